use clap::Parser;
use log::LevelFilter;
use repo_details::{
    commands::{CommandArgs, RepoDetailsArgs, RepoDetailsCommand},
    shadow,
};
use repo_details_utils::logging::Logger;

fn main() {
    let args = RepoDetailsArgs::parse();

    Logger::new()
        .filter_level(args.verbosity.log_level_filter())
        .filter_modules([("hyper", LevelFilter::Info), ("reqwest", LevelFilter::Info)])
        .log_out_dir(args.log_out.clone())
        .init();

    log::debug!(
        "repo-details {} ({})",
        shadow::PKG_VERSION,
        shadow::RD_COMMIT_HASH_SHORT
    );
    log::trace!("Parsed arguments: {args:#?}");

    match args.command {
        CommandArgs::Extract(mut command) => command.run(),

        CommandArgs::Resolve(mut command) => command.run(),

        CommandArgs::Watch(mut command) => command.run(),

        CommandArgs::Completions(mut command) => command.run(),
    }
}
