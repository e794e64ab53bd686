use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};
use log::debug;
use miette::Result;

use crate::commands::RepoDetailsArgs;

use super::RepoDetailsCommand;

#[derive(Debug, Clone, Args)]
pub struct CompletionsCommand {
    #[arg(value_enum)]
    shell: Shell,
}

impl RepoDetailsCommand for CompletionsCommand {
    fn try_run(&mut self) -> Result<()> {
        debug!("Generating completions for {shell}", shell = self.shell);

        generate(
            self.shell,
            &mut RepoDetailsArgs::command(),
            "repo-details",
            &mut std::io::stdout().lock(),
        );

        Ok(())
    }
}
