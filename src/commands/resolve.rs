use std::path::PathBuf;

use bon::Builder;
use clap::Args;
use log::trace;
use miette::{IntoDiagnostic, Result};
use repo_details_resolver::{ResolutionState, ResolveRequest, ASYNC_RUNTIME};
use tokio_util::sync::CancellationToken;

use crate::render::{DetailsPanel, StatusPanel};

use super::{read_application, RepoDetailsCommand, ServerArgs};

#[derive(Debug, Clone, Args, Builder)]
pub struct ResolveCommand {
    /// The application document, as printed by
    /// `argocd app get <name> -o json`. Use `-` for stdin.
    #[arg()]
    #[builder(into)]
    application: PathBuf,

    /// Show the current and latest release
    /// instead of a one line status.
    #[arg(short, long)]
    #[builder(default)]
    details: bool,

    /// Print the normalized release info as JSON.
    #[arg(long, conflicts_with = "details")]
    #[builder(default)]
    json: bool,

    #[clap(flatten)]
    server: ServerArgs,
}

impl RepoDetailsCommand for ResolveCommand {
    fn try_run(&mut self) -> Result<()> {
        trace!("ResolveCommand::try_run()");

        let application = read_application(&self.application)?;
        let request = ResolveRequest::from_application(&application, &self.server.namespace_source);
        trace!("{request:#?}");

        let resolver = self.server.resolver()?;
        let info = ASYNC_RUNTIME.block_on(resolver.resolve(&request, &CancellationToken::new()))?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&info).into_diagnostic()?);
            return Ok(());
        }

        let state = ResolutionState::Ready(info);
        if self.details {
            println!("{}", DetailsPanel::new(&state));
        } else {
            println!("{}", StatusPanel::new(&state));
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use super::*;

    #[test]
    fn missing_fields_fail_before_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.json");
        fs::write(
            &path,
            r#"{"metadata": {"name": "web"}, "spec": {"info": []}}"#,
        )
        .unwrap();

        let err = ResolveCommand::builder()
            .application(path)
            .server(
                ServerArgs::builder()
                    .server("http://127.0.0.1:9")
                    .timeout(1)
                    .build(),
            )
            .build()
            .try_run()
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Missing required fields: Application Repository and Image Tag."
        );
    }
}
