use std::path::PathBuf;

use bon::Builder;
use clap::Args;
use log::trace;
use miette::{IntoDiagnostic, Result};
use repo_details_app_info::AppReferences;
use repo_details_utils::constants::{APPLICATION_REPOSITORY_INFO, IMAGE_TAG_FIELD};

use super::{read_application, RepoDetailsCommand};

#[derive(Debug, Clone, Args, Builder)]
pub struct ExtractCommand {
    /// The application document, as printed by
    /// `argocd app get <name> -o json`. Use `-` for stdin.
    #[arg()]
    #[builder(into)]
    application: PathBuf,

    /// Print the references as JSON.
    #[arg(long)]
    #[builder(default)]
    json: bool,
}

impl RepoDetailsCommand for ExtractCommand {
    fn try_run(&mut self) -> Result<()> {
        trace!("ExtractCommand::try_run()");

        let references = read_application(&self.application)?.references();
        println!("{}", self.format(&references)?);

        Ok(())
    }
}

impl ExtractCommand {
    fn format(&self, references: &AppReferences) -> Result<String> {
        if self.json {
            return serde_json::to_string_pretty(references).into_diagnostic();
        }

        Ok(format!(
            "{APPLICATION_REPOSITORY_INFO}: {}\n{IMAGE_TAG_FIELD}: {}",
            references.app_repository.as_deref().unwrap_or("N/A"),
            references.image_tag.as_deref().unwrap_or("N/A"),
        ))
    }
}
