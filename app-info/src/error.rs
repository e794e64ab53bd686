use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum AppInfoError {
    #[error("Failed to read application file {}", .path.display())]
    #[diagnostic()]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse application document")]
    #[diagnostic(help("Export the application with `argocd app get <name> -o json`"))]
    Parse(#[from] serde_json::Error),
}
