use std::{fmt, path::PathBuf};

use miette::Diagnostic;
use repo_details_utils::constants::{APPLICATION_REPOSITORY_INFO, IMAGE_TAG_FIELD};
use reqwest::StatusCode;
use thiserror::Error;

use crate::normalize::NormalizeError;

/// A field that has to be known before a release can be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    ApplicationRepository,
    ImageTag,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ApplicationRepository => APPLICATION_REPOSITORY_INFO,
            Self::ImageTag => IMAGE_TAG_FIELD,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingFields(pub Vec<MissingField>);

impl fmt::Display for MissingFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" and ")?;
            }
            write!(f, "{field}")?;
        }
        Ok(())
    }
}

#[derive(Error, Diagnostic, Debug)]
pub enum ResolveError {
    #[error("Missing required fields: {0}.")]
    #[diagnostic(help(
        "Add 'Application Repository' and 'Image Repository' entries to the application's spec.info"
    ))]
    MissingFields(MissingFields),

    #[error("Failed to fetch release info for {git_ref} tag from {repo} git repository (HTTP {status})")]
    #[diagnostic()]
    Fetch {
        repo: String,
        git_ref: String,
        status: StatusCode,
    },

    #[error("Failed to fetch release info for {git_ref} tag from {repo} git repository")]
    #[diagnostic(help("Check that the reference service is reachable"))]
    Transport {
        repo: String,
        git_ref: String,

        #[source]
        source: reqwest::Error,
    },

    #[error("Received release info for {git_ref} from {repo} in an unrecognized format")]
    #[diagnostic()]
    MalformedResponse {
        repo: String,
        git_ref: String,

        #[source]
        source: NormalizeError,
    },

    #[error("Failed to set up the HTTP client")]
    #[diagnostic()]
    ClientBuild(#[source] reqwest::Error),

    #[error("Release resolution was cancelled")]
    #[diagnostic()]
    Cancelled,
}

#[derive(Error, Diagnostic, Debug)]
pub enum CacheError {
    #[error("Cached release info for {key} is corrupt")]
    #[diagnostic()]
    Corrupt {
        key: String,

        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize release info for {key}")]
    #[diagnostic()]
    Serialize {
        key: String,

        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to access session file {}", .path.display())]
    #[diagnostic()]
    Io {
        path: PathBuf,

        #[source]
        source: std::io::Error,
    },

    #[error("Session file {} is not a valid session store", .path.display())]
    #[diagnostic(help("Delete the file to start a new session"))]
    FileFormat {
        path: PathBuf,

        #[source]
        source: serde_json::Error,
    },

    #[error("Session store task failed")]
    #[diagnostic()]
    Task(#[source] tokio::task::JoinError),
}
