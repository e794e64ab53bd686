use std::fmt;

use bon::Builder;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::Application;

/// The Argo CD identity forwarded to the reference service
/// for per-application authorization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Builder)]
pub struct Identity {
    #[builder(into, default)]
    pub application_name: String,

    #[builder(into, default)]
    pub application_namespace: String,

    #[builder(into, default)]
    pub project: String,
}

impl Identity {
    /// The `<namespace>:<name>` value Argo CD expects.
    #[must_use]
    pub fn application_header(&self) -> String {
        format!("{}:{}", self.application_namespace, self.application_name)
    }
}

/// Determines the identity of an application.
pub trait IdentityResolver {
    fn resolve_identity(&self, application: &Application) -> Identity;
}

/// Where the application's namespace is read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamespaceSource {
    /// `metadata.namespace`, the namespace the Application resource lives in.
    #[default]
    Metadata,

    /// `spec.destination.namespace`, the namespace the application deploys to.
    Destination,
}

impl fmt::Display for NamespaceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Metadata => "metadata",
            Self::Destination => "destination",
        })
    }
}

impl IdentityResolver for NamespaceSource {
    fn resolve_identity(&self, application: &Application) -> Identity {
        let namespace = match self {
            Self::Metadata => application.namespace(),
            Self::Destination => application.destination_namespace(),
        };

        Identity::builder()
            .application_name(application.name().unwrap_or_default())
            .application_namespace(namespace.unwrap_or_default())
            .project(application.project().unwrap_or_default())
            .build()
    }
}
