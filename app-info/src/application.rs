use std::{fs, path::Path, str::FromStr};

use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::AppInfoError,
    extract::{extract_references, AppReferences},
    image::{images_from_value, ImageReference},
    info::{info_items_from_value, InfoItem},
};

/// The parts of an Argo CD `Application` resource this tool reads.
///
/// Every field is optional. `spec.info` and `status.summary.images`
/// are kept as raw JSON so a malformed value only affects extraction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Application {
    #[serde(default)]
    metadata: Option<ApplicationMetadata>,

    #[serde(default)]
    spec: Option<ApplicationSpec>,

    #[serde(default)]
    status: Option<ApplicationStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ApplicationMetadata {
    name: Option<String>,
    namespace: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ApplicationSpec {
    project: Option<String>,

    #[serde(default)]
    info: Value,

    #[serde(default)]
    destination: Option<ApplicationDestination>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ApplicationDestination {
    namespace: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ApplicationStatus {
    #[serde(default)]
    summary: Option<ApplicationSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ApplicationSummary {
    #[serde(default)]
    images: Value,
}

impl Application {
    /// Reads an application from a JSON file.
    ///
    /// # Errors
    /// Will error if the file can't be read or isn't an application document.
    pub fn from_path<P>(path: P) -> Result<Self, AppInfoError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        fs::read_to_string(path)
            .map_err(|source| AppInfoError::Read {
                path: path.to_path_buf(),
                source,
            })?
            .parse()
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.metadata.as_ref()?.name.as_deref()
    }

    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.metadata.as_ref()?.namespace.as_deref()
    }

    #[must_use]
    pub fn project(&self) -> Option<&str> {
        self.spec.as_ref()?.project.as_deref()
    }

    #[must_use]
    pub fn destination_namespace(&self) -> Option<&str> {
        self.spec
            .as_ref()?
            .destination
            .as_ref()?
            .namespace
            .as_deref()
    }

    /// The declared `spec.info` entries.
    #[must_use]
    pub fn info(&self) -> Vec<InfoItem> {
        self.spec
            .as_ref()
            .map_or_else(Vec::new, |spec| info_items_from_value(&spec.info))
    }

    /// The running images from `status.summary.images`.
    #[must_use]
    pub fn images(&self) -> Vec<ImageReference> {
        self.status
            .as_ref()
            .and_then(|status| status.summary.as_ref())
            .map_or_else(Vec::new, |summary| images_from_value(&summary.images))
    }

    /// Extracts the repository and deployed tag of this application.
    #[must_use]
    pub fn references(&self) -> AppReferences {
        extract_references(&self.images(), &self.info())
    }
}

impl FromStr for Application {
    type Err = AppInfoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s).map_err(AppInfoError::from)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    const APPLICATION: &str = r#"{
        "metadata": {"name": "web", "namespace": "argocd"},
        "spec": {
            "project": "shop",
            "destination": {"namespace": "web-prod", "server": "https://kubernetes.default.svc"},
            "info": [
                {"name": "Application Repository", "value": "org/repo "},
                {"name": "Image Repository", "value": "registry/org/app"}
            ]
        },
        "status": {
            "summary": {
                "images": ["registry/org/sidecar:0.1", "registry/org/app:1.2.3@sha256:abcd"]
            }
        }
    }"#;

    #[test]
    fn reads_application_fields() {
        let application: Application = APPLICATION.parse().unwrap();

        assert_eq!(application.name(), Some("web"));
        assert_eq!(application.namespace(), Some("argocd"));
        assert_eq!(application.project(), Some("shop"));
        assert_eq!(application.destination_namespace(), Some("web-prod"));
        assert_eq!(application.info().len(), 2);
        assert_eq!(application.images().len(), 2);
    }

    #[test]
    fn references() {
        let application: Application = APPLICATION.parse().unwrap();

        assert_eq!(
            application.references(),
            AppReferences {
                app_repository: Some("org/repo".into()),
                image_tag: Some("1.2.3".into()),
            }
        );
    }

    #[test]
    fn malformed_info_is_tolerated() {
        let application: Application = r#"{
            "spec": {"info": "org/repo"},
            "status": {"summary": {"images": ["registry/org/app:1.0"]}}
        }"#
        .parse()
        .unwrap();

        assert_eq!(application.references(), AppReferences::default());
    }

    #[test]
    fn empty_document() {
        let application: Application = "{}".parse().unwrap();

        assert_eq!(application.name(), None);
        assert!(application.info().is_empty());
        assert!(application.images().is_empty());
    }

    #[test]
    fn not_json() {
        assert!(matches!(
            "metadata: {}".parse::<Application>(),
            Err(AppInfoError::Parse(_))
        ));
    }
}
