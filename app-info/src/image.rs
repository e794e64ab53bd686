use std::{fmt, ops::Deref};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A running image in the form `<repository>:<tag>@<digest>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageReference(String);

impl ImageReference {
    /// The tag segment with any digest stripped.
    ///
    /// Returns `None` when the reference has no `:` separated
    /// tag segment or the tag is empty.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        let mut parts = self.0.split(':');
        parts.next()?;

        let Some(tag_part) = parts.next() else {
            debug!("Image reference {self} has no tag segment");
            return None;
        };

        tag_part
            .split('@')
            .next()
            .filter(|tag| !tag.is_empty())
    }
}

impl Deref for ImageReference {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ImageReference {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ImageReference {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Decodes the running image list without failing.
///
/// Entries that are not strings are skipped and a value that
/// isn't a list yields no images.
#[must_use]
pub fn images_from_value(value: &Value) -> Vec<ImageReference> {
    match value {
        Value::Null => vec![],
        Value::Array(images) => images
            .iter()
            .filter_map(|image| {
                let image = image.as_str().map(ImageReference::from);
                if image.is_none() {
                    warn!("Skipping non-string entry in the images list");
                }
                image
            })
            .collect(),
        other => {
            warn!("Error processing images, expected a list but got {other}");
            vec![]
        }
    }
}

/// Finds the tag of the first image that starts with `image_repository`.
///
/// Input order is significant. Returns `None` when no repository is
/// given, nothing matches, or the matching reference has no tag.
#[must_use]
pub fn find_matching_image(
    images: &[ImageReference],
    image_repository: Option<&str>,
) -> Option<String> {
    let image_repository = image_repository?;

    let Some(image) = images
        .iter()
        .find(|image| image.starts_with(image_repository))
    else {
        debug!("No running image matches repository {image_repository}");
        return None;
    };

    image.tag().map(ToString::to_string)
}
