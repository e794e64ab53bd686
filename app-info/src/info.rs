use log::{debug, warn};
use repo_details_utils::constants::{APPLICATION_REPOSITORY_INFO, IMAGE_REPOSITORY_INFO};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single entry from an application's `spec.info` list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoItem {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub value: String,
}

impl InfoItem {
    #[must_use]
    pub fn new<N, V>(name: N, value: V) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Decodes an info list without failing.
///
/// Anything that is not a list yields an empty list. A malformed entry
/// that still has a string `name` is kept with an empty value so it
/// shadows later entries of the same name. Other malformed entries
/// are skipped.
#[must_use]
pub fn info_items_from_value(value: &Value) -> Vec<InfoItem> {
    match value {
        Value::Null => vec![],
        Value::Array(items) => items.iter().filter_map(info_item_from_value).collect(),
        other => {
            warn!("Error parsing info for application metadata, expected a list but got {other}");
            vec![]
        }
    }
}

fn info_item_from_value(item: &Value) -> Option<InfoItem> {
    match InfoItem::deserialize(item) {
        Ok(entry) => Some(entry),
        Err(e) => match item.get("name").and_then(Value::as_str) {
            Some(name) => {
                warn!("Ignoring the value of malformed info entry {item}: {e}");
                Some(InfoItem::new(name, ""))
            }
            None => {
                warn!("Skipping malformed info entry {item}: {e}");
                None
            }
        },
    }
}

fn find_info<'a>(info: &'a [InfoItem], name: &str) -> Option<&'a InfoItem> {
    info.iter().find(|item| item.name == name)
}

/// Gets the trimmed `Application Repository` value.
#[must_use]
pub fn parse_app_repository(info: &[InfoItem]) -> Option<String> {
    let Some(entry) = find_info(info, APPLICATION_REPOSITORY_INFO) else {
        debug!("No '{APPLICATION_REPOSITORY_INFO}' entry in application info");
        return None;
    };

    let value = entry.value.trim();
    if value.is_empty() {
        debug!("'{APPLICATION_REPOSITORY_INFO}' entry is empty");
        None
    } else {
        Some(value.to_string())
    }
}

/// Gets the `Image Repository` value up to the first `:`.
#[must_use]
pub fn parse_image_repository(info: &[InfoItem]) -> Option<String> {
    let Some(entry) = find_info(info, IMAGE_REPOSITORY_INFO) else {
        debug!("No '{IMAGE_REPOSITORY_INFO}' entry in application info");
        return None;
    };

    match entry.value.split(':').next() {
        Some(repository) if !repository.is_empty() => Some(repository.to_string()),
        _ => {
            debug!(
                "'{IMAGE_REPOSITORY_INFO}' entry has no repository: {:?}",
                entry.value
            );
            None
        }
    }
}
