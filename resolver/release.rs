use lazy_regex::regex_is_match;
use repo_details_utils::constants::SHORT_SHA_LEN;
use serde::{Deserialize, Serialize};

/// A release or commit in the canonical shape every provider
/// payload is normalized into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseEntity {
    /// Git SHA or tag name.
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl ReleaseEntity {
    /// The ref as it should be shown to a user.
    ///
    /// Full commit SHAs are shortened, the stored ref is left as is.
    #[must_use]
    pub fn display_ref(&self) -> Option<&str> {
        self.git_ref.as_deref().map(display_ref)
    }
}

/// The deployed release alongside the newest one in the repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<ReleaseEntity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest: Option<ReleaseEntity>,
}

impl ReleaseInfo {
    /// Whether the deployed ref is the newest ref.
    ///
    /// `None` when either ref is unknown.
    #[must_use]
    pub fn is_up_to_date(&self) -> Option<bool> {
        let current = self.current.as_ref()?.git_ref.as_deref()?;
        let latest = self.latest.as_ref()?.git_ref.as_deref()?;
        Some(current == latest)
    }
}

#[must_use]
pub fn is_full_sha(git_ref: &str) -> bool {
    regex_is_match!(r"^[0-9a-fA-F]{40}$", git_ref)
}

/// Shortens a full commit SHA, other refs pass through.
#[must_use]
pub fn display_ref(git_ref: &str) -> &str {
    if is_full_sha(git_ref) {
        &git_ref[..SHORT_SHA_LEN]
    } else {
        git_ref
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    const SHA: &str = "deadbeefdeadbeefdeadbeefdeadbeefdeadbeef";

    #[rstest]
    #[case::full_sha(SHA, "deadbee")]
    #[case::upper_sha("DEADBEEFDEADBEEFDEADBEEFDEADBEEFDEADBEEF", "DEADBEE")]
    #[case::tag("v1.2.3", "v1.2.3")]
    #[case::short_sha("deadbee", "deadbee")]
    #[case::too_long("deadbeefdeadbeefdeadbeefdeadbeefdeadbeef0", "deadbeefdeadbeefdeadbeefdeadbeefdeadbeef0")]
    #[case::not_hex("deadbeefdeadbeefdeadbeefdeadbeefdeadbeeg", "deadbeefdeadbeefdeadbeefdeadbeefdeadbeeg")]
    fn shortens_full_shas(#[case] git_ref: &str, #[case] expected: &str) {
        assert_eq!(display_ref(git_ref), expected);
    }

    #[test]
    fn display_keeps_stored_ref() {
        let entity = ReleaseEntity {
            git_ref: Some(SHA.into()),
            ..Default::default()
        };

        assert_eq!(entity.display_ref(), Some("deadbee"));
        assert_eq!(entity.git_ref.as_deref(), Some(SHA));
    }

    #[rstest]
    #[case::same(Some("v2.0"), Some("v2.0"), Some(true))]
    #[case::behind(Some("v1.0"), Some("v2.0"), Some(false))]
    #[case::unknown_latest(Some("v1.0"), None, None)]
    #[case::unknown_current(None, Some("v2.0"), None)]
    fn up_to_date(
        #[case] current: Option<&str>,
        #[case] latest: Option<&str>,
        #[case] expected: Option<bool>,
    ) {
        let entity = |git_ref: Option<&str>| ReleaseEntity {
            git_ref: git_ref.map(Into::into),
            ..Default::default()
        };
        let info = ReleaseInfo {
            current: Some(entity(current)),
            latest: Some(entity(latest)),
        };

        assert_eq!(info.is_up_to_date(), expected);
    }

    #[test]
    fn serializes_canonical_field_names() {
        let info = ReleaseInfo {
            current: Some(ReleaseEntity {
                git_ref: Some("v2.0".into()),
                published_at: Some("2024-01-01".into()),
                ..Default::default()
            }),
            latest: None,
        };

        assert_eq!(
            serde_json::to_string(&info).unwrap(),
            r#"{"current":{"ref":"v2.0","published_at":"2024-01-01"}}"#
        );
    }
}
