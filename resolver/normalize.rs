//! Maps the payloads the reference service can return into
//! the canonical [`ReleaseInfo`] shape.
//!
//! Each side of a payload is normalized on its own, so a tagged
//! release on one side and a bare commit on the other is fine.

use log::trace;
use miette::Diagnostic;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::release::{ReleaseEntity, ReleaseInfo};

#[derive(Error, Diagnostic, Debug)]
pub enum NormalizeError {
    #[error("Response body is not JSON")]
    #[diagnostic()]
    NotJson(#[source] serde_json::Error),

    #[error("Expected a JSON object but got {0}")]
    #[diagnostic()]
    NotAnObject(&'static str),

    #[error("Unrecognized '{side}' entry")]
    #[diagnostic()]
    Side {
        side: &'static str,

        #[source]
        source: serde_json::Error,
    },
}

/// The shape a provider entry arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawShape {
    /// A GitHub release with `tag_name`.
    Release,

    /// A GitHub commit with `sha` and nested `commit` details.
    Commit,

    /// Already in the canonical shape.
    Canonical,
}

#[derive(Debug, Default, Deserialize)]
struct RawEntity {
    tag_name: Option<String>,
    sha: Option<String>,

    #[serde(rename = "ref")]
    git_ref: Option<String>,

    html_url: Option<String>,
    url: Option<String>,
    body: Option<String>,
    message: Option<String>,
    published_at: Option<String>,
    author: Option<RawAuthor>,
    commit: Option<RawCommit>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawAuthor {
    User { login: Option<String> },
    Name(String),
}

#[derive(Debug, Default, Deserialize)]
struct RawCommit {
    message: Option<String>,
    author: Option<RawCommitAuthor>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCommitAuthor {
    date: Option<String>,
}

impl RawEntity {
    const fn shape(&self) -> RawShape {
        if self.tag_name.is_some() {
            RawShape::Release
        } else if self.sha.is_some() || self.commit.is_some() {
            RawShape::Commit
        } else {
            RawShape::Canonical
        }
    }

    fn commit_message(&self) -> Option<&str> {
        self.commit.as_ref()?.message.as_deref()
    }

    fn commit_date(&self) -> Option<&str> {
        self.commit.as_ref()?.author.as_ref()?.date.as_deref()
    }

    fn author_login(&self) -> Option<&str> {
        match self.author.as_ref()? {
            RawAuthor::User { login } => login.as_deref(),
            RawAuthor::Name(_) => None,
        }
    }

    fn author_name(&self) -> Option<&str> {
        match self.author.as_ref()? {
            RawAuthor::Name(name) => Some(name),
            RawAuthor::User { .. } => None,
        }
    }
}

/// The first candidate that is present and not empty.
fn first_present<'a, I>(candidates: I) -> Option<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.is_empty())
        .map(ToString::to_string)
}

fn entity_ref(raw: &RawEntity) -> Option<String> {
    first_present([
        raw.tag_name.as_deref(),
        raw.sha.as_deref(),
        raw.git_ref.as_deref(),
    ])
}

fn entity_url(raw: &RawEntity) -> Option<String> {
    first_present([raw.html_url.as_deref(), raw.url.as_deref()])
}

fn entity_message(raw: &RawEntity) -> Option<String> {
    first_present([
        raw.body.as_deref(),
        raw.commit_message(),
        raw.message.as_deref(),
    ])
}

fn entity_published_at(raw: &RawEntity) -> Option<String> {
    first_present([raw.published_at.as_deref(), raw.commit_date()])
}

fn entity_author(raw: &RawEntity) -> Option<String> {
    first_present([raw.author_login(), raw.author_name()])
}

impl From<&RawEntity> for ReleaseEntity {
    fn from(raw: &RawEntity) -> Self {
        Self {
            git_ref: entity_ref(raw),
            url: entity_url(raw),
            message: entity_message(raw),
            published_at: entity_published_at(raw),
            author: entity_author(raw),
        }
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn normalize_side(
    payload: &serde_json::Map<String, Value>,
    side: &'static str,
) -> Result<Option<ReleaseEntity>, NormalizeError> {
    let Some(value) = payload.get(side).filter(|value| !value.is_null()) else {
        return Ok(None);
    };

    if !value.is_object() {
        return Err(NormalizeError::NotAnObject(json_kind(value)));
    }

    let raw = RawEntity::deserialize(value).map_err(|source| NormalizeError::Side { side, source })?;
    trace!("Normalizing {side} entry from {:?} shape", raw.shape());

    Ok(Some(ReleaseEntity::from(&raw)))
}

/// Normalizes a reference service response body.
///
/// # Errors
/// Will error if the body isn't a JSON object or either side
/// can't be read as a release, commit, or canonical entry.
pub fn normalize_payload(body: &[u8]) -> Result<ReleaseInfo, NormalizeError> {
    let payload: Value = serde_json::from_slice(body).map_err(NormalizeError::NotJson)?;
    let Value::Object(payload) = payload else {
        return Err(NormalizeError::NotAnObject(json_kind(&payload)));
    };

    Ok(ReleaseInfo {
        current: normalize_side(&payload, "current")?,
        latest: normalize_side(&payload, "latest")?,
    })
}
