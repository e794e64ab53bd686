//! Text renderings of a resolution for the terminal.
//!
//! Every field of the release info may be absent, the panels fall
//! back to placeholders instead of failing.

use std::fmt;

use chrono::{DateTime, Utc};
use colored::Colorize;
use repo_details_resolver::{ReleaseEntity, ReleaseInfo, ResolutionState};

const NOT_AVAILABLE: &str = "N/A";
const NO_DESCRIPTION: &str = "No description available";
const UNKNOWN_AUTHOR: &str = "Unknown";
const LOADING: &str = "Loading release information...";
const NO_RELEASE_INFO: &str = "No release information available for this application.";

/// A one line summary of the deployed release.
#[derive(Debug, Clone, Copy)]
pub struct StatusPanel<'a> {
    state: &'a ResolutionState,
}

impl<'a> StatusPanel<'a> {
    #[must_use]
    pub const fn new(state: &'a ResolutionState) -> Self {
        Self { state }
    }
}

impl fmt::Display for StatusPanel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", "CURRENT RELEASE".bold())?;

        match self.state {
            ResolutionState::Idle => f.write_str(NOT_AVAILABLE),
            ResolutionState::Loading => f.write_str(LOADING),
            ResolutionState::Failed(message) => write!(f, "{}", message.red()),
            ResolutionState::Ready(info) if is_empty(info) => f.write_str(NO_RELEASE_INFO),
            ResolutionState::Ready(info) => write!(
                f,
                "{}",
                info.current
                    .as_ref()
                    .and_then(ReleaseEntity::display_ref)
                    .unwrap_or(NOT_AVAILABLE)
                    .bright_green()
            ),
        }
    }
}

/// The current and latest releases side by side.
#[derive(Debug, Clone, Copy)]
pub struct DetailsPanel<'a> {
    state: &'a ResolutionState,
}

impl<'a> DetailsPanel<'a> {
    #[must_use]
    pub const fn new(state: &'a ResolutionState) -> Self {
        Self { state }
    }
}

impl fmt::Display for DetailsPanel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let info = match self.state {
            ResolutionState::Idle => return f.write_str(NO_RELEASE_INFO),
            ResolutionState::Loading => return f.write_str(LOADING),
            ResolutionState::Failed(message) => {
                return write!(
                    f,
                    "Error loading release information: {}",
                    message.red()
                )
            }
            ResolutionState::Ready(info) if is_empty(info) => {
                return f.write_str(NO_RELEASE_INFO)
            }
            ResolutionState::Ready(info) => info,
        };

        write_entity(f, "CURRENT RELEASE", info.current.as_ref())?;
        writeln!(f)?;
        write_entity(f, "LATEST RELEASE", info.latest.as_ref())?;

        match (info.is_up_to_date(), info.latest.as_ref()) {
            (Some(true), _) => write!(f, "\n{}", "Up to date".green()),
            (Some(false), Some(latest)) => write!(
                f,
                "\n{} {}",
                "Update available:".yellow(),
                latest.display_ref().unwrap_or(NOT_AVAILABLE)
            ),
            _ => Ok(()),
        }
    }
}

const fn is_empty(info: &ReleaseInfo) -> bool {
    info.current.is_none() && info.latest.is_none()
}

fn write_entity(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    entity: Option<&ReleaseEntity>,
) -> fmt::Result {
    writeln!(f, "{}", title.bold())?;

    let Some(entity) = entity else {
        return writeln!(f, "  {NOT_AVAILABLE}");
    };

    let git_ref = entity.display_ref().unwrap_or(NOT_AVAILABLE);
    match entity.url.as_deref() {
        Some(url) => writeln!(f, "  {:<14}{git_ref} ({})", "REF", url.cyan())?,
        None => writeln!(f, "  {:<14}{git_ref}", "REF")?,
    }
    writeln!(
        f,
        "  {:<14}{}",
        "PUBLISHED AT",
        entity
            .published_at
            .as_deref()
            .map_or_else(|| NOT_AVAILABLE.to_string(), format_date)
    )?;
    writeln!(
        f,
        "  {:<14}{}",
        "AUTHOR",
        entity.author.as_deref().unwrap_or(UNKNOWN_AUTHOR)
    )?;
    writeln!(f, "  DESCRIPTION")?;
    for line in entity.message.as_deref().unwrap_or(NO_DESCRIPTION).lines() {
        writeln!(f, "    {line}")?;
    }

    Ok(())
}

/// Formats RFC 3339 timestamps in UTC, anything else is shown as is.
fn format_date(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw).map_or_else(
        |_| raw.to_string(),
        |date| {
            date.with_timezone(&Utc)
                .format("%Y-%m-%d %H:%M UTC")
                .to_string()
        },
    )
}
