//! Reads the metadata of a deployed Argo CD application and derives
//! the git repository and image tag that identify the running release.
//!
//! Everything here is fail-soft. Partial metadata is routine, so parsing
//! helpers log what they couldn't find and return `None` instead of erroring.

mod application;
mod error;
mod extract;
mod identity;
mod image;
mod info;

pub use application::*;
pub use error::*;
pub use extract::*;
pub use identity::*;
pub use image::*;
pub use info::*;
