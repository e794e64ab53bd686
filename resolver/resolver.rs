//! Resolves the deployed and newest release of an Argo CD application.
//!
//! References are fetched from the repository-details extension, normalized
//! into one canonical shape, and cached for the rest of the session.

use std::sync::LazyLock;

use tokio::runtime::Runtime;

pub use cache::*;
pub use client::*;
pub use debounce::*;
pub use error::*;
pub use normalize::{normalize_payload, NormalizeError, RawShape};
pub use release::*;
pub use resolve::*;

mod cache;
mod client;
mod debounce;
mod error;
mod normalize;
mod release;
mod resolve;

/// Runtime used by the synchronous command layer to drive resolutions.
///
/// # Panics
/// Panics if the runtime can't be started.
pub static ASYNC_RUNTIME: LazyLock<Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Should build async runtime")
});
