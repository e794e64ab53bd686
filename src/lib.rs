//! Shows which git release an Argo CD application is running.
//!
//! The application's repository and deployed image tag are read from its
//! `spec.info` and running images, then resolved to the current and latest
//! release through the repository-details extension.

pub mod commands;
pub mod render;

shadow_rs::shadow!(shadow);
