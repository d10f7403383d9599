//! Platform helpers shared by the rest of the crate.
//!
//! - [`path`] - Shell-like path expansion for user supplied paths
//! - [`thread`] - Named background threads

pub mod path;
pub mod thread;
