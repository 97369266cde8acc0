//! Internal implementation modules for `workfocus-core`.

pub mod config;
pub mod focus;
pub(crate) mod fs;
pub mod install;
pub mod project;
pub mod runtime;
pub mod store;
pub mod tooling;
