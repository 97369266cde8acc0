#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod ident;
pub mod manifest;
pub mod project;
pub mod workspace;

pub use ident::{Descriptor, Ident};
pub use manifest::{DependencyMap, DependencyScope, Manifest, MANIFEST_FILE};
pub use project::{discover_project_root, MissingProjectError, Project};
pub use workspace::{expand_workspace_patterns, relative_cwd, LocatorHash, Workspace};
