#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]

mod core;

pub(crate) use crate::core::config;
pub(crate) use crate::core::config::context;
pub(crate) use crate::core::runtime::effects;
pub(crate) use crate::core::tooling::outcome;
pub(crate) use crate::core::{fs, project, runtime, store, tooling};

pub mod focus {
    pub use crate::core::focus::*;
}

pub mod install {
    pub use crate::core::install::*;
}

pub use crate::core::config::context::{CommandContext, CommandInfo};
pub use crate::core::config::{CacheConfig, Config, GlobalOptions, InstallConfig};
pub use crate::core::runtime::effects::{FileSystem, SharedEffects, SystemEffects};
pub use crate::core::runtime::CommandGroup;
pub use crate::core::store::CacheLocation;
pub use crate::core::tooling::outcome::{CommandStatus, ExecutionOutcome};
pub use crate::core::tooling::report::{Report, ReportEntry, ReportLevel};

pub use crate::core::focus::{workspace_focus, FocusError, FocusRequest};
pub use crate::core::install::project_install;
pub use crate::core::project::project_list;

pub use crate::core::runtime::{
    focus_error_outcome, format_status_message, is_missing_project_error, manifest_error_outcome,
    missing_project_outcome, to_json_response,
};

pub const MISSING_PROJECT_MESSAGE: &str = crate::core::runtime::MISSING_PROJECT_MESSAGE;
pub const MISSING_PROJECT_HINT: &str = crate::core::runtime::MISSING_PROJECT_HINT;
