//! Command-facing helpers shared by `wf focus`, `wf install`, and `wf list`.

mod context;
mod errors;

pub const MISSING_PROJECT_MESSAGE: &str = "No workspace project found.";
pub const MISSING_PROJECT_HINT: &str =
    "Run the command from a directory containing package.json, or one of its children.";

pub use context::CommandGroup;
pub use errors::{
    focus_error_outcome, format_status_message, is_missing_project_error, manifest_error_outcome,
    missing_project_outcome, to_json_response,
};
