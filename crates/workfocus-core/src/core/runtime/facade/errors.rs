use serde_json::{json, Value};
use workfocus_domain::{MissingProjectError, MANIFEST_FILE};

use crate::context::CommandInfo;
use crate::focus::FocusError;
use crate::outcome::{CommandStatus, ExecutionOutcome};

use super::{MISSING_PROJECT_HINT, MISSING_PROJECT_MESSAGE};

pub fn missing_project_outcome() -> ExecutionOutcome {
    ExecutionOutcome::user_error(
        MISSING_PROJECT_MESSAGE,
        json!({
            "reason": "missing_project",
            "hint": MISSING_PROJECT_HINT,
        }),
    )
}

pub fn is_missing_project_error(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| cause.downcast_ref::<MissingProjectError>().is_some())
}

/// Maps unreadable or conflicting manifests to a user error.
pub fn manifest_error_outcome(err: &anyhow::Error) -> Option<ExecutionOutcome> {
    if let Some(message) = err
        .chain()
        .map(ToString::to_string)
        .find(|msg| msg.starts_with("duplicate workspace name"))
    {
        return Some(ExecutionOutcome::user_error(
            message,
            json!({
                "reason": "duplicate_workspace",
                "hint": "Give every workspace a unique `name` in its package.json.",
            }),
        ));
    }

    let parse_error = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<serde_json::Error>().map(ToString::to_string))?;
    let target = err
        .chain()
        .find_map(|cause| {
            cause
                .to_string()
                .strip_prefix("failed to parse ")
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| MANIFEST_FILE.to_string());

    Some(ExecutionOutcome::user_error(
        format!("{target} is not valid JSON"),
        json!({
            "reason": "invalid_manifest",
            "target": target,
            "error": parse_error,
            "hint": "Fix the package.json syntax and rerun the command.",
        }),
    ))
}

/// Maps focus selection errors to user errors and install failures to failures.
pub fn focus_error_outcome(err: &FocusError) -> ExecutionOutcome {
    match err {
        FocusError::Configuration => ExecutionOutcome::user_error(
            err.to_string(),
            json!({
                "reason": "conflicting_selection",
                "hint": "Pass either workspace names or --all, not both.",
            }),
        ),
        FocusError::UnknownWorkspace { name } => ExecutionOutcome::user_error(
            err.to_string(),
            json!({
                "reason": "unknown_workspace",
                "workspace": name,
                "hint": "Run `wf list` to see the workspaces of this project.",
            }),
        ),
        FocusError::NoActiveWorkspace { cwd } => ExecutionOutcome::user_error(
            err.to_string(),
            json!({
                "reason": "no_active_workspace",
                "cwd": cwd.display().to_string(),
                "hint": "Pass workspace names or --all, or run from inside a workspace.",
            }),
        ),
        FocusError::InstallFailure(source) => ExecutionOutcome::failure(
            source.to_string(),
            json!({
                "reason": "install_failed",
                "exit_code": 1,
            }),
        ),
    }
}

#[must_use]
pub fn to_json_response(info: CommandInfo, outcome: &ExecutionOutcome, _code: i32) -> Value {
    let status = match outcome.status {
        CommandStatus::Ok => "ok",
        CommandStatus::UserError => "user-error",
        CommandStatus::Failure => "error",
    };
    let details = match &outcome.details {
        Value::Object(_) => outcome.details.clone(),
        Value::Null => json!({}),
        other => json!({ "value": other }),
    };
    json!({
        "status": status,
        "message": format_status_message(info, &outcome.message),
        "details": details,
    })
}

#[must_use]
pub fn format_status_message(info: CommandInfo, message: &str) -> String {
    let group_name = info.group.to_string();
    let prefix = if group_name == info.name {
        format!("wf {}", info.name)
    } else {
        format!("wf {} {}", group_name, info.name)
    };
    if message.is_empty() {
        prefix
    } else if message.starts_with(&prefix) {
        message.to_string()
    } else {
        format!("{prefix}: {message}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CommandGroup;
    use anyhow::Context;
    use std::path::PathBuf;

    #[test]
    fn json_response_prefixes_command_name() {
        let info = CommandInfo::new(CommandGroup::Focus, "focus");
        let outcome = ExecutionOutcome::success("focused on app", Value::Null);
        let response = to_json_response(info, &outcome, 0);
        assert_eq!(response["status"], "ok");
        assert_eq!(response["message"], "wf focus: focused on app");
        assert_eq!(response["details"], json!({}));
    }

    #[test]
    fn detects_missing_project_through_context() {
        let err = anyhow::Error::new(MissingProjectError {
            start: PathBuf::from("/tmp/nowhere"),
        })
        .context("loading project");
        assert!(is_missing_project_error(&err));
        assert!(!is_missing_project_error(&anyhow::anyhow!("other")));
    }

    #[test]
    fn parse_errors_name_the_broken_manifest() {
        let err = serde_json::from_str::<Value>("{ nope")
            .context("failed to parse /repo/packages/app/package.json")
            .unwrap_err();
        let outcome = manifest_error_outcome(&err).expect("manifest outcome");
        assert_eq!(outcome.status, CommandStatus::UserError);
        assert_eq!(
            outcome.message,
            "/repo/packages/app/package.json is not valid JSON"
        );
        assert_eq!(outcome.details["reason"], "invalid_manifest");
    }

    #[test]
    fn install_failures_keep_the_installer_message() {
        let err = FocusError::InstallFailure(anyhow::anyhow!("registry unreachable"));
        let outcome = focus_error_outcome(&err);
        assert_eq!(outcome.status, CommandStatus::Failure);
        assert_eq!(outcome.message, "registry unreachable");
    }
}
