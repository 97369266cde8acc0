use color_eyre::Result;
use serde_json::json;
use workfocus_core::{
    focus_error_outcome, is_missing_project_error, manifest_error_outcome,
    missing_project_outcome as core_missing_project_outcome, project_install, project_list,
    workspace_focus, CommandContext, CommandGroup, CommandInfo, ExecutionOutcome, FocusError,
    FocusRequest,
};

use crate::cli::{CommandGroupCli, FocusArgs};

pub fn command_info(group: &CommandGroupCli) -> CommandInfo {
    match group {
        CommandGroupCli::Focus(_) => CommandInfo::new(CommandGroup::Focus, "focus"),
        CommandGroupCli::Install => CommandInfo::new(CommandGroup::Install, "install"),
        CommandGroupCli::List => CommandInfo::new(CommandGroup::List, "list"),
    }
}

pub fn dispatch_command(ctx: &CommandContext, group: &CommandGroupCli) -> Result<ExecutionOutcome> {
    match group {
        CommandGroupCli::Focus(args) => {
            let request = focus_request_from_args(args);
            core_call(|| workspace_focus(ctx, &request))
        }
        CommandGroupCli::Install => core_call(|| project_install(ctx)),
        CommandGroupCli::List => core_call(|| project_list(ctx)),
    }
}

/// Outcome for a context that could not be assembled (bad `WF_*` settings).
pub fn config_error_outcome(err: &anyhow::Error) -> ExecutionOutcome {
    ExecutionOutcome::user_error(
        format!("{err:#}"),
        json!({
            "reason": "invalid_config",
            "hint": "Check the WF_* environment variables and rerun the command.",
        }),
    )
}

fn core_call<F>(action: F) -> Result<ExecutionOutcome>
where
    F: FnOnce() -> anyhow::Result<ExecutionOutcome>,
{
    match action() {
        Ok(result) => Ok(result),
        Err(err) => {
            if let Some(outcome) = missing_project_outcome(&err) {
                Ok(outcome)
            } else if let Some(focus) = err.downcast_ref::<FocusError>() {
                Ok(focus_error_outcome(focus))
            } else if let Some(outcome) = manifest_error_outcome(&err) {
                Ok(outcome)
            } else {
                let issues: Vec<String> = err.chain().map(ToString::to_string).collect();
                Ok(ExecutionOutcome::failure(
                    err.to_string(),
                    json!({
                        "reason": "internal_error",
                        "error": err.to_string(),
                        "issues": issues,
                        "hint": "Re-run with `-vv` for more detail.",
                    }),
                ))
            }
        }
    }
}

fn missing_project_outcome(err: &anyhow::Error) -> Option<ExecutionOutcome> {
    if is_missing_project_error(err) {
        Some(core_missing_project_outcome())
    } else {
        None
    }
}

fn focus_request_from_args(args: &FocusArgs) -> FocusRequest {
    FocusRequest {
        workspaces: args.workspaces.clone(),
        all: args.all,
        production: args.production,
    }
}
