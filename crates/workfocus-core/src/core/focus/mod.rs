//! `wf focus`: prune a project to a few workspaces and install only those.

use std::path::PathBuf;

use anyhow::Result;
use serde_json::json;
use tracing::info;

use crate::context::CommandContext;
use crate::install::{FsInstallStateStore, WorkspaceLinker};
use crate::outcome::ExecutionOutcome;
use crate::project::load_project;
use crate::runtime::block_on;
use crate::tooling::report::Report;

pub mod closure;
pub(crate) mod driver;
pub mod evict;
pub mod seed;


pub use closure::{required_workspaces, RequiredSet};
pub use driver::{scoped_install, InstallSummary};
pub use evict::{evict_workspaces, EvictionSummary};
pub use seed::select_seed;

#[derive(Clone, Debug, Default)]
pub struct FocusRequest {
    /// Workspace names to focus on; empty means the workspace owning the cwd.
    pub workspaces: Vec<String>,
    pub all: bool,
    pub production: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum FocusError {
    #[error("workspace names cannot be combined with --all")]
    Configuration,
    #[error("workspace `{name}` is not part of this project")]
    UnknownWorkspace { name: String },
    #[error("{} is not inside a workspace", cwd.display())]
    NoActiveWorkspace { cwd: PathBuf },
    #[error(transparent)]
    InstallFailure(anyhow::Error),
}

/// Focuses the project on the requested workspaces and runs a scoped install.
///
/// Workspace manifests on disk are left as they were; only install state is
/// written.
pub fn workspace_focus(ctx: &CommandContext, request: &FocusRequest) -> Result<ExecutionOutcome> {
    let mut project = load_project(ctx)?;
    let seed = select_seed(&project, request, ctx.cwd())?;
    let required = required_workspaces(&project, &seed);
    let required_names = required
        .iter()
        .filter_map(|locator| project.workspace(locator))
        .map(|workspace| workspace.ident.to_string())
        .collect::<Vec<_>>();
    let total = project.len();
    info!(
        seed = seed.len(),
        required = required.len(),
        total,
        "computed focus closure"
    );

    let eviction = evict_workspaces(&mut project, &required, request.production)?;
    let linker = WorkspaceLinker::new(ctx.config().install().link_concurrency);
    let store = FsInstallStateStore::new(ctx.fs());
    let mut report = Report::new();
    let summary = block_on(scoped_install(
        &project,
        ctx.cache(),
        &linker,
        &store,
        &mut report,
    ))??;

    let details = json!({
        "project": project.root().display().to_string(),
        "required": required_names,
        "evicted": eviction.removed,
        "cleared": eviction.cleared,
        "dev_pruned": eviction.dev_pruned,
        "production": request.production,
        "install": summary.details(project.root()),
        "report": &report,
        "exit_code": summary.exit_code,
    });
    if report.has_errors() {
        return Ok(ExecutionOutcome::failure(
            "focused install finished with errors",
            details,
        ));
    }
    Ok(ExecutionOutcome::success(
        format!(
            "focused on {} of {total} workspace(s)",
            required_names.len()
        ),
        details,
    ))
}
