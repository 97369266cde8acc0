//! Installer seam, the bundled workspace linker, and install-state storage.

use std::future::Future;

use anyhow::Result;
use serde_json::json;
use tracing::info;
use workfocus_domain::Project;

use crate::context::CommandContext;
use crate::core::focus::driver::run_install;
use crate::outcome::ExecutionOutcome;
use crate::project::load_project;
use crate::runtime::block_on;
use crate::store::CacheLocation;
use crate::tooling::report::Report;

pub mod linker;
pub mod state;

pub use linker::WorkspaceLinker;
pub use state::{
    install_state_path, FsInstallStateStore, InstallState, InstallStateStore, VirtualInstance,
    WorkspaceInstallRecord,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InstallOptions {
    /// Whether the installer may write workspace manifests back to disk.
    pub persist_project: bool,
}

/// Performs an install over whatever workspaces `project` currently holds.
///
/// Messages go to `report`; an `Err` means the install could not complete.
pub trait Installer: Send + Sync {
    fn install(
        &self,
        project: &Project,
        cache: &CacheLocation,
        report: &mut Report,
        options: InstallOptions,
    ) -> impl Future<Output = Result<InstallState>> + Send;
}

/// Installs every workspace of the project and keeps manifests on disk in sync.
pub fn project_install(ctx: &CommandContext) -> Result<ExecutionOutcome> {
    let project = load_project(ctx)?;
    let linker = WorkspaceLinker::new(ctx.config().install().link_concurrency);
    let store = FsInstallStateStore::new(ctx.fs());
    let mut report = Report::new();
    let options = InstallOptions {
        persist_project: true,
    };
    let summary = block_on(run_install(
        &project,
        ctx.cache(),
        &linker,
        &store,
        &mut report,
        options,
    ))??;
    info!(
        workspaces = project.len(),
        links = summary.state.link_count(),
        "install finished"
    );

    let details = json!({
        "project": project.root().display().to_string(),
        "workspaces": project.len(),
        "install": summary.details(project.root()),
        "report": &report,
        "exit_code": summary.exit_code,
    });
    if report.has_errors() {
        return Ok(ExecutionOutcome::failure("install finished with errors", details));
    }
    Ok(ExecutionOutcome::success(
        format!(
            "installed {} workspace(s), {} link(s)",
            project.len(),
            summary.state.link_count()
        ),
        details,
    ))
}
