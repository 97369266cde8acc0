use anyhow::{Context, Result};
use serde_json::json;
use tracing::debug;
use workfocus_domain::{DependencyScope, Project};

use crate::context::CommandContext;
use crate::install::FsInstallStateStore;
use crate::install::InstallStateStore;
use crate::outcome::ExecutionOutcome;

/// Loads every workspace of the project enclosing the command's cwd.
pub(crate) fn load_project(ctx: &CommandContext) -> Result<Project> {
    let root = ctx.project_root()?;
    let project = Project::load(&root)
        .with_context(|| format!("failed to load project at {}", root.display()))?;
    debug!(root = %root.display(), workspaces = project.len(), "loaded project");
    Ok(project)
}

/// Lists the workspaces of the current project.
pub fn project_list(ctx: &CommandContext) -> Result<ExecutionOutcome> {
    let project = load_project(ctx)?;
    let install_state = FsInstallStateStore::new(ctx.fs()).load_install_state(project.root())?;
    let workspaces = project
        .workspaces()
        .map(|workspace| {
            let dependencies = DependencyScope::ALL
                .iter()
                .map(|scope| workspace.manifest.scope(*scope).len())
                .sum::<usize>();
            json!({
                "name": workspace.ident.to_string(),
                "path": workspace.relative_cwd,
                "locator_hash": workspace.locator_hash,
                "root": project.is_root(&workspace.locator_hash),
                "dependencies": dependencies,
            })
        })
        .collect::<Vec<_>>();
    Ok(ExecutionOutcome::success(
        format!("{} workspace(s)", project.len()),
        json!({
            "project": project.root().display().to_string(),
            "workspaces": workspaces,
            "installed_fingerprint": install_state.map(|state| state.fingerprint),
        }),
    ))
}
