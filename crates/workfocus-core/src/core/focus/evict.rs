use anyhow::Result;
use serde::Serialize;
use tracing::debug;
use workfocus_domain::{DependencyScope, Project};

use super::closure::RequiredSet;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EvictionSummary {
    /// Required workspaces whose `devDependencies` were dropped (production mode).
    pub dev_pruned: Vec<String>,
    /// Workspaces stripped of every dependency scope.
    pub cleared: Vec<String>,
    /// Workspaces taken out of the project entirely.
    pub removed: Vec<String>,
}

/// Prunes `project` down to the `required` workspaces.
///
/// Manifests are mutated first; structural removal happens in a second pass
/// once every manifest has been handled. The root is cleared when it is not
/// required but always stays in the project. Nothing is written to disk.
pub fn evict_workspaces(
    project: &mut Project,
    required: &RequiredSet,
    production: bool,
) -> Result<EvictionSummary> {
    let mut summary = EvictionSummary::default();
    let mut evicted = Vec::new();

    for locator in project.locators() {
        let is_root = project.is_root(&locator);
        let Some(workspace) = project.workspace_mut(&locator) else {
            continue;
        };
        let name = workspace.ident.to_string();
        if required.contains(&locator) {
            if production {
                workspace
                    .manifest
                    .clear_scope(DependencyScope::DevDependencies);
                debug!(workspace = %name, "dropped devDependencies");
                summary.dev_pruned.push(name);
            }
            continue;
        }

        for scope in DependencyScope::ALL {
            workspace.manifest.clear_scope(scope);
        }
        debug!(workspace = %name, root = is_root, "cleared dependency scopes");
        summary.cleared.push(name.clone());
        if !is_root {
            evicted.push(locator);
            summary.removed.push(name);
        }
    }

    project.remove_workspaces(&evicted)?;
    Ok(summary)
}
