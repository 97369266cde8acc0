use std::path::Path;

use workfocus_domain::{Ident, LocatorHash, Project};

use super::{FocusError, FocusRequest};

/// Picks the workspaces a focus starts from.
///
/// `--all` takes every workspace, explicit names are looked up by ident, and
/// otherwise the workspace owning `cwd` is used.
pub fn select_seed(
    project: &Project,
    request: &FocusRequest,
    cwd: &Path,
) -> Result<Vec<LocatorHash>, FocusError> {
    if request.all && !request.workspaces.is_empty() {
        return Err(FocusError::Configuration);
    }
    if request.all {
        return Ok(project.locators());
    }
    if !request.workspaces.is_empty() {
        return request
            .workspaces
            .iter()
            .map(|name| {
                Ident::parse(name)
                    .ok()
                    .and_then(|ident| project.workspace_by_ident(&ident))
                    .map(|workspace| workspace.locator_hash.clone())
                    .ok_or_else(|| FocusError::UnknownWorkspace { name: name.clone() })
            })
            .collect();
    }
    project
        .workspace_for_path(cwd)
        .map(|workspace| vec![workspace.locator_hash.clone()])
        .ok_or_else(|| FocusError::NoActiveWorkspace {
            cwd: cwd.to_path_buf(),
        })
}
