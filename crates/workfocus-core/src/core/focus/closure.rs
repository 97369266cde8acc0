use std::collections::VecDeque;

use indexmap::IndexSet;
use tracing::trace;
use workfocus_domain::{DependencyScope, LocatorHash, Project};

/// Workspaces that must stay installable, in discovery order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequiredSet {
    members: IndexSet<LocatorHash>,
}

impl RequiredSet {
    pub fn contains(&self, locator: &LocatorHash) -> bool {
        self.members.contains(locator)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LocatorHash> {
        self.members.iter()
    }
}

/// Expands `seed` to every workspace reachable through hard dependency edges.
///
/// Peer dependencies never pull a workspace in. Descriptors that do not
/// resolve to a workspace of `project` are ignored, as are seed entries the
/// project does not know.
pub fn required_workspaces(project: &Project, seed: &[LocatorHash]) -> RequiredSet {
    let mut required = RequiredSet::default();
    let mut queue = VecDeque::new();
    for locator in seed {
        if project.workspace(locator).is_some() && required.members.insert(locator.clone()) {
            queue.push_back(locator.clone());
        }
    }

    while let Some(locator) = queue.pop_front() {
        let Some(workspace) = project.workspace(&locator) else {
            continue;
        };
        for scope in DependencyScope::HARD {
            for descriptor in workspace.manifest.scope(scope).values() {
                let Some(dependency) = project.try_workspace_by_descriptor(descriptor) else {
                    continue;
                };
                if required.members.insert(dependency.locator_hash.clone()) {
                    trace!(
                        from = %workspace.ident,
                        to = %dependency.ident,
                        %scope,
                        "workspace pulled into focus"
                    );
                    queue.push_back(dependency.locator_hash.clone());
                }
            }
        }
    }
    required
}
