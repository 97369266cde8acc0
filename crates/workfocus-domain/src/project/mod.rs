use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use indexmap::IndexMap;
use tracing::debug;

use crate::ident::{Descriptor, Ident};
use crate::manifest::MANIFEST_FILE;
use crate::workspace::{expand_workspace_patterns, LocatorHash, Workspace};

mod discovery;

pub use discovery::{discover_project_root, MissingProjectError};

/// All workspaces of a project.
///
/// `workspaces` owns the records in discovery order; `by_cwd` and `by_ident`
/// only hold locator hashes into it. The root workspace is always present.
#[derive(Clone, Debug)]
pub struct Project {
    root: PathBuf,
    root_locator: LocatorHash,
    workspaces: IndexMap<LocatorHash, Workspace>,
    by_cwd: HashMap<PathBuf, LocatorHash>,
    by_ident: HashMap<Ident, LocatorHash>,
}

impl Project {
    pub fn new(root: Workspace) -> Self {
        let mut project = Self {
            root: root.cwd.clone(),
            root_locator: root.locator_hash.clone(),
            workspaces: IndexMap::new(),
            by_cwd: HashMap::new(),
            by_ident: HashMap::new(),
        };
        project.index(root);
        project
    }

    /// Loads the root manifest at `root` and every workspace reachable through
    /// `workspaces` patterns, nested declarations included.
    pub fn load(root: &Path) -> Result<Self> {
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        if !root.join(MANIFEST_FILE).is_file() {
            bail!("{MANIFEST_FILE} not found in project root {}", root.display());
        }
        let root_workspace = Workspace::read_from(&root, &root)?;
        let mut pending = VecDeque::from([(
            root.clone(),
            root_workspace.manifest.workspace_patterns.clone(),
        )]);
        let mut project = Self::new(root_workspace);

        while let Some((cwd, patterns)) = pending.pop_front() {
            for member in expand_workspace_patterns(&cwd, &patterns)? {
                if project.by_cwd.contains_key(&member) {
                    continue;
                }
                let workspace = Workspace::read_from(&root, &member)?;
                debug!(
                    workspace = %workspace.ident,
                    cwd = %workspace.relative_cwd,
                    "discovered workspace"
                );
                pending.push_back((member, workspace.manifest.workspace_patterns.clone()));
                project.add_workspace(workspace)?;
            }
        }
        Ok(project)
    }

    pub fn add_workspace(&mut self, workspace: Workspace) -> Result<()> {
        if let Some(existing) = self.by_ident.get(&workspace.ident) {
            let other = &self.workspaces[existing];
            return Err(anyhow!(
                "duplicate workspace name `{}` ({} and {})",
                workspace.ident,
                other.relative_cwd,
                workspace.relative_cwd
            ));
        }
        if self.by_cwd.contains_key(&workspace.cwd) {
            bail!("workspace {} registered twice", workspace.cwd.display());
        }
        self.index(workspace);
        Ok(())
    }

    fn index(&mut self, workspace: Workspace) {
        let locator = workspace.locator_hash.clone();
        self.by_cwd.insert(workspace.cwd.clone(), locator.clone());
        self.by_ident.insert(workspace.ident.clone(), locator.clone());
        self.workspaces.insert(locator, workspace);
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn root_locator(&self) -> &LocatorHash {
        &self.root_locator
    }

    pub fn root_workspace(&self) -> &Workspace {
        &self.workspaces[&self.root_locator]
    }

    pub fn is_root(&self, locator: &LocatorHash) -> bool {
        *locator == self.root_locator
    }

    pub fn workspaces(&self) -> impl Iterator<Item = &Workspace> {
        self.workspaces.values()
    }

    pub fn locators(&self) -> Vec<LocatorHash> {
        self.workspaces.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.workspaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty()
    }

    pub fn workspace(&self, locator: &LocatorHash) -> Option<&Workspace> {
        self.workspaces.get(locator)
    }

    pub fn workspace_mut(&mut self, locator: &LocatorHash) -> Option<&mut Workspace> {
        self.workspaces.get_mut(locator)
    }

    pub fn workspace_by_ident(&self, ident: &Ident) -> Option<&Workspace> {
        self.by_ident
            .get(ident)
            .and_then(|locator| self.workspaces.get(locator))
    }

    pub fn workspace_by_cwd(&self, cwd: &Path) -> Option<&Workspace> {
        self.by_cwd
            .get(cwd)
            .and_then(|locator| self.workspaces.get(locator))
    }

    /// The workspace owning `path`: the nearest ancestor holding a manifest
    /// must itself be a workspace.
    pub fn workspace_for_path(&self, path: &Path) -> Option<&Workspace> {
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        for dir in path.ancestors() {
            if let Some(workspace) = self.workspace_by_cwd(dir) {
                return Some(workspace);
            }
            if dir.join(MANIFEST_FILE).is_file() {
                return None;
            }
        }
        None
    }

    /// The in-project workspace satisfying `descriptor`, or `None` for external packages.
    pub fn try_workspace_by_descriptor(&self, descriptor: &Descriptor) -> Option<&Workspace> {
        if !descriptor.may_bind_workspace() {
            return None;
        }
        self.workspace_by_ident(&descriptor.ident)
    }

    /// Drops `locators` from the ordered collection and both indexes at once.
    ///
    /// The root cannot be removed; asking for it is an error and leaves the
    /// project untouched.
    pub fn remove_workspaces(&mut self, locators: &[LocatorHash]) -> Result<Vec<Workspace>> {
        if locators.iter().any(|locator| self.is_root(locator)) {
            bail!("the root workspace cannot be removed from the project");
        }
        let mut removed = Vec::with_capacity(locators.len());
        for locator in locators {
            let Some(workspace) = self.workspaces.shift_remove(locator) else {
                continue;
            };
            self.by_cwd.remove(&workspace.cwd);
            self.by_ident.remove(&workspace.ident);
            removed.push(workspace);
        }
        debug_assert!(self.indexes_consistent());
        Ok(removed)
    }

    /// Every index entry points at a live workspace and vice versa.
    pub fn indexes_consistent(&self) -> bool {
        let sizes_match =
            self.by_cwd.len() == self.workspaces.len() && self.by_ident.len() == self.workspaces.len();
        sizes_match
            && self.workspaces.contains_key(&self.root_locator)
            && self.workspaces.iter().all(|(locator, workspace)| {
                self.by_cwd.get(&workspace.cwd) == Some(locator)
                    && self.by_ident.get(&workspace.ident) == Some(locator)
            })
    }

    /// Writes every workspace manifest back to disk.
    pub fn persist(&self) -> Result<()> {
        for workspace in self.workspaces.values() {
            let path = workspace.manifest_path();
            workspace
                .manifest
                .write_to(&path)
                .with_context(|| format!("failed to persist workspace {}", workspace.ident))?;
        }
        Ok(())
    }
}
