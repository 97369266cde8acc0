use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use workfocus_domain::LocatorHash;

use crate::effects::FileSystem;

pub(crate) const INSTALL_STATE_VERSION: u32 = 1;
const STATE_DIR: &str = ".wf";
const STATE_FILE: &str = "install-state.json";

/// Link and resolution bookkeeping left behind by the last successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallState {
    pub version: u32,
    pub fingerprint: String,
    pub installed_at: String,
    pub workspaces: BTreeMap<String, WorkspaceInstallRecord>,
    #[serde(default)]
    pub virtuals: BTreeMap<String, VirtualInstance>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceInstallRecord {
    pub locator_hash: Option<LocatorHash>,
    pub path: String,
    /// Dependency name → relative path of the linked workspace.
    #[serde(default)]
    pub links: BTreeMap<String, String>,
    /// Dependency name → declared range, for packages outside the project.
    #[serde(default)]
    pub external: BTreeMap<String, String>,
}

/// A peer-dependent workspace as seen from one dependent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualInstance {
    pub package: String,
    pub dependent: String,
    /// Peer name → range provided by the dependent, `None` when unmet.
    pub peers: BTreeMap<String, Option<String>>,
}

impl InstallState {
    pub fn new(
        workspaces: BTreeMap<String, WorkspaceInstallRecord>,
        virtuals: BTreeMap<String, VirtualInstance>,
    ) -> Result<Self> {
        let fingerprint = fingerprint(&workspaces, &virtuals)?;
        let installed_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .context("failed to format install timestamp")?;
        Ok(Self {
            version: INSTALL_STATE_VERSION,
            fingerprint,
            installed_at,
            workspaces,
            virtuals,
        })
    }

    pub fn link_count(&self) -> usize {
        self.workspaces.values().map(|record| record.links.len()).sum()
    }

    pub fn external_count(&self) -> usize {
        self.workspaces
            .values()
            .map(|record| record.external.len())
            .sum()
    }
}

fn fingerprint(
    workspaces: &BTreeMap<String, WorkspaceInstallRecord>,
    virtuals: &BTreeMap<String, VirtualInstance>,
) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(workspaces)?);
    hasher.update(b"\n");
    hasher.update(serde_json::to_vec(virtuals)?);
    Ok(hex::encode(hasher.finalize()))
}

pub fn install_state_path(root: &Path) -> PathBuf {
    root.join(STATE_DIR).join(STATE_FILE)
}

pub trait InstallStateStore: Send + Sync {
    fn persist_install_state(&self, root: &Path, state: &InstallState) -> Result<()>;
    fn load_install_state(&self, root: &Path) -> Result<Option<InstallState>>;
}

/// Keeps install state under `<root>/.wf/install-state.json`.
pub struct FsInstallStateStore<'a> {
    fs: &'a dyn FileSystem,
}

impl<'a> FsInstallStateStore<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self { fs }
    }
}

impl InstallStateStore for FsInstallStateStore<'_> {
    fn persist_install_state(&self, root: &Path, state: &InstallState) -> Result<()> {
        let path = install_state_path(root);
        let mut contents = serde_json::to_vec_pretty(state)?;
        contents.push(b'\n');
        if let Some(dir) = path.parent() {
            self.fs.create_dir_all(dir)?;
        }
        let tmp_path = path.with_extension("tmp");
        self.fs.write(&tmp_path, &contents)?;
        match self.fs.rename(&tmp_path, &path) {
            Ok(()) => Ok(()),
            Err(_err) if self.fs.exists(&path) => {
                self.fs.remove_file(&path)?;
                self.fs
                    .rename(&tmp_path, &path)
                    .with_context(|| format!("writing {}", path.display()))
            }
            Err(err) => Err(err).with_context(|| format!("writing {}", path.display())),
        }
    }

    fn load_install_state(&self, root: &Path) -> Result<Option<InstallState>> {
        let path = install_state_path(root);
        if !self.fs.exists(&path) {
            return Ok(None);
        }
        let contents = self.fs.read_to_string(&path)?;
        let state: InstallState = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        if state.version != INSTALL_STATE_VERSION {
            bail!(
                "unsupported install state version {} in {}",
                state.version,
                path.display()
            );
        }
        Ok(Some(state))
    }
}
