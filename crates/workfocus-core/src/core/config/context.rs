use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use workfocus_domain::discover_project_root;

use crate::config::{Config, EnvSnapshot, GlobalOptions};
use crate::effects::{self, Effects, SharedEffects};
use crate::store::CacheLocation;
use crate::CommandGroup;

#[derive(Clone, Copy, Debug)]
pub struct CommandInfo {
    pub group: CommandGroup,
    pub name: &'static str,
}

impl CommandInfo {
    #[must_use]
    pub const fn new(group: CommandGroup, name: &'static str) -> Self {
        Self { group, name }
    }
}

pub struct CommandContext<'a> {
    pub global: &'a GlobalOptions,
    config: Config,
    cwd: PathBuf,
    project_root: OnceLock<PathBuf>,
    effects: SharedEffects,
}

impl<'a> CommandContext<'a> {
    /// Creates a new command context with the provided global options.
    ///
    /// # Errors
    /// Returns an error if the working directory or configuration cannot be prepared.
    pub fn new(global: &'a GlobalOptions, effects: SharedEffects) -> Result<Self> {
        let cwd = std::env::current_dir().context("unable to determine current directory")?;
        Self::with_cwd(global, effects, cwd)
    }

    /// Creates a context that resolves the project from `cwd` instead of the process directory.
    ///
    /// # Errors
    /// Returns an error if the configuration cannot be prepared.
    pub fn with_cwd(
        global: &'a GlobalOptions,
        effects: SharedEffects,
        cwd: impl Into<PathBuf>,
    ) -> Result<Self> {
        let env = EnvSnapshot::capture();
        let config = Config::from_snapshot(&env, effects.cache())?;
        Ok(Self {
            global,
            config,
            cwd: cwd.into(),
            project_root: OnceLock::new(),
            effects,
        })
    }

    pub fn effects(&self) -> &dyn Effects {
        self.effects.as_ref()
    }

    pub fn fs(&self) -> &dyn effects::FileSystem {
        self.effects.fs()
    }

    pub fn cache(&self) -> &CacheLocation {
        &self.config.cache().store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Resolves the current project's root directory.
    ///
    /// # Errors
    /// Returns an error if no project encloses the working directory.
    pub fn project_root(&self) -> Result<PathBuf> {
        if let Some(path) = self.project_root.get() {
            Ok(path.clone())
        } else {
            let path = discover_project_root(&self.cwd)?;
            let _ = self.project_root.set(path.clone());
            Ok(path)
        }
    }
}
