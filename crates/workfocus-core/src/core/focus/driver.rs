use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tracing::{debug, warn};
use workfocus_domain::Project;

use super::FocusError;
use crate::install::{install_state_path, InstallOptions, InstallState, InstallStateStore, Installer};
use crate::store::CacheLocation;
use crate::tooling::report::Report;

/// What an install run left behind.
#[derive(Debug)]
pub struct InstallSummary {
    pub exit_code: i32,
    pub state: InstallState,
    pub state_persisted: bool,
}

impl InstallSummary {
    pub(crate) fn details(&self, root: &Path) -> Value {
        json!({
            "exit_code": self.exit_code,
            "state_persisted": self.state_persisted,
            "state_path": install_state_path(root).display().to_string(),
            "fingerprint": self.state.fingerprint,
            "links": self.state.link_count(),
            "external": self.state.external_count(),
            "virtuals": self.state.virtuals.len(),
        })
    }
}

/// Installs the pruned project without ever writing workspace manifests.
///
/// Install state is persisted once, and only when the installer succeeded
/// with a clean report.
pub async fn scoped_install<I, S>(
    project: &Project,
    cache: &CacheLocation,
    installer: &I,
    store: &S,
    report: &mut Report,
) -> Result<InstallSummary>
where
    I: Installer,
    S: InstallStateStore + ?Sized,
{
    let options = InstallOptions {
        persist_project: false,
    };
    run_install(project, cache, installer, store, report, options).await
}

pub(crate) async fn run_install<I, S>(
    project: &Project,
    cache: &CacheLocation,
    installer: &I,
    store: &S,
    report: &mut Report,
    options: InstallOptions,
) -> Result<InstallSummary>
where
    I: Installer,
    S: InstallStateStore + ?Sized,
{
    let state = match installer.install(project, cache, report, options).await {
        Ok(state) => state,
        Err(err) => {
            warn!(error = %err, "install failed");
            return Err(FocusError::InstallFailure(err).into());
        }
    };

    let exit_code = report.exit_code();
    if report.has_errors() {
        debug!(exit_code, "install reported errors; keeping previous install state");
        return Ok(InstallSummary {
            exit_code,
            state,
            state_persisted: false,
        });
    }

    store
        .persist_install_state(project.root(), &state)
        .context("failed to persist install state")?;
    Ok(InstallSummary {
        exit_code,
        state,
        state_persisted: true,
    })
}
