use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;
use workfocus_domain::{DependencyScope, Project, Workspace};

use super::state::{InstallState, VirtualInstance, WorkspaceInstallRecord};
use super::{InstallOptions, Installer};
use crate::config::DEFAULT_LINK_CONCURRENCY;
use crate::fs::replace_dir_link;
use crate::store::CacheLocation;
use crate::tooling::report::Report;

const NODE_MODULES: &str = "node_modules";

/// Links workspaces into each other's `node_modules` and records everything else.
///
/// External packages are noted in the install state but never fetched.
#[derive(Clone, Debug)]
pub struct WorkspaceLinker {
    concurrency: usize,
}

impl Default for WorkspaceLinker {
    fn default() -> Self {
        Self::new(DEFAULT_LINK_CONCURRENCY)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct LinkOperation {
    pub(crate) target: PathBuf,
    pub(crate) link: PathBuf,
}

#[derive(Debug, Default)]
pub(crate) struct LinkPlan {
    pub(crate) links: Vec<LinkOperation>,
    pub(crate) records: BTreeMap<String, WorkspaceInstallRecord>,
    pub(crate) virtuals: BTreeMap<String, VirtualInstance>,
}

impl WorkspaceLinker {
    #[must_use]
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    pub(crate) fn plan(&self, project: &Project, report: &mut Report) -> LinkPlan {
        let mut plan = LinkPlan::default();
        for workspace in project.workspaces() {
            let mut record = WorkspaceInstallRecord {
                locator_hash: Some(workspace.locator_hash.clone()),
                path: workspace.relative_cwd.clone(),
                ..WorkspaceInstallRecord::default()
            };
            for scope in DependencyScope::HARD {
                for descriptor in workspace.manifest.scope(scope).values() {
                    let name = descriptor.ident.to_string();
                    let Some(target) = project.try_workspace_by_descriptor(descriptor) else {
                        record
                            .external
                            .entry(name)
                            .or_insert_with(|| descriptor.range.clone());
                        continue;
                    };
                    if target.locator_hash == workspace.locator_hash
                        || record.links.contains_key(&name)
                    {
                        continue;
                    }
                    record.links.insert(name, target.relative_cwd.clone());
                    plan.links.push(LinkOperation {
                        target: target.cwd.clone(),
                        link: link_path(workspace, target),
                    });
                    if let Some((id, instance)) = virtual_instance(workspace, target, report) {
                        plan.virtuals.insert(id, instance);
                    }
                }
            }
            plan.records.insert(workspace.locator(), record);
        }
        plan
    }

    /// Runs every link on the blocking pool, at most `concurrency` at a time.
    ///
    /// Failures are returned sorted by link path; only a lost task is an `Err`.
    async fn link_all(&self, links: Vec<LinkOperation>) -> Result<Vec<(LinkOperation, String)>> {
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        for operation in links {
            let permit = Arc::clone(&permits)
                .acquire_owned()
                .await
                .context("link semaphore closed")?;
            tasks.spawn_blocking(move || {
                let _permit = permit;
                let result = replace_dir_link(&operation.target, &operation.link);
                (operation, result)
            });
        }

        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (operation, result) = joined.context("link task did not complete")?;
            match result {
                Ok(()) => debug!(link = %operation.link.display(), "linked workspace"),
                Err(err) => failures.push((operation, format!("{err:#}"))),
            }
        }
        failures.sort_by(|a, b| a.0.link.cmp(&b.0.link));
        Ok(failures)
    }
}

impl Installer for WorkspaceLinker {
    async fn install(
        &self,
        project: &Project,
        cache: &CacheLocation,
        report: &mut Report,
        options: InstallOptions,
    ) -> Result<InstallState> {
        let plan = self.plan(project, report);
        debug!(
            cache = %cache.path.display(),
            links = plan.links.len(),
            concurrency = self.concurrency,
            "linking workspaces"
        );
        let link_count = plan.links.len();
        for (operation, error) in self.link_all(plan.links).await? {
            report.error(format!(
                "failed to link {}: {error}",
                operation.link.display()
            ));
        }
        if options.persist_project {
            project.persist()?;
        }
        report.info(format!(
            "linked {link_count} workspace dependenc{} across {} workspace(s)",
            if link_count == 1 { "y" } else { "ies" },
            project.len()
        ));
        InstallState::new(plan.records, plan.virtuals)
    }
}

fn link_path(dependent: &Workspace, target: &Workspace) -> PathBuf {
    let mut path = dependent.cwd.join(NODE_MODULES);
    if let Some(scope) = target.ident.scope() {
        path.push(format!("@{scope}"));
    }
    path.push(target.ident.name());
    path
}

/// Peer resolutions of `target` as provided by `dependent`, keyed by virtual id.
///
/// Peers the dependent does not declare are reported as warnings.
fn virtual_instance(
    dependent: &Workspace,
    target: &Workspace,
    report: &mut Report,
) -> Option<(String, VirtualInstance)> {
    let requested = target.manifest.scope(DependencyScope::PeerDependencies);
    if requested.is_empty() {
        return None;
    }
    let mut peers = BTreeMap::new();
    for peer in requested.keys() {
        let provided = dependent
            .manifest
            .find_descriptor(peer)
            .map(|descriptor| descriptor.range.clone());
        if provided.is_none() {
            report.warning(format!(
                "{} doesn't provide {peer}, requested by {}",
                dependent.ident, target.ident
            ));
        }
        peers.insert(peer.to_string(), provided);
    }

    let mut hasher = Sha256::new();
    hasher.update(dependent.locator().as_bytes());
    hasher.update(b"\n");
    hasher.update(target.locator().as_bytes());
    for (name, range) in &peers {
        hasher.update(b"\n");
        hasher.update(name.as_bytes());
        hasher.update(b"@");
        hasher.update(range.as_deref().unwrap_or("<missing>").as_bytes());
    }
    let id = hex::encode(hasher.finalize());
    Some((
        id,
        VirtualInstance {
            package: target.locator(),
            dependent: dependent.locator(),
            peers,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CacheLocation;
    use crate::tooling::report::ReportLevel;
    use serde_json::json;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn write_json(path: &Path, value: &serde_json::Value) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    }

    fn sample(root: &Path) -> Project {
        write_json(
            &root.join("package.json"),
            &json!({ "name": "repo", "private": true, "workspaces": ["packages/*"] }),
        );
        write_json(
            &root.join("packages/app/package.json"),
            &json!({
                "name": "app",
                "dependencies": { "@acme/ui": "workspace:^", "left-pad": "^1.3.0" },
                "devDependencies": { "react": "^18.0.0" }
            }),
        );
        write_json(
            &root.join("packages/ui/package.json"),
            &json!({
                "name": "@acme/ui",
                "peerDependencies": { "react": "*", "react-dom": "*" }
            }),
        );
        Project::load(root).unwrap()
    }

    fn cache() -> CacheLocation {
        CacheLocation {
            path: PathBuf::from("/tmp/wf-cache"),
            source: "test",
        }
    }

    #[test]
    fn plan_separates_links_from_external_packages() {
        let tmp = tempdir().unwrap();
        let project = sample(tmp.path());
        let mut report = Report::new();
        let plan = WorkspaceLinker::default().plan(&project, &mut report);

        assert_eq!(plan.links.len(), 1);
        assert!(plan.links[0]
            .link
            .ends_with(Path::new("packages/app/node_modules/@acme/ui")));
        let app = &plan.records["app@workspace:packages/app"];
        assert_eq!(app.links["@acme/ui"], "packages/ui");
        assert_eq!(app.external["left-pad"], "^1.3.0");
        assert_eq!(app.external["react"], "^18.0.0");
        assert!(plan.records.contains_key("repo@workspace:."));
    }

    #[test]
    fn missing_peers_are_warnings() {
        let tmp = tempdir().unwrap();
        let project = sample(tmp.path());
        let mut report = Report::new();
        let plan = WorkspaceLinker::default().plan(&project, &mut report);

        assert_eq!(plan.virtuals.len(), 1);
        let instance = plan.virtuals.values().next().unwrap();
        assert_eq!(instance.peers["react"].as_deref(), Some("^18.0.0"));
        assert_eq!(instance.peers["react-dom"], None);
        assert_eq!(report.warning_count(), 1);
        assert!(!report.has_errors());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn install_creates_links_and_leaves_manifests_alone() {
        let tmp = tempdir().unwrap();
        let project = sample(tmp.path());
        let manifest = tmp.path().join("packages/app/package.json");
        let before = fs::read_to_string(&manifest).unwrap();
        let mut report = Report::new();

        let state = WorkspaceLinker::new(2)
            .install(&project, &cache(), &mut report, InstallOptions::default())
            .await
            .unwrap();

        let link = tmp.path().join("packages/app/node_modules/@acme/ui");
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(state.link_count(), 1);
        assert_eq!(fs::read_to_string(&manifest).unwrap(), before);
        assert!(report
            .entries()
            .iter()
            .any(|entry| entry.level == ReportLevel::Info));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn broken_links_land_in_the_report() {
        let tmp = tempdir().unwrap();
        let project = sample(tmp.path());
        fs::remove_dir_all(tmp.path().join("packages/ui")).unwrap();
        let mut report = Report::new();

        let state = WorkspaceLinker::default()
            .install(&project, &cache(), &mut report, InstallOptions::default())
            .await
            .unwrap();

        assert!(report.has_errors());
        assert_eq!(report.exit_code(), 1);
        assert_eq!(state.link_count(), 1);
    }
}
