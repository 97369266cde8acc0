use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;

use crate::manifest::MANIFEST_FILE;

#[derive(thiserror::Error, Debug)]
#[error("No project found in {} or any parent directory", start.display())]
pub struct MissingProjectError {
    pub start: PathBuf,
}

/// Walks upward from `start` to find the project root.
///
/// The topmost directory whose manifest declares `workspaces` wins; otherwise
/// the nearest directory holding a manifest is a single-workspace project.
pub fn discover_project_root(start: &Path) -> Result<PathBuf> {
    let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
    let mut nearest = None;
    let mut topmost_with_workspaces = None;
    for dir in start.ancestors() {
        let manifest = dir.join(MANIFEST_FILE);
        if !manifest.is_file() {
            continue;
        }
        if nearest.is_none() {
            nearest = Some(dir.to_path_buf());
        }
        if manifest_declares_workspaces(&manifest)? {
            topmost_with_workspaces = Some(dir.to_path_buf());
        }
    }
    topmost_with_workspaces
        .or(nearest)
        .ok_or_else(|| MissingProjectError { start }.into())
}

fn manifest_declares_workspaces(path: &Path) -> Result<bool> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(value.get("workspaces").is_some_and(|v| !v.is_null()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn prefers_topmost_workspace_root() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        fs::write(
            root.join(MANIFEST_FILE),
            r#"{ "name": "repo", "workspaces": ["packages/*"] }"#,
        )
        .unwrap();
        let member = root.join("packages/app/src");
        fs::create_dir_all(&member).unwrap();
        fs::write(
            root.join("packages/app").join(MANIFEST_FILE),
            r#"{ "name": "app" }"#,
        )
        .unwrap();

        assert_eq!(discover_project_root(&member).unwrap(), root);
    }

    #[test]
    fn falls_back_to_nearest_manifest() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        let pkg = root.join("solo");
        fs::create_dir_all(pkg.join("lib")).unwrap();
        fs::write(pkg.join(MANIFEST_FILE), r#"{ "name": "solo" }"#).unwrap();

        assert_eq!(discover_project_root(&pkg.join("lib")).unwrap(), pkg);
    }

    #[test]
    fn reports_missing_project() {
        let tmp = tempdir().unwrap();
        let err = discover_project_root(tmp.path()).unwrap_err();
        assert!(err.downcast_ref::<MissingProjectError>().is_some());
    }
}
