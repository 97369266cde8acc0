use std::fmt;
use std::path::{Component, Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ident::Ident;
use crate::manifest::{Manifest, MANIFEST_FILE};

const ROOT_WORKSPACE_NAME: &str = "root-workspace";
const LOCATOR_HASH_LEN: usize = 16;

/// Stable identity of a workspace inside one project.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocatorHash(String);

impl LocatorHash {
    pub fn for_workspace(ident: &Ident, relative_cwd: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(ident.to_string().as_bytes());
        hasher.update(b"@workspace:");
        hasher.update(relative_cwd.as_bytes());
        let digest = hex::encode(hasher.finalize());
        Self(digest[..LOCATOR_HASH_LEN].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocatorHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug)]
pub struct Workspace {
    pub ident: Ident,
    pub locator_hash: LocatorHash,
    pub cwd: PathBuf,
    pub relative_cwd: String,
    pub manifest: Manifest,
}

impl Workspace {
    /// Builds a workspace rooted at `cwd`, identified relative to `project_root`.
    pub fn new(project_root: &Path, cwd: &Path, manifest: Manifest) -> Result<Self> {
        let relative_cwd = relative_cwd(project_root, cwd)?;
        let ident = match &manifest.name {
            Some(name) => name.clone(),
            None => anonymous_ident(cwd, &relative_cwd)?,
        };
        let locator_hash = LocatorHash::for_workspace(&ident, &relative_cwd);
        Ok(Self {
            ident,
            locator_hash,
            cwd: cwd.to_path_buf(),
            relative_cwd,
            manifest,
        })
    }

    pub fn read_from(project_root: &Path, cwd: &Path) -> Result<Self> {
        let manifest = Manifest::read_from(&cwd.join(MANIFEST_FILE))?;
        Self::new(project_root, cwd, manifest)
    }

    pub fn locator(&self) -> String {
        format!("{}@workspace:{}", self.ident, self.relative_cwd)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.cwd.join(MANIFEST_FILE)
    }
}

fn anonymous_ident(cwd: &Path, relative_cwd: &str) -> Result<Ident> {
    if relative_cwd == "." {
        return Ident::parse(ROOT_WORKSPACE_NAME);
    }
    let dir_name = cwd
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("cannot derive a name for workspace {}", cwd.display()))?;
    Ident::parse(dir_name)
        .with_context(|| format!("workspace {} has no usable name", cwd.display()))
}

/// Portable `/`-separated path of `cwd` relative to the project root (`.` for the root).
pub fn relative_cwd(project_root: &Path, cwd: &Path) -> Result<String> {
    let rel = cwd.strip_prefix(project_root).map_err(|_| {
        anyhow!(
            "workspace {} is outside the project root {}",
            cwd.display(),
            project_root.display()
        )
    })?;
    let parts = rel
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().to_string()),
            _ => None,
        })
        .collect::<Vec<_>>();
    if parts.is_empty() {
        Ok(".".to_string())
    } else {
        Ok(parts.join("/"))
    }
}

/// Expands `workspaces` patterns declared by the workspace at `cwd`.
///
/// Matches must be directories holding a manifest. `!`-prefixed patterns
/// remove matches. Each pattern's matches are sorted.
pub fn expand_workspace_patterns(cwd: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut included = Vec::new();
    let mut excluded = Vec::new();
    for pattern in patterns {
        let (negated, pattern) = match pattern.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, pattern.as_str()),
        };
        let pattern = pattern.trim_end_matches('/');
        if pattern.is_empty() {
            continue;
        }
        let full = cwd.join(pattern);
        let full = full.to_string_lossy();
        let mut matches = Vec::new();
        let entries = glob::glob(&full)
            .with_context(|| format!("invalid workspace pattern `{pattern}`"))?;
        for entry in entries {
            let path = entry.with_context(|| format!("failed to expand `{pattern}`"))?;
            if path.is_dir() && path.join(MANIFEST_FILE).is_file() {
                let path = path.canonicalize().unwrap_or(path);
                matches.push(path);
            }
        }
        matches.sort();
        if negated {
            excluded.extend(matches);
        } else {
            included.extend(matches);
        }
    }
    let mut members = Vec::with_capacity(included.len());
    for path in included {
        if excluded.contains(&path) || members.contains(&path) {
            continue;
        }
        members.push(path);
    }
    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_package(dir: &Path, name: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(
            dir.join(MANIFEST_FILE),
            format!("{{ \"name\": \"{name}\", \"version\": \"0.0.0\" }}\n"),
        )
        .unwrap();
    }

    #[test]
    fn locator_hash_depends_on_name_and_location() {
        let a = Ident::parse("a").unwrap();
        let first = LocatorHash::for_workspace(&a, "packages/a");
        assert_eq!(first, LocatorHash::for_workspace(&a, "packages/a"));
        assert_ne!(first, LocatorHash::for_workspace(&a, "packages/b"));
        assert_eq!(first.as_str().len(), LOCATOR_HASH_LEN);
    }

    #[test]
    fn anonymous_workspaces_get_derived_names() {
        let root = Path::new("/repo");
        let ws = Workspace::new(root, root, Manifest::default()).unwrap();
        assert_eq!(ws.ident.to_string(), "root-workspace");
        assert_eq!(ws.relative_cwd, ".");

        let member = Workspace::new(root, &root.join("tools/gen"), Manifest::default()).unwrap();
        assert_eq!(member.ident.to_string(), "gen");
        assert_eq!(member.locator(), "gen@workspace:tools/gen");
    }

    #[test]
    fn expands_globs_and_honours_exclusions() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        write_package(&root.join("packages/b"), "b");
        write_package(&root.join("packages/a"), "a");
        write_package(&root.join("packages/legacy"), "legacy");
        fs::create_dir_all(root.join("packages/no-manifest")).unwrap();

        let members = expand_workspace_patterns(
            &root,
            &["packages/*".to_string(), "!packages/legacy".to_string()],
        )
        .unwrap();
        let names: Vec<_> = members
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
