use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ident::{Descriptor, Ident};

pub const MANIFEST_FILE: &str = "package.json";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DependencyScope {
    Dependencies,
    DevDependencies,
    PeerDependencies,
}

impl DependencyScope {
    /// Scopes whose edges pull other workspaces into a focused install.
    pub const HARD: [DependencyScope; 2] = [
        DependencyScope::Dependencies,
        DependencyScope::DevDependencies,
    ];

    pub const ALL: [DependencyScope; 3] = [
        DependencyScope::Dependencies,
        DependencyScope::DevDependencies,
        DependencyScope::PeerDependencies,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DependencyScope::Dependencies => "dependencies",
            DependencyScope::DevDependencies => "devDependencies",
            DependencyScope::PeerDependencies => "peerDependencies",
        }
    }
}

impl fmt::Display for DependencyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type DependencyMap = IndexMap<Ident, Descriptor>;

/// In-memory view of a workspace `package.json`.
///
/// Dependency scopes are parsed into their own maps; every other field stays
/// in `raw` so the manifest can be written back without losing data.
#[derive(Clone, Debug, Default)]
pub struct Manifest {
    pub name: Option<Ident>,
    pub version: Option<String>,
    pub workspace_patterns: Vec<String>,
    dependencies: DependencyMap,
    dev_dependencies: DependencyMap,
    peer_dependencies: DependencyMap,
    raw: Map<String, Value>,
}

impl Manifest {
    pub fn read_from(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        let value: Value = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Self::from_value(value).with_context(|| format!("invalid manifest {}", path.display()))
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(raw) = value else {
            return Err(anyhow!("manifest must be a JSON object"));
        };
        let name = match raw.get("name") {
            Some(Value::String(name)) => Some(Ident::parse(name)?),
            Some(Value::Null) | None => None,
            Some(_) => return Err(anyhow!("`name` must be a string")),
        };
        let version = raw
            .get("version")
            .and_then(Value::as_str)
            .map(ToString::to_string);
        let workspace_patterns = read_workspace_patterns(raw.get("workspaces"))?;
        let mut manifest = Self {
            name,
            version,
            workspace_patterns,
            raw,
            ..Self::default()
        };
        for scope in DependencyScope::ALL {
            let parsed = read_scope(manifest.raw.get(scope.as_str()), scope)?;
            *manifest.scope_mut(scope) = parsed;
        }
        Ok(manifest)
    }

    pub fn scope(&self, scope: DependencyScope) -> &DependencyMap {
        match scope {
            DependencyScope::Dependencies => &self.dependencies,
            DependencyScope::DevDependencies => &self.dev_dependencies,
            DependencyScope::PeerDependencies => &self.peer_dependencies,
        }
    }

    pub fn scope_mut(&mut self, scope: DependencyScope) -> &mut DependencyMap {
        match scope {
            DependencyScope::Dependencies => &mut self.dependencies,
            DependencyScope::DevDependencies => &mut self.dev_dependencies,
            DependencyScope::PeerDependencies => &mut self.peer_dependencies,
        }
    }

    pub fn clear_scope(&mut self, scope: DependencyScope) {
        self.scope_mut(scope).clear();
    }

    /// Descriptor for `ident` in the first scope that declares it.
    pub fn find_descriptor(&self, ident: &Ident) -> Option<&Descriptor> {
        DependencyScope::ALL
            .iter()
            .find_map(|scope| self.scope(*scope).get(ident))
    }

    pub fn has_dependencies(&self) -> bool {
        DependencyScope::ALL
            .iter()
            .any(|scope| !self.scope(*scope).is_empty())
    }

    /// Serialises the manifest, keeping unknown fields in their original order.
    ///
    /// A scope that was present on disk is always written back, even when it
    /// has been emptied; an absent scope is only added when it gained entries.
    pub fn to_value(&self) -> Value {
        let mut raw = self.raw.clone();
        for scope in DependencyScope::ALL {
            let entries = self.scope(scope);
            if entries.is_empty() && !raw.contains_key(scope.as_str()) {
                continue;
            }
            let table = entries
                .values()
                .map(|descriptor| {
                    (
                        descriptor.ident.to_string(),
                        Value::String(descriptor.range.clone()),
                    )
                })
                .collect::<Map<_, _>>();
            raw.insert(scope.as_str().to_string(), Value::Object(table));
        }
        Value::Object(raw)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let mut contents = serde_json::to_string_pretty(&self.to_value())?;
        contents.push('\n');
        fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
    }
}

fn read_scope(value: Option<&Value>, scope: DependencyScope) -> Result<DependencyMap> {
    let Some(value) = value else {
        return Ok(DependencyMap::new());
    };
    let table = value
        .as_object()
        .ok_or_else(|| anyhow!("`{scope}` must be an object"))?;
    let mut entries = DependencyMap::with_capacity(table.len());
    for (name, range) in table {
        let ident = Ident::parse(name).with_context(|| format!("in `{scope}`"))?;
        let range = range
            .as_str()
            .ok_or_else(|| anyhow!("`{scope}.{name}` must be a string range"))?;
        entries.insert(ident.clone(), Descriptor::new(ident, range));
    }
    Ok(entries)
}

fn read_workspace_patterns(value: Option<&Value>) -> Result<Vec<String>> {
    let array = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(Value::Object(table)) => match table.get("packages") {
            Some(Value::Array(items)) => items,
            None => return Ok(Vec::new()),
            Some(_) => return Err(anyhow!("`workspaces.packages` must be an array of strings")),
        },
        Some(_) => return Err(anyhow!("`workspaces` must be an array of strings")),
    };
    array
        .iter()
        .map(|item| {
            item.as_str()
                .map(ToString::to_string)
                .ok_or_else(|| anyhow!("`workspaces` must be an array of strings"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ident(raw: &str) -> Ident {
        Ident::parse(raw).unwrap()
    }

    #[test]
    fn reads_scopes_and_workspace_patterns() {
        let manifest = Manifest::from_value(json!({
            "name": "@acme/app",
            "version": "1.0.0",
            "workspaces": { "packages": ["packages/*"] },
            "dependencies": { "lib-b": "workspace:^", "left-pad": "^1.3.0" },
            "devDependencies": { "tool-c": "*" },
            "peerDependencies": { "react": ">=18" }
        }))
        .unwrap();

        assert_eq!(manifest.name, Some(ident("@acme/app")));
        assert_eq!(manifest.workspace_patterns, vec!["packages/*".to_string()]);
        let deps: Vec<_> = manifest
            .scope(DependencyScope::Dependencies)
            .keys()
            .map(ToString::to_string)
            .collect();
        assert_eq!(deps, vec!["lib-b", "left-pad"]);
        assert_eq!(
            manifest
                .find_descriptor(&ident("react"))
                .map(|d| d.range.as_str()),
            Some(">=18")
        );
    }

    #[test]
    fn clearing_a_scope_keeps_the_others() {
        let mut manifest = Manifest::from_value(json!({
            "name": "a",
            "dependencies": { "b": "1" },
            "devDependencies": { "c": "1" }
        }))
        .unwrap();
        manifest.clear_scope(DependencyScope::DevDependencies);

        assert!(manifest.scope(DependencyScope::DevDependencies).is_empty());
        assert_eq!(manifest.scope(DependencyScope::Dependencies).len(), 1);
        assert!(manifest.has_dependencies());
    }

    #[test]
    fn to_value_preserves_unknown_fields_and_emptied_scopes() {
        let mut manifest = Manifest::from_value(json!({
            "name": "a",
            "private": true,
            "scripts": { "build": "tsc" },
            "dependencies": { "b": "1" }
        }))
        .unwrap();
        manifest.clear_scope(DependencyScope::Dependencies);

        let value = manifest.to_value();
        assert_eq!(value["private"], json!(true));
        assert_eq!(value["scripts"]["build"], json!("tsc"));
        assert_eq!(value["dependencies"], json!({}));
        assert!(value.get("devDependencies").is_none());
    }

    #[test]
    fn rejects_non_string_ranges() {
        let err = Manifest::from_value(json!({ "dependencies": { "b": 1 } })).unwrap_err();
        assert!(err.to_string().contains("dependencies.b"));
    }

    #[test]
    fn rejects_non_array_workspaces() {
        assert!(Manifest::from_value(json!({ "workspaces": "packages/*" })).is_err());
    }
}
