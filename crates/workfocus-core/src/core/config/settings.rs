use std::collections::HashMap;
use std::env;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::effects;
use crate::store::CacheLocation;

pub(crate) const DEFAULT_LINK_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalOptions {
    pub quiet: bool,
    pub verbose: u8,
    pub trace: bool,
    pub json: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub(crate) fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    pub(crate) fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    #[cfg(test)]
    pub(crate) fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}

#[derive(Debug)]
pub struct Config {
    pub(crate) cache: CacheConfig,
    pub(crate) install: InstallConfig,
}

impl Config {
    pub(crate) fn from_snapshot(
        snapshot: &EnvSnapshot,
        cache_store: &dyn effects::CacheStore,
    ) -> anyhow::Result<Self> {
        let link_concurrency = match snapshot.var("WF_LINK_CONCURRENCY") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(value) if value > 0 => value,
                _ => {
                    return Err(anyhow!(
                        "WF_LINK_CONCURRENCY must be a positive integer (got `{raw}`)"
                    ))
                }
            },
            None => DEFAULT_LINK_CONCURRENCY,
        };
        Ok(Self {
            cache: CacheConfig {
                store: cache_store.resolve_store_path(snapshot.var("WF_CACHE_DIR"))?,
            },
            install: InstallConfig { link_concurrency },
        })
    }

    #[must_use]
    pub fn cache(&self) -> &CacheConfig {
        &self.cache
    }

    #[must_use]
    pub fn install(&self) -> &InstallConfig {
        &self.install
    }
}

#[derive(Debug)]
pub struct CacheConfig {
    pub store: CacheLocation,
}

#[derive(Debug, Clone, Copy)]
pub struct InstallConfig {
    pub link_concurrency: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{Effects, SystemEffects};

    #[test]
    fn defaults_apply_without_overrides() {
        let effects = SystemEffects::new();
        let snapshot = EnvSnapshot::testing(&[("WF_CACHE_DIR", "/tmp/wf-cache")]);
        let config = Config::from_snapshot(&snapshot, effects.cache()).unwrap();
        assert_eq!(config.install().link_concurrency, DEFAULT_LINK_CONCURRENCY);
        assert_eq!(config.cache().store.path.to_str(), Some("/tmp/wf-cache"));
        assert_eq!(config.cache().store.source, "WF_CACHE_DIR");
    }

    #[test]
    fn link_concurrency_must_be_positive() {
        let effects = SystemEffects::new();
        for raw in ["0", "-1", "many"] {
            let snapshot = EnvSnapshot::testing(&[
                ("WF_CACHE_DIR", "/tmp/wf-cache"),
                ("WF_LINK_CONCURRENCY", raw),
            ]);
            let err = Config::from_snapshot(&snapshot, effects.cache()).unwrap_err();
            assert!(err.to_string().contains("WF_LINK_CONCURRENCY"));
        }

        let snapshot = EnvSnapshot::testing(&[
            ("WF_CACHE_DIR", "/tmp/wf-cache"),
            ("WF_LINK_CONCURRENCY", "3"),
        ]);
        let config = Config::from_snapshot(&snapshot, effects.cache()).unwrap();
        assert_eq!(config.install().link_concurrency, 3);
    }
}
