use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

#[derive(Debug, Clone)]
pub struct CacheLocation {
    pub path: PathBuf,
    pub source: &'static str,
}

/// Resolve the cache directory handed to installers.
///
/// `override_path` comes from `WF_CACHE_DIR`; otherwise the platform cache
/// directory is used.
pub fn resolve_cache_store_path(override_path: Option<PathBuf>) -> Result<CacheLocation> {
    if let Some(path) = override_path {
        return Ok(CacheLocation {
            path: absolutize(path)?,
            source: "WF_CACHE_DIR",
        });
    }
    let base = dirs_next::cache_dir().ok_or_else(|| anyhow!("unable to determine cache directory"))?;
    Ok(CacheLocation {
        path: base.join("workfocus"),
        source: "platform",
    })
}

fn absolutize(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(env::current_dir()
            .context("unable to determine current directory")?
            .join(path))
    }
}
