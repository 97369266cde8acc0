use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};

/// Replace whatever sits at `link` with a directory link pointing at `target`.
///
/// On Unix this is a symlink; on Windows a directory symlink.
pub(crate) fn replace_dir_link(target: &Path, link: &Path) -> Result<()> {
    if !target.exists() {
        return Err(anyhow!(
            "cannot create link; target does not exist: {}",
            target.display()
        ));
    }
    if let Some(parent) = link.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    remove_path_for_replace(link)?;

    #[cfg(unix)]
    let created = std::os::unix::fs::symlink(target, link);
    #[cfg(windows)]
    let created = std::os::windows::fs::symlink_dir(target, link);

    match created {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
        Err(err) => Err(err).with_context(|| {
            format!(
                "failed to link {} -> {}",
                link.display(),
                target.display()
            )
        }),
    }
}

fn remove_path_for_replace(path: &Path) -> Result<()> {
    let Ok(meta) = fs::symlink_metadata(path) else {
        return Ok(());
    };
    let result = if meta.file_type().is_symlink() || meta.is_file() {
        fs::remove_file(path).or_else(|err| {
            // directory symlinks on Windows need remove_dir
            if meta.is_dir() || cfg!(windows) {
                fs::remove_dir(path)
            } else {
                Err(err)
            }
        })
    } else {
        fs::remove_dir_all(path)
    };
    match result {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("failed to remove {}", path.display())),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn replaces_existing_directory_with_link() {
        let temp = tempfile::tempdir().expect("tempdir");
        let target = temp.path().join("target");
        fs::create_dir_all(&target).expect("target dir");
        let link = temp.path().join("node_modules").join("lib");
        fs::create_dir_all(&link).expect("stale dir");
        fs::write(link.join("stale.txt"), "old").expect("stale file");

        replace_dir_link(&target, &link).expect("link");
        replace_dir_link(&target, &link).expect("relink");

        let meta = fs::symlink_metadata(&link).expect("link metadata");
        assert!(meta.file_type().is_symlink());
        assert_eq!(fs::read_link(&link).expect("read link"), target);
    }

    #[test]
    fn refuses_missing_target() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = replace_dir_link(&temp.path().join("missing"), &temp.path().join("link"))
            .unwrap_err();
        assert!(err.to_string().contains("target does not exist"));
    }
}
