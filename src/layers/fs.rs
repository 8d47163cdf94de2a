//! Directory copy and move helpers
//!
//! Errors always name the path involved; nothing here retries.

use crate::error::{ShimError, ShimResult};
use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Create a directory and its parents
pub fn ensure_dir(path: &Path) -> ShimResult<()> {
    fs::create_dir_all(path)
        .map_err(|e| ShimError::io(format!("creating directory {}", path.display()), e))
}

/// Remove a file or directory tree; absent paths are fine
pub fn remove_all(path: &Path) -> ShimResult<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(ShimError::io(format!("inspecting {}", path.display()), e)),
    };
    let result = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| ShimError::io(format!("removing {}", path.display()), e))
}

/// Rename, creating the destination's parent first
pub fn rename(src: &Path, dst: &Path) -> ShimResult<()> {
    if let Some(parent) = dst.parent() {
        ensure_dir(parent)?;
    }
    fs::rename(src, dst)
        .map_err(|e| ShimError::io(format!("moving {} to {}", src.display(), dst.display()), e))
}

/// Copy one file, creating the destination's parent first
pub fn copy_file(src: &Path, dst: &Path) -> ShimResult<()> {
    if let Some(parent) = dst.parent() {
        ensure_dir(parent)?;
    }
    fs::copy(src, dst).map(|_| ()).map_err(|e| {
        ShimError::io(
            format!("copying {} to {}", src.display(), dst.display()),
            e,
        )
    })
}

/// Recursively copy `src` into `dst`, overlaying anything already there.
/// Symlinks are recreated rather than followed.
pub fn copy_dir(src: &Path, dst: &Path) -> ShimResult<()> {
    ensure_dir(dst)?;

    for entry in WalkDir::new(src).min_depth(1) {
        let entry =
            entry.map_err(|e| ShimError::io(format!("walking {}", src.display()), e.into()))?;
        let relative = entry.path().strip_prefix(src).map_err(|_| {
            ShimError::io(
                format!("walking {}", src.display()),
                std::io::Error::other(format!("{} escapes source", entry.path().display())),
            )
        })?;
        let target = dst.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            ensure_dir(&target)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            copy_file(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> ShimResult<()> {
    let link = fs::read_link(src)
        .map_err(|e| ShimError::io(format!("reading link {}", src.display()), e))?;
    remove_all(dst)?;
    std::os::unix::fs::symlink(&link, dst)
        .map_err(|e| ShimError::io(format!("creating link {}", dst.display()), e))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> ShimResult<()> {
    copy_file(src, dst)
}

/// Move the contents of `src` into `dst`, then remove `src`.
///
/// If `dst` does not exist this is a single rename. Otherwise entries are
/// moved one by one, descending into directories present on both sides;
/// an entry already present in `dst` wins over the one from `src`.
pub fn move_dir(src: &Path, dst: &Path) -> ShimResult<()> {
    if !dst.exists() {
        return rename(src, dst);
    }

    merge_into(src, dst)?;
    remove_all(src)
}

fn merge_into(src: &Path, dst: &Path) -> ShimResult<()> {
    let entries =
        fs::read_dir(src).map_err(|e| ShimError::io(format!("reading {}", src.display()), e))?;

    for entry in entries {
        let entry = entry.map_err(|e| ShimError::io(format!("reading {}", src.display()), e))?;
        let from = entry.path();
        let to = dst.join(entry.file_name());

        match fs::symlink_metadata(&to) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => rename(&from, &to)?,
            Err(e) => return Err(ShimError::io(format!("inspecting {}", to.display()), e)),
            Ok(meta) => {
                let from_is_dir = entry
                    .file_type()
                    .map_err(|e| ShimError::io(format!("inspecting {}", from.display()), e))?
                    .is_dir();
                if meta.is_dir() && from_is_dir {
                    merge_into(&from, &to)?;
                } else {
                    debug!(
                        "Keeping existing {}, skipping {}",
                        to.display(),
                        from.display()
                    );
                }
            }
        }
    }
    Ok(())
}
