//! Per-build scratch directory.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use walkdir::WalkDir;

use crate::domain::error::BuildError;

const WORK_AREA_PREFIX: &str = "autoiso-";

/// A uniquely-named directory under the staging root, owned by one build.
///
/// Removed when dropped, on success, error and panic alike. Extracted trees
/// often carry read-only modes, so the tree is made writable first.
pub struct WorkArea {
    path: PathBuf,
    dir: Option<TempDir>,
}

impl WorkArea {
    /// Create a fresh work area under `staging_root`, creating the root if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Filesystem`] if either directory cannot be
    /// created.
    pub fn create(staging_root: &Path) -> Result<Self, BuildError> {
        std::fs::create_dir_all(staging_root).map_err(|e| {
            BuildError::fs(
                format!("creating staging root {}", staging_root.display()),
                e,
            )
        })?;
        let dir = tempfile::Builder::new()
            .prefix(WORK_AREA_PREFIX)
            .tempdir_in(staging_root)
            .map_err(|e| {
                BuildError::fs(
                    format!("creating work area in {}", staging_root.display()),
                    e,
                )
            })?;
        tracing::debug!(path = %dir.path().display(), "work area created");
        Ok(Self {
            path: dir.path().to_path_buf(),
            dir: Some(dir),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Give the owner write access to every extracted entry.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Filesystem`] for the first entry that cannot be
    /// inspected or changed.
    pub fn make_writable(&self) -> Result<(), BuildError> {
        make_tree_writable(&self.path)
    }

    /// Remove the work area now, reporting failures instead of ignoring them.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Filesystem`] if the tree cannot be removed.
    pub fn close(mut self) -> Result<(), BuildError> {
        let Some(dir) = self.dir.take() else {
            return Ok(());
        };
        let _ = make_tree_writable(&self.path);
        dir.close().map_err(|e| {
            BuildError::fs(format!("removing work area {}", self.path.display()), e)
        })?;
        tracing::debug!(path = %self.path.display(), "work area removed");
        Ok(())
    }
}

impl Drop for WorkArea {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let _ = make_tree_writable(&self.path);
            drop(dir);
        }
    }
}

/// Add owner write permission (and search permission on directories) to
/// every entry under `root`. Symlinks are left alone.
///
/// # Errors
///
/// Returns [`BuildError::Filesystem`] for the first entry that cannot be
/// inspected or changed.
pub fn make_tree_writable(root: &Path) -> Result<(), BuildError> {
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            let io = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
            BuildError::fs(format!("walking {}", path.display()), io)
        })?;
        if entry.file_type().is_symlink() {
            continue;
        }
        let meta = entry
            .metadata()
            .map_err(|e| {
                BuildError::fs(
                    format!("reading metadata of {}", entry.path().display()),
                    e.into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("metadata unavailable")),
                )
            })?;
        let mut perms = meta.permissions();
        if !needs_write_bit(&perms, entry.file_type().is_dir()) {
            continue;
        }
        grant_owner_write(&mut perms, entry.file_type().is_dir());
        std::fs::set_permissions(entry.path(), perms).map_err(|e| {
            BuildError::fs(format!("making {} writable", entry.path().display()), e)
        })?;
    }
    Ok(())
}

#[cfg(unix)]
fn needs_write_bit(perms: &std::fs::Permissions, is_dir: bool) -> bool {
    use std::os::unix::fs::PermissionsExt;
    let wanted = if is_dir { 0o700 } else { 0o200 };
    perms.mode() & wanted != wanted
}

#[cfg(not(unix))]
fn needs_write_bit(perms: &std::fs::Permissions, _is_dir: bool) -> bool {
    perms.readonly()
}

#[cfg(unix)]
fn grant_owner_write(perms: &mut std::fs::Permissions, is_dir: bool) {
    use std::os::unix::fs::PermissionsExt;
    let extra = if is_dir { 0o700 } else { 0o200 };
    perms.set_mode(perms.mode() | extra);
}

#[cfg(not(unix))]
#[allow(clippy::permissions_set_readonly_false)]
fn grant_owner_write(perms: &mut std::fs::Permissions, _is_dir: bool) {
    perms.set_readonly(false);
}
