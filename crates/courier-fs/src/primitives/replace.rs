use crate::{Error, Result};
use std::io;
use std::path::{Path, PathBuf};

/// Move `staged` onto `destination` by parking the original under a backup name first.
///
/// Used when a plain rename refuses to replace an existing file. The original
/// is only deleted after the staged file is in place; if the second move fails
/// the backup is renamed back, so the destination keeps its original content.
/// If that restore fails as well, [`Error::Restore`] reports where the original is.
///
/// `rename` is injected so the restore path can be exercised in tests.
pub fn replace_via_backup<R>(staged: &Path, destination: &Path, backup_prefix: &str, rename: R) -> Result<()>
where
    R: Fn(&Path, &Path) -> io::Result<()>,
{
    let backup = reserve_backup_path(destination, backup_prefix)?;

    rename(destination, &backup).map_err(|source| Error::Replace {
        path: destination.to_path_buf(),
        source,
    })?;

    if let Err(source) = rename(staged, destination) {
        return Err(match rename(&backup, destination) {
            Ok(()) => Error::Replace {
                path: destination.to_path_buf(),
                source,
            },
            Err(restore) => Error::Restore {
                path: destination.to_path_buf(),
                backup,
                source,
                restore,
            },
        });
    }

    if let Err(err) = std::fs::remove_file(&backup) {
        tracing::debug!(backup = %backup.display(), error = %err, "stale backup left behind");
    }
    Ok(())
}

/// Pick an unused name next to `destination` by creating and removing a placeholder.
fn reserve_backup_path(destination: &Path, prefix: &str) -> Result<PathBuf> {
    let dir = super::parent_dir(destination);
    let placeholder = tempfile::Builder::new()
        .prefix(prefix)
        .tempfile_in(dir)
        .map_err(Error::write(dir))?
        .into_temp_path();
    let path = placeholder.to_path_buf();
    placeholder.close().map_err(Error::write(&path))?;
    Ok(path)
}
