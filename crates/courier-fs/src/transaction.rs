use crate::primitives::{AtomicWriteOptions, parent_dir, replace_via_backup};
use crate::{Error, Result};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// One in-flight write to a destination path.
///
/// Content goes into [`AtomicFile::file_mut`] and only becomes visible at the
/// destination on [`AtomicFile::commit`]. Dropping an uncommitted file removes
/// everything this transaction created, so any `?` between creation and commit
/// is a safe abort.
pub struct AtomicFile {
    destination: PathBuf,
    staged:      Staged,
}

enum Staged {
    /// No-overwrite mode: exclusively created at the destination itself.
    Direct(CreatedFile),
    /// Overwrite mode: a sibling temp file renamed over the destination.
    Temp {
        file:          NamedTempFile,
        had_existing:  bool,
        backup_prefix: String,
    },
}

/// A file this process created exclusively; removed on drop unless kept.
struct CreatedFile {
    file: File,
    path: PathBuf,
    keep: bool,
}

impl Drop for CreatedFile {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        if let Err(err) = fs::remove_file(&self.path) {
            tracing::debug!(
                path = %self.path.display(),
                error = %err,
                "could not remove partially written file"
            );
        }
    }
}

impl AtomicFile {
    pub fn create(destination: impl AsRef<Path>, options: &AtomicWriteOptions) -> Result<Self> {
        let destination = destination.as_ref().to_path_buf();
        let dir = parent_dir(&destination);
        fs::create_dir_all(dir).map_err(Error::write(dir))?;

        let staged = if options.is_overwrite() {
            let had_existing = inspect_destination(&destination)?;
            let file = tempfile::Builder::new()
                .prefix(options.temp_prefix_str())
                .tempfile_in(dir)
                .map_err(Error::write(dir))?;
            options.get_permissions().apply(file.as_file(), file.path())?;
            tracing::trace!(
                destination = %destination.display(),
                staging = %file.path().display(),
                had_existing,
                "staging overwrite"
            );
            Staged::Temp {
                file,
                had_existing,
                backup_prefix: options.backup_prefix_str().to_owned(),
            }
        } else {
            Staged::Direct(create_new_no_follow(&destination, options)?)
        };

        Ok(Self { destination, staged })
    }

    pub fn file_mut(&mut self) -> &mut File {
        match &mut self.staged {
            Staged::Direct(created) => &mut created.file,
            Staged::Temp { file, .. } => file.as_file_mut(),
        }
    }

    pub fn destination(&self) -> &Path { &self.destination }

    /// Where bytes are currently landing.
    pub fn staging_path(&self) -> &Path {
        match &self.staged {
            Staged::Direct(created) => &created.path,
            Staged::Temp { file, .. } => file.path(),
        }
    }

    /// Flush to stable storage and publish at the destination.
    pub fn commit(self) -> Result<()> {
        let Self { destination, staged } = self;

        match staged {
            Staged::Direct(mut created) => {
                created.file.sync_all().map_err(Error::write(&destination))?;
                created.keep = true;
            }
            Staged::Temp {
                file,
                had_existing,
                backup_prefix,
            } => {
                file.as_file().sync_all().map_err(Error::write(file.path()))?;
                // Closes the handle; the path is still removed if we bail out below.
                let temp = file.into_temp_path();

                if let Err(source) = fs::rename(&temp, &destination) {
                    if !had_existing {
                        return Err(Error::Replace {
                            path: destination,
                            source,
                        });
                    }
                    tracing::debug!(
                        destination = %destination.display(),
                        error = %source,
                        "rename refused, swapping through backup"
                    );
                    replace_via_backup(&temp, &destination, &backup_prefix, |from, to| {
                        fs::rename(from, to)
                    })?;
                }
                // The temp name has been moved away; disarm its cleanup.
                let _ = temp.keep();
                sync_dir(parent_dir(&destination));
            }
        }

        Ok(())
    }
}

/// `Ok(true)` when a regular file is already present at `path`.
fn inspect_destination(path: &Path) -> Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => Err(Error::Symlink {
            path: path.to_path_buf(),
        }),
        Ok(meta) if meta.is_dir() => Err(Error::IsDirectory {
            path: path.to_path_buf(),
        }),
        Ok(_) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(Error::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn create_new_no_follow(path: &Path, options: &AtomicWriteOptions) -> Result<CreatedFile> {
    let mut open = OpenOptions::new();
    open.write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        open.custom_flags(nix::fcntl::OFlag::O_NOFOLLOW.bits());
        if let Some(mode) = options.get_permissions().to_unix_mode() {
            open.mode(mode);
        }
    }

    let file = open.open(path).map_err(|source| {
        if source.kind() == io::ErrorKind::AlreadyExists {
            Error::AlreadyExists {
                path: path.to_path_buf(),
            }
        } else {
            Error::Write {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let created = CreatedFile {
        file,
        path: path.to_path_buf(),
        keep: false,
    };
    options.get_permissions().apply(&created.file, path)?;
    Ok(created)
}

#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(err) = File::open(dir).and_then(|d| d.sync_all()) {
        tracing::trace!(dir = %dir.display(), error = %err, "directory sync skipped");
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_uncommitted_overwrite_is_discarded() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("asset.mov");
        fs::write(&dest, "original").unwrap();

        let staging = {
            let mut tx = AtomicFile::create(&dest, &AtomicWriteOptions::new().overwrite(true)).unwrap();
            tx.file_mut().write_all(b"half").unwrap();
            assert_ne!(tx.staging_path(), dest.as_path());
            assert!(tx.staging_path().exists());
            tx.staging_path().to_path_buf()
        };

        assert!(!staging.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"original");
    }

    #[test]
    fn test_uncommitted_direct_is_removed() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("asset.mov");

        {
            let mut tx = AtomicFile::create(&dest, &AtomicWriteOptions::new()).unwrap();
            tx.file_mut().write_all(b"half").unwrap();
            assert_eq!(tx.staging_path(), dest.as_path());
        }

        assert!(!dest.exists());
    }

    #[test]
    fn test_staging_file_is_sibling_with_prefix() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("asset.mov");
        let tx = AtomicFile::create(&dest, &AtomicWriteOptions::new().overwrite(true)).unwrap();

        let staging = tx.staging_path();
        assert_eq!(staging.parent(), dest.parent());
        let name = staging.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with(crate::DEFAULT_TEMP_PREFIX));
    }

    #[test]
    fn test_commit_publishes() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("asset.mov");

        let mut tx = AtomicFile::create(&dest, &AtomicWriteOptions::new().overwrite(true)).unwrap();
        tx.file_mut().write_all(b"complete").unwrap();
        assert!(!dest.exists());
        tx.commit().unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"complete");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
