use crate::permissions::PermissionMode;
use crate::transaction::AtomicFile;
use crate::{Error, Result};
use std::borrow::Cow;
use std::fs::File;
use std::path::Path;

pub const DEFAULT_TEMP_PREFIX: &str = ".courier-download-";
pub const DEFAULT_BACKUP_PREFIX: &str = ".courier-download-backup-";

#[derive(Clone, Debug)]
pub struct AtomicWriteOptions {
    permissions:   PermissionMode,
    overwrite:     bool,
    temp_prefix:   Cow<'static, str>,
    backup_prefix: Cow<'static, str>,
}

impl Default for AtomicWriteOptions {
    fn default() -> Self { Self::new() }
}

impl AtomicWriteOptions {
    pub fn new() -> Self {
        Self {
            permissions:   PermissionMode::default(),
            overwrite:     false,
            temp_prefix:   Cow::Borrowed(DEFAULT_TEMP_PREFIX),
            backup_prefix: Cow::Borrowed(DEFAULT_BACKUP_PREFIX),
        }
    }

    pub fn permissions(mut self, permissions: impl Into<PermissionMode>) -> Self {
        self.permissions = permissions.into();
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Name prefix for the staging file created next to the destination.
    pub fn temp_prefix(mut self, prefix: impl Into<Cow<'static, str>>) -> Self {
        self.temp_prefix = prefix.into();
        self
    }

    /// Name prefix for the short-lived copy of the original during a backup swap.
    pub fn backup_prefix(mut self, prefix: impl Into<Cow<'static, str>>) -> Self {
        self.backup_prefix = prefix.into();
        self
    }

    pub fn get_permissions(&self) -> PermissionMode { self.permissions }

    pub fn is_overwrite(&self) -> bool { self.overwrite }

    pub fn temp_prefix_str(&self) -> &str { &self.temp_prefix }

    pub fn backup_prefix_str(&self) -> &str { &self.backup_prefix }
}

/// Write `path` through `write`, never exposing a half-written file.
///
/// With `overwrite` unset the destination must not exist (a symlink counts as
/// existing). With `overwrite` set the content is staged next to `path` and
/// renamed over it once durable; symlinks and directories are refused. A
/// failing `write` leaves the destination exactly as it was.
///
/// Returns whatever byte count `write` reported.
pub fn write_atomic<F>(path: impl AsRef<Path>, options: &AtomicWriteOptions, write: F) -> Result<u64>
where
    F: FnOnce(&mut File) -> std::io::Result<u64>,
{
    let path = path.as_ref();
    let mut staged = AtomicFile::create(path, options)?;
    let written = write(staged.file_mut()).map_err(Error::write(path))?;
    staged.commit()?;
    Ok(written)
}

/// Convenience wrapper for in-memory content.
pub fn write_bytes(path: impl AsRef<Path>, content: &[u8], options: &AtomicWriteOptions) -> Result<u64> {
    write_atomic(path, options, |file| {
        use std::io::Write;
        file.write_all(content)?;
        Ok(content.len() as u64)
    })
}
