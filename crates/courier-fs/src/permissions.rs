use crate::{Error, Result};
use std::fs::File;
use std::path::Path;

/// Permission bits applied to a freshly written file before it becomes visible.
///
/// Applied through the open handle, so the mode is exact regardless of umask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PermissionMode {
    /// Leave whatever the platform assigned at creation.
    Inherit,

    /// Owner read/write only.
    ///
    /// On Unix: `0o600` (rw-------). The default for downloaded and uploaded
    /// artifact copies.
    /// On Windows: clears the `readonly` attribute.
    #[default]
    OwnerOnly,

    /// On Unix: `0o644` (rw-r--r--).
    /// On Windows: clears the `readonly` attribute.
    ReadWrite,

    /// On Unix: `0o444` (r--r--r--).
    /// On Windows: sets the `readonly` attribute.
    ReadOnly,

    /// Raw Unix mode bits; on Windows only the write bits are honoured.
    Custom(u32),
}

impl PermissionMode {
    pub fn to_unix_mode(self) -> Option<u32> {
        match self {
            Self::Inherit => None,
            Self::OwnerOnly => Some(0o600),
            Self::ReadWrite => Some(0o644),
            Self::ReadOnly => Some(0o444),
            Self::Custom(mode) => Some(mode),
        }
    }

    pub fn is_writable(self) -> bool {
        self.to_unix_mode().is_none_or(|mode| mode & 0o222 != 0)
    }

    /// Apply the mode to an open file. `path` is only used for error reporting.
    pub fn apply(self, file: &File, path: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let Some(mode) = self.to_unix_mode() else {
                return Ok(());
            };
            file.set_permissions(std::fs::Permissions::from_mode(mode))
                .map_err(Error::write(path))?;
        }

        #[cfg(not(unix))]
        {
            if self == Self::Inherit {
                return Ok(());
            }
            let mut perms = file.metadata().map_err(Error::write(path))?.permissions();
            perms.set_readonly(!self.is_writable());
            file.set_permissions(perms).map_err(Error::write(path))?;
        }

        Ok(())
    }
}

impl From<u32> for PermissionMode {
    fn from(mode: u32) -> Self { Self::Custom(mode) }
}
