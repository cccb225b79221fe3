use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("output file already exists: {}", .path.display())]
    AlreadyExists { path: PathBuf },

    #[error("refusing to follow symlink {}", .path.display())]
    Symlink { path: PathBuf },

    #[error("output path {} is a directory", .path.display())]
    IsDirectory { path: PathBuf },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to move new content onto {}: {source}", .path.display())]
    Replace {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    /// The swap failed and putting the original back failed too; the original
    /// content now lives at `backup`.
    #[error(
        "failed to move new content onto {} ({source}) and could not restore it: original kept at {} ({restore})",
        .path.display(),
        .backup.display()
    )]
    Restore {
        path:    PathBuf,
        backup:  PathBuf,
        #[source]
        source:  io::Error,
        restore: io::Error,
    },
}

impl Error {
    /// Errors raised to protect the destination rather than by the OS.
    ///
    /// These are never worth retrying: the same call would refuse again.
    pub fn is_safety_violation(&self) -> bool {
        matches!(
            self,
            Self::AlreadyExists { .. } | Self::Symlink { .. } | Self::IsDirectory { .. }
        )
    }

    pub(crate) fn write(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Write { path, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
