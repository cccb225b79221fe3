use crate::{Error, Result};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

/// Open an existing regular file for reading without following a final symlink.
///
/// The symlink check happens twice: once on the metadata so the common case
/// gets a clear error, and again in the kernel via `O_NOFOLLOW` so a link
/// swapped in between the two calls is still refused.
pub fn open_no_follow(path: impl AsRef<Path>) -> Result<File> {
    let path = path.as_ref();
    let meta = fs::symlink_metadata(path).map_err(read_error(path))?;
    if meta.file_type().is_symlink() {
        return Err(Error::Symlink {
            path: path.to_path_buf(),
        });
    }
    if meta.is_dir() {
        return Err(Error::IsDirectory {
            path: path.to_path_buf(),
        });
    }

    let mut open = OpenOptions::new();
    open.read(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        open.custom_flags(nix::fcntl::OFlag::O_NOFOLLOW.bits());
    }

    open.open(path).map_err(|source| {
        #[cfg(unix)]
        if source.raw_os_error() == Some(nix::errno::Errno::ELOOP as i32) {
            return Error::Symlink {
                path: path.to_path_buf(),
            };
        }
        read_error(path)(source)
    })
}

fn read_error(path: &Path) -> impl FnOnce(io::Error) -> Error + '_ {
    move |source| Error::Read {
        path: path.to_path_buf(),
        source,
    }
}
