pub mod atomic_write;
pub mod open;
pub mod replace;

pub use atomic_write::{
    AtomicWriteOptions, DEFAULT_BACKUP_PREFIX, DEFAULT_TEMP_PREFIX, write_atomic, write_bytes,
};
pub use open::open_no_follow;
pub use replace::replace_via_backup;

use std::path::Path;

/// Directory that holds `path`; bare file names resolve to the working directory.
pub(crate) fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
