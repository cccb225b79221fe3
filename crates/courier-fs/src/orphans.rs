use crate::primitives::AtomicWriteOptions;
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Staging and backup files left in `dir` by writes that never finished (for
/// example after the process was killed between create and commit).
///
/// Only direct children are inspected and only regular files whose name starts
/// with one of the configured prefixes are reported.
pub fn find_orphans(dir: impl AsRef<Path>, options: &AtomicWriteOptions) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let read = |source| Error::Read {
        path: dir.to_path_buf(),
        source,
    };

    let mut found = Vec::new();
    for entry in fs::read_dir(dir).map_err(read)? {
        let entry = entry.map_err(read)?;
        if !entry.file_type().map_err(read)?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(options.temp_prefix_str()) || name.starts_with(options.backup_prefix_str()) {
            found.push(entry.path());
        }
    }
    found.sort();
    Ok(found)
}

/// Delete everything [`find_orphans`] reports. Returns the removed paths.
pub fn remove_orphans(dir: impl AsRef<Path>, options: &AtomicWriteOptions) -> Result<Vec<PathBuf>> {
    let orphans = find_orphans(dir, options)?;
    for path in &orphans {
        fs::remove_file(path).map_err(Error::write(path))?;
    }
    Ok(orphans)
}
