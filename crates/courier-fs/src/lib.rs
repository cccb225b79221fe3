//! Crash-safe file placement for transferred assets.
//!
//! Every write either leaves the destination untouched or replaces it whole:
//! overwrites are staged in a sibling temp file and renamed into place after
//! an fsync, fresh files are created exclusively, and symlinks are never
//! followed or written through.
//!
//! ```no_run
//! use courier_fs::{AtomicWriteOptions, write_atomic};
//! use std::io::Write;
//!
//! let options = AtomicWriteOptions::new().overwrite(true);
//! let written = write_atomic("out/shot.png", &options, |file| {
//!     file.write_all(b"...")?;
//!     Ok(3)
//! })?;
//! # Ok::<(), courier_fs::Error>(())
//! ```

mod error;
mod orphans;
pub mod permissions;
mod primitives;
mod transaction;

pub use error::{Error, Result};
pub use orphans::{find_orphans, remove_orphans};
pub use permissions::PermissionMode;
pub use primitives::{
    AtomicWriteOptions, DEFAULT_BACKUP_PREFIX, DEFAULT_TEMP_PREFIX, open_no_follow,
    replace_via_backup, write_atomic, write_bytes,
};
pub use transaction::AtomicFile;
