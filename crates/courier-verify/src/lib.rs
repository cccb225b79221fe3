//! Streaming content checksums for transferred assets.
//!
//! Files are hashed in fixed-size chunks so large videos never have to fit in
//! memory. MD5 is the default because that is what the asset API verifies on
//! commit; SHA-256 is available for local integrity checks.
//!
//! ```
//! use courier_verify::{ChecksumAlgorithm, checksum_reader};
//!
//! let (sum, len) = checksum_reader(&b"hello world"[..], ChecksumAlgorithm::Md5).unwrap();
//! assert_eq!(len, 11);
//! assert_eq!(sum.hash, "5eb63bbbe01eeed093cb22bb8f5acdc3");
//! ```

pub use self::checksum::{Checksum, ChecksumAlgorithm, checksum_reader};
pub use self::error::{Result, VerificationError};
pub use self::hasher::{AnyHasher, DigestHasher, Hasher};

#[cfg(feature = "sha256")]
pub use self::hasher::Sha256Hasher;

#[cfg(feature = "md5")]
pub use self::hasher::Md5Hasher;

mod checksum;
mod error;
mod hasher;
