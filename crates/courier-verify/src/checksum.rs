use std::fmt;
use std::io::{self, Read};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::hasher::{AnyHasher, Hasher};
use crate::{Result, VerificationError};

const READ_BUF: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    /// What the asset API expects when an upload is committed.
    #[cfg(feature = "md5")]
    #[default]
    Md5,
    #[cfg(feature = "sha256")]
    Sha256,
}

impl ChecksumAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            #[cfg(feature = "md5")]
            Self::Md5 => "md5",
            #[cfg(feature = "sha256")]
            Self::Sha256 => "sha256",
        }
    }

    pub fn hasher(self) -> AnyHasher {
        match self {
            #[cfg(feature = "md5")]
            Self::Md5 => AnyHasher::Md5(Default::default()),
            #[cfg(feature = "sha256")]
            Self::Sha256 => AnyHasher::Sha256(Default::default()),
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for ChecksumAlgorithm {
    type Err = VerificationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            #[cfg(feature = "md5")]
            "md5" => Ok(Self::Md5),
            #[cfg(feature = "sha256")]
            "sha256" | "sha-256" => Ok(Self::Sha256),
            other => Err(VerificationError::UnknownAlgorithm(other.to_owned())),
        }
    }
}

/// Hex digest of some content together with the algorithm that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksum {
    pub algorithm: ChecksumAlgorithm,
    pub hash:      String,
}

impl Checksum {
    pub fn new(algorithm: ChecksumAlgorithm, digest: &[u8]) -> Self {
        Self {
            algorithm,
            hash: hex::encode(digest),
        }
    }

    /// Compare against a hex digest, ignoring case.
    pub fn verify(&self, expected_hex: &str) -> Result<()> {
        if self.hash.eq_ignore_ascii_case(expected_hex.trim()) {
            Ok(())
        } else {
            Err(VerificationError::Mismatch {
                expected: expected_hex.trim().to_ascii_lowercase(),
                actual:   self.hash.clone(),
            })
        }
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hash)
    }
}

/// Hash everything `reader` yields in fixed-size chunks.
///
/// Returns the checksum and the number of bytes consumed.
pub fn checksum_reader<R: Read>(mut reader: R, algorithm: ChecksumAlgorithm) -> io::Result<(Checksum, u64)> {
    let mut hasher = algorithm.hasher();
    let mut buf = vec![0u8; READ_BUF];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        hasher.update(&buf[..n]);
        total += n as u64;
    }
    Ok((Checksum::new(algorithm, &hasher.finalize()), total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_checksum_reader_md5() {
        let (sum, n) = checksum_reader(Cursor::new(b"hello world"), ChecksumAlgorithm::Md5).unwrap();
        assert_eq!(n, 11);
        assert_eq!(sum.hash, "5eb63bbbe01eeed093cb22bb8f5acdc3");
        assert_eq!(sum.to_string(), "md5:5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[test]
    fn test_checksum_reader_spans_buffers() {
        let data = vec![0xABu8; READ_BUF * 2 + 17];
        let (streamed, n) = checksum_reader(Cursor::new(&data), ChecksumAlgorithm::Sha256).unwrap();

        let mut whole = ChecksumAlgorithm::Sha256.hasher();
        whole.update(&data);
        assert_eq!(n, data.len() as u64);
        assert_eq!(streamed, Checksum::new(ChecksumAlgorithm::Sha256, &whole.finalize()));
    }

    #[test]
    fn test_checksum_reader_sha256() {
        let (sum, _) = checksum_reader(Cursor::new(b"hello world"), ChecksumAlgorithm::Sha256).unwrap();
        assert_eq!(
            sum.hash,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_verify_is_case_insensitive() {
        let (sum, _) = checksum_reader(Cursor::new(b"hello world"), ChecksumAlgorithm::Md5).unwrap();
        sum.verify("5EB63BBBE01EEED093CB22BB8F5ACDC3").unwrap();
        assert!(matches!(
            sum.verify("00000000000000000000000000000000"),
            Err(VerificationError::Mismatch { .. })
        ));
    }

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!("MD5".parse::<ChecksumAlgorithm>().unwrap(), ChecksumAlgorithm::Md5);
        assert_eq!("sha-256".parse::<ChecksumAlgorithm>().unwrap(), ChecksumAlgorithm::Sha256);
        assert!("crc32".parse::<ChecksumAlgorithm>().is_err());
        assert_eq!(ChecksumAlgorithm::default(), ChecksumAlgorithm::Md5);
    }
}
