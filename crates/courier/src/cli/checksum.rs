use std::path::PathBuf;

use anyhow::{Context, Result};
use courier_verify::{ChecksumAlgorithm, checksum_reader};

#[derive(Debug, clap::Args)]
pub struct ChecksumArg {
    pub file: PathBuf,

    #[arg(long, short, default_value_t = ChecksumAlgorithm::default())]
    pub algorithm: ChecksumAlgorithm,

    /// Fail unless the digest matches this hex value
    #[arg(long, value_name = "HEX")]
    pub expect: Option<String>,
}

impl ChecksumArg {
    pub fn run(self) -> Result<()> {
        let file = courier_fs::open_no_follow(&self.file)?;
        let (checksum, _) = checksum_reader(file, self.algorithm).with_context(|| format!("failed to read {}", self.file.display()))?;

        if let Some(expected) = &self.expect {
            checksum
                .verify(expected)
                .with_context(|| format!("{} failed verification", self.file.display()))?;
        }
        println!("{}  {}", checksum.hash, self.file.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arg(file: PathBuf, expect: Option<&str>) -> ChecksumArg {
        ChecksumArg {
            file,
            algorithm: ChecksumAlgorithm::Md5,
            expect: expect.map(str::to_owned),
        }
    }

    #[test]
    fn test_expect_match_and_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, b"hello world").unwrap();

        arg(path.clone(), Some("5EB63BBBE01EEED093CB22BB8F5ACDC3")).run().unwrap();
        let err = arg(path, Some("00")).run().unwrap_err();
        assert!(format!("{err:#}").contains("checksum mismatch"), "{err:#}");
    }

    #[cfg(unix)]
    #[test]
    fn test_refuses_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("real.txt");
        std::fs::write(&target, b"x").unwrap();
        let link = dir.path().join("link.txt");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let err = arg(link, None).run().unwrap_err();
        assert!(err.downcast_ref::<courier_fs::Error>().is_some(), "{err:#}");
    }
}
