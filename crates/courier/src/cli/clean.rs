use std::path::PathBuf;

use anyhow::Result;
use courier_fs::{AtomicWriteOptions, find_orphans, remove_orphans};
use tracing::info;

#[derive(Debug, clap::Args)]
pub struct CleanArg {
    /// Directory that downloads were written into
    pub dir: PathBuf,

    /// Only list what would be removed
    #[arg(long)]
    pub dry_run: bool,
}

impl CleanArg {
    pub fn run(self) -> Result<()> {
        let options = AtomicWriteOptions::new();
        let paths = if self.dry_run { find_orphans(&self.dir, &options)? } else { remove_orphans(&self.dir, &options)? };

        for path in &paths {
            println!("{}", path.display());
        }
        info!(count = paths.len(), dry_run = self.dry_run, "orphaned files");
        Ok(())
    }
}
