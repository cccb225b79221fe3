use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use courier_transfer::{UploadRequest, Uploader};
use courier_verify::ChecksumAlgorithm;
use tracing::info;

use super::{Session, print_json};
use crate::remote::JsonRemote;

#[derive(Debug, clap::Args)]
pub struct UploadArg {
    /// File, or directory whose files are uploaded in name order
    pub path: PathBuf,

    /// Base URL of the asset service
    #[arg(long, value_name = "URL")]
    pub remote: String,

    /// Extra header for asset service calls, as `Name: value`
    #[arg(long = "header", short = 'H', value_name = "HEADER", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Delay between delivery state checks
    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Checksum reported when committing (md5 or sha256)
    #[arg(long)]
    pub checksum: Option<ChecksumAlgorithm>,
}

impl UploadArg {
    pub async fn run(self, session: &Session) -> Result<()> {
        let request = UploadRequest::new(self.path);
        request.validate()?;

        let settings = &session.config.upload;
        let poll_interval = self
            .poll_interval_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| settings.poll_interval());

        let client = session.client()?;
        let remote = JsonRemote::new(&client, &self.remote).headers(self.headers);
        let uploader = Uploader::new(&client)
            .with_poll_interval(poll_interval)
            .with_timeout(settings.timeout())
            .with_checksum_algorithm(self.checksum.unwrap_or(settings.checksum));

        let results = uploader
            .upload_all(&request.file, &remote, &session.scope)
            .await
            .with_context(|| format!("could not upload {}", request.file.display()))?;

        info!(count = results.len(), "upload finished");
        print_json(&results)
    }
}

fn parse_header(value: &str) -> Result<(String, String), String> {
    let (name, value) = value
        .split_once(':')
        .ok_or_else(|| format!("expected `Name: value`, got {value:?}"))?;
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(format!("invalid header name {name:?}"));
    }
    Ok((name.to_owned(), value.trim().to_owned()))
}
