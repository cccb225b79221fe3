use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use courier_transfer::core::{resolve_template_url, sanitize_file_name};
use courier_transfer::{Downloaded, DownloadRequest};
use serde::Serialize;
use tracing::info;

use super::{Session, print_json};

#[derive(Debug, clap::Args)]
pub struct DownloadArg {
    /// URL to fetch
    pub url: String,

    /// Where to write the file
    #[arg(long, short)]
    pub output: PathBuf,

    /// Replace an existing file instead of refusing
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Debug, clap::Args)]
pub struct ImageArg {
    /// Template URL containing `{w}`, `{h}` and optionally `{f}`
    pub template: String,

    #[arg(long)]
    pub width: u32,

    #[arg(long)]
    pub height: u32,

    /// Original file name; picks the format and the output name
    #[arg(long)]
    pub file_name: Option<String>,

    /// Directory to write into
    #[arg(long, short, default_value = ".")]
    pub dir: PathBuf,

    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    url:           &'a str,
    path:          &'a Path,
    bytes_written: u64,
    content_type:  Option<&'a str>,
    attempts:      u32,
}

impl DownloadArg {
    pub async fn run(self, session: &Session) -> Result<()> {
        let request = DownloadRequest::new(self.url, self.output).overwrite(self.overwrite);
        fetch(session, &request).await
    }
}

impl ImageArg {
    pub async fn run(self, session: &Session) -> Result<()> {
        let file_name = self.file_name.unwrap_or_default();
        let url = resolve_template_url(&self.template, self.width, self.height, &file_name)?;
        let name = sanitize_file_name(&file_name).unwrap_or_else(|| format!("image-{}x{}.png", self.width, self.height));

        let request = DownloadRequest::new(url, self.dir.join(name)).overwrite(self.overwrite);
        fetch(session, &request).await
    }
}

async fn fetch(session: &Session, request: &DownloadRequest) -> Result<()> {
    let downloader = session.downloader()?;
    let Downloaded {
        bytes_written,
        content_type,
        attempts,
    } = downloader
        .fetch(request, &session.scope)
        .await
        .with_context(|| format!("could not download {}", request.url.trim()))?;

    info!(path = %request.destination.display(), bytes_written, "saved");
    print_json(&Report {
        url: request.url.trim(),
        path: &request.destination,
        bytes_written,
        content_type: content_type.as_deref(),
        attempts,
    })
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::super::{App, Commands};

    #[test]
    fn test_parse_download() {
        let app = App::try_parse_from(["courier", "download", "https://cdn.example/a.png", "-o", "a.png", "--overwrite"]).unwrap();
        match app.cmd {
            Commands::Download(arg) => {
                assert_eq!(arg.url, "https://cdn.example/a.png");
                assert!(arg.overwrite);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_output_is_required() {
        assert!(App::try_parse_from(["courier", "download", "https://cdn.example/a.png"]).is_err());
    }

    #[test]
    fn test_parse_image() {
        let app = App::try_parse_from([
            "courier",
            "image",
            "https://cdn.example/{w}x{h}.{f}",
            "--width",
            "640",
            "--height",
            "480",
            "--file-name",
            "shot.jpg",
        ])
        .unwrap();
        match app.cmd {
            Commands::Image(arg) => {
                assert_eq!((arg.width, arg.height), (640, 480));
                assert_eq!(arg.dir.to_str(), Some("."));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
