use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use courier_transfer::effects::USER_AGENT;
use courier_transfer::{CancelScope, Downloader, ReqwestClient};
use serde::Serialize;

use crate::config::Config;

mod checksum;
mod clean;
mod download;
mod upload;

#[derive(Debug, Parser)]
#[command(name = "courier", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    /// TOML file with retry, upload and user agent settings
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(alias = "dl", name = "download", about = "Download a URL to a local file")]
    Download(download::DownloadArg),
    #[command(name = "image", about = "Download an image from a {w}x{h}.{f} template URL")]
    Image(download::ImageArg),
    #[command(alias = "up", name = "upload", about = "Upload a file or directory to an asset service")]
    Upload(upload::UploadArg),
    #[command(alias = "sum", name = "checksum", about = "Print or verify a file checksum")]
    Checksum(checksum::ChecksumArg),
    #[command(name = "clean", about = "Remove temp files left behind by interrupted downloads")]
    Clean(clean::CleanArg),
}

impl Commands {
    pub async fn run(self, session: &Session) -> Result<()> {
        match self {
            Self::Download(arg) => arg.run(session).await,
            Self::Image(arg) => arg.run(session).await,
            Self::Upload(arg) => arg.run(session).await,
            Self::Checksum(arg) => arg.run(),
            Self::Clean(arg) => arg.run(),
        }
    }
}

/// Everything a command needs besides its own arguments.
pub struct Session {
    pub config: Config,
    pub scope:  CancelScope,
}

impl Session {
    pub fn new(config: Config, scope: CancelScope) -> Self { Self { config, scope } }

    pub fn client(&self) -> Result<ReqwestClient> { ReqwestClient::new().context("failed to set up HTTP client") }

    pub fn user_agent(&self) -> &str { self.config.user_agent.as_deref().unwrap_or(USER_AGENT) }

    pub fn downloader(&self) -> Result<Downloader<ReqwestClient>> {
        Ok(Downloader::new(self.client()?)
            .with_policy(self.config.retry.policy())
            .with_user_agent(self.user_agent()))
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_is_well_formed() { App::command().debug_assert(); }

    #[test]
    fn test_global_config_flag() {
        let app = App::try_parse_from(["courier", "clean", ".", "--config", "courier.toml"]).unwrap();
        assert_eq!(app.config, Some(PathBuf::from("courier.toml")));
        assert!(matches!(app.cmd, Commands::Clean(_)));
    }
}
