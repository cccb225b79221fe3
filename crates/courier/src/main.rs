use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use courier_transfer::CancelScope;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::cli::{App, Session};
use crate::config::Config;

mod cli;
mod config;
mod exit;
mod remote;

/// Set to `json` for one JSON object per log line.
const LOG_FORMAT_ENV: &str = "COURIER_LOG_FORMAT";

fn init_tracing() {
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|value| value.eq_ignore_ascii_case("json"));
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("courier=info"));

    // stdout carries command output
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let app = App::parse();

    match run(app).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit::code_for(&err))
        }
    }
}

async fn run(app: App) -> Result<()> {
    let config = Config::load(app.config.as_deref())?;

    let token = CancellationToken::new();
    tokio::spawn({
        let token = token.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, abandoning in-flight transfers");
                token.cancel();
            }
        }
    });

    let session = Session::new(config, CancelScope::from_token(token));
    app.cmd.run(&session).await
}
