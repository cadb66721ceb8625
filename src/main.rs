// src/main.rs
mod chart;
mod client;
mod controller;
mod dom;
mod error;
mod layout;
mod model;
mod rank;
mod timeline;
mod web;

use std::{net::SocketAddr, pin::pin};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::client::ApiClient;
use crate::controller::PageController;

#[derive(Parser)]
#[command(name = "dnsdash")]
#[command(about = "dnsmasq statistics -> dashboard page", long_about = None)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the dashboard once
    Render {
        /// Base URL of the resolver API
        #[arg(long, default_value = "http://localhost:8080")]
        api: String,

        /// Write the page here instead of stdout
        #[arg(long)]
        out: Option<String>,

        /// Entries shown in the domain and client lists
        #[arg(long, default_value_t = rank::DEFAULT_TOP_N)]
        top: usize,
    },

    /// Serve the dashboard and proxy /api to the resolver
    Serve {
        /// Base URL of the resolver API
        #[arg(long, default_value = "http://localhost:8080")]
        api: String,

        /// Bind address
        #[arg(long, default_value = "127.0.0.1:3001")]
        bind: String,

        /// Entries shown in the domain and client lists
        #[arg(long, default_value_t = rank::DEFAULT_TOP_N)]
        top: usize,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn api_client(api: &str) -> Result<ApiClient> {
    let base = Url::parse(api).with_context(|| format!("parse api url {}", api))?;
    Ok(ApiClient::new(base))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.cmd {
        Command::Render { api, out, top } => {
            let controller = PageController::new(api_client(&api)?, top);

            let mut writer: Box<dyn AsyncWrite + Unpin + Send> = match &out {
                Some(path) => Box::new(
                    tokio::fs::File::create(path)
                        .await
                        .with_context(|| format!("create {}", path))?,
                ),
                None => Box::new(tokio::io::stdout()),
            };

            // Panels are written as they finish.
            let mut html = pin!(controller.start().into_html());
            while let Some(chunk) = html.next().await {
                writer.write_all(chunk.as_bytes()).await.context("write page")?;
                writer.flush().await.context("flush page")?;
            }
            writer.write_all(b"\n").await.context("write page")?;
            writer.flush().await.context("flush page")?;

            if let Some(path) = out {
                tracing::info!(%path, "dashboard written");
            }
        }

        Command::Serve { api, bind, top } => {
            let bind: SocketAddr = bind.parse().context("parse bind addr")?;
            let state = web::AppState::new(api_client(&api)?, top);
            web::serve(state, bind).await?;
        }
    }

    Ok(())
}
