//! chatcsvd: the keyword chat server.
//!
//! - `POST /chat`: `{"message": "..."}` → `{"message": "...", "redirect": ...}`
//! - `OPTIONS *`: CORS preflight
//! - everything else: static files from `public/` and `/pages/` from `pages/`
//!
//! The rule table is read once at startup; every exchange is appended to the
//! interaction log in the background.
//!
//! Build and run: `cargo run --bin chatcsvd -- --responses responses.csv`

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use miette::{IntoDiagnostic, Result};

use chatcsv::config::ServerConfig;
use chatcsv::error::ChatResult;
use chatcsv::server::{AppState, router};

#[derive(Parser)]
#[command(name = "chatcsvd", version, about = "Keyword-driven chat server")]
struct Args {
    /// TOML config file; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to bind (overrides CHATCSV_BIND).
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on (overrides PORT).
    #[arg(long)]
    port: Option<u16>,

    /// Keyword rule table.
    #[arg(long)]
    responses: Option<PathBuf>,

    /// Interaction log to append to.
    #[arg(long)]
    chatlog: Option<PathBuf>,

    /// Root for static assets.
    #[arg(long)]
    public_dir: Option<PathBuf>,

    /// Root for standalone pages.
    #[arg(long)]
    pages_dir: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> ChatResult<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)?,
            None => ServerConfig::default(),
        };
        config.apply_env()?;

        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(responses) = self.responses {
            config.responses = responses;
        }
        if let Some(chatlog) = self.chatlog {
            config.chatlog = chatlog;
        }
        if let Some(public_dir) = self.public_dir {
            config.public_dir = public_dir;
        }
        if let Some(pages_dir) = self.pages_dir {
            config.pages_dir = pages_dir;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Args::parse().into_config()?;
    let state = Arc::new(AppState::from_config(&config));
    let app = router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .into_diagnostic()?;
    tracing::info!("chatcsvd listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let ctrl_c = tokio::signal::ctrl_c();
            #[cfg(unix)]
            {
                match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        tokio::select! {
                            _ = ctrl_c => {},
                            _ = sigterm.recv() => {},
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "cannot register SIGTERM handler");
                        ctrl_c.await.ok();
                    }
                }
            }
            #[cfg(not(unix))]
            {
                ctrl_c.await.ok();
            }
            tracing::info!("chatcsvd shutting down");
        })
        .await
        .into_diagnostic()?;

    Ok(())
}
