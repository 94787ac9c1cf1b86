//! Serve command - launches the API server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Args;
use tracing::info;

use synergia_config::SynergiaConfig;
use synergia_domain::{DomainServices, Store};
use synergia_server::{AppState, Server, ServerConfig};
use synergia_session::{CacheConfig, ClerkConfig, ClerkProvider, SessionCache, SessionVerifier};

use super::Context;

/// Arguments for the serve command.
///
/// CLI arguments override config file and environment values.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind to, host:port (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// SQLite database path (overrides config)
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Identity provider API base URL (overrides config)
    #[arg(long)]
    pub clerk_api_url: Option<String>,
}

impl ServeArgs {
    fn apply(self, config: &mut SynergiaConfig) {
        if let Some(bind) = self.bind {
            config.server_mut().bind = bind;
        }
        if let Some(path) = self.database {
            config.database_mut().path = path;
        }
        if let Some(url) = self.clerk_api_url {
            config.auth_mut().clerk_api_url = url;
        }
    }
}

/// Run the serve command.
pub async fn run(args: ServeArgs, ctx: Context) -> Result<()> {
    let mut config = ctx.loaded.config.clone();
    args.apply(&mut config);
    config.validate()?;

    let server_cfg = config.server();
    let auth = config.auth();
    let database = config.database();
    let addr: SocketAddr = server_cfg.socket_addr()?;

    // ── Store ───────────────────────────────────────────────────────────

    let store = Store::open(&database.path)
        .with_context(|| format!("failed to open database {}", database.path.display()))?;
    let services = DomainServices::new(Arc::new(store));
    info!(path = %database.path.display(), "Database ready");

    // ── Session verification ────────────────────────────────────────────

    let secret = auth
        .clerk_secret_key
        .clone()
        .filter(|key| !key.is_empty())
        .context("no identity provider secret: set CLERK_SECRET_KEY or [auth] clerk_secret_key")?;
    let provider = ClerkProvider::new(
        ClerkConfig::new(secret)
            .with_api_url(auth.clerk_api_url.clone())
            .with_timeout(auth.verify_timeout()),
    )?;

    let cache_config = CacheConfig::new()
        .with_max_size(auth.cache_max_size)
        .with_ttl(auth.cache_ttl())
        .with_cleanup_task(auth.cleanup_enabled)
        .with_cleanup_interval(
            auth.cleanup_interval()
                .unwrap_or(synergia_session::DEFAULT_CLEANUP_INTERVAL),
        );
    let cache = SessionCache::new(cache_config);
    let cleanup = cache.spawn_cleanup_task();

    let verifier = SessionVerifier::new(cache, Arc::new(provider))
        .with_timeout(auth.verify_timeout());

    info!(
        max_size = auth.cache_max_size,
        ttl_secs = auth.cache_ttl_secs,
        api_url = %auth.clerk_api_url,
        "Session verification configured"
    );
    if ctx.verbose {
        for path in ctx.loaded.loaded_from() {
            println!("Config: {}", path.display());
        }
    }

    // ── Start server ────────────────────────────────────────────────────

    let server_config = ServerConfig::new()
        .with_bind_address(addr)
        .with_request_logging(server_cfg.request_logging)
        .with_cors_origins(server_cfg.cors_origins);

    let server = Server::from_state(AppState::new(server_config, verifier, services));

    println!("Synergia server starting on http://{}", addr);
    println!("Press Ctrl+C to stop");

    server.run_until(addr, shutdown_signal()).await?;

    if let Some(handle) = cleanup {
        handle.abort();
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
