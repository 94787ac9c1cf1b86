//! Config command - configuration inspection and bootstrap.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use synergia_config::{BIND_ENV, DATABASE_PATH_ENV, SECRET_KEY_ENV};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the resolved configuration (secrets redacted)
    Show,

    /// Show which config files are loaded and their precedence
    Which,

    /// Initialize a config file with defaults
    Init {
        /// Create project-local config (./synergia.toml) instead of user config
        #[arg(long)]
        local: bool,
    },

    /// Show the user configuration file path
    Path,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Which => cmd_which(ctx),
        ConfigCommand::Init { local } => cmd_init(local),
        ConfigCommand::Path => cmd_path(),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let loaded = &ctx.loaded;
    let config = &loaded.config;

    println!("# Synergia Configuration\n");

    let sources = loaded.loaded_from();
    if sources.is_empty() {
        println!("No config files loaded (using defaults)\n");
    } else {
        println!("Config files:");
        for source in &sources {
            println!("  {}", source.display());
        }
        println!();
    }

    let server = config.server();
    println!("Server:");
    println!("  bind: {}", server.bind);
    println!("  cors_origins: {}", server.cors_origins.join(", "));
    println!("  request_logging: {}", server.request_logging);
    println!();

    let auth = config.auth();
    let secret_status = match auth.clerk_secret_key.as_deref() {
        Some(key) if !key.is_empty() => "set",
        _ => "missing",
    };
    println!("Auth:");
    println!("  clerk_api_url: {}", auth.clerk_api_url);
    println!("  clerk_secret_key: ({})", secret_status);
    println!("  cache_max_size: {}", auth.cache_max_size);
    println!("  cache_ttl_secs: {}", auth.cache_ttl_secs);
    println!("  verify_timeout_secs: {}", auth.verify_timeout_secs);
    match auth.cleanup_interval() {
        Some(interval) => println!("  cleanup: every {}s", interval.as_secs()),
        None => println!("  cleanup: disabled"),
    }
    println!();

    println!("Database:");
    println!("  path: {}", config.database().path.display());
    println!();

    let logging = config.logging();
    println!("Logging:");
    match (logging.file_enabled, logging.log_dir()) {
        (true, Some(dir)) => println!("  file: {}", dir.display()),
        _ => println!("  file: disabled"),
    }
    println!();

    if !loaded.warnings.is_empty() {
        println!("Warnings:");
        for w in &loaded.warnings {
            println!("  ⚠ {}", w);
        }
        println!();
    }

    if ctx.verbose {
        println!("---\nResolved:\n");
        println!("{:#?}", auth);
    }

    Ok(())
}

fn cmd_which(ctx: &Context) -> Result<()> {
    println!("Config file search order (later overrides earlier):\n");

    for source in &ctx.loaded.sources {
        let status = if source.loaded {
            "✓ loaded"
        } else {
            "· not found"
        };
        println!("  {} {}", status, source.path.display());
    }

    println!();
    println!(
        "Environment overrides: {}, {}, {}",
        SECRET_KEY_ENV, DATABASE_PATH_ENV, BIND_ENV
    );
    Ok(())
}

fn cmd_init(local: bool) -> Result<()> {
    let path = if local {
        PathBuf::from("synergia.toml")
    } else {
        let dir = synergia_config::xdg_config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        std::fs::create_dir_all(&dir)?;
        dir.join("config.toml")
    };

    if path.exists() {
        println!("Config file already exists: {}", path.display());
        return Ok(());
    }

    std::fs::write(&path, CONFIG_TEMPLATE)?;
    println!("Created config file: {}", path.display());
    println!("Set {} in the environment before running 'synergia serve'.", SECRET_KEY_ENV);
    Ok(())
}

fn cmd_path() -> Result<()> {
    if let Some(path) = synergia_config::xdg_config_path() {
        println!("{}", path.display());
    } else {
        eprintln!("Could not determine config directory");
    }
    Ok(())
}

const CONFIG_TEMPLATE: &str = r#"# Synergia Configuration

[server]
bind = "127.0.0.1:8000"
cors_origins = ["http://localhost:5173"]
request_logging = true

[auth]
# The secret key is read from CLERK_SECRET_KEY; avoid storing it here.
clerk_api_url = "https://api.clerk.com/v1"
cache_max_size = 1000
cache_ttl_secs = 300
verify_timeout_secs = 10
cleanup_enabled = true
cleanup_interval_secs = 60

[database]
path = "synergia.db"

[logging]
file_enabled = true
# dir = "/var/log/synergia"
"#;
