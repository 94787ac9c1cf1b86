//! CLI command handlers.

pub mod config;
pub mod serve;

use synergia_config::LoadedConfig;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Configuration after file layering and env overrides.
    pub loaded: LoadedConfig,
    /// Verbose output enabled.
    pub verbose: bool,
}
