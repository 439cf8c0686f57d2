//! # gate-config
//!
//! Layered configuration loading for Gatehouse using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`GATEHOUSE_*` prefix, `__` as separator)
//! 2. Project-level `.gatehouse/config.toml`
//! 3. User-level `~/.config/gatehouse/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `GATEHOUSE_CLERK__SECRET_KEY` -> `clerk.secret_key`,
//! `GATEHOUSE_CLERK__REQUEST_TIMEOUT_SECS` -> `clerk.request_timeout_secs`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use gate_config::GatehouseConfig;
//!
//! let config = GatehouseConfig::load_with_dotenv().expect("config");
//! let clerk = config.require_clerk().expect("clerk secret key");
//! println!("Clerk API: {}", clerk.api_base());
//! ```

mod clerk;
mod error;

pub use clerk::ClerkConfig;
pub use error::ConfigError;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GatehouseConfig {
    #[serde(default)]
    pub clerk: ClerkConfig,
}

impl GatehouseConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need `.env` file loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` if a source cannot be parsed or a value
    /// has the wrong type.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv_from_workspace();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment directly or add providers on top.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".gatehouse/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("GATEHOUSE_").split("__"))
    }

    /// Return the Clerk section, or an error if no secret key is configured.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotConfigured` when `clerk.secret_key` is missing,
    /// and `ConfigError::InvalidValue` for a zero request timeout.
    pub fn require_clerk(&self) -> Result<&ClerkConfig, ConfigError> {
        self.clerk.validate()?;
        Ok(&self.clerk)
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gatehouse").join("config.toml"))
    }

    /// Load `.env` from the workspace root.
    ///
    /// Walks up from `CARGO_MANIFEST_DIR` (if available) looking for a `.env`
    /// file, then falls back to the current directory. Silently does nothing
    /// if none is found.
    fn load_dotenv_from_workspace() {
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let mut dir = PathBuf::from(manifest_dir);
            // crate -> crates/ -> workspace root
            for _ in 0..3 {
                let env_path = dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                    return;
                }
                if !dir.pop() {
                    break;
                }
            }
        }

        let _ = dotenvy::dotenv();
    }
}
