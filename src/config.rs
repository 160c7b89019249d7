//! Runtime settings
//!
//! Layered with the `config` crate, lowest priority first:
//! 1. built-in defaults
//! 2. `mdscript.toml` in the working directory (optional), or the file given
//!    with `--config` (required)
//! 3. `MDSCRIPT_*` environment variables, e.g. `MDSCRIPT_MAX_CALL_DEPTH=500`
//!
//! Command-line flags are applied on top by the CLI.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::interpreter::executor::VmOptions;

/// Name searched for in the working directory, with any supported extension
pub const DEFAULT_CONFIG_FILE: &str = "mdscript";

/// Prefix of the environment variables that override settings
pub const ENV_PREFIX: &str = "MDSCRIPT";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Function a run starts in
    pub entry: String,
    pub max_call_depth: usize,
    pub tail_calls: bool,
    /// Filter used when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        let defaults = VmOptions::default();
        Self {
            entry: "main".to_string(),
            max_call_depth: defaults.max_call_depth,
            tail_calls: defaults.tail_calls,
            log_level: "warn".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from defaults, a config file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Self::defaults()?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let defaults = Settings::default();
        Config::builder()
            .set_default("entry", defaults.entry)?
            .set_default("max_call_depth", defaults.max_call_depth as i64)?
            .set_default("tail_calls", defaults.tail_calls)?
            .set_default("log_level", defaults.log_level)
    }

    pub fn vm_options(&self) -> VmOptions {
        VmOptions {
            max_call_depth: self.max_call_depth,
            tail_calls: self.tail_calls,
        }
    }
}
