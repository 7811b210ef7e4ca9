use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use log::LevelFilter;
use serde::Deserialize;

pub mod setup;

/// Prefix of environment variables that override configuration values.
pub const ENV_PREFIX: &str = "PHP_CONVERT_";

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Maximum array nesting depth for decoding. 0 means no limit.
    pub max_depth: usize,
    pub pretty: bool,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogConfig {
    pub color: Option<bool>,
    #[serde(default)]
    pub time: bool,
    pub default: Option<LevelFilter>,
    #[serde(flatten)]
    pub modules: HashMap<String, LevelFilter>,
}

impl Config {
    /// Gets the configured depth limit for a [`serde_php::Codec`].
    pub fn depth_limit(&self) -> Option<usize> {
        (self.max_depth != 0).then_some(self.max_depth)
    }
}

/// Loads the configuration from all layers.
///
/// Later layers take precedence:
/// 1. built-in defaults
/// 2. `php_convert.toml` in the working directory, if present
/// 3. the `extra` file, if specified
/// 4. environment variables prefixed with [`ENV_PREFIX`]
pub fn build(extra: Option<&Path>) -> Result<Config> {
    use setup::{Builder, Env, File, TomlText};

    let default_config = include_str!("../assets/default_config.toml");

    let mut builder = Builder::new()
        .add_layer(TomlText::new(default_config))
        .add_layer(File::new("php_convert.toml").required(false));

    if let Some(extra) = extra {
        builder = builder.add_layer(File::new(extra));
    }

    builder.add_layer(Env::prefixed(ENV_PREFIX)).build()
}
