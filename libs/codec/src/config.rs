//! # Codec Configuration
//!
//! Tunable limits for codec contexts, with defaults suitable for untrusted
//! input. Loaded from TOML and `PACKWRIGHT_*` environment overrides:
//!
//! ```toml
//! default_behaviour = "ignore"
//! max_depth = 64
//! max_compile_depth = 32
//! ```
//!
//! `PACKWRIGHT_MAX_DEPTH=16` overrides `max_depth` regardless of the file.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::behaviour::UnexpectedFieldBehaviour;

/// Limits and defaults applied by a [`CodecContext`](crate::CodecContext)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Behaviour bound into codecs requested without an explicit one
    pub default_behaviour: UnexpectedFieldBehaviour,

    /// Maximum container nesting accepted while deserialising
    pub max_depth: usize,

    /// Maximum chain of distinct nested types compiled in one session
    pub max_compile_depth: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            default_behaviour: UnexpectedFieldBehaviour::Throw,
            max_depth: 128,
            max_compile_depth: 64,
        }
    }
}

impl CodecConfig {
    pub const ENV_PREFIX: &'static str = "PACKWRIGHT";

    /// Parse a TOML document; absent keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: CodecConfig =
            toml::from_str(source).context("Failed to parse codec configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Layer defaults, an optional TOML file and environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Config::try_from(&CodecConfig::default())
            .context("Failed to encode default configuration")?;

        let mut builder = Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(Self::ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: CodecConfig = builder
            .build()
            .context("Failed to build codec configuration")?
            .try_deserialize()
            .context("Failed to deserialize codec configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.max_depth > 0, "max_depth must be at least 1");
        ensure!(self.max_compile_depth > 0, "max_compile_depth must be at least 1");
        Ok(())
    }
}
