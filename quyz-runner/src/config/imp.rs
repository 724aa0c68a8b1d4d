// Copyright (c) The quyz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{CollectorConfig, PartialCollectorConfig, Patterns, Volume};
use crate::errors::{ConfigParseError, ConfigParseErrorKind, ConfigValueError};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::debug;

/// The resolved quyz configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QuyzConfig {
    /// Options for the collector.
    pub collector: CollectorConfig,

    /// Whether to colorize output.
    pub colors: bool,

    /// Whether to print a header when each file starts.
    pub print_file_names: bool,

    /// Whether ancestor scopes' hooks apply to a test, or only the innermost
    /// scope's.
    pub bubble_hooks: bool,

    /// How much the reporter prints.
    pub volume: Volume,

    /// Whether to run in dev mode, using `collector.sequence` as the file order.
    pub dev: bool,

    /// Files always loaded first.
    pub require: Vec<Utf8PathBuf>,

    /// Whether `afterEach` hooks still run after a `beforeEach` hook failed.
    pub after_each_on_setup_failure: bool,

    /// Whether any hook failure aborts the run.
    pub abort_on_hook_failure: bool,
}

impl Default for QuyzConfig {
    fn default() -> Self {
        Self {
            collector: CollectorConfig::default(),
            colors: true,
            print_file_names: false,
            bubble_hooks: true,
            volume: Volume::default(),
            dev: false,
            require: Vec::new(),
            after_each_on_setup_failure: true,
            abort_on_hook_failure: false,
        }
    }
}

impl QuyzConfig {
    /// The default location of the config within the root directory.
    pub const CONFIG_PATH: &'static str = "quyz.toml";

    /// Contains the default config as a TOML file.
    ///
    /// Repository-specific configuration is layered on top of the default config.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../../default-config.toml");

    /// Reads the config, layering `config_file` (or `root_dir/quyz.toml` if it
    /// exists) over the embedded defaults.
    pub fn from_sources(
        root_dir: &Utf8Path,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = root_dir.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };
        debug!("reading config from {config_file}");

        let builder = Self::make_default_config().add_source(source);
        Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(config_file, kind))
    }

    /// Merges `partial` into this config. Options absent from `partial` are
    /// left alone.
    ///
    /// On error, `self` is unchanged.
    pub fn merge(&mut self, partial: &PartialConfig) -> Result<(), ConfigValueError> {
        partial.validate()?;

        let PartialConfig {
            collector,
            colors,
            print_file_names,
            bubble_hooks,
            volume,
            dev,
            require,
            after_each_on_setup_failure,
            abort_on_hook_failure,
        } = partial;

        if let Some(root) = &collector.root {
            self.collector.root = root.clone();
        }
        if let Some(patterns) = &collector.patterns {
            self.collector.patterns = patterns.clone();
        }
        if let Some(ignore) = &collector.ignore {
            self.collector.ignore = ignore.clone();
        }
        if let Some(sequence) = &collector.sequence {
            self.collector.sequence = sequence.clone();
        }
        if let Some(colors) = colors {
            self.colors = *colors;
        }
        if let Some(print_file_names) = print_file_names {
            self.print_file_names = *print_file_names;
        }
        if let Some(bubble_hooks) = bubble_hooks {
            self.bubble_hooks = *bubble_hooks;
        }
        if let Some(level) = volume {
            self.volume = Volume::from_level(*level)?;
        }
        if let Some(dev) = dev {
            self.dev = *dev;
        }
        if let Some(require) = require {
            self.require = require.clone();
        }
        if let Some(after_each_on_setup_failure) = after_each_on_setup_failure {
            self.after_each_on_setup_failure = *after_each_on_setup_failure;
        }
        if let Some(abort_on_hook_failure) = abort_on_hook_failure {
            self.abort_on_hook_failure = *abort_on_hook_failure;
        }
        Ok(())
    }

    /// Checks constraints that span several options.
    pub fn validate(&self) -> Result<(), ConfigValueError> {
        self.collector.patterns.compile("collector.match")?;
        self.collector.ignore.compile("collector.ignore")?;
        if self.dev && self.collector.sequence.is_empty() {
            return Err(ConfigValueError::new(
                "dev",
                "dev mode requires a non-empty collector.sequence",
            ));
        }
        Ok(())
    }

    // ---
    // Helper methods
    // ---

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<Self, ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let deserialized: QuyzConfigDeserialize = serde_path_to_error::deserialize(ignored_de)
            .map_err(|error| {
                // The config crate reports the key as well; keep only the path.
                let path = error.path().clone();
                let error = match error.into_inner() {
                    ConfigError::At { error, .. } => *error,
                    other => other,
                };
                ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                    path, error,
                )))
            })?;

        if !ignored.is_empty() {
            return Err(ConfigParseErrorKind::UnknownKeys(ignored));
        }

        let config = deserialized.into_config()?;
        config.validate()?;
        Ok(config)
    }
}

/// A subset of the configuration, merged on top of a [`QuyzConfig`].
///
/// Test files carry these in `configure` calls; the command line produces one
/// from its flags.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PartialConfig {
    /// Collector options.
    pub collector: PartialCollectorConfig,

    /// See [`QuyzConfig::colors`].
    pub colors: Option<bool>,

    /// See [`QuyzConfig::print_file_names`].
    pub print_file_names: Option<bool>,

    /// See [`QuyzConfig::bubble_hooks`].
    pub bubble_hooks: Option<bool>,

    /// See [`QuyzConfig::volume`]. Must be between 0 and [`Volume::MAX`].
    pub volume: Option<u8>,

    /// See [`QuyzConfig::dev`].
    pub dev: Option<bool>,

    /// See [`QuyzConfig::require`].
    pub require: Option<Vec<Utf8PathBuf>>,

    /// See [`QuyzConfig::after_each_on_setup_failure`].
    pub after_each_on_setup_failure: Option<bool>,

    /// See [`QuyzConfig::abort_on_hook_failure`].
    pub abort_on_hook_failure: Option<bool>,
}

impl PartialConfig {
    /// Checks each option that is set.
    pub fn validate(&self) -> Result<(), ConfigValueError> {
        if let Some(level) = self.volume {
            Volume::from_level(level)?;
        }
        if let Some(patterns) = &self.collector.patterns {
            patterns.compile("collector.match")?;
        }
        if let Some(ignore) = &self.collector.ignore {
            ignore.compile("collector.ignore")?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct QuyzConfigDeserialize {
    collector: CollectorDeserialize,
    colors: bool,
    print_file_names: bool,
    bubble_hooks: bool,
    volume: u8,
    dev: bool,
    require: Vec<Utf8PathBuf>,
    after_each_on_setup_failure: bool,
    abort_on_hook_failure: bool,
}

impl QuyzConfigDeserialize {
    fn into_config(self) -> Result<QuyzConfig, ConfigValueError> {
        Ok(QuyzConfig {
            collector: CollectorConfig {
                root: self.collector.root,
                patterns: self.collector.patterns,
                ignore: self.collector.ignore,
                sequence: self.collector.sequence,
            },
            colors: self.colors,
            print_file_names: self.print_file_names,
            bubble_hooks: self.bubble_hooks,
            volume: Volume::from_level(self.volume)?,
            dev: self.dev,
            require: self.require,
            after_each_on_setup_failure: self.after_each_on_setup_failure,
            abort_on_hook_failure: self.abort_on_hook_failure,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CollectorDeserialize {
    root: Utf8PathBuf,
    #[serde(rename = "match")]
    patterns: Patterns,
    ignore: Patterns,
    sequence: Vec<Utf8PathBuf>,
}
