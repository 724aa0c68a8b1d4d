// Copyright (c) The quyz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::ConfigValueError;
use camino::Utf8PathBuf;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::fmt;

/// How much the reporter prints.
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
pub enum Volume {
    /// Print nothing.
    Silent,

    /// Print failures and the final summary.
    Failures,

    /// Print every test result.
    #[default]
    Results,

    /// Also print groups, one-shot callbacks and configuration changes.
    Verbose,
}

impl Volume {
    /// The highest accepted numeric level.
    pub const MAX: u8 = 3;

    /// Converts a numeric level, as found in configuration, into a volume.
    pub fn from_level(level: u8) -> Result<Self, ConfigValueError> {
        match level {
            0 => Ok(Self::Silent),
            1 => Ok(Self::Failures),
            2 => Ok(Self::Results),
            3 => Ok(Self::Verbose),
            other => Err(ConfigValueError::new(
                "volume",
                format!("must be between 0 and {}, found {other}", Self::MAX),
            )),
        }
    }

    /// The numeric level.
    pub fn level(self) -> u8 {
        match self {
            Self::Silent => 0,
            Self::Failures => 1,
            Self::Results => 2,
            Self::Verbose => 3,
        }
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}

/// A list of globs. Configuration accepts either a single string or a list.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(from = "StringOrList")]
pub struct Patterns(Vec<String>);

impl Patterns {
    /// Creates a new list of patterns.
    pub fn new(patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(patterns.into_iter().map(Into::into).collect())
    }

    /// Returns true if there are no patterns.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compiles the patterns into a glob set, reporting failures against
    /// `option`.
    pub(crate) fn compile(&self, option: &str) -> Result<GlobSet, ConfigValueError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.0 {
            let glob = Glob::new(pattern).map_err(|error| {
                ConfigValueError::new(option, format!("invalid glob `{pattern}`: {error}"))
            })?;
            builder.add(glob);
        }
        builder
            .build()
            .map_err(|error| ConfigValueError::new(option, error.to_string()))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl From<StringOrList> for Patterns {
    fn from(value: StringOrList) -> Self {
        match value {
            StringOrList::One(pattern) => Self(vec![pattern]),
            StringOrList::Many(patterns) => Self(patterns),
        }
    }
}

/// Options that control which files the collector selects.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CollectorConfig {
    /// Only files under this directory are considered.
    pub root: Utf8PathBuf,

    /// Globs, relative to `root`, selecting files.
    pub patterns: Patterns,

    /// Globs, relative to `root`, excluding files.
    pub ignore: Patterns,

    /// The literal file order used in dev mode.
    pub sequence: Vec<Utf8PathBuf>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            root: Utf8PathBuf::from("."),
            patterns: Patterns::new(["**"]),
            ignore: Patterns::default(),
            sequence: Vec::new(),
        }
    }
}

/// A subset of [`CollectorConfig`], merged on top of it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PartialCollectorConfig {
    /// See [`CollectorConfig::root`].
    pub root: Option<Utf8PathBuf>,

    /// See [`CollectorConfig::patterns`].
    pub patterns: Option<Patterns>,

    /// See [`CollectorConfig::ignore`].
    pub ignore: Option<Patterns>,

    /// See [`CollectorConfig::sequence`].
    pub sequence: Option<Vec<Utf8PathBuf>>,
}

impl PartialCollectorConfig {
    /// Returns true if no collector option is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
