// Copyright (c) The quyz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by quyz.

use crate::action::{BoxError, HookKind};
use camino::Utf8PathBuf;
use config::ConfigError;
use itertools::Itertools;
use std::{any::Any, collections::BTreeSet, fmt};
use thiserror::Error;

/// An error produced by a test body, hook or lifecycle callback.
#[derive(Debug, Error)]
pub enum CallbackError {
    /// The callback returned an error.
    #[error("{0}")]
    Error(BoxError),

    /// The callback panicked.
    #[error("panicked: {message}")]
    Panic {
        /// The panic message, if it was a string.
        message: String,
    },
}

impl CallbackError {
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        Self::Panic {
            message: panic_message(&*payload),
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "<non-string panic payload>".to_owned()
    }
}

/// Why a test was recorded as failed.
#[derive(Debug, Error)]
pub enum TestFailure {
    /// The test body failed.
    #[error("test failed")]
    Body(#[source] CallbackError),

    /// A hook guarding (or cleaning up after) the test failed.
    #[error("{kind} hook in `{scope}` failed")]
    Hook {
        /// The kind of hook that failed.
        kind: HookKind,

        /// The title of the scope the hook was registered in.
        scope: String,

        /// The underlying error.
        #[source]
        error: CallbackError,
    },

    /// The test was not attempted because a `beforeAll` hook of an enclosing
    /// scope failed earlier.
    #[error("not run: beforeAll hook in `{scope}` failed earlier")]
    SetupFailed {
        /// The scope whose `beforeAll` chain failed.
        scope: String,
    },

    /// A global teardown callback failed after every test had run.
    #[error("globalTeardown failed")]
    GlobalTeardown(#[source] CallbackError),
}

/// An invalid value for a configuration option.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("Option '{option}': {message}")]
pub struct ConfigValueError {
    option: String,
    message: String,
}

impl ConfigValueError {
    pub(crate) fn new(option: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            option: option.into(),
            message: message.into(),
        }
    }

    /// The name of the offending option.
    pub fn option(&self) -> &str {
        &self.option
    }
}

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse quyz config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file that failed to parse.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }

    /// Returns the kind of error.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of [`ConfigParseError`].
#[derive(Debug, Error)]
pub enum ConfigParseErrorKind {
    /// The layered configuration could not be built.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// The configuration could not be deserialized.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),

    /// Unknown keys were present.
    #[error("unknown configuration keys: {}", .0.iter().join(", "))]
    UnknownKeys(BTreeSet<String>),

    /// A value was present but invalid.
    #[error(transparent)]
    InvalidValue(#[from] ConfigValueError),
}

/// Malformed use of the test-definition DSL.
///
/// A file whose recording produces one of these contributes nothing to the run.
#[derive(Clone, Debug, Error)]
pub enum RecordError {
    /// A hook was registered while no file or group was open.
    #[error("{kind} hook registered outside any file or describe block")]
    HookOutsideScope {
        /// The kind of hook.
        kind: HookKind,
    },

    /// A test was declared while no file or group was open.
    #[error("test `{title}` declared outside any file or describe block")]
    TestOutsideScope {
        /// The test title.
        title: String,
    },

    /// A describe block was declared while no file or group was open.
    #[error("describe block `{title}` declared outside any file or describe block")]
    GroupOutsideScope {
        /// The group title.
        title: String,
    },

    /// A global lifecycle callback was registered inside a file or group.
    #[error("{name} may only be registered before any file begins")]
    GlobalInsideScope {
        /// `globalSetup` or `globalTeardown`.
        name: &'static str,
    },

    /// A `describe` body panicked while it was being recorded.
    #[error("describe block `{title}` panicked while recording: {message}")]
    GroupBodyPanicked {
        /// The group title.
        title: String,

        /// The panic message.
        message: String,
    },

    /// A file's definition panicked outside any `describe` block.
    #[error("definition panicked while recording: {message}")]
    DefinitionPanicked {
        /// The panic message.
        message: String,
    },

    /// A `configure` call carried an invalid value.
    #[error("invalid configuration")]
    InvalidConfig(#[source] ConfigValueError),
}

impl RecordError {
    /// Returns true if this error should abort the whole run rather than just
    /// the file being recorded.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidConfig(_))
    }
}

/// An error that occurred while collecting test files.
#[derive(Debug, Error)]
pub enum CollectError {
    /// A path in the dev-mode sequence is not a registered file.
    #[error("sequence entry `{path}` is not a registered test file (known files: {})", .known.iter().join(", "))]
    UnknownSequenceFile {
        /// The unknown path.
        path: Utf8PathBuf,

        /// The registered paths.
        known: Vec<Utf8PathBuf>,
    },

    /// A path in `require` is not a registered file.
    #[error("required file `{path}` is not a registered test file")]
    UnknownRequiredFile {
        /// The unknown path.
        path: Utf8PathBuf,
    },

    /// A glob in `collector.match` or `collector.ignore` failed to compile.
    #[error("{}", .0)]
    InvalidPattern(ConfigValueError),

    /// Recording setup declarations failed.
    #[error("failed to record setup declarations")]
    Setup(#[source] RecordError),

    /// A file carried a configuration error, which is fatal for the run.
    #[error("invalid configuration in `{path}`")]
    Configuration {
        /// The file being recorded.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: RecordError,
    },
}

/// An error that occurred while building a [`TestRunner`](crate::runner::TestRunner).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TestRunnerBuildError {
    /// An error occurred while creating the Tokio runtime.
    #[error("error creating Tokio runtime")]
    TokioRuntimeCreate(#[source] std::io::Error),
}

/// A fatal error that stopped a run before every action was processed.
#[derive(Debug, Error)]
pub enum RunAbortedError {
    /// A global setup callback failed.
    #[error("global setup failed")]
    GlobalSetupFailed(#[source] CallbackError),

    /// A global setup action appeared after the first file had started.
    #[error("global setup declared after file `{path}` started")]
    MisplacedGlobalSetup {
        /// The first file.
        path: Utf8PathBuf,
    },

    /// A global setup action appeared after a test had run.
    #[error("global setup declared after test `{title}` ran")]
    GlobalSetupAfterTest {
        /// The first test.
        title: String,
    },

    /// A `do_once` callback failed.
    #[error("one-shot callback at {site} failed")]
    OneShotFailed {
        /// The call site.
        site: String,

        /// The underlying error.
        #[source]
        error: CallbackError,
    },

    /// A hook failed and `abort-on-hook-failure` is set.
    #[error("{kind} hook in `{scope}` failed")]
    HookFailed {
        /// The hook kind.
        kind: HookKind,

        /// The scope title.
        scope: String,

        /// The underlying error.
        #[source]
        error: CallbackError,
    },

    /// A `configure` action carried an invalid value.
    #[error("invalid configuration")]
    InvalidConfig(#[source] ConfigValueError),

    /// The scope markers of the action list do not pair up.
    #[error("unbalanced action list: {0}")]
    Unbalanced(UnbalancedScope),
}

/// Details about an unbalanced action list.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UnbalancedScope {
    /// An end marker was found with no open scope.
    UnexpectedEnd {
        /// The index of the action.
        index: usize,
    },

    /// An end marker closed a scope of a different kind.
    MismatchedEnd {
        /// The index of the action.
        index: usize,

        /// The title of the scope that was open.
        open: String,
    },

    /// A hook was registered with no open scope.
    OrphanHook {
        /// The index of the action.
        index: usize,
    },

    /// Scopes were still open after the last action.
    Unclosed {
        /// The titles of the open scopes, outermost first.
        open: Vec<String>,
    },
}

impl fmt::Display for UnbalancedScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEnd { index } => {
                write!(f, "action {index} closes a scope but none is open")
            }
            Self::MismatchedEnd { index, open } => {
                write!(f, "action {index} closes `{open}` with the wrong kind of end marker")
            }
            Self::OrphanHook { index } => {
                write!(f, "action {index} registers a hook but no scope is open")
            }
            Self::Unclosed { open } => {
                write!(f, "scopes still open at the end: {}", open.iter().join(" > "))
            }
        }
    }
}

/// An error occurred while writing an event.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteEventError {
    /// An error occurred while writing the event to the provided output.
    #[error("error writing to output")]
    Io(#[from] std::io::Error),
}

/// Displays an error followed by its chain of sources, one per line.
pub struct DisplayErrorChain<E>(E);

impl<E: std::error::Error> DisplayErrorChain<E> {
    /// Creates a new display wrapper.
    pub fn new(error: E) -> Self {
        Self(error)
    }
}

impl<E: std::error::Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(error) = source {
            write!(f, "\n  caused by: {error}")?;
            source = error.source();
        }
        Ok(())
    }
}
