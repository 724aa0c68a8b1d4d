// Copyright (c) The quyz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::NO_HEADING;
use camino::FromPathBufError;
use quyz_runner::errors::*;
use std::error::Error;
use thiserror::Error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

/// Documented exit codes for quyz runs.
///
/// Unknown or unexpected failures always result in exit code 1.
pub enum QuyzExitCode {}

impl QuyzExitCode {
    /// Every test passed.
    pub const OK: i32 = 0;

    /// No tests were run, but no other errors occurred.
    pub const NO_TESTS_RUN: i32 = 4;

    /// One or more tests or hooks failed.
    pub const TEST_RUN_FAILED: i32 = 100;

    /// A fatal error stopped the run partway through.
    pub const RUN_ABORTED: i32 = 105;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;

    /// A user issue happened while setting up the run.
    pub const SETUP_ERROR: i32 = 96;
}

// The #[error()] strings are placeholders: errors are meant to be printed
// with display_to_stderr.

/// An error that quyz expects and reports without a backtrace.
#[derive(Debug, Error)]
pub enum ExpectedError {
    #[error("could not determine the current directory")]
    CurrentDirFailed {
        #[source]
        err: std::io::Error,
    },
    #[error("current directory is not valid UTF-8")]
    CurrentDirInvalidUtf8 {
        #[source]
        err: FromPathBufError,
    },
    #[error("failed to parse arguments")]
    ArgumentParseError {
        #[source]
        err: clap::Error,
    },
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("invalid command-line option")]
    ArgumentConfigError {
        #[source]
        err: ConfigValueError,
    },
    #[error("collect error")]
    CollectError {
        #[from]
        err: CollectError,
    },
    #[error("test runner build error")]
    TestRunnerBuildError {
        #[from]
        err: TestRunnerBuildError,
    },
    #[error("run aborted")]
    RunAborted {
        #[from]
        err: RunAbortedError,
    },
    #[error("error writing test output")]
    WriteEventError {
        #[from]
        err: WriteEventError,
    },
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::CurrentDirFailed { .. }
            | Self::CurrentDirInvalidUtf8 { .. }
            | Self::ArgumentParseError { .. }
            | Self::ConfigParseError { .. }
            | Self::ArgumentConfigError { .. }
            | Self::CollectError { .. }
            | Self::TestRunnerBuildError { .. } => QuyzExitCode::SETUP_ERROR,
            Self::RunAborted { .. } => QuyzExitCode::RUN_ABORTED,
            Self::WriteEventError { .. } => QuyzExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr through the logger.
    pub fn display_to_stderr(&self) {
        let mut next_error = match self {
            Self::CurrentDirFailed { err } => {
                tracing::error!("could not determine the current directory");
                Some(err as &dyn Error)
            }
            Self::CurrentDirInvalidUtf8 { err } => {
                tracing::error!("current directory is not valid UTF-8");
                Some(err as &dyn Error)
            }
            Self::ArgumentParseError { err } => {
                tracing::error!(target: NO_HEADING, "{}", err.render());
                None
            }
            Self::ConfigParseError { err } => {
                tracing::error!("failed to parse config at `{}`", err.config_file());
                err.source()
            }
            Self::ArgumentConfigError { err } => {
                tracing::error!("{err}");
                None
            }
            Self::CollectError { err } => {
                tracing::error!("failed to collect test files");
                Some(err as &dyn Error)
            }
            Self::TestRunnerBuildError { err } => {
                tracing::error!("failed to build test runner");
                Some(err as &dyn Error)
            }
            Self::RunAborted { err } => {
                tracing::error!("test run aborted: {err}");
                err.source()
            }
            Self::WriteEventError { err } => {
                tracing::error!("failed to write test output");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            tracing::error!(target: NO_HEADING, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
