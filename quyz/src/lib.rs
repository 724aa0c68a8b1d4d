// Copyright (c) The quyz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A describe/it test harness for `harness = false` test targets.
//!
//! Register test files on a [`Quyz`] and hand control to [`Quyz::main`]:
//!
//! ```no_run
//! use quyz::Quyz;
//!
//! fn main() -> color_eyre::Result<()> {
//!     Quyz::new()
//!         .setup(|s| {
//!             s.global_setup(|| println!("starting"));
//!         })
//!         .file("tests/math.rs", |s| {
//!             s.describe("addition", |s| {
//!                 s.before_each(|| ());
//!                 s.it("adds", || assert_eq!(2 + 2, 4));
//!             });
//!         })
//!         .main()
//! }
//! ```
//!
//! The process exits with one of the codes in [`QuyzExitCode`].

mod dispatch;
mod errors;
mod output;

pub use errors::{ExpectedError, QuyzExitCode};
pub use output::Color;
pub use quyz_runner::{action::Title, config::PartialConfig, recorder::Recorder};

use camino::Utf8PathBuf;
use clap::Parser;
use dispatch::QuyzApp;
use quyz_runner::{
    collector::{TestFile, TestRegistry},
    reporter::ReporterOutput,
};
use std::{ffi::OsString, io::Write};

/// The test files and setup declarations of a test target.
#[derive(Clone, Debug, Default)]
#[must_use]
pub struct Quyz {
    registry: TestRegistry,
}

impl Quyz {
    /// Creates an empty harness.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds setup declarations, recorded ahead of every file.
    ///
    /// This is where `global_setup` and `global_teardown` belong.
    pub fn setup(mut self, define: impl Fn(&mut Recorder) + Send + Sync + 'static) -> Self {
        self.registry.add_setup(define);
        self
    }

    /// Registers a test file. Files run in registration order unless dev mode
    /// picks a sequence.
    pub fn file(
        mut self,
        path: impl Into<Utf8PathBuf>,
        define: impl Fn(&mut Recorder) + Send + Sync + 'static,
    ) -> Self {
        self.registry.add_file(TestFile::new(path, define));
        self
    }

    /// Parses the process's command line, runs the tests and exits.
    pub fn main(self) -> color_eyre::Result<()> {
        color_eyre::install()?;
        let _ = enable_ansi_support::enable_ansi_support();

        let app = QuyzApp::parse();
        match app.exec(&self.registry, ReporterOutput::Terminal) {
            Ok(code) => std::process::exit(code),
            Err(error) => {
                error.display_to_stderr();
                std::process::exit(error.process_exit_code())
            }
        }
    }

    /// Runs the tests with `args` as the command line, writing the report to
    /// `writer`, and returns the exit code.
    ///
    /// The first argument is the program name.
    pub fn exec<I, T>(&self, args: I, writer: &mut dyn Write) -> Result<i32, ExpectedError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let app =
            QuyzApp::try_parse_from(args).map_err(|err| ExpectedError::ArgumentParseError { err })?;
        app.exec(&self.registry, ReporterOutput::Writer(writer))
    }
}
