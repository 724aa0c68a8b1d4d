// Copyright (c) The quyz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prints out test execution events.
//!
//! The main structure in this module is [`TestReporter`].

use super::displayer::{DisplayReporter, DisplayReporterBuilder};
use crate::{config::Volume, errors::WriteEventError, reporter::TestEvent};
use std::io::{self, Write};

/// Output destination for the reporter.
///
/// This is usually the terminal, but can be an in-memory buffer for tests.
pub enum ReporterOutput<'a> {
    /// Produce output on standard output.
    Terminal,

    /// Write output to the given writer.
    Writer(&'a mut dyn Write),
}

/// Test reporter builder.
#[derive(Debug, Default)]
pub struct ReporterBuilder {
    should_colorize: bool,
    colors_follow_config: bool,
    volume: Volume,
    print_file_names: bool,
}

impl ReporterBuilder {
    /// Set to true if the reporter should colorize output.
    pub fn set_colorize(&mut self, should_colorize: bool) -> &mut Self {
        self.should_colorize = should_colorize;
        self
    }

    /// Set to true if `configure` calls may turn colors on or off.
    ///
    /// This is false when the color choice was forced, for example from the
    /// command line or because the terminal has no color support.
    pub fn set_colors_follow_config(&mut self, colors_follow_config: bool) -> &mut Self {
        self.colors_follow_config = colors_follow_config;
        self
    }

    /// Sets how much to print.
    pub fn set_volume(&mut self, volume: Volume) -> &mut Self {
        self.volume = volume;
        self
    }

    /// Set to true to print a header when each file starts.
    pub fn set_print_file_names(&mut self, print_file_names: bool) -> &mut Self {
        self.print_file_names = print_file_names;
        self
    }

    /// Creates a new test reporter.
    pub fn build<'a>(&self, output: ReporterOutput<'a>) -> TestReporter<'a> {
        let display_reporter = DisplayReporterBuilder {
            volume: self.volume,
            print_file_names: self.print_file_names,
            should_colorize: self.should_colorize,
            colors_follow_config: self.colors_follow_config,
        }
        .build();

        TestReporter {
            display_reporter,
            output,
        }
    }
}

/// Writes test events in human-readable form.
pub struct TestReporter<'a> {
    display_reporter: DisplayReporter,
    output: ReporterOutput<'a>,
}

impl TestReporter<'_> {
    /// Report a test event.
    pub fn report_event(&mut self, event: &TestEvent<'_>) -> Result<(), WriteEventError> {
        match &mut self.output {
            ReporterOutput::Terminal => {
                let mut stdout = io::stdout().lock();
                self.display_reporter.write_event(event, &mut stdout)?;
                stdout.flush()?;
            }
            ReporterOutput::Writer(writer) => {
                self.display_reporter.write_event(event, &mut **writer)?;
            }
        }
        Ok(())
    }
}
