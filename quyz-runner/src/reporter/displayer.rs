// Copyright (c) The quyz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human-readable output of test events.

use super::helpers::{Styles, indent_continuation};
use crate::{
    config::Volume,
    context::Context,
    errors::DisplayErrorChain,
    helpers::{DisplayMillis, plural},
    reporter::{TestEvent, TestEventKind},
};
use owo_colors::OwoColorize;
use std::io::{self, Write};
use swrite::{SWrite, swrite};

// Width of the `PASSED:  ` prefix, used to align failure details.
const STATUS_WIDTH: usize = 9;

#[derive(Debug)]
pub(super) struct DisplayReporterBuilder {
    pub(super) volume: Volume,
    pub(super) print_file_names: bool,
    pub(super) should_colorize: bool,
    pub(super) colors_follow_config: bool,
}

impl DisplayReporterBuilder {
    pub(super) fn build(self) -> DisplayReporter {
        DisplayReporter {
            volume: self.volume,
            print_file_names: self.print_file_names,
            colors_follow_config: self.colors_follow_config,
            styles: make_styles(self.should_colorize),
        }
    }
}

#[derive(Debug)]
pub(super) struct DisplayReporter {
    volume: Volume,
    print_file_names: bool,
    // Whether the `colors` option of `configure` calls is honored.
    colors_follow_config: bool,
    styles: Styles,
}

impl DisplayReporter {
    pub(super) fn write_event(
        &mut self,
        event: &TestEvent<'_>,
        writer: &mut dyn Write,
    ) -> io::Result<()> {
        match &event.kind {
            TestEventKind::RunStarted { test_count } => {
                if self.volume >= Volume::Verbose {
                    writeln!(
                        writer,
                        "Starting {} {}",
                        test_count.style(self.styles.count),
                        plural::tests_str(*test_count),
                    )?;
                }
            }
            TestEventKind::FileStarted { path } => {
                if self.print_file_names && self.volume >= Volume::Results {
                    writeln!(writer, "{}", path.style(self.styles.file))?;
                }
            }
            TestEventKind::FileFinished { .. } => {}
            TestEventKind::GroupStarted { title, depth } => {
                if self.volume >= Volume::Verbose {
                    let indent = "  ".repeat(depth.saturating_sub(1));
                    writeln!(writer, "{indent}{}", title.style(self.styles.group))?;
                }
            }
            TestEventKind::TestPassed { title, runtime } => {
                if self.volume >= Volume::Results {
                    writeln!(
                        writer,
                        "{}  {title} ({})",
                        "PASSED:".style(self.styles.pass),
                        DisplayMillis(*runtime),
                    )?;
                }
            }
            TestEventKind::TestFailed {
                title,
                runtime,
                failure,
            } => {
                if self.volume >= Volume::Failures {
                    writeln!(
                        writer,
                        "{}  {title} ({})",
                        "FAILED:".style(self.styles.fail),
                        DisplayMillis(*runtime),
                    )?;
                    self.write_details(&DisplayErrorChain::new(*failure).to_string(), writer)?;
                }
            }
            TestEventKind::ScopeHookFailed { scope, failure } => {
                if self.volume >= Volume::Failures {
                    writeln!(writer, "{}  {scope}", "FAILED:".style(self.styles.fail))?;
                    self.write_details(&DisplayErrorChain::new(*failure).to_string(), writer)?;
                }
            }
            TestEventKind::OneShotFinished { site } => {
                if self.volume >= Volume::Verbose {
                    writeln!(writer, "{}    {site}", "ONCE:".style(self.styles.skip))?;
                }
            }
            TestEventKind::OneShotSkipped { site } => {
                if self.volume >= Volume::Verbose {
                    writeln!(
                        writer,
                        "{}    {site} (already ran)",
                        "ONCE:".style(self.styles.skip)
                    )?;
                }
            }
            TestEventKind::ConfigChanged { config } => {
                self.volume = config.volume;
                self.print_file_names = config.print_file_names;
                if self.colors_follow_config {
                    self.styles = make_styles(config.colors);
                }
                if self.volume >= Volume::Verbose {
                    writeln!(
                        writer,
                        "{}  bubble-hooks = {}, volume = {}",
                        "CONFIG:".style(self.styles.skip),
                        config.bubble_hooks,
                        config.volume,
                    )?;
                }
            }
            TestEventKind::GlobalTeardownFailed { error } => {
                if self.volume >= Volume::Failures {
                    writeln!(
                        writer,
                        "{}  globalTeardown",
                        "FAILED:".style(self.styles.fail)
                    )?;
                    self.write_details(&DisplayErrorChain::new(*error).to_string(), writer)?;
                }
            }
            TestEventKind::RunFinished { context } => {
                if self.volume >= Volume::Failures {
                    self.write_summary(context, writer)?;
                }
            }
        }
        Ok(())
    }

    fn write_details(&self, details: &str, writer: &mut dyn Write) -> io::Result<()> {
        let padding = " ".repeat(STATUS_WIDTH);
        writeln!(
            writer,
            "{padding}{}",
            indent_continuation(details, STATUS_WIDTH)
        )
    }

    fn write_summary(&self, context: &Context, writer: &mut dyn Write) -> io::Result<()> {
        let style = if context.is_success() {
            self.styles.pass
        } else if context.total() == 0 {
            self.styles.skip
        } else {
            self.styles.fail
        };

        writeln!(writer, "------------")?;
        writeln!(
            writer,
            "{} {} {} run: {} ({})",
            "Summary:".style(style),
            context.total().style(self.styles.count),
            plural::tests_str(context.total()),
            summary_str(context, &self.styles),
            DisplayMillis(context.total_runtime()),
        )?;

        for (failure, title) in context.errors() {
            let chain = DisplayErrorChain::new(failure).to_string();
            writeln!(
                writer,
                "  {} {title}: {}",
                "-".style(self.styles.fail),
                indent_continuation(&chain, 4),
            )?;
        }
        Ok(())
    }
}

fn make_styles(should_colorize: bool) -> Styles {
    let mut styles = Styles::default();
    if should_colorize {
        styles.colorize();
    }
    styles
}

fn summary_str(context: &Context, styles: &Styles) -> String {
    let mut out = String::new();
    swrite!(
        out,
        "{} {}",
        context.passed().style(styles.count),
        "passed".style(styles.pass)
    );
    if context.failed() > 0 {
        swrite!(
            out,
            ", {} {}",
            context.failed().style(styles.count),
            "failed".style(styles.fail)
        );
    }
    let extra = context.errors().len() - context.failed();
    if extra > 0 {
        swrite!(
            out,
            ", {} hook {}",
            extra.style(styles.count),
            plural::errors_str(extra)
        );
    }
    out
}
