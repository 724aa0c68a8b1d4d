// Copyright (c) The quyz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Color choice and the stderr logger.

use clap::{Args, ValueEnum};
use owo_colors::{OwoColorize, Style};
use std::{fmt, sync::Once};
use supports_color::Stream;
use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
    level_filters::LevelFilter,
};
use tracing_subscriber::{
    Layer,
    filter::Targets,
    fmt::{FmtContext, FormatEvent, FormatFields, format},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// Log lines with this target are printed without a level prefix.
pub(crate) const NO_HEADING: &str = "quyz::no_heading";

#[derive(Copy, Clone, Debug, Args)]
#[must_use]
pub(crate) struct OutputOpts {
    /// Verbose log output
    #[arg(long, short, env = "QUYZ_VERBOSE")]
    pub(crate) verbose: bool,

    /// Produce color output: auto, always, never
    #[arg(
        long,
        value_enum,
        default_value_t,
        hide_possible_values = true,
        value_name = "WHEN",
        env = "QUYZ_COLOR"
    )]
    pub(crate) color: Color,
}

impl OutputOpts {
    pub(crate) fn init(self) -> OutputContext {
        init_logger(self.verbose, self.color.should_colorize(Stream::Stderr));
        OutputContext { color: self.color }
    }
}

#[derive(Copy, Clone, Debug)]
#[must_use]
pub(crate) struct OutputContext {
    color: Color,
}

impl OutputContext {
    /// The forced color choice for the report, if there is one.
    ///
    /// `None` means the report follows the `colors` option, including changes
    /// made by `configure` during the run.
    pub(crate) fn stdout_color_override(&self) -> Option<bool> {
        match self.color {
            Color::Auto if self.color.should_colorize(Stream::Stdout) => None,
            Color::Auto | Color::Never => Some(false),
            Color::Always => Some(true),
        }
    }
}

/// When to color output.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
#[must_use]
pub enum Color {
    /// Color when the stream is a terminal that supports it.
    #[default]
    Auto,
    /// Always color.
    Always,
    /// Never color.
    Never,
}

impl Color {
    fn should_colorize(self, stream: Stream) -> bool {
        match self {
            Color::Auto => supports_color::on_cached(stream).is_some(),
            Color::Always => true,
            Color::Never => false,
        }
    }
}

fn init_logger(verbose: bool, colorize: bool) {
    static INIT_LOGGER: Once = Once::new();

    INIT_LOGGER.call_once(|| {
        let default_level = if verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        };
        // An empty or unparseable QUYZ_LOG falls back to the default level.
        let targets = std::env::var("QUYZ_LOG")
            .ok()
            .filter(|level| !level.is_empty())
            .and_then(|level| level.parse::<Targets>().ok())
            .unwrap_or_else(|| Targets::new().with_default(default_level));

        let layer = tracing_subscriber::fmt::layer()
            .event_format(LevelPrefixFormat { colorize })
            .with_writer(std::io::stderr)
            .with_filter(targets);

        // Another subscriber may already be installed, e.g. by a test.
        let _ = tracing_subscriber::registry().with(layer).try_init();
    });
}

/// Formats a log line as `level: message`.
struct LevelPrefixFormat {
    colorize: bool,
}

impl LevelPrefixFormat {
    fn prefix(&self, level: Level) -> (&'static str, Style) {
        let (name, style) = match level {
            Level::ERROR => ("error", Style::new().red().bold()),
            Level::WARN => ("warning", Style::new().yellow().bold()),
            Level::INFO => ("info", Style::new().bold()),
            Level::DEBUG => ("debug", Style::new().bold()),
            Level::TRACE => ("trace", Style::new().dimmed()),
        };
        (name, if self.colorize { style } else { Style::new() })
    }
}

impl<S, N> FormatEvent<S, N> for LevelPrefixFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        if event.metadata().target() != NO_HEADING {
            let (name, style) = self.prefix(*event.metadata().level());
            write!(writer, "{}: ", name.style(style))?;
        }

        let mut message = MessageField::default();
        event.record(&mut message);
        writeln!(writer, "{}", message.0)
    }
}

/// Collects the `message` field of an event, ignoring the others.
#[derive(Default)]
struct MessageField(String);

impl Visit for MessageField {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}
