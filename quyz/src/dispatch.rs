// Copyright (c) The quyz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::{ExpectedError, QuyzExitCode, Result},
    output::OutputOpts,
};
use camino::Utf8PathBuf;
use clap::{Args, Parser};
use quyz_runner::{
    collector::{Collector, TestRegistry},
    config::{PartialCollectorConfig, PartialConfig, Patterns, QuyzConfig},
    context::Context,
    reporter::{ReporterBuilder, ReporterOutput},
    runner::TestRunnerBuilder,
};
use tracing::debug;

/// Runs describe/it test files.
#[derive(Debug, Parser)]
#[command(name = "quyz", version, max_term_width = 100)]
pub(crate) struct QuyzApp {
    /// Config file [default: quyz.toml in the current directory]
    #[arg(long, value_name = "PATH", env = "QUYZ_CONFIG_FILE")]
    config_file: Option<Utf8PathBuf>,

    #[command(flatten)]
    collector: CollectorOpts,

    #[command(flatten)]
    run: RunOpts,

    #[command(flatten)]
    output: OutputOpts,
}

#[derive(Debug, Default, Args)]
#[command(next_help_heading = "Collector options")]
struct CollectorOpts {
    /// Only consider test files under this directory
    #[arg(long, value_name = "DIR")]
    root: Option<Utf8PathBuf>,

    /// Glob selecting test files, relative to the root (may be repeated)
    #[arg(long = "match", value_name = "GLOB")]
    patterns: Vec<String>,

    /// Glob excluding test files, relative to the root (may be repeated)
    #[arg(long, value_name = "GLOB")]
    ignore: Vec<String>,

    /// Run the files of the dev sequence, in order
    #[arg(long, env = "QUYZ_DEV")]
    dev: bool,

    /// A file in the dev sequence (may be repeated)
    #[arg(long, value_name = "PATH")]
    sequence: Vec<Utf8PathBuf>,

    /// A file loaded before all others (may be repeated)
    #[arg(long, value_name = "PATH")]
    require: Vec<Utf8PathBuf>,
}

impl CollectorOpts {
    fn to_partial(&self) -> (PartialCollectorConfig, Option<bool>, Option<Vec<Utf8PathBuf>>) {
        let collector = PartialCollectorConfig {
            root: self.root.clone(),
            patterns: non_empty(&self.patterns).map(Patterns::new),
            ignore: non_empty(&self.ignore).map(Patterns::new),
            sequence: non_empty(&self.sequence).map(<[_]>::to_vec),
        };
        let dev = self.dev.then_some(true);
        let require = non_empty(&self.require).map(<[_]>::to_vec);
        (collector, dev, require)
    }
}

#[derive(Debug, Default, Args)]
#[command(next_help_heading = "Run options")]
struct RunOpts {
    /// How much to print, from 0 (nothing) to 3 (everything)
    #[arg(long, value_name = "LEVEL", env = "QUYZ_VOLUME")]
    volume: Option<u8>,

    /// Only apply the hooks of a test's innermost scope
    #[arg(long)]
    no_bubble_hooks: bool,

    /// Print a header line when each test file starts
    #[arg(long)]
    print_file_names: bool,

    /// Abort the run on the first hook failure
    #[arg(long)]
    abort_on_hook_failure: bool,
}

impl QuyzApp {
    /// Builds the command-line overrides, leaving unset options alone.
    fn partial_config(&self) -> PartialConfig {
        let (collector, dev, require) = self.collector.to_partial();
        PartialConfig {
            collector,
            dev,
            require,
            volume: self.run.volume,
            bubble_hooks: self.run.no_bubble_hooks.then_some(false),
            print_file_names: self.run.print_file_names.then_some(true),
            abort_on_hook_failure: self.run.abort_on_hook_failure.then_some(true),
            ..PartialConfig::default()
        }
    }

    fn load_config(&self) -> Result<QuyzConfig> {
        let current_dir =
            std::env::current_dir().map_err(|err| ExpectedError::CurrentDirFailed { err })?;
        let current_dir = Utf8PathBuf::try_from(current_dir)
            .map_err(|err| ExpectedError::CurrentDirInvalidUtf8 { err })?;

        let mut config = QuyzConfig::from_sources(&current_dir, self.config_file.as_deref())?;
        config
            .merge(&self.partial_config())
            .and_then(|()| config.validate())
            .map_err(|err| ExpectedError::ArgumentConfigError { err })?;
        Ok(config)
    }

    /// Collects, runs and reports the registered files, returning the exit code.
    pub(crate) fn exec(self, registry: &TestRegistry, output: ReporterOutput<'_>) -> Result<i32> {
        let output_cx = self.output.init();
        let config = self.load_config()?;

        let collection = Collector::new(registry, &config).collect()?;
        debug!(
            "running {} tests from {} files",
            collection.test_count(),
            collection.files.len(),
        );

        let color_override = output_cx.stdout_color_override();
        let mut reporter_builder = ReporterBuilder::default();
        reporter_builder
            .set_colorize(color_override.unwrap_or(config.colors))
            .set_colors_follow_config(color_override.is_none())
            .set_volume(config.volume)
            .set_print_file_names(config.print_file_names);
        let mut reporter = reporter_builder.build(output);

        let runner = TestRunnerBuilder::new(config).build(&collection.actions)?;

        // The first write error is kept; the run itself carries on.
        let mut write_error = None;
        let context = runner.execute(|event| {
            if write_error.is_some() {
                return;
            }
            if let Err(err) = reporter.report_event(&event) {
                write_error = Some(err);
            }
        })?;

        if let Some(err) = write_error {
            return Err(err.into());
        }
        Ok(final_exit_code(&context))
    }
}

fn final_exit_code(context: &Context) -> i32 {
    if !context.is_success() {
        QuyzExitCode::TEST_RUN_FAILED
    } else if context.total() == 0 {
        QuyzExitCode::NO_TESTS_RUN
    } else {
        QuyzExitCode::OK
    }
}

fn non_empty<T>(values: &[T]) -> Option<&[T]> {
    (!values.is_empty()).then_some(values)
}
