// Copyright (c) The quyz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Selecting and recording test files.
//!
//! Test files are registered in a [`TestRegistry`] in discovery order. The
//! [`Collector`] picks which of them take part in a run, records each one
//! inside a file bracket and concatenates the results into the single action
//! list handed to the runner.

use crate::{
    action::Action,
    config::QuyzConfig,
    errors::{CollectError, RecordError},
    helpers::plural,
    recorder::Recorder,
};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use debug_ignore::DebugIgnore;
use std::sync::Arc;
use tracing::{debug, warn};

type DefineFn = dyn Fn(&mut Recorder) + Send + Sync;

/// A test file: a path and the declarations it makes.
#[derive(Clone, Debug)]
pub struct TestFile {
    path: Utf8PathBuf,
    define: DebugIgnore<Arc<DefineFn>>,
}

impl TestFile {
    /// Creates a new test file.
    pub fn new(
        path: impl Into<Utf8PathBuf>,
        define: impl Fn(&mut Recorder) + Send + Sync + 'static,
    ) -> Self {
        Self {
            path: path.into(),
            define: DebugIgnore(Arc::new(define)),
        }
    }

    /// The path this file was registered under.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Records this file's declarations, bracketed by file markers.
    pub fn record(&self) -> Result<Vec<Action>, RecordError> {
        Recorder::record_file(self.path.clone(), |recorder| (self.define)(recorder))
    }
}

/// Test files and setup declarations, in registration order.
#[derive(Clone, Debug, Default)]
pub struct TestRegistry {
    setup: Vec<DebugIgnore<Arc<DefineFn>>>,
    files: Vec<TestFile>,
}

impl TestRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers top-level setup declarations: global setup and teardown,
    /// `do_once` and `configure`. These are recorded before any file.
    pub fn add_setup(&mut self, define: impl Fn(&mut Recorder) + Send + Sync + 'static) {
        self.setup.push(DebugIgnore(Arc::new(define)));
    }

    /// Registers a test file.
    pub fn add_file(&mut self, file: TestFile) {
        self.files.push(file);
    }

    fn find(&self, path: &Utf8Path) -> Option<&TestFile> {
        let path = normalize(path);
        self.files.iter().find(|file| normalize(&file.path) == path)
    }
}

/// The recorded contribution of every selected file.
#[derive(Debug)]
pub struct TestCollection {
    /// The concatenated action list.
    pub actions: Vec<Action>,

    /// The files that contributed actions, in run order.
    pub files: Vec<Utf8PathBuf>,

    /// Files skipped because of a usage error while recording.
    pub skipped: Vec<(Utf8PathBuf, RecordError)>,
}

impl TestCollection {
    /// The number of tests in the action list.
    pub fn test_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|action| matches!(action, Action::Test(_)))
            .count()
    }
}

/// Selects test files from a registry according to the configuration.
#[derive(Debug)]
pub struct Collector<'a> {
    registry: &'a TestRegistry,
    config: &'a QuyzConfig,
}

impl<'a> Collector<'a> {
    /// Creates a new collector.
    pub fn new(registry: &'a TestRegistry, config: &'a QuyzConfig) -> Self {
        Self { registry, config }
    }

    /// Selects the files taking part in the run, in run order.
    ///
    /// Required files come first, once each. In dev mode the rest of the order
    /// is the literal `collector.sequence`; otherwise it is registration order,
    /// filtered by `collector.root`, `collector.match` and `collector.ignore`.
    pub fn select(&self) -> Result<Vec<&'a TestFile>, CollectError> {
        let registry = self.registry;
        let mut selected = Vec::new();
        for path in &self.config.require {
            let file = registry
                .find(path)
                .ok_or_else(|| CollectError::UnknownRequiredFile { path: path.clone() })?;
            if !selected
                .iter()
                .any(|other: &&TestFile| std::ptr::eq(*other, file))
            {
                selected.push(file);
            }
        }
        let required = selected.len();

        if self.config.dev {
            for path in &self.config.collector.sequence {
                let file = registry.find(path).ok_or_else(|| {
                    CollectError::UnknownSequenceFile {
                        path: path.clone(),
                        known: registry
                            .files
                            .iter()
                            .map(|file| file.path.clone())
                            .collect(),
                    }
                })?;
                selected.push(file);
            }
        } else {
            let collector = &self.config.collector;
            let patterns = collector
                .patterns
                .compile("collector.match")
                .map_err(CollectError::InvalidPattern)?;
            let ignore = collector
                .ignore
                .compile("collector.ignore")
                .map_err(CollectError::InvalidPattern)?;
            let root = normalize(&collector.root);

            for file in &registry.files {
                if selected[..required]
                    .iter()
                    .any(|other| std::ptr::eq(*other, file))
                {
                    continue;
                }
                let path = normalize(&file.path);
                let Ok(relative) = path.strip_prefix(&root) else {
                    debug!("{} is outside root {}", file.path, collector.root);
                    continue;
                };
                if patterns.is_match(relative) && !ignore.is_match(relative) {
                    selected.push(file);
                } else {
                    debug!("{} is excluded by collector patterns", file.path);
                }
            }
        }

        Ok(selected)
    }

    /// Records the setup declarations and every selected file.
    ///
    /// A file with a usage error is skipped. A configuration error in a file
    /// fails the collection.
    pub fn collect(&self) -> Result<TestCollection, CollectError> {
        let mut actions = Vec::new();
        for define in &self.registry.setup {
            let recorded = Recorder::record(|recorder| (define)(recorder))
                .map_err(CollectError::Setup)?;
            actions.extend(recorded);
        }

        let mut files = Vec::new();
        let mut skipped = Vec::new();
        for file in self.select()? {
            match file.record() {
                Ok(recorded) => {
                    debug!("recorded {} ({} actions)", file.path, recorded.len());
                    actions.extend(recorded);
                    files.push(file.path.clone());
                }
                Err(error) if error.is_fatal() => {
                    return Err(CollectError::Configuration {
                        path: file.path.clone(),
                        error,
                    });
                }
                Err(error) => {
                    warn!("skipping {}: {error}", file.path);
                    skipped.push((file.path.clone(), error));
                }
            }
        }

        debug!(
            "collected {} {} ({} skipped)",
            files.len(),
            plural::files_str(files.len()),
            skipped.len(),
        );
        Ok(TestCollection {
            actions,
            files,
            skipped,
        })
    }
}

// Drops `.` components so that `./tests/a.rs` and `tests/a.rs` compare equal
// and a root of `.` is a prefix of every relative path.
fn normalize(path: &Utf8Path) -> Utf8PathBuf {
    path.components()
        .filter(|component| !matches!(component, Utf8Component::CurDir))
        .collect()
}
