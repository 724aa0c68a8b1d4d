// Copyright (c) The quyz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use quyz_runner::{
    action::Action,
    config::QuyzConfig,
    context::Context,
    errors::RunAbortedError,
    reporter::{TestEvent, TestEventKind},
    runner::TestRunnerBuilder,
};
use std::{
    sync::{Arc, Mutex, Once},
    time::Duration,
};

pub(crate) fn test_init() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        color_eyre::install().expect("color-eyre installed once");
    });
}

/// A shared, ordered log of everything callbacks did.
#[derive(Clone, Debug, Default)]
pub(crate) struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, entry: impl Into<String>) {
        self.0.lock().expect("log lock poisoned").push(entry.into());
    }

    /// A callback that records `label` and succeeds.
    pub(crate) fn entry(&self, label: &str) -> impl Fn() + Send + Sync + 'static {
        let log = self.clone();
        let label = label.to_owned();
        move || log.push(label.clone())
    }

    /// A callback that records `label` and fails.
    pub(crate) fn failing(
        &self,
        label: &str,
    ) -> impl Fn() -> Result<(), String> + Send + Sync + 'static {
        let log = self.clone();
        let label = label.to_owned();
        move || {
            log.push(label.clone());
            Err(format!("{label} failed"))
        }
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.lock().expect("log lock poisoned").clone()
    }

    pub(crate) fn count(&self, label: &str) -> usize {
        self.entries().iter().filter(|entry| *entry == label).count()
    }
}

/// What a run produced.
#[derive(Debug)]
pub(crate) struct RunOutcome {
    pub(crate) result: Result<Context, RunAbortedError>,
    pub(crate) events: Vec<String>,
    pub(crate) runtimes: Vec<Duration>,
}

impl RunOutcome {
    pub(crate) fn context(&self) -> &Context {
        match &self.result {
            Ok(context) => context,
            Err(error) => panic!("run aborted: {error}"),
        }
    }
}

pub(crate) fn run(actions: &[Action]) -> RunOutcome {
    run_with(actions, QuyzConfig::default())
}

pub(crate) fn run_with(actions: &[Action], config: QuyzConfig) -> RunOutcome {
    let runner = TestRunnerBuilder::new(config)
        .build(actions)
        .expect("runner built");

    let mut events = Vec::new();
    let mut runtimes = Vec::new();
    let result = runner.execute(|event: TestEvent<'_>| {
        if let TestEventKind::TestPassed { runtime, .. } | TestEventKind::TestFailed { runtime, .. } =
            &event.kind
        {
            runtimes.push(*runtime);
        }
        events.push(describe(&event.kind));
    });

    RunOutcome {
        result,
        events,
        runtimes,
    }
}

fn describe(kind: &TestEventKind<'_>) -> String {
    match kind {
        TestEventKind::RunStarted { test_count } => format!("run-started:{test_count}"),
        TestEventKind::FileStarted { path } => format!("file-started:{path}"),
        TestEventKind::FileFinished { path } => format!("file-finished:{path}"),
        TestEventKind::GroupStarted { title, .. } => format!("group-started:{title}"),
        TestEventKind::TestPassed { title, .. } => format!("passed:{title}"),
        TestEventKind::TestFailed { title, .. } => format!("failed:{title}"),
        TestEventKind::ScopeHookFailed { scope, .. } => format!("scope-hook-failed:{scope}"),
        TestEventKind::OneShotFinished { .. } => "one-shot".to_owned(),
        TestEventKind::OneShotSkipped { .. } => "one-shot-skipped".to_owned(),
        TestEventKind::ConfigChanged { .. } => "config-changed".to_owned(),
        TestEventKind::GlobalTeardownFailed { .. } => "global-teardown-failed".to_owned(),
        TestEventKind::RunFinished { .. } => "run-finished".to_owned(),
    }
}
