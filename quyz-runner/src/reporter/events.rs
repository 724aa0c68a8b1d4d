// Copyright (c) The quyz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    action::CallSite,
    config::QuyzConfig,
    context::Context,
    errors::{CallbackError, TestFailure},
};
use camino::Utf8Path;
use chrono::{DateTime, FixedOffset};
use std::time::Duration;

/// A test event.
///
/// Events are produced by a [`TestRunner`](crate::runner::TestRunner) and consumed by a
/// [`TestReporter`](crate::reporter::TestReporter).
#[derive(Clone, Debug)]
pub struct TestEvent<'a> {
    /// The time at which the event was generated, including the offset from UTC.
    pub timestamp: DateTime<FixedOffset>,

    /// The amount of time elapsed since the start of the test run.
    pub elapsed: Duration,

    /// The kind of test event this is.
    pub kind: TestEventKind<'a>,
}

/// The kind of test event this is.
///
/// Forms part of [`TestEvent`].
#[derive(Clone, Debug)]
pub enum TestEventKind<'a> {
    /// The test run started.
    RunStarted {
        /// The number of test actions in the list.
        test_count: usize,
    },

    /// A file started.
    FileStarted {
        /// The file's path.
        path: &'a Utf8Path,
    },

    /// A file finished.
    FileFinished {
        /// The file's path.
        path: &'a Utf8Path,
    },

    /// A `describe` group started.
    GroupStarted {
        /// The group title.
        title: &'a str,

        /// The number of scopes open outside this group, including the file.
        depth: usize,
    },

    /// A test passed.
    TestPassed {
        /// The test title.
        title: &'a str,

        /// Time spent in `beforeEach` hooks, the body and `afterEach` hooks.
        runtime: Duration,
    },

    /// A test failed, or was not attempted because its setup failed.
    TestFailed {
        /// The test title.
        title: &'a str,

        /// Time spent in hooks and the body.
        runtime: Duration,

        /// Why the test failed.
        failure: &'a TestFailure,
    },

    /// A hook failed while no test was in flight, e.g. an `afterAll` hook.
    ScopeHookFailed {
        /// The scope the hook was registered in.
        scope: &'a str,

        /// The failure.
        failure: &'a TestFailure,
    },

    /// A `do_once` callback ran.
    OneShotFinished {
        /// Where it was declared.
        site: CallSite,
    },

    /// A `do_once` callback was skipped because it had already run.
    OneShotSkipped {
        /// Where it was declared.
        site: CallSite,
    },

    /// A `configure` action was merged into the active configuration.
    ConfigChanged {
        /// The configuration now in effect.
        config: &'a QuyzConfig,
    },

    /// A global teardown callback failed.
    GlobalTeardownFailed {
        /// The error.
        error: &'a CallbackError,
    },

    /// The run finished.
    RunFinished {
        /// The final aggregate.
        context: &'a Context,
    },
}
