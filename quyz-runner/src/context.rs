// Copyright (c) The quyz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregated results of a run.
//!
//! A [`Context`] is created per run by the [`TestRunner`](crate::runner::TestRunner),
//! which is its only writer, through a [`ContextManager`].

use crate::errors::TestFailure;
use std::time::Duration;
use tracing::debug;

/// The summary of a run: counts, accumulated runtime and captured errors.
#[derive(Debug, Default)]
pub struct Context {
    passed: usize,
    failed: usize,
    total_runtime: Duration,
    errors: Vec<(TestFailure, String)>,
}

impl Context {
    /// The number of tests that passed.
    pub fn passed(&self) -> usize {
        self.passed
    }

    /// The number of tests that failed.
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// The number of tests that were processed.
    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    /// The sum of every test's runtime.
    pub fn total_runtime(&self) -> Duration {
        self.total_runtime
    }

    /// The captured errors and the titles they belong to, in the order they
    /// were recorded.
    ///
    /// This contains one entry per failed test, plus one entry per `afterAll`
    /// hook failure (titled with the scope).
    pub fn errors(&self) -> &[(TestFailure, String)] {
        &self.errors
    }

    /// Returns true if no test failed and no error was captured.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.errors.is_empty()
    }
}

/// The only writer of a [`Context`].
#[derive(Debug, Default)]
pub struct ContextManager {
    context: Context,
}

impl ContextManager {
    /// Creates a manager around an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a passing test.
    pub fn pass(&mut self, title: &str, runtime: Duration) {
        debug!(title, ?runtime, "test passed");
        self.context.passed += 1;
        self.context.total_runtime += runtime;
    }

    /// Records a failing test.
    pub fn fail(&mut self, title: &str, runtime: Duration, error: TestFailure) {
        debug!(title, ?runtime, %error, "test failed");
        self.context.failed += 1;
        self.context.total_runtime += runtime;
        self.context.errors.push((error, title.to_owned()));
    }

    /// Records an error that is not attributable to a test, such as an
    /// `afterAll` hook failure. Counts are unaffected.
    pub fn record_scope_error(&mut self, scope: &str, error: TestFailure) {
        debug!(scope, %error, "scope hook failed");
        self.context.errors.push((error, scope.to_owned()));
    }

    /// Returns the current aggregate.
    pub fn get(&self) -> &Context {
        &self.context
    }

    /// Consumes the manager, returning the aggregate.
    pub fn into_context(self) -> Context {
        self.context
    }
}
