// Copyright (c) The quyz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The test-definition DSL.
//!
//! A [`Recorder`] turns declarations into a flat list of [`Action`]s. Nothing
//! is executed while recording except `describe` bodies, which run eagerly so
//! that everything they declare lands between the group's start and end
//! markers.

use crate::{
    action::{Action, Callback, HookKind, IntoCallbackResult, TestAction, Title},
    config::PartialConfig,
    errors::{RecordError, panic_message},
};
use camino::Utf8PathBuf;
use std::{
    fmt,
    future::Future,
    panic::{AssertUnwindSafe, Location},
};
use tracing::debug;

/// Records declarations into an ordered list of actions.
#[derive(Debug)]
pub struct Recorder {
    actions: Vec<Action>,
    // Open scopes, including the file bracket for file recorders.
    depth: usize,
    is_file: bool,
    error: Option<RecordError>,
}

impl Recorder {
    /// Creates a top-level recorder with no open scope.
    ///
    /// Top-level recorders are used for setup declarations: global setup and
    /// teardown, `do_once` and `configure`. Hooks need an enclosing scope.
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            depth: 0,
            is_file: false,
            error: None,
        }
    }

    /// Creates a recorder for the file at `path`. The recorded actions are
    /// bracketed by file start and end markers.
    pub fn for_file(path: impl Into<Utf8PathBuf>) -> Self {
        let mut recorder = Self::new();
        recorder
            .actions
            .push(Action::FileStart { path: path.into() });
        recorder.depth = 1;
        recorder.is_file = true;
        recorder
    }

    /// Records `define` with a top-level recorder.
    pub fn record(define: impl FnOnce(&mut Recorder)) -> Result<Vec<Action>, RecordError> {
        let mut recorder = Self::new();
        recorder.run_definition(define);
        recorder.finish()
    }

    /// Records `define` as the file at `path`.
    pub fn record_file(
        path: impl Into<Utf8PathBuf>,
        define: impl FnOnce(&mut Recorder),
    ) -> Result<Vec<Action>, RecordError> {
        let mut recorder = Self::for_file(path);
        recorder.run_definition(define);
        recorder.finish()
    }

    /// Declares a group. `body` runs immediately.
    pub fn describe(&mut self, title: impl Into<String>, body: impl FnOnce(&mut Recorder)) {
        self.describe_with(title.into(), (), |recorder, ()| body(recorder));
    }

    /// Declares a group whose title may be a template over `args`, which are
    /// passed to `body`.
    pub fn describe_with<'t, A>(
        &mut self,
        title: impl Into<Title<'t, A>>,
        args: A,
        body: impl FnOnce(&mut Recorder, A),
    ) {
        let title = title.into().resolve(&args);
        if self.depth == 0 {
            self.record_error(RecordError::GroupOutsideScope { title });
            return;
        }
        self.actions.push(Action::GroupStart {
            title: title.clone(),
        });
        self.depth += 1;

        let depth = self.depth;
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| body(self, args)));
        if let Err(payload) = result {
            // Nested groups close themselves, so nothing below us is left open.
            debug_assert_eq!(self.depth, depth);
            self.record_error(RecordError::GroupBodyPanicked {
                title,
                message: panic_message(&*payload),
            });
        }

        self.depth -= 1;
        self.actions.push(Action::GroupEnd);
    }

    /// Declares a test with a synchronous body.
    pub fn it(&mut self, title: impl Into<String>, body: impl Into<Callback>) {
        self.push_test(title.into(), body.into(), None);
    }

    /// Declares a test with an asynchronous body.
    pub fn it_async<F, Fut>(&mut self, title: impl Into<String>, body: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoCallbackResult,
    {
        self.push_test(title.into(), Callback::from_async(body), None);
    }

    /// Declares a parametrized test. The title may be a template over `args`;
    /// the body is called with `args`.
    pub fn it_with<'t, A, F, R>(&mut self, title: impl Into<Title<'t, A>>, args: A, body: F)
    where
        A: fmt::Debug + Send + Sync + 'static,
        F: Fn(&A) -> R + Send + Sync + 'static,
        R: IntoCallbackResult,
    {
        let title = title.into().resolve(&args);
        let rendered = format!("{args:?}");
        self.push_test(title, Callback::new(move || body(&args)), Some(rendered));
    }

    /// Declares a parametrized test with an asynchronous body. Each invocation
    /// receives a clone of `args`.
    pub fn it_with_async<'t, A, F, Fut>(
        &mut self,
        title: impl Into<Title<'t, A>>,
        args: A,
        body: F,
    ) where
        A: Clone + fmt::Debug + Send + Sync + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoCallbackResult,
    {
        let title = title.into().resolve(&args);
        let rendered = format!("{args:?}");
        let callback = Callback::from_async(move || body(args.clone()));
        self.push_test(title, callback, Some(rendered));
    }

    /// Registers a `beforeAll` hook on the innermost open scope.
    pub fn before_all(&mut self, callback: impl Into<Callback>) {
        self.hook(HookKind::BeforeAll, callback);
    }

    /// Registers a `beforeEach` hook on the innermost open scope.
    pub fn before_each(&mut self, callback: impl Into<Callback>) {
        self.hook(HookKind::BeforeEach, callback);
    }

    /// Registers an `afterAll` hook on the innermost open scope.
    pub fn after_all(&mut self, callback: impl Into<Callback>) {
        self.hook(HookKind::AfterAll, callback);
    }

    /// Registers an `afterEach` hook on the innermost open scope.
    pub fn after_each(&mut self, callback: impl Into<Callback>) {
        self.hook(HookKind::AfterEach, callback);
    }

    /// Registers a hook of the given kind on the innermost open scope.
    ///
    /// Registering a hook with no open scope is a usage error.
    pub fn hook(&mut self, kind: HookKind, callback: impl Into<Callback>) {
        if self.depth == 0 {
            self.record_error(RecordError::HookOutsideScope { kind });
            return;
        }
        self.actions.push(Action::HookRegister {
            kind,
            callback: callback.into(),
        });
    }

    /// Declares a callback that runs at most once per run, however many times
    /// the enclosing file is replayed. Callbacks are keyed by call site.
    #[track_caller]
    pub fn do_once(&mut self, callback: impl Into<Callback>) {
        let site = Location::caller();
        self.actions.push(Action::OneShot {
            site,
            callback: callback.into(),
        });
    }

    /// Declares a callback that runs once before any file.
    pub fn global_setup(&mut self, callback: impl Into<Callback>) {
        if self.check_global("globalSetup") {
            self.actions.push(Action::GlobalSetup {
                callback: callback.into(),
            });
        }
    }

    /// Declares a callback that runs once after the last action of the run.
    pub fn global_teardown(&mut self, callback: impl Into<Callback>) {
        if self.check_global("globalTeardown") {
            self.actions.push(Action::GlobalTeardown {
                callback: callback.into(),
            });
        }
    }

    /// Merges `config` into the active configuration from this point on.
    ///
    /// Invalid values are recorded as a configuration error.
    pub fn configure(&mut self, config: PartialConfig) {
        match config.validate() {
            Ok(()) => self.actions.push(Action::Configure { config }),
            Err(error) => self.record_error(RecordError::InvalidConfig(error)),
        }
    }

    /// Returns the actions recorded so far.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Finishes recording, closing the file bracket if there is one.
    ///
    /// Returns the first usage error, if any was recorded.
    pub fn finish(mut self) -> Result<Vec<Action>, RecordError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.is_file {
            self.actions.push(Action::FileEnd);
        }
        Ok(self.actions)
    }

    // ---
    // Helper methods
    // ---

    fn run_definition(&mut self, define: impl FnOnce(&mut Recorder)) {
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| define(self)));
        if let Err(payload) = result {
            self.record_error(RecordError::DefinitionPanicked {
                message: panic_message(&*payload),
            });
        }
    }

    fn push_test(&mut self, title: String, body: Callback, args: Option<String>) {
        if self.depth == 0 {
            self.record_error(RecordError::TestOutsideScope { title });
            return;
        }
        self.actions
            .push(Action::Test(TestAction { title, body, args }));
    }

    fn check_global(&mut self, name: &'static str) -> bool {
        if self.depth > 0 {
            self.record_error(RecordError::GlobalInsideScope { name });
            false
        } else {
            true
        }
    }

    fn record_error(&mut self, error: RecordError) {
        debug!(%error, "usage error while recording");
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}
