// Copyright (c) The quyz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::scope::{ScopeKind, ScopeStack, SetupState};
use crate::{
    action::{Action, CallSite, Callback, HookKind, TestAction},
    config::QuyzConfig,
    context::{Context, ContextManager},
    errors::{CallbackError, RunAbortedError, TestFailure, TestRunnerBuildError, UnbalancedScope},
    helpers::plural,
    reporter::{TestEvent, TestEventKind},
    time::{StopwatchStart, stopwatch},
};
use camino::Utf8Path;
use std::{collections::HashSet, ops::Range, time::Duration};
use tokio::runtime::Runtime;
use tracing::{debug, warn};

/// Test runner options.
#[derive(Debug)]
pub struct TestRunnerBuilder {
    config: QuyzConfig,
}

impl TestRunnerBuilder {
    /// Creates a builder that starts from `config`.
    ///
    /// `configure` actions in the list are merged into this configuration as
    /// they are processed.
    pub fn new(config: QuyzConfig) -> Self {
        Self { config }
    }

    /// Sets whether ancestor scopes' hooks apply to each test.
    pub fn set_bubble_hooks(&mut self, bubble_hooks: bool) -> &mut Self {
        self.config.bubble_hooks = bubble_hooks;
        self
    }

    /// Sets whether a hook failure aborts the run.
    pub fn set_abort_on_hook_failure(&mut self, abort: bool) -> &mut Self {
        self.config.abort_on_hook_failure = abort;
        self
    }

    /// Sets whether `afterEach` hooks run after a `beforeEach` hook failed.
    pub fn set_after_each_on_setup_failure(&mut self, run: bool) -> &mut Self {
        self.config.after_each_on_setup_failure = run;
        self
    }

    /// Creates a new test runner over `actions`.
    pub fn build(self, actions: &[Action]) -> Result<TestRunner<'_>, TestRunnerBuildError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(TestRunnerBuildError::TokioRuntimeCreate)?;

        Ok(TestRunner {
            inner: TestRunnerInner {
                actions,
                config: self.config,
                runtime,
            },
        })
    }
}

/// Replays an action list.
///
/// Created using [`TestRunnerBuilder::build`].
#[derive(Debug)]
pub struct TestRunner<'a> {
    inner: TestRunnerInner<'a>,
}

impl<'a> TestRunner<'a> {
    /// The number of tests in the action list.
    pub fn test_count(&self) -> usize {
        self.inner
            .actions
            .iter()
            .filter(|action| matches!(action, Action::Test(_)))
            .count()
    }

    /// Processes every action once, in order.
    ///
    /// The callback is called with each event as it happens. Test and hook
    /// failures are recorded in the returned [`Context`]; a fatal error stops
    /// processing and is returned instead. Global teardown callbacks run in
    /// both cases.
    pub fn execute<F>(self, callback: F) -> Result<Context, RunAbortedError>
    where
        F: FnMut(TestEvent<'_>),
    {
        let test_count = self.test_count();
        let TestRunnerInner {
            actions,
            config,
            runtime,
        } = self.inner;

        let cx = RunContext {
            actions,
            config,
            stack: ScopeStack::default(),
            context: ContextManager::new(),
            fired: HashSet::new(),
            test_count,
            first_file: None,
            first_test: None,
            events: EventSink {
                callback,
                stopwatch: stopwatch(),
            },
        };
        runtime.block_on(cx.run())
    }
}

#[derive(Debug)]
struct TestRunnerInner<'a> {
    actions: &'a [Action],
    config: QuyzConfig,
    runtime: Runtime,
}

struct EventSink<F> {
    callback: F,
    stopwatch: StopwatchStart,
}

impl<F> EventSink<F>
where
    F: FnMut(TestEvent<'_>),
{
    fn emit(&mut self, kind: TestEventKind<'_>) {
        let snapshot = self.stopwatch.snapshot();
        (self.callback)(TestEvent {
            timestamp: snapshot.end_time().fixed_offset(),
            elapsed: snapshot.duration,
            kind,
        });
    }
}

/// The mutable state of a single run.
struct RunContext<'a, F> {
    actions: &'a [Action],
    // The active configuration, including merged `configure` actions.
    config: QuyzConfig,
    stack: ScopeStack<'a>,
    context: ContextManager,
    fired: HashSet<CallSite>,
    test_count: usize,
    first_file: Option<&'a Utf8Path>,
    first_test: Option<&'a str>,
    events: EventSink<F>,
}

impl<'a, F> RunContext<'a, F>
where
    F: FnMut(TestEvent<'_>),
{
    async fn run(mut self) -> Result<Context, RunAbortedError> {
        let teardowns: Vec<&'a Callback> = self
            .actions
            .iter()
            .filter_map(|action| match action {
                Action::GlobalTeardown { callback } => Some(callback),
                _ => None,
            })
            .collect();

        let test_count = self.test_count;
        debug!(
            "starting run: {} actions, {test_count} {}",
            self.actions.len(),
            plural::tests_str(test_count),
        );
        self.events.emit(TestEventKind::RunStarted { test_count });

        let result = self.process_actions().await;

        let mut teardown_errors = Vec::new();
        for callback in teardowns {
            if let Err(error) = callback.invoke().await {
                warn!("globalTeardown failed: {error}");
                self.events
                    .emit(TestEventKind::GlobalTeardownFailed { error: &error });
                teardown_errors.push(error);
            }
        }

        // An abort takes precedence over teardown failures.
        result?;

        for error in teardown_errors {
            self.context
                .record_scope_error("globalTeardown", TestFailure::GlobalTeardown(error));
        }
        let context = self.context.into_context();
        self.events
            .emit(TestEventKind::RunFinished { context: &context });
        Ok(context)
    }

    async fn process_actions(&mut self) -> Result<(), RunAbortedError> {
        let actions = self.actions;
        for (index, action) in actions.iter().enumerate() {
            match action {
                Action::GlobalSetup { callback } => {
                    if let Some(path) = self.first_file {
                        return Err(RunAbortedError::MisplacedGlobalSetup {
                            path: path.to_owned(),
                        });
                    }
                    if let Some(title) = self.first_test {
                        return Err(RunAbortedError::GlobalSetupAfterTest {
                            title: title.to_owned(),
                        });
                    }
                    callback
                        .invoke()
                        .await
                        .map_err(RunAbortedError::GlobalSetupFailed)?;
                }
                Action::FileStart { path } => {
                    if self.first_file.is_none() {
                        self.first_file = Some(path.as_path());
                    }
                    self.stack.push(path.as_str(), ScopeKind::File);
                    self.events.emit(TestEventKind::FileStarted {
                        path: path.as_path(),
                    });
                }
                Action::GroupStart { title } => {
                    let depth = self.stack.len();
                    self.stack.push(title, ScopeKind::Group);
                    self.events.emit(TestEventKind::GroupStarted {
                        title: title.as_str(),
                        depth,
                    });
                }
                Action::HookRegister { kind, callback } => {
                    self.stack
                        .register(*kind, callback, index)
                        .map_err(RunAbortedError::Unbalanced)?;
                }
                Action::Test(test) => {
                    if self.first_test.is_none() {
                        self.first_test = Some(test.title.as_str());
                    }
                    self.run_test(test).await?;
                }
                Action::GroupEnd => {
                    self.end_scope(ScopeKind::Group, index).await?;
                }
                Action::FileEnd => {
                    let title = self.end_scope(ScopeKind::File, index).await?;
                    self.events.emit(TestEventKind::FileFinished {
                        path: Utf8Path::new(title),
                    });
                }
                Action::OneShot { site, callback } => self.run_one_shot(site, callback).await?,
                Action::Configure { config } => {
                    self.config
                        .merge(config)
                        .map_err(RunAbortedError::InvalidConfig)?;
                    if !config.collector.is_empty() {
                        debug!("collector options have no effect after collection");
                    }
                    self.events
                        .emit(TestEventKind::ConfigChanged { config: &self.config });
                }
                // Collected up front, run after the last action.
                Action::GlobalTeardown { .. } => {}
            }
        }

        if self.stack.len() > 0 {
            return Err(RunAbortedError::Unbalanced(UnbalancedScope::Unclosed {
                open: self.stack.titles(),
            }));
        }
        Ok(())
    }

    async fn run_test(&mut self, test: &'a TestAction) -> Result<(), RunAbortedError> {
        let scopes = self.stack.applicable(self.config.bubble_hooks);

        if let Some(index) = scopes
            .clone()
            .find(|&index| self.stack.get(index).setup == SetupState::Failed)
        {
            let failure = TestFailure::SetupFailed {
                scope: self.stack.get(index).title.to_owned(),
            };
            self.record_failure(&test.title, Duration::ZERO, failure);
            return Ok(());
        }

        // beforeAll, outermost first, for scopes this is the first test of.
        for index in scopes.clone() {
            let scope = self.stack.get_mut(index);
            if scope.is_entered() {
                continue;
            }
            scope.setup = SetupState::Ready;
            let title = scope.title;
            for hook in self.chain(index, HookKind::BeforeAll) {
                if let Err(error) = hook.invoke().await {
                    self.stack.get_mut(index).setup = SetupState::Failed;
                    let failure = self.hook_failure(HookKind::BeforeAll, title, error)?;
                    self.record_failure(&test.title, Duration::ZERO, failure);
                    return Ok(());
                }
            }
        }

        debug!("running `{}`", test.title);
        let start = stopwatch();
        let mut failure = None;

        // Scopes in `scopes.start..set_up` completed their beforeEach chains.
        let mut set_up = scopes.start;
        'setup: for index in scopes.clone() {
            for hook in self.chain(index, HookKind::BeforeEach) {
                if let Err(error) = hook.invoke().await {
                    let title = self.stack.get(index).title;
                    failure = Some(self.hook_failure(HookKind::BeforeEach, title, error)?);
                    break 'setup;
                }
            }
            set_up = index + 1;
        }

        let teardown = if failure.is_none() {
            if let Err(error) = test.body.invoke().await {
                failure = Some(TestFailure::Body(error));
            }
            scopes
        } else if self.config.after_each_on_setup_failure {
            scopes.start..set_up
        } else {
            debug!("skipping afterEach hooks for `{}`", test.title);
            Range::default()
        };

        for index in teardown.rev() {
            for hook in self.chain(index, HookKind::AfterEach) {
                if let Err(error) = hook.invoke().await {
                    let title = self.stack.get(index).title;
                    let message = error.to_string();
                    let hook_failure = self.hook_failure(HookKind::AfterEach, title, error)?;
                    if failure.is_none() {
                        failure = Some(hook_failure);
                    } else {
                        warn!(
                            "`{}` had already failed, ignoring {hook_failure}: {message}",
                            test.title,
                        );
                    }
                }
            }
        }

        let runtime = start.snapshot().duration;
        match failure {
            None => {
                self.events.emit(TestEventKind::TestPassed {
                    title: &test.title,
                    runtime,
                });
                self.context.pass(&test.title, runtime);
            }
            Some(failure) => self.record_failure(&test.title, runtime, failure),
        }
        Ok(())
    }

    /// Pops the innermost scope, running its afterAll chain if a test entered
    /// it. Returns the scope's title.
    async fn end_scope(
        &mut self,
        kind: ScopeKind,
        index: usize,
    ) -> Result<&'a str, RunAbortedError> {
        let scope = self
            .stack
            .pop(kind, index)
            .map_err(RunAbortedError::Unbalanced)?;

        if !scope.is_entered() {
            debug!("no test entered `{}`, skipping afterAll hooks", scope.title);
            return Ok(scope.title);
        }
        for hook in scope.hooks(HookKind::AfterAll) {
            if let Err(error) = hook.invoke().await {
                let failure = self.hook_failure(HookKind::AfterAll, scope.title, error)?;
                self.events.emit(TestEventKind::ScopeHookFailed {
                    scope: scope.title,
                    failure: &failure,
                });
                self.context.record_scope_error(scope.title, failure);
            }
        }
        Ok(scope.title)
    }

    async fn run_one_shot(
        &mut self,
        site: &CallSite,
        callback: &Callback,
    ) -> Result<(), RunAbortedError> {
        let site = *site;
        if !self.fired.insert(site) {
            debug!("one-shot callback at {site} already ran");
            self.events.emit(TestEventKind::OneShotSkipped { site });
            return Ok(());
        }

        callback
            .invoke()
            .await
            .map_err(|error| RunAbortedError::OneShotFailed {
                site: site.to_string(),
                error,
            })?;
        self.events.emit(TestEventKind::OneShotFinished { site });
        Ok(())
    }

    // ---
    // Helper methods
    // ---

    fn chain(&self, index: usize, kind: HookKind) -> Vec<&'a Callback> {
        self.stack.get(index).hooks(kind).to_vec()
    }

    fn hook_failure(
        &self,
        kind: HookKind,
        scope: &str,
        error: CallbackError,
    ) -> Result<TestFailure, RunAbortedError> {
        if self.config.abort_on_hook_failure {
            return Err(RunAbortedError::HookFailed {
                kind,
                scope: scope.to_owned(),
                error,
            });
        }
        Ok(TestFailure::Hook {
            kind,
            scope: scope.to_owned(),
            error,
        })
    }

    fn record_failure(&mut self, title: &str, runtime: Duration, failure: TestFailure) {
        self.events.emit(TestEventKind::TestFailed {
            title,
            runtime,
            failure: &failure,
        });
        self.context.fail(title, runtime, failure);
    }
}
