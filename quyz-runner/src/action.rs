// Copyright (c) The quyz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The vocabulary of recorded steps.
//!
//! Everything a test file declares is turned into an [`Action`] by the
//! [`Recorder`](crate::recorder::Recorder). Actions carry no behavior of their
//! own: the [`TestRunner`](crate::runner::TestRunner) gives them meaning by
//! replaying them in order.

use crate::{config::PartialConfig, errors::CallbackError};
use camino::Utf8PathBuf;
use debug_ignore::DebugIgnore;
use futures::{FutureExt, future::BoxFuture};
use std::{
    fmt,
    future::Future,
    panic::{AssertUnwindSafe, Location},
    sync::Arc,
};

/// A boxed error returned by a failing callback.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The call site a [`Action::OneShot`] was declared at.
pub type CallSite = &'static Location<'static>;

/// One immutable recorded step of a test run.
#[derive(Clone, Debug)]
pub enum Action {
    /// A test: run its body, surrounded by the hooks of every open scope.
    Test(TestAction),

    /// Opens a `describe` group.
    GroupStart {
        /// The resolved group title.
        title: String,
    },

    /// Closes the innermost open `describe` group.
    GroupEnd,

    /// Opens a test file. A file behaves like an anonymous top-level group.
    FileStart {
        /// The path the file was registered under.
        path: Utf8PathBuf,
    },

    /// Closes the innermost open file.
    FileEnd,

    /// Registers a hook on the innermost open scope.
    HookRegister {
        /// Which chain the hook is appended to.
        kind: HookKind,

        /// The hook itself.
        callback: Callback,
    },

    /// A callback that runs at most once per run, keyed by its call site.
    OneShot {
        /// Where `do_once` was called.
        site: CallSite,

        /// The callback.
        callback: Callback,
    },

    /// Runs once, before any file.
    GlobalSetup {
        /// The callback.
        callback: Callback,
    },

    /// Runs once, after the last action of the run.
    GlobalTeardown {
        /// The callback.
        callback: Callback,
    },

    /// Merges a partial configuration into the active configuration.
    Configure {
        /// The options to merge.
        config: PartialConfig,
    },
}

impl Action {
    /// A short, stable name for this kind of action, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Test(_) => "test",
            Self::GroupStart { .. } => "group-start",
            Self::GroupEnd => "group-end",
            Self::FileStart { .. } => "file-start",
            Self::FileEnd => "file-end",
            Self::HookRegister { .. } => "hook-register",
            Self::OneShot { .. } => "one-shot",
            Self::GlobalSetup { .. } => "global-setup",
            Self::GlobalTeardown { .. } => "global-teardown",
            Self::Configure { .. } => "configure",
        }
    }

    /// Returns true if this action opens a scope.
    pub fn is_scope_start(&self) -> bool {
        matches!(self, Self::GroupStart { .. } | Self::FileStart { .. })
    }

    /// Returns true if this action closes a scope.
    pub fn is_scope_end(&self) -> bool {
        matches!(self, Self::GroupEnd | Self::FileEnd)
    }
}

/// A recorded test.
#[derive(Clone, Debug)]
pub struct TestAction {
    /// The title, resolved at record time.
    pub title: String,

    /// The test body, with any declaration arguments already bound.
    pub body: Callback,

    /// The debug rendering of the declaration arguments, if the test was
    /// declared with any.
    pub args: Option<String>,
}

/// The four hook kinds.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum HookKind {
    /// Runs once per scope, before the first test inside it.
    BeforeAll,

    /// Runs before every test inside the scope.
    BeforeEach,

    /// Runs once per scope, when the scope closes, if any test ran inside it.
    AfterAll,

    /// Runs after every test inside the scope.
    AfterEach,
}

impl HookKind {
    /// All hook kinds, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::BeforeAll,
        Self::BeforeEach,
        Self::AfterAll,
        Self::AfterEach,
    ];

    /// The DSL name of this hook kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BeforeAll => "beforeAll",
            Self::BeforeEach => "beforeEach",
            Self::AfterAll => "afterAll",
            Self::AfterEach => "afterEach",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type CallbackFn = dyn Fn() -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync;

/// A test body, hook or lifecycle callback.
///
/// Callbacks may complete synchronously or asynchronously. Sync closures
/// returning `()` or `Result<(), E>` convert with [`From`]; async closures go
/// through [`Callback::from_async`].
#[derive(Clone, Debug)]
pub struct Callback {
    inner: DebugIgnore<Arc<CallbackFn>>,
}

impl Callback {
    /// Wraps a synchronous closure.
    pub fn new<F, R>(f: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: IntoCallbackResult,
    {
        Self {
            inner: DebugIgnore(Arc::new(move || {
                futures::future::ready(f().into_callback_result()).boxed()
            })),
        }
    }

    /// Wraps a closure returning a future.
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoCallbackResult,
    {
        Self {
            inner: DebugIgnore(Arc::new(move || {
                f().map(IntoCallbackResult::into_callback_result).boxed()
            })),
        }
    }

    /// Invokes the callback and waits for it to settle.
    ///
    /// Panics, whether raised while creating the future or while polling it, are
    /// caught and turned into [`CallbackError::Panic`].
    pub(crate) async fn invoke(&self) -> Result<(), CallbackError> {
        let fut = match std::panic::catch_unwind(AssertUnwindSafe(|| (self.inner)())) {
            Ok(fut) => fut,
            Err(payload) => return Err(CallbackError::from_panic(payload)),
        };
        match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(error)) => Err(CallbackError::Error(error)),
            Err(payload) => Err(CallbackError::from_panic(payload)),
        }
    }
}

impl<F, R> From<F> for Callback
where
    F: Fn() -> R + Send + Sync + 'static,
    R: IntoCallbackResult,
{
    fn from(f: F) -> Self {
        Self::new(f)
    }
}

/// Return types a callback may produce.
pub trait IntoCallbackResult {
    /// Converts into the common result type.
    fn into_callback_result(self) -> Result<(), BoxError>;
}

impl IntoCallbackResult for () {
    fn into_callback_result(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<E> IntoCallbackResult for Result<(), E>
where
    E: Into<BoxError>,
{
    fn into_callback_result(self) -> Result<(), BoxError> {
        self.map_err(Into::into)
    }
}

/// A title: a literal string, or a template applied to a declaration's
/// arguments.
///
/// Templates are resolved exactly once, when the declaration is recorded.
pub enum Title<'a, A> {
    /// Used verbatim.
    Literal(String),

    /// Called with the declaration arguments to produce the title.
    Template(Box<dyn FnOnce(&A) -> String + 'a>),
}

impl<'a, A> Title<'a, A> {
    /// Creates a title from a template function.
    pub fn template(f: impl FnOnce(&A) -> String + 'a) -> Self {
        Self::Template(Box::new(f))
    }

    pub(crate) fn resolve(self, args: &A) -> String {
        match self {
            Self::Literal(title) => title,
            Self::Template(f) => f(args),
        }
    }
}

impl<A> From<&str> for Title<'_, A> {
    fn from(title: &str) -> Self {
        Self::Literal(title.to_owned())
    }
}

impl<A> From<String> for Title<'_, A> {
    fn from(title: String) -> Self {
        Self::Literal(title)
    }
}

impl<A> fmt::Debug for Title<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(title) => f.debug_tuple("Literal").field(title).finish(),
            Self::Template(_) => f.write_str("Template(..)"),
        }
    }
}
