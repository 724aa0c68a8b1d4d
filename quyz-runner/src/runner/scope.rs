// Copyright (c) The quyz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    action::{Callback, HookKind},
    errors::UnbalancedScope,
};
use std::ops::Range;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum ScopeKind {
    File,
    Group,
}

/// Whether a scope's `beforeAll` chain has run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum SetupState {
    Pending,
    Ready,
    Failed,
}

/// An open file or group.
#[derive(Debug)]
pub(super) struct Scope<'a> {
    pub(super) title: &'a str,
    pub(super) kind: ScopeKind,
    pub(super) setup: SetupState,
    hooks: [Vec<&'a Callback>; 4],
}

impl<'a> Scope<'a> {
    fn new(title: &'a str, kind: ScopeKind) -> Self {
        Self {
            title,
            kind,
            setup: SetupState::Pending,
            hooks: Default::default(),
        }
    }

    pub(super) fn hooks(&self, kind: HookKind) -> &[&'a Callback] {
        &self.hooks[hook_index(kind)]
    }

    /// True once a test has entered this scope, even if its setup failed.
    pub(super) fn is_entered(&self) -> bool {
        self.setup != SetupState::Pending
    }
}

fn hook_index(kind: HookKind) -> usize {
    match kind {
        HookKind::BeforeAll => 0,
        HookKind::BeforeEach => 1,
        HookKind::AfterAll => 2,
        HookKind::AfterEach => 3,
    }
}

/// The stack of open scopes, outermost first.
#[derive(Debug, Default)]
pub(super) struct ScopeStack<'a> {
    scopes: Vec<Scope<'a>>,
}

impl<'a> ScopeStack<'a> {
    pub(super) fn push(&mut self, title: &'a str, kind: ScopeKind) {
        self.scopes.push(Scope::new(title, kind));
    }

    /// Pops the innermost scope, which must be of the given kind.
    pub(super) fn pop(
        &mut self,
        kind: ScopeKind,
        index: usize,
    ) -> Result<Scope<'a>, UnbalancedScope> {
        let top = self
            .scopes
            .pop()
            .ok_or(UnbalancedScope::UnexpectedEnd { index })?;
        if top.kind != kind {
            let open = top.title.to_owned();
            self.scopes.push(top);
            return Err(UnbalancedScope::MismatchedEnd { index, open });
        }
        Ok(top)
    }

    /// Appends a hook to the innermost scope.
    pub(super) fn register(
        &mut self,
        kind: HookKind,
        callback: &'a Callback,
        index: usize,
    ) -> Result<(), UnbalancedScope> {
        let top = self
            .scopes
            .last_mut()
            .ok_or(UnbalancedScope::OrphanHook { index })?;
        top.hooks[hook_index(kind)].push(callback);
        Ok(())
    }

    /// The scopes whose hooks apply to a test: every open scope when hooks
    /// bubble, otherwise only the innermost.
    pub(super) fn applicable(&self, bubble_hooks: bool) -> Range<usize> {
        let len = self.scopes.len();
        if bubble_hooks || len == 0 {
            0..len
        } else {
            len - 1..len
        }
    }

    pub(super) fn get(&self, index: usize) -> &Scope<'a> {
        &self.scopes[index]
    }

    pub(super) fn get_mut(&mut self, index: usize) -> &mut Scope<'a> {
        &mut self.scopes[index]
    }

    pub(super) fn len(&self) -> usize {
        self.scopes.len()
    }

    pub(super) fn titles(&self) -> Vec<String> {
        self.scopes
            .iter()
            .map(|scope| scope.title.to_owned())
            .collect()
    }
}
