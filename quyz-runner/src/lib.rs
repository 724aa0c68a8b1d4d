// Copyright (c) The quyz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for the quyz test harness.
//!
//! The basic flow is:
//!
//! 1. Test files, registered as [`collector::TestFile`]s, are *recorded*: a
//!    [`recorder::Recorder`] runs each file's definition closure and appends an
//!    ordered, flat list of [`action::Action`]s. Nested `describe` blocks become
//!    start/end marker pairs.
//! 2. The [`collector::Collector`] selects files, brackets each file's actions
//!    with file boundaries and concatenates them.
//! 3. The [`runner::TestRunner`] replays the list exactly once against a stack of
//!    open scopes, firing hooks around each test and aggregating the results into
//!    a [`context::Context`].

pub mod action;
pub mod collector;
pub mod config;
pub mod context;
pub mod errors;
mod helpers;
pub mod recorder;
pub mod reporter;
pub mod runner;
mod time;
