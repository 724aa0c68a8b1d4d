// Copyright (c) The quyz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Report the results of a test run in human-readable form.
//!
//! The main type here is [`TestReporter`], which is constructed via a [`ReporterBuilder`].

mod displayer;
mod events;
mod helpers;
mod imp;

pub use events::*;
pub use imp::*;
