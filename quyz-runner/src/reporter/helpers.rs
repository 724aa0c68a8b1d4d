// Copyright (c) The quyz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use itertools::Itertools;
use owo_colors::Style;

#[derive(Debug, Default, Clone)]
pub(super) struct Styles {
    pub(super) is_colorized: bool,
    pub(super) count: Style,
    pub(super) pass: Style,
    pub(super) fail: Style,
    pub(super) skip: Style,
    pub(super) file: Style,
    pub(super) group: Style,
}

impl Styles {
    pub(super) fn colorize(&mut self) {
        self.is_colorized = true;
        self.count = Style::new().bold();
        self.pass = Style::new().green().bold();
        self.fail = Style::new().red().bold();
        self.skip = Style::new().yellow().bold();
        self.file = Style::new().blue().bold();
        self.group = Style::new().bold();
    }
}

/// Indents every line after the first by `indent` spaces.
pub(super) fn indent_continuation(text: &str, indent: usize) -> String {
    let padding = " ".repeat(indent);
    text.lines()
        .enumerate()
        .map(|(index, line)| {
            if index == 0 {
                line.to_owned()
            } else {
                format!("{padding}{line}")
            }
        })
        .join("\n")
}
