use std::{
    cmp::max,
    fmt::{Formatter, Result},
};

use super::{
    super::{RESET, YELLOW},
    {get_width, Visual, BLANK, EQUAL, HIGHLIGHT, PIPE},
};
use crate::region::Region;

/// A type of `Visual` that points to a specific location within expression
/// source text.
///
/// Expression sources are usually a single line, but string literals may
/// embed newlines, so the pointer resolves the line containing the region
/// before highlighting it.
#[derive(Debug, PartialEq)]
pub struct Pointer {
    /// The line that the Pointer is pointing to, zero indexed.
    line: usize,
    /// The column that the Pointer is pointing to, zero indexed.
    column: usize,
    /// The display width of the text being highlighted.
    length: usize,
    /// The actual line of text that is being pointed to.
    text: String,
}

impl Pointer {
    /// Create a new Visual over the given source text and Region.
    pub fn new(source: &str, region: Region) -> Self {
        let mut line = 0;
        let mut line_begin = 0;

        for (index, character) in source.char_indices() {
            if index >= region.begin {
                break;
            }
            if character == '\n' {
                line += 1;
                line_begin = index + 1;
            }
        }

        let text = source[line_begin..]
            .split('\n')
            .next()
            .unwrap_or(BLANK)
            .to_string();
        let column = get_width(&source[line_begin..region.begin.max(line_begin)]);
        let length = max(
            1,
            get_width(source.get(region.begin..region.end).unwrap_or(BLANK)),
        );

        Self {
            line,
            column,
            length,
            text,
        }
    }
}

impl Visual for Pointer {
    fn display(&self, formatter: &mut Formatter<'_>, help: Option<&str>) -> Result {
        let num = (self.line + 1).to_string();
        let col = self.column + 1;
        let pad = get_width(&num);
        let align = self.column + self.length;

        let text = &self.text;
        let underline = HIGHLIGHT.repeat(self.length);

        write!(
            formatter,
            "\n {BLANK:pad$}--> {num}:{col}\
             \n {BLANK:pad$} {PIPE}\
             \n {num:>} {PIPE} {text}\
             \n {BLANK:pad$} {PIPE} {YELLOW}{underline:>align$}{RESET}\
             \n {BLANK:pad$} {PIPE}\n",
        )?;

        if let Some(help) = help {
            writeln!(formatter, " {BLANK:pad$}{EQUAL} help: {help}")?;
        }

        Ok(())
    }
}
