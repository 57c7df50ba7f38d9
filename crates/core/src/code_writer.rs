//! Indenting text sink used to render declarations back to source form.

use std::fmt;

/// Accumulates text, inserting two spaces per indent level at the start of
/// every non-empty line. Use it through [`std::fmt::Write`], e.g.
/// `writeln!(w, "interface {} {{", name)`.
#[derive(Debug)]
pub struct CodeWriter {
    out: String,
    indent: usize,
    start_of_line: bool,
}

impl CodeWriter {
    pub fn new() -> Self {
        CodeWriter {
            out: String::new(),
            indent: 0,
            start_of_line: true,
        }
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> String {
        self.out
    }
}

impl Default for CodeWriter {
    fn default() -> Self {
        CodeWriter::new()
    }
}

impl fmt::Write for CodeWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for line in s.split_inclusive('\n') {
            // blank lines stay blank
            if self.start_of_line && line != "\n" {
                for _ in 0..self.indent {
                    self.out.push_str("  ");
                }
            }
            self.out.push_str(line);
            self.start_of_line = line.ends_with('\n');
        }
        Ok(())
    }
}
