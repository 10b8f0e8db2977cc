//! Where command lines come from: a terminal with line editing, or a file.

use anyhow::Result;
use rustyline::completion::FilenameCompleter;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Completer, Editor, Helper, Highlighter, Hinter, Validator};
use std::io::BufRead;

/// A source of command lines.
pub trait LineSource {
    /// Read the next line, showing `prompt` if the source is interactive.
    ///
    /// Returns `None` at end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Completes file names on Tab; nothing else.
#[derive(Helper, Completer, Hinter, Highlighter, Validator)]
struct MishHelper {
    #[rustyline(Completer)]
    completer: FilenameCompleter,
}

/// Terminal input with history and file name completion.
pub struct InteractiveSource {
    editor: Editor<MishHelper, DefaultHistory>,
}

impl InteractiveSource {
    pub fn new() -> Result<Self> {
        let mut editor = Editor::new()?;
        editor.set_helper(Some(MishHelper {
            completer: FilenameCompleter::new(),
        }));
        Ok(Self { editor })
    }
}

impl LineSource for InteractiveSource {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        loop {
            match self.editor.readline(prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        self.editor.add_history_entry(line.as_str())?;
                    }
                    return Ok(Some(line));
                }
                // Ctrl-C drops the current line.
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => return Ok(None),
                Err(err) => return Err(err.into()),
            }
        }
    }
}

/// Lines from a script file or any other reader, no prompt.
pub struct BatchSource<R> {
    reader: R,
}

impl<R: BufRead> BatchSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for BatchSource<R> {
    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_batch_lines_without_terminators() {
        let mut source = BatchSource::new(Cursor::new("ls -l\r\n\nwc\nlast"));
        assert_eq!(source.read_line("").unwrap().as_deref(), Some("ls -l"));
        assert_eq!(source.read_line("").unwrap().as_deref(), Some(""));
        assert_eq!(source.read_line("").unwrap().as_deref(), Some("wc"));
        assert_eq!(source.read_line("").unwrap().as_deref(), Some("last"));
        assert_eq!(source.read_line("").unwrap(), None);
        assert_eq!(source.read_line("").unwrap(), None);
    }
}
