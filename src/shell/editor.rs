//! Interactive line editor.
//!
//! Key handling is kept apart from the terminal: [`Editor`] turns key events
//! into edits and [`KeyAction`]s, and [`LineEditor`] drives it from crossterm
//! with the terminal in raw mode only while a line is being read.

use std::io::{self, Stdout, Write};

use crossterm::cursor::MoveToColumn;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::{queue, style::Print};
use tracing::debug;

use super::history::InputHistory;
use crate::commands::complete::Completion;
use crate::commands::output::render_help;
use crate::commands::CommandRouter;
use crate::error::{CliError, Result};

/// Text being edited, with a cursor counted in characters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LineBuffer {
    text: String,
    cursor: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Text left of the cursor.
    pub fn before_cursor(&self) -> &str {
        &self.text[..self.byte_offset(self.cursor)]
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.text
            .char_indices()
            .nth(chars)
            .map_or(self.text.len(), |(i, _)| i)
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_offset(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, s: &str) {
        for c in s.chars() {
            self.insert(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_offset(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.len() {
            let at = self.byte_offset(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.len() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.len();
    }

    /// Replaces the whole text and moves the cursor to its end.
    pub fn set(&mut self, text: &str) {
        self.text = text.to_string();
        self.move_end();
    }

    /// Replaces the `partial` characters left of the cursor with `word`.
    pub fn replace_partial(&mut self, partial: &str, word: &str) {
        for _ in partial.chars() {
            self.backspace();
        }
        self.insert_str(word);
    }

    /// Clears the buffer and returns its text.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }
}

/// What the terminal driver should do after a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Nothing visible changed.
    None,
    /// The line changed and must be redrawn.
    Redraw,
    /// Enter: run this line.
    Submit(String),
    /// Tab: complete the word in progress.
    Complete,
    /// `?`: list what may follow.
    Help,
    /// Ctrl-C: the line was discarded.
    Cancel,
    /// Ctrl-D on an empty line.
    Eof,
}

/// Editing state of one prompt: the buffer plus history navigation.
#[derive(Debug)]
pub struct Editor {
    pub buffer: LineBuffer,
    history: InputHistory,
}

impl Editor {
    pub fn new(history_size: usize) -> Self {
        Self {
            buffer: LineBuffer::new(),
            history: InputHistory::new(history_size),
        }
    }

    pub fn history(&self) -> &InputHistory {
        &self.history
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => {
                    self.buffer.take();
                    self.history.reset_position();
                    KeyAction::Cancel
                }
                KeyCode::Char('d') if self.buffer.is_empty() => KeyAction::Eof,
                KeyCode::Char('d') => {
                    self.buffer.delete();
                    KeyAction::Redraw
                }
                KeyCode::Char('a') => {
                    self.buffer.move_home();
                    KeyAction::Redraw
                }
                KeyCode::Char('e') => {
                    self.buffer.move_end();
                    KeyAction::Redraw
                }
                _ => KeyAction::None,
            };
        }

        match key.code {
            KeyCode::Char('?') => KeyAction::Help,
            KeyCode::Char(c) => {
                self.buffer.insert(c);
                KeyAction::Redraw
            }
            KeyCode::Tab => KeyAction::Complete,
            KeyCode::Backspace => {
                self.buffer.backspace();
                KeyAction::Redraw
            }
            KeyCode::Delete => {
                self.buffer.delete();
                KeyAction::Redraw
            }
            KeyCode::Left => {
                self.buffer.move_left();
                KeyAction::Redraw
            }
            KeyCode::Right => {
                self.buffer.move_right();
                KeyAction::Redraw
            }
            KeyCode::Home => {
                self.buffer.move_home();
                KeyAction::Redraw
            }
            KeyCode::End => {
                self.buffer.move_end();
                KeyAction::Redraw
            }
            KeyCode::Up => match self.history.previous(self.buffer.text()) {
                Some(entry) => {
                    let entry = entry.to_string();
                    self.buffer.set(&entry);
                    KeyAction::Redraw
                }
                None => KeyAction::None,
            },
            KeyCode::Down => match self.history.next() {
                Some(entry) => {
                    let entry = entry.to_string();
                    self.buffer.set(&entry);
                    KeyAction::Redraw
                }
                None => KeyAction::None,
            },
            KeyCode::Enter => {
                let line = self.buffer.take();
                self.history.push(&line);
                KeyAction::Submit(line)
            }
            _ => KeyAction::None,
        }
    }

    /// Applies a Tab completion. Returns the candidate listing when the word
    /// could not be completed or extended.
    pub fn apply_completion(&mut self, completion: &Completion) -> Option<Vec<String>> {
        if let Some(word) = completion.unique() {
            let word = format!("{word} ");
            self.buffer.replace_partial(&completion.partial, &word);
            return None;
        }
        if let Some(prefix) = completion.common_prefix() {
            self.buffer.replace_partial(&completion.partial, &prefix);
            return None;
        }
        if completion.items.is_empty() {
            return None;
        }
        Some(render_help(&completion.items))
    }
}

/// Puts the terminal in raw mode until dropped.
struct RawMode;

impl RawMode {
    fn enable() -> Result<Self> {
        terminal::enable_raw_mode()
            .map_err(|e| CliError::terminal(format!("Failed to enable raw mode: {e}")))?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Reads lines from the terminal.
pub struct LineEditor {
    editor: Editor,
    out: Stdout,
}

impl LineEditor {
    pub fn new(history_size: usize) -> Self {
        Self {
            editor: Editor::new(history_size),
            out: io::stdout(),
        }
    }

    /// Reads one line. `None` means end of input.
    pub async fn read_line(&mut self, prompt: &str, router: &CommandRouter) -> Result<Option<String>> {
        let _raw = RawMode::enable()?;
        self.redraw(prompt)?;

        loop {
            let key = next_key()?;
            match self.editor.handle_key(key) {
                KeyAction::None => {}
                KeyAction::Redraw => self.redraw(prompt)?,
                KeyAction::Submit(line) => {
                    self.write_lines(&[])?;
                    return Ok(Some(line));
                }
                KeyAction::Eof => {
                    self.write_lines(&[])?;
                    return Ok(None);
                }
                KeyAction::Cancel => {
                    self.write_lines(&["^C".to_string()])?;
                    self.redraw(prompt)?;
                }
                KeyAction::Complete => {
                    let completion = self.candidates(router).await;
                    if let Some(listing) = self.editor.apply_completion(&completion) {
                        self.write_lines(&[])?;
                        self.write_lines(&listing)?;
                    }
                    self.redraw(prompt)?;
                }
                KeyAction::Help => {
                    let completion = self.candidates(router).await;
                    self.write_lines(&[])?;
                    self.write_lines(&render_help(&completion.help_items()))?;
                    self.redraw(prompt)?;
                }
            }
        }
    }

    /// Completion for the text left of the cursor. Lookup failures are
    /// logged and show as no candidates.
    async fn candidates(&self, router: &CommandRouter) -> Completion {
        match router.complete(self.editor.buffer.before_cursor()).await {
            Ok(completion) => completion,
            Err(err) => {
                debug!(target: "cli", error = %err, "completion failed");
                Completion::default()
            }
        }
    }

    fn redraw(&mut self, prompt: &str) -> Result<()> {
        let buffer = &self.editor.buffer;
        let column = prompt.chars().count() + buffer.cursor();
        queue!(
            self.out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(prompt),
            Print(buffer.text()),
            MoveToColumn(u16::try_from(column).unwrap_or(u16::MAX)),
        )
        .and_then(|()| self.out.flush())
        .map_err(|e| CliError::terminal(format!("Failed to draw prompt: {e}")))
    }

    /// Writes lines with raw-mode line endings. An empty slice ends the
    /// current line.
    fn write_lines(&mut self, lines: &[String]) -> Result<()> {
        let result = if lines.is_empty() {
            write!(self.out, "\r\n")
        } else {
            lines
                .iter()
                .try_for_each(|line| write!(self.out, "{line}\r\n"))
        };
        result
            .and_then(|()| self.out.flush())
            .map_err(|e| CliError::terminal(format!("Failed to write output: {e}")))
    }
}

/// Blocks until the next key press.
fn next_key() -> Result<KeyEvent> {
    loop {
        let event =
            event::read().map_err(|e| CliError::terminal(format!("Failed to read event: {e}")))?;
        if let Event::Key(key) = event {
            if key.kind == KeyEventKind::Press {
                return Ok(key);
            }
        }
    }
}
