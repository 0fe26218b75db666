//! Transport-agnostic command output types.
//!
//! Handlers push [`CommandOutput`] values instead of printing. The shell (or a
//! test) turns them into text lines with [`CommandOutput::render`].

use super::token::HelpItem;

/// Output from a command handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Informational text; may span several lines.
    Info(String),

    /// Error message, already in its user-facing form.
    Error(String),

    /// Columns padded to the widest cell.
    Table {
        /// Column headers; empty for a headerless table.
        headers: Vec<String>,
        /// Row data (each row is a vector of cell values).
        rows: Vec<Vec<String>>,
        /// Spaces in front of every line.
        indent: usize,
    },

    /// `label: value` lines with labels aligned.
    KeyValues {
        pairs: Vec<(String, String)>,
        indent: usize,
    },

    /// Completion or help candidates with their descriptions.
    Help(Vec<HelpItem>),
}

const COLUMN_GAP: &str = "   ";

impl CommandOutput {
    /// Creates an info message.
    pub fn info(msg: impl Into<String>) -> Self {
        Self::Info(msg.into())
    }

    /// Creates an error message.
    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error(msg.into())
    }

    /// Creates a table output.
    pub fn table(headers: &[&str], rows: Vec<Vec<String>>) -> Self {
        Self::Table {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
            indent: 0,
        }
    }

    /// Creates a key/value block indented by two spaces.
    pub fn key_values(pairs: Vec<(String, String)>) -> Self {
        Self::KeyValues { pairs, indent: 2 }
    }

    /// Sets the indent of a table or key/value block.
    pub fn indented(self, by: usize) -> Self {
        match self {
            Self::Table { headers, rows, .. } => Self::Table {
                headers,
                rows,
                indent: by,
            },
            Self::KeyValues { pairs, .. } => Self::KeyValues { pairs, indent: by },
            other => other,
        }
    }

    /// Renders the output as text lines.
    pub fn render(&self) -> Vec<String> {
        match self {
            Self::Info(text) | Self::Error(text) => {
                if text.is_empty() {
                    vec![String::new()]
                } else {
                    text.lines().map(str::to_string).collect()
                }
            }
            Self::Table {
                headers,
                rows,
                indent,
            } => render_table(headers, rows, *indent),
            Self::KeyValues { pairs, indent } => {
                let width = pairs.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
                let pad = " ".repeat(*indent);
                pairs
                    .iter()
                    .map(|(k, v)| format!("{pad}{k:<width$}: {v}"))
                    .collect()
            }
            Self::Help(items) => render_help(items),
        }
    }
}

fn render_table(headers: &[String], rows: &[Vec<String>], indent: usize) -> Vec<String> {
    let columns = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(headers.len()))
        .max()
        .unwrap_or(0);
    let mut widths = vec![0; columns];
    for line in std::iter::once(headers).chain(rows.iter().map(Vec::as_slice)) {
        for (i, cell) in line.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let pad = " ".repeat(indent);
    let format_line = |cells: &[String]| {
        let body: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{cell:<width$}", width = widths[i]))
            .collect();
        format!("{pad}{}", body.join(COLUMN_GAP)).trim_end().to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    if !headers.is_empty() {
        lines.push(format_line(headers));
    }
    lines.extend(rows.iter().map(|r| format_line(r)));
    lines
}

/// Two-space indented `text  help` lines, aligned on the longest text.
pub fn render_help(items: &[HelpItem]) -> Vec<String> {
    let width = items.iter().map(|i| i.text.len()).max().unwrap_or(0);
    items
        .iter()
        .map(|i| {
            format!("  {:<width$}  {}", i.text, i.help)
                .trim_end()
                .to_string()
        })
        .collect()
}
