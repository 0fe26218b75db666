//! Error types for the shell.
//!
//! Every failure raised while resolving, tokenizing or running a command is a
//! [`CliError`]. Its `Display` form is the single line shown to the user.

use thiserror::Error;

/// Main error type for shell operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    /// No command matched, or the `no` flag is not supported by the command.
    #[error("% No such command.")]
    NoSuchCommand,

    /// The words matched more than one command or choice.
    #[error("% Ambiguous command.")]
    Ambiguous,

    /// The words resolved to a placeholder node without a handler.
    #[error("% Incomplete command.")]
    IncompleteCommand,

    /// A word could not be claimed by any option of the command.
    #[error("% Invalid option {0}.")]
    BadOption(String),

    /// A required option contributed nothing.
    #[error("% Required option missing.")]
    OptionRequired,

    /// A choose-one option was given more than one alternative.
    #[error("% Too many options: only one of them may be given.")]
    Superfluous,

    /// A token rejected a word it had previously accepted.
    #[error("% Invalid value {0}.")]
    InvalidValue(String),

    /// Help was requested for an unknown command.
    #[error("% No help available: unknown command.")]
    NoHelpAvailable,

    /// Two commands were registered at the same path.
    #[error("% Duplicate command: {0}.")]
    DuplicateCommand(String),

    /// A command description is malformed (empty path, empty option, ...).
    #[error("% Invalid command definition: {0}.")]
    Definition(String),

    /// The configuration database failed (connect, protocol or timeout).
    #[error("% Database error: {0}")]
    Collaborator(String),

    /// Invalid configuration file or command-line value.
    #[error("% Configuration error: {0}")]
    Config(String),

    /// Terminal I/O failure in the line editor.
    #[error("% Terminal error: {0}")]
    Terminal(String),

    /// A handler rejected the request for a domain reason.
    #[error("% {0}")]
    Command(String),
}

impl CliError {
    /// Creates an invalid option error naming the offending word.
    pub fn bad_option(word: impl Into<String>) -> Self {
        Self::BadOption(word.into())
    }

    /// Creates an invalid value error naming the offending word.
    pub fn invalid_value(word: impl Into<String>) -> Self {
        Self::InvalidValue(word.into())
    }

    /// Creates a database error with the given message.
    pub fn collaborator(msg: impl Into<String>) -> Self {
        Self::Collaborator(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a terminal error with the given message.
    pub fn terminal(msg: impl Into<String>) -> Self {
        Self::Terminal(msg.into())
    }

    /// Creates a command error with the given message.
    pub fn command(msg: impl Into<String>) -> Self {
        Self::Command(msg.into())
    }

    /// Creates a definition error with the given message.
    pub fn definition(msg: impl Into<String>) -> Self {
        Self::Definition(msg.into())
    }

    /// Returns the error category as a string for log records.
    pub fn category(&self) -> &'static str {
        match self {
            Self::NoSuchCommand
            | Self::Ambiguous
            | Self::IncompleteCommand
            | Self::NoHelpAvailable => "Lookup Error",
            Self::BadOption(_)
            | Self::OptionRequired
            | Self::Superfluous
            | Self::InvalidValue(_) => "Option Error",
            Self::DuplicateCommand(_) | Self::Definition(_) => "Registration Error",
            Self::Collaborator(_) => "Database Error",
            Self::Config(_) => "Configuration Error",
            Self::Terminal(_) => "Terminal Error",
            Self::Command(_) => "Command Error",
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Terminal(err.to_string())
    }
}

/// Result type alias using CliError.
pub type Result<T> = std::result::Result<T, CliError>;
