//! Command grammar, parsing and dispatch.
//!
//! Commands are declared as [`CommandSpec`]s and stored in per-mode trees of
//! the [`Registry`]. The [`CommandRouter`] resolves a typed line against the
//! active tree, turns the remaining words into typed tokens and runs the
//! handler. Completion and help read the same trees.

pub mod complete;
pub mod context;
pub mod handlers;
pub mod help;
pub mod options;
pub mod output;
pub mod registry;
pub mod router;
pub mod token;
pub mod tree;

pub use complete::Completion;
pub use context::{Context, ContextStack};
pub use handlers::{register_builtin, Arguments, CommandContext, CommandResult, Handler};
pub use options::OptionSpec;
pub use output::CommandOutput;
pub use registry::Registry;
pub use router::{CommandRouter, Dispatch};
pub use token::{NameKind, Names, Token, Value};
pub use tree::{CommandSpec, Flag};
