//! Command handlers.
//!
//! Each handler is a unit struct implementing [`Handler`]. Handlers read the
//! bound arguments, talk to the database through the context and push output;
//! they never print.

pub mod debug;
pub mod interface;
pub mod lldp;
pub mod system;
pub mod vlan;

use async_trait::async_trait;

use super::context::ContextStack;
use super::options::{Bound, TokenId};
use super::output::CommandOutput;
use super::registry::Registry;
use super::token::Value;
use super::tree::Flag;
use crate::db::DatabaseClient;
use crate::error::Result;
use crate::logging::DebugKeys;

/// Context provided to command handlers.
pub struct CommandContext<'a> {
    /// Configuration database.
    pub db: &'a dyn DatabaseClient,
    /// Modes entered so far; handlers push to enter a sub-mode.
    pub contexts: &'a mut ContextStack,
    /// Runtime debug targets.
    pub debug: &'a mut DebugKeys,
    /// Output collected for the caller.
    pub output: Vec<CommandOutput>,
}

impl<'a> CommandContext<'a> {
    pub fn new(
        db: &'a dyn DatabaseClient,
        contexts: &'a mut ContextStack,
        debug: &'a mut DebugKeys,
    ) -> Self {
        Self {
            db,
            contexts,
            debug,
            output: Vec::new(),
        }
    }

    /// Appends one output value.
    pub fn emit(&mut self, output: CommandOutput) {
        self.output.push(output);
    }

    /// Appends an informational message.
    pub fn info(&mut self, msg: impl Into<String>) {
        self.emit(CommandOutput::info(msg));
    }
}

/// What the session should do after a command ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResult {
    /// Read the next line.
    Continue,
    /// Leave the current mode; at the top level this ends the session.
    PopContext,
    /// End the session.
    Terminate,
}

/// Typed arguments of one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments {
    /// Bound values in the order their words were typed.
    pub tokens: Vec<Bound>,
    pub flags: Vec<Flag>,
}

impl Arguments {
    pub fn new(tokens: Vec<Bound>, flags: Vec<Flag>) -> Self {
        Self { tokens, flags }
    }

    /// True if the command was prefixed with `no`.
    pub fn negated(&self) -> bool {
        self.flags.contains(&Flag::No)
    }

    /// The value bound to token `slot` of option `option`.
    pub fn get(&self, option: usize, slot: usize) -> Option<&Value> {
        let source = TokenId { option, slot };
        self.tokens
            .iter()
            .find(|b| b.source == source)
            .map(|b| &b.value)
    }

    /// True if token `slot` of option `option` was bound.
    pub fn has(&self, option: usize, slot: usize) -> bool {
        self.get(option, slot).is_some()
    }

    /// The first bound value.
    pub fn first(&self) -> Option<&Value> {
        self.tokens.first().map(|b| &b.value)
    }

    /// The first integer value.
    pub fn integer(&self) -> Option<i64> {
        self.values().find_map(Value::as_integer)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.tokens.iter().map(|b| &b.value)
    }
}

/// A command implementation.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn run(&self, ctx: &mut CommandContext<'_>, args: &Arguments) -> Result<CommandResult>;
}

/// Registers every built-in command.
pub fn register_builtin(registry: &mut Registry) -> Result<()> {
    system::register(registry)?;
    debug::register(registry)?;
    vlan::register(registry)?;
    interface::register(registry)?;
    lldp::register(registry)?;
    Ok(())
}
