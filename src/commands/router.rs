//! Command dispatch.
//!
//! [`CommandRouter`] owns the session state: the registry, the context stack,
//! the database client and the debug targets. It turns a typed line into a
//! handler call and answers completion and help requests.

use std::sync::Arc;

use tracing::{debug, warn};

use super::complete::{self, Completion, Position, Request};
use super::context::ContextStack;
use super::handlers::{Arguments, CommandContext, CommandResult};
use super::help;
use super::options::{check_required, tokenize, OptionSpec};
use super::output::CommandOutput;
use super::registry::Registry;
use super::token::{NameKind, Names};
use super::tree::Flag;
use crate::db::DatabaseClient;
use crate::error::{CliError, Result};
use crate::logging::DebugKeys;

/// Outcome of one dispatched line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dispatch {
    pub output: Vec<CommandOutput>,
    /// The session should end.
    pub terminate: bool,
}

impl Dispatch {
    fn from_output(output: Vec<CommandOutput>) -> Self {
        Self {
            output,
            terminate: false,
        }
    }

    /// Output rendered to text lines.
    pub fn lines(&self) -> Vec<String> {
        self.output.iter().flat_map(CommandOutput::render).collect()
    }
}

/// Routes typed lines to command handlers.
pub struct CommandRouter {
    registry: Registry,
    contexts: ContextStack,
    db: Arc<dyn DatabaseClient>,
    debug: DebugKeys,
    hostname: String,
}

impl CommandRouter {
    pub fn new(
        registry: Registry,
        db: Arc<dyn DatabaseClient>,
        debug: DebugKeys,
        hostname: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            contexts: ContextStack::new(),
            db,
            debug,
            hostname: hostname.into(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn contexts(&self) -> &ContextStack {
        &self.contexts
    }

    pub fn debug_keys(&self) -> &DebugKeys {
        &self.debug
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Prompt reflecting the current mode.
    pub fn prompt(&self) -> String {
        self.contexts.prompt(&self.hostname)
    }

    /// Runs one line. Errors become a single output line; only `quit` or
    /// leaving the top level ends the session.
    pub async fn dispatch(&mut self, line: &str) -> Dispatch {
        match self.execute(line).await {
            Ok(dispatch) => dispatch,
            Err(err) => {
                warn!(target: "cli", category = err.category(), error = %err, line, "command failed");
                Dispatch::from_output(vec![CommandOutput::error(err.to_string())])
            }
        }
    }

    async fn execute(&mut self, line: &str) -> Result<Dispatch> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some(first) = words.first() else {
            return Ok(Dispatch::default());
        };
        if *first == "help" {
            return self.help(&words[1..]).map(Dispatch::from_output);
        }

        let (flags, words) = match words.split_first() {
            Some((&"no", rest)) => (vec![Flag::No], rest),
            _ => (Vec::new(), words.as_slice()),
        };

        let tree = self.contexts.active_tree().to_string();
        let found = self.registry.lookup(&tree, words)?;
        let node = found.node;
        let Some(handler) = node.handler.clone() else {
            return Err(CliError::IncompleteCommand);
        };
        debug!(target: "cli", tree = %tree, command = %node.name(), "resolved command");

        let names = fetch_names(self.db.as_ref(), name_kinds(&node.options)).await?;
        let tokens = tokenize(&node.options, &words[found.consumed..], &names)?;
        check_required(&node.options, &tokens)?;
        if flags.iter().any(|f| !node.allows(*f)) {
            return Err(CliError::NoSuchCommand);
        }

        let args = Arguments::new(tokens, flags);
        let mut ctx = CommandContext::new(self.db.as_ref(), &mut self.contexts, &mut self.debug);
        let result = handler.run(&mut ctx, &args).await;
        let output = ctx.output;

        let terminate = match result {
            Ok(CommandResult::Continue) => false,
            Ok(CommandResult::PopContext) => self.contexts.pop().is_none(),
            Ok(CommandResult::Terminate) => true,
            Err(err) => {
                warn!(target: "cli", category = err.category(), error = %err, "handler failed");
                let mut output = output;
                output.push(CommandOutput::error(err.to_string()));
                return Ok(Dispatch::from_output(output));
            }
        };
        debug!(target: "cli", depth = self.contexts.depth(), terminate, "command finished");
        Ok(Dispatch { output, terminate })
    }

    /// Output of `help <words>`.
    pub fn help(&self, words: &[&str]) -> Result<Vec<CommandOutput>> {
        help::describe(&self.registry, self.contexts.active_tree(), words)
    }

    /// Completion candidates for the line typed so far.
    pub async fn complete(&self, line: &str) -> Result<Completion> {
        let tree = self.contexts.active_tree();
        let request = Request::parse(line);
        let position = Position::locate(&self.registry, tree, &request.words);
        let names = fetch_names(self.db.as_ref(), position.name_kinds()).await?;
        Ok(complete::complete(
            &self.registry,
            tree,
            &request,
            &position,
            &names,
        ))
    }

    /// Outline of every command tree.
    pub fn dump(&self) -> Vec<String> {
        self.registry.dump()
    }
}

fn name_kinds(options: &[OptionSpec]) -> Vec<NameKind> {
    let mut kinds: Vec<NameKind> = Vec::new();
    for kind in options.iter().flat_map(OptionSpec::name_kinds) {
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    kinds
}

/// Fetches a fresh snapshot, skipping the database when nothing is needed.
async fn fetch_names(db: &dyn DatabaseClient, kinds: Vec<NameKind>) -> Result<Names> {
    if kinds.is_empty() {
        return Ok(Names::new());
    }
    db.names(&kinds).await
}
