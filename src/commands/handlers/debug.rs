//! Runtime debug switches (`debug`, `show debug`).

use async_trait::async_trait;

use super::{Arguments, CommandContext, CommandResult, Handler};
use crate::commands::options::OptionSpec;
use crate::commands::registry::{Registry, GLOBAL_TREE};
use crate::commands::token::Token;
use crate::commands::tree::{CommandSpec, Flag};
use crate::error::{CliError, Result};

pub fn register(registry: &mut Registry) -> Result<()> {
    registry.register_all(
        GLOBAL_TREE,
        [
            CommandSpec::new("debug", "Enable debug output for subsystems", SetDebug)
                .option(
                    OptionSpec::one_of(vec![Token::choice(&[
                        ("cli", "Command parsing and dispatch"),
                        ("ovsdb", "Configuration database traffic"),
                    ])])
                    .required(),
                )
                .flag(Flag::No),
            CommandSpec::new("show debug", "Show current debug setting", ShowDebug),
        ],
    )
}

/// Handle `[no] debug <key>`.
pub struct SetDebug;

#[async_trait]
impl Handler for SetDebug {
    async fn run(&self, ctx: &mut CommandContext<'_>, args: &Arguments) -> Result<CommandResult> {
        let key = args
            .first()
            .and_then(|v| v.as_str())
            .ok_or(CliError::IncompleteCommand)?;
        if args.negated() {
            ctx.debug.disable(key)?;
        } else {
            ctx.debug.enable(key)?;
        }
        Ok(CommandResult::Continue)
    }
}

/// Handle `show debug`.
pub struct ShowDebug;

#[async_trait]
impl Handler for ShowDebug {
    async fn run(&self, ctx: &mut CommandContext<'_>, _args: &Arguments) -> Result<CommandResult> {
        let enabled: Vec<&str> = ctx.debug.enabled().collect();
        if !enabled.is_empty() {
            let text = enabled.join("\n");
            ctx.info(text);
        }
        Ok(CommandResult::Continue)
    }
}
