//! Session and system commands (quit, exit, pwc, configure, show version,
//! show running-configuration).

use async_trait::async_trait;

use super::{interface, lldp, vlan, Arguments, CommandContext, CommandResult, Handler};
use crate::commands::context::Context;
use crate::commands::options::OptionSpec;
use crate::commands::output::CommandOutput;
use crate::commands::registry::{Registry, GLOBAL_TREE, ROOT_TREE};
use crate::commands::token::Token;
use crate::commands::tree::CommandSpec;
use crate::db::SYSTEM_TABLE;
use crate::error::Result;

/// Tree of the configuration mode entered by `configure terminal`.
pub const CONFIG_TREE: &str = "config";

/// Running-config lines use tabs for nesting; they print as this.
const CONFIG_INDENT: &str = "    ";

pub fn register(registry: &mut Registry) -> Result<()> {
    registry.register_all(
        ROOT_TREE,
        [
            CommandSpec::new("quit", "Quit shell", Quit),
            CommandSpec::new("configure", "Configuration from CLI", Configure).option(
                OptionSpec::one_of(vec![Token::keyword("terminal", "Configure from terminal")])
                    .required(),
            ),
        ],
    )?;

    registry.describe(GLOBAL_TREE, "show", "Show running system information");
    registry.register_all(
        GLOBAL_TREE,
        [
            CommandSpec::new("exit", "Exit current mode and down to previous mode", Exit),
            CommandSpec::new("pwc", "Show current configuration context", Pwc),
            CommandSpec::new("show version", "Version information", ShowVersion).option(
                OptionSpec::one_of(vec![
                    Token::keyword("hardware", "Hardware information"),
                    Token::keyword("software", "Software information"),
                ])
                .required(),
            ),
            CommandSpec::new(
                "show running-configuration",
                "Current running configuration",
                ShowRunningConfig,
            ),
        ],
    )
}

/// Handle `quit`.
pub struct Quit;

#[async_trait]
impl Handler for Quit {
    async fn run(&self, _ctx: &mut CommandContext<'_>, _args: &Arguments) -> Result<CommandResult> {
        Ok(CommandResult::Terminate)
    }
}

/// Handle `exit`: leave the current mode, or the shell at the top level.
pub struct Exit;

#[async_trait]
impl Handler for Exit {
    async fn run(&self, _ctx: &mut CommandContext<'_>, _args: &Arguments) -> Result<CommandResult> {
        Ok(CommandResult::PopContext)
    }
}

/// Handle `pwc`: one line per entered mode, each nested two spaces deeper.
pub struct Pwc;

#[async_trait]
impl Handler for Pwc {
    async fn run(&self, ctx: &mut CommandContext<'_>, _args: &Arguments) -> Result<CommandResult> {
        let lines: Vec<String> = ctx
            .contexts
            .iter()
            .enumerate()
            .map(|(depth, context)| {
                let indent = "  ".repeat(depth);
                match &context.object {
                    Some(object) => format!("{indent}{} {object}", context.mode),
                    None => format!("{indent}{}", context.mode),
                }
            })
            .collect();
        if !lines.is_empty() {
            ctx.info(lines.join("\n"));
        }
        Ok(CommandResult::Continue)
    }
}

/// Handle `configure terminal`.
pub struct Configure;

#[async_trait]
impl Handler for Configure {
    async fn run(&self, ctx: &mut CommandContext<'_>, _args: &Arguments) -> Result<CommandResult> {
        ctx.contexts.push(Context::new(CONFIG_TREE));
        Ok(CommandResult::Continue)
    }
}

/// Handle `show version {hardware|software}`.
pub struct ShowVersion;

#[async_trait]
impl Handler for ShowVersion {
    async fn run(&self, ctx: &mut CommandContext<'_>, args: &Arguments) -> Result<CommandResult> {
        if args.has(0, 0) {
            let info = ctx.db.get_map(SYSTEM_TABLE, "switch_info", Vec::new()).await?;
            let pairs = [
                ("vendor", "Vendor"),
                ("product_name", "Product name"),
                ("serial_number", "Serial number"),
            ]
            .iter()
            .filter_map(|(key, label)| info.get(*key).map(|v| (label.to_string(), v.clone())))
            .collect();
            ctx.info("Hardware:");
            ctx.emit(CommandOutput::key_values(pairs));
        }
        if args.has(0, 1) {
            let info = ctx.db.get_map(SYSTEM_TABLE, "software_info", Vec::new()).await?;
            let mut pairs: Vec<(String, String)> = [("os_name", "OS name"), ("build_id", "Build")]
                .iter()
                .filter_map(|(key, label)| info.get(*key).map(|v| (label.to_string(), v.clone())))
                .collect();
            pairs.push(("Shell".to_string(), env!("CARGO_PKG_VERSION").to_string()));
            ctx.info("Software:");
            ctx.emit(CommandOutput::key_values(pairs));
        }
        Ok(CommandResult::Continue)
    }
}

/// Handle `show running-configuration`.
pub struct ShowRunningConfig;

#[async_trait]
impl Handler for ShowRunningConfig {
    async fn run(&self, ctx: &mut CommandContext<'_>, _args: &Arguments) -> Result<CommandResult> {
        let mut lines = lldp::running_config(ctx.db).await?;
        lines.extend(vlan::running_config(ctx.db).await?);
        lines.extend(interface::running_config(ctx.db).await?);

        let text: Vec<String> = lines
            .iter()
            .map(|line| line.replace('\t', CONFIG_INDENT))
            .collect();
        if !text.is_empty() {
            ctx.info(text.join("\n"));
        }
        Ok(CommandResult::Continue)
    }
}
