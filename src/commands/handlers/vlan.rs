//! VLAN commands.

use async_trait::async_trait;
use serde_json::{json, Value as Json};

use super::system::CONFIG_TREE;
use super::{Arguments, CommandContext, CommandResult, Handler};
use crate::commands::context::Context;
use crate::commands::options::OptionSpec;
use crate::commands::output::CommandOutput;
use crate::commands::registry::{Registry, GLOBAL_TREE};
use crate::commands::token::{Token, Value};
use crate::commands::tree::{CommandSpec, Flag};
use crate::db::protocol::{atom_to_string, to_row};
use crate::db::{Condition, DatabaseClient, Row, SYSTEM_TABLE, VLAN_TABLE};
use crate::error::{CliError, Result};

/// Tree of the mode entered by `vlan <id>`.
pub const VLAN_TREE: &str = "vlan";

const SHOW_COLUMNS: [&str; 4] = ["id", "name", "oper_state", "oper_state_reason"];

fn vlan_id() -> Token {
    Token::range(1, 4095).help("VLAN identifier")
}

pub fn register(registry: &mut Registry) -> Result<()> {
    registry.register(
        CONFIG_TREE,
        CommandSpec::new("vlan", "VLAN configuration", ConfVlan).option(
            OptionSpec::one_of(vec![
                vlan_id(),
                Token::keyword("internal", "VLAN internal configuration"),
            ])
            .required(),
        ),
    )?;
    registry.register(
        VLAN_TREE,
        CommandSpec::new("shutdown", "Disable the VLAN", Shutdown).flag(Flag::No),
    )?;
    registry.register(
        GLOBAL_TREE,
        CommandSpec::new("show vlan", "Show VLAN configuration", ShowVlan).option(
            OptionSpec::one_of(vec![
                vlan_id(),
                Token::keyword("internal", "VLAN internal configuration"),
                Token::keyword("summary", "VLAN summary"),
            ]),
        ),
    )
}

/// Handle `vlan <id>`: create the VLAN if needed and enter its mode.
pub struct ConfVlan;

#[async_trait]
impl Handler for ConfVlan {
    async fn run(&self, ctx: &mut CommandContext<'_>, args: &Arguments) -> Result<CommandResult> {
        let Some(id) = args.integer() else {
            return Err(CliError::command(
                "Internal VLANs are allocated by the system.",
            ));
        };

        let existing = ctx
            .db
            .select(VLAN_TABLE, vec![Condition::eq("id", id)], Some(&["id"]))
            .await?;
        if existing.is_empty() {
            ctx.db
                .insert(
                    VLAN_TABLE,
                    to_row(json!({
                        "id": id,
                        "name": format!("VLAN{id}"),
                        "admin": "down",
                    })),
                )
                .await?;
        }

        ctx.contexts.push(Context::bound(VLAN_TREE, Value::Integer(id)));
        Ok(CommandResult::Continue)
    }
}

/// Handle `[no] shutdown` inside a VLAN.
pub struct Shutdown;

#[async_trait]
impl Handler for Shutdown {
    async fn run(&self, ctx: &mut CommandContext<'_>, args: &Arguments) -> Result<CommandResult> {
        let id = ctx
            .contexts
            .object(VLAN_TREE)
            .and_then(Value::as_integer)
            .ok_or_else(|| CliError::command("No VLAN selected."))?;
        let admin = if args.negated() { "up" } else { "down" };
        let changed = ctx
            .db
            .update(
                VLAN_TABLE,
                vec![Condition::eq("id", id)],
                to_row(json!({ "admin": admin })),
            )
            .await?;
        if changed == 0 {
            return Err(CliError::command(format!("VLAN {id} has not been configured.")));
        }
        Ok(CommandResult::Continue)
    }
}

/// Handle `show vlan [<id>|internal|summary]`.
pub struct ShowVlan;

#[async_trait]
impl Handler for ShowVlan {
    async fn run(&self, ctx: &mut CommandContext<'_>, args: &Arguments) -> Result<CommandResult> {
        if args.has(0, 1) {
            let config = ctx.db.get_map(SYSTEM_TABLE, "other_config", Vec::new()).await?;
            let get = |key: &str| config.get(key).cloned().unwrap_or_default();
            ctx.info(format!(
                "Internal VLAN range: {}-{}",
                get("min_internal_vlan"),
                get("max_internal_vlan")
            ));
            ctx.info(format!("Internal VLAN policy: {}", get("internal_vlan_policy")));
            return Ok(CommandResult::Continue);
        }

        let id = args.integer();
        let conditions = id.map(|id| vec![Condition::eq("id", id)]).unwrap_or_default();
        let mut rows = ctx
            .db
            .select(VLAN_TABLE, conditions, Some(&SHOW_COLUMNS))
            .await?;
        rows.sort_by_key(row_id);

        if args.has(0, 2) {
            ctx.info(format!("Number of existing VLANs: {}", rows.len()));
        } else if let (Some(id), true) = (id, rows.is_empty()) {
            ctx.info(format!("VLAN {id} has not been configured."));
        } else {
            let table = rows
                .iter()
                .map(|row| {
                    SHOW_COLUMNS
                        .iter()
                        .map(|c| row.get(*c).map(atom_to_string).unwrap_or_default())
                        .collect()
                })
                .collect();
            ctx.emit(CommandOutput::table(&["ID", "Name", "State", "Reason"], table));
        }
        Ok(CommandResult::Continue)
    }
}

fn row_id(row: &Row) -> i64 {
    row.get("id").and_then(Json::as_i64).unwrap_or_default()
}

/// `vlan N` blocks, with `no shutdown` for VLANs that are up.
pub async fn running_config(db: &dyn DatabaseClient) -> Result<Vec<String>> {
    let mut rows = db.select(VLAN_TABLE, Vec::new(), Some(&["id", "admin"])).await?;
    rows.sort_by_key(row_id);

    let mut lines = Vec::new();
    for row in &rows {
        lines.push(format!("vlan {}", row_id(row)));
        if row.get("admin").and_then(Json::as_str) == Some("up") {
            lines.push("\tno shutdown".to_string());
        }
    }
    Ok(lines)
}
