//! Interface commands.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value as Json;

use super::lldp::Direction;
use super::system::CONFIG_TREE;
use super::{Arguments, CommandContext, CommandResult, Handler};
use crate::commands::context::Context;
use crate::commands::options::OptionSpec;
use crate::commands::output::CommandOutput;
use crate::commands::registry::{Registry, GLOBAL_TREE};
use crate::commands::token::{NameKind, Token, Value};
use crate::commands::tree::{CommandSpec, Flag};
use crate::db::protocol::{atom_to_string, decode_map};
use crate::db::{expect_one, natural_key, Condition, DatabaseClient, Row, INTERFACE_TABLE, SYSTEM_TABLE};
use crate::error::{CliError, Result};

/// Tree of the mode entered by `interface <name>`.
pub const INTERFACE_TREE: &str = "interface";

const STATUS_COLUMNS: [&str; 8] = [
    "name",
    "admin_state",
    "link_state",
    "duplex",
    "link_speed",
    "link_resets",
    "mac_in_use",
    "hw_intf_info",
];

const DETAIL_LABELS: [(&str, &str); 6] = [
    ("admin_state", "Administrative state"),
    ("link_state", "Operational state"),
    ("duplex", "Duplex"),
    ("link_speed", "Speed"),
    ("link_resets", "Resets"),
    ("mac_in_use", "MAC address in use"),
];

const TRANSCEIVER_LABELS: [(&str, &str); 5] = [
    ("connector", "Connector"),
    ("mac_addr", "Mac address"),
    ("max_speed", "Max speed"),
    ("pluggable", "Removable"),
    ("speeds", "Supported speeds"),
];

pub fn register(registry: &mut Registry) -> Result<()> {
    registry.register(
        CONFIG_TREE,
        CommandSpec::new("interface", "Select an interface to configure", ConfInterface)
            .option(OptionSpec::one_of(vec![Token::name(NameKind::Interface)]).required()),
    )?;
    registry.register(
        INTERFACE_TREE,
        CommandSpec::new("shutdown", "Disable the interface", Shutdown).flag(Flag::No),
    )?;
    registry.register(
        GLOBAL_TREE,
        CommandSpec::new("show interface", "Interface information", ShowInterface)
            .option(OptionSpec::one_of(vec![
                Token::name(NameKind::Interface),
                Token::keyword("mgmt", "Management interface details"),
            ]))
            .option(OptionSpec::one_of(vec![
                Token::keyword("brief", "Show brief information"),
                Token::keyword("transceiver", "Show transceiver information"),
            ])),
    )
}

/// Handle `interface <name>`.
pub struct ConfInterface;

#[async_trait]
impl Handler for ConfInterface {
    async fn run(&self, ctx: &mut CommandContext<'_>, args: &Arguments) -> Result<CommandResult> {
        let name = args.first().cloned().ok_or(CliError::OptionRequired)?;
        ctx.contexts.push(Context::bound(INTERFACE_TREE, name));
        Ok(CommandResult::Continue)
    }
}

/// Handle `[no] shutdown` inside an interface.
pub struct Shutdown;

#[async_trait]
impl Handler for Shutdown {
    async fn run(&self, ctx: &mut CommandContext<'_>, args: &Arguments) -> Result<CommandResult> {
        let name = ctx
            .contexts
            .object(INTERFACE_TREE)
            .map(Value::to_string)
            .ok_or_else(|| CliError::command("No interface selected."))?;
        let admin = if args.negated() { "up" } else { "down" };
        ctx.db
            .map_set_key(
                INTERFACE_TABLE,
                "user_config",
                "admin",
                admin,
                vec![Condition::eq("name", name.as_str())],
            )
            .await?;
        Ok(CommandResult::Continue)
    }
}

/// Handle `show interface [<name>|mgmt] [brief|transceiver]`.
pub struct ShowInterface;

#[async_trait]
impl Handler for ShowInterface {
    async fn run(&self, ctx: &mut CommandContext<'_>, args: &Arguments) -> Result<CommandResult> {
        if args.has(0, 1) {
            show_mgmt(ctx).await?;
            return Ok(CommandResult::Continue);
        }

        let rows = match args.get(0, 0).and_then(Value::as_str) {
            Some(name) => {
                let rows = ctx
                    .db
                    .select(
                        INTERFACE_TABLE,
                        vec![Condition::eq("name", name)],
                        Some(&STATUS_COLUMNS),
                    )
                    .await?;
                vec![expect_one(rows, "interface")?]
            }
            None => {
                let mut rows = ctx
                    .db
                    .select(INTERFACE_TABLE, Vec::new(), Some(&STATUS_COLUMNS))
                    .await?;
                rows.sort_by(|a, b| natural_key(row_name(a)).cmp(&natural_key(row_name(b))));
                rows
            }
        };

        let brief = args.has(1, 0);
        let transceiver = args.has(1, 1);
        for row in &rows {
            let data = status(row);
            let name = row_name(row);
            if brief {
                ctx.info(brief_line(name, &data));
                continue;
            }
            let labels: &[(&str, &str)] = if transceiver {
                &TRANSCEIVER_LABELS
            } else {
                &DETAIL_LABELS
            };
            let pairs = labels
                .iter()
                .filter_map(|(key, label)| {
                    let value = data.get(*key)?;
                    let value = match (*key, value.as_str()) {
                        ("pluggable", "true") => "Yes".to_string(),
                        ("pluggable", "false") => "No".to_string(),
                        _ => value.clone(),
                    };
                    Some((label.to_string(), value))
                })
                .collect();
            ctx.info(format!("Interface {name}:"));
            ctx.emit(CommandOutput::key_values(pairs));
        }
        Ok(CommandResult::Continue)
    }
}

fn row_name(row: &Row) -> &str {
    row.get("name").and_then(Json::as_str).unwrap_or_default()
}

/// Flattens the status columns and the hardware info map into one lookup.
fn status(row: &Row) -> BTreeMap<String, String> {
    let mut data: BTreeMap<String, String> = STATUS_COLUMNS
        .iter()
        .filter(|c| !matches!(**c, "name" | "hw_intf_info"))
        .filter_map(|c| row.get(*c).map(|v| (c.to_string(), atom_to_string(v))))
        .filter(|(_, v)| !v.is_empty())
        .collect();
    if let Some(info) = row.get("hw_intf_info") {
        data.extend(decode_map(info));
    }
    data
}

fn brief_line(name: &str, data: &BTreeMap<String, String>) -> String {
    let unknown = String::from("unknown");
    let link = data.get("link_state").unwrap_or(&unknown);
    let mut line = format!("Interface {name} is {link}");
    if link == "down" {
        let admin = data.get("admin_state").unwrap_or(&unknown);
        line.push_str(&format!(" (administratively {admin})"));
    }
    line
}

async fn show_mgmt(ctx: &mut CommandContext<'_>) -> Result<()> {
    let status = ctx
        .db
        .get_map(SYSTEM_TABLE, "mgmt_intf_status", Vec::new())
        .await?;
    let get = |key: &str| status.get(key).cloned();

    let mut pairs = Vec::new();
    if let Some(state) = get("link_state") {
        pairs.push(("Operational state".to_string(), state));
    }
    if let Some(ip) = get("ip") {
        let address = match get("subnet_mask") {
            Some(mask) => format!("{ip}/{mask}"),
            None => ip,
        };
        pairs.push(("IPv4 address/len".to_string(), address));
    }
    if let Some(gateway) = get("default_gateway") {
        pairs.push(("IPv4 default route".to_string(), gateway));
    }
    if let Some(link_local) = get("ipv6_linklocal") {
        pairs.push(("IPv6 link local address/prefix".to_string(), link_local));
    }
    ctx.info("Interface mgmt:");
    ctx.emit(CommandOutput::key_values(pairs));
    Ok(())
}

/// `interface N` blocks for interfaces whose settings differ from the defaults.
pub async fn running_config(db: &dyn DatabaseClient) -> Result<Vec<String>> {
    let mut rows = db
        .select(
            INTERFACE_TABLE,
            Vec::new(),
            Some(&["name", "user_config", "other_config"]),
        )
        .await?;
    rows.sort_by(|a, b| natural_key(row_name(a)).cmp(&natural_key(row_name(b))));

    let mut lines = Vec::new();
    for row in &rows {
        let map = |column: &str| row.get(column).map(decode_map).unwrap_or_default();
        let user_config = map("user_config");
        let other_config = map("other_config");

        let mut block = Vec::new();
        let direction = Direction::parse(other_config.get("lldp_enable_dir").map(String::as_str));
        if !direction.rx {
            block.push("\tno lldp reception".to_string());
        }
        if !direction.tx {
            block.push("\tno lldp transmission".to_string());
        }
        if user_config.get("admin").is_some_and(|a| a == "up") {
            block.push("\tno shutdown".to_string());
        }

        if !block.is_empty() {
            lines.push(format!("interface {}", row_name(row)));
            lines.extend(block);
        }
    }
    Ok(lines)
}
