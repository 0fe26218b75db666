//! LLDP commands.
//!
//! Global settings live in `System.other_config`, clear requests are counters
//! in `System.status`, and each interface keeps its direction in
//! `Interface.other_config["lldp_enable_dir"]`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value as Json;

use super::interface::INTERFACE_TREE;
use super::system::CONFIG_TREE;
use super::{Arguments, CommandContext, CommandResult, Handler};
use crate::commands::options::OptionSpec;
use crate::commands::output::CommandOutput;
use crate::commands::registry::{Registry, GLOBAL_TREE};
use crate::commands::token::{NameKind, Token, Value};
use crate::commands::tree::{CommandSpec, Flag};
use crate::db::protocol::decode_map;
use crate::db::{natural_key, Condition, DatabaseClient, INTERFACE_TABLE, SYSTEM_TABLE};
use crate::error::{CliError, Result};

const DEFAULT_HOLDTIME: &str = "4";
const DEFAULT_TIMER: &str = "30";
const DIRECTION_KEY: &str = "lldp_enable_dir";

/// An advertisable TLV: command word, `other_config` key, description.
pub struct Tlv {
    pub word: &'static str,
    pub key: &'static str,
    pub description: &'static str,
}

pub const TLVS: [Tlv; 9] = [
    Tlv {
        word: "management-address",
        key: "lldp_tlv_mgmt_addr_enable",
        description: "Management address",
    },
    Tlv {
        word: "port-description",
        key: "lldp_tlv_port_desc_enable",
        description: "Port description",
    },
    Tlv {
        word: "port-protocol-id",
        key: "lldp_tlv_port_proto_id_enable",
        description: "Port protocol ID",
    },
    Tlv {
        word: "port-protocol-vlan-id",
        key: "lldp_tlv_port_proto_vlan_id_enable",
        description: "Port protocol VLAN ID",
    },
    Tlv {
        word: "port-vlan-id",
        key: "lldp_tlv_port_vlan_id_enable",
        description: "Port VLAN ID",
    },
    Tlv {
        word: "port-vlan-name",
        key: "lldp_tlv_port_vlan_name_enable",
        description: "Port VLAN name",
    },
    Tlv {
        word: "system-capabilities",
        key: "lldp_tlv_sys_cap_enable",
        description: "System capabilities",
    },
    Tlv {
        word: "system-description",
        key: "lldp_tlv_sys_desc_enable",
        description: "System description",
    },
    Tlv {
        word: "system-name",
        key: "lldp_tlv_sys_name_enable",
        description: "System name",
    },
];

/// Which LLDP directions an interface runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Direction {
    pub rx: bool,
    pub tx: bool,
}

impl Direction {
    /// Parses `rx`, `tx`, `rxtx` or `off`. A missing value means both.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            None => Self { rx: true, tx: true },
            Some("off") => Self { rx: false, tx: false },
            Some(v) => Self {
                rx: v.contains("rx"),
                tx: v.contains("tx"),
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match (self.rx, self.tx) {
            (true, true) => "rxtx",
            (true, false) => "rx",
            (false, true) => "tx",
            (false, false) => "off",
        }
    }
}

pub fn register(registry: &mut Registry) -> Result<()> {
    let tlv_words: Vec<(&str, String)> = TLVS
        .iter()
        .map(|t| (t.word, format!("Select {} TLV", t.word)))
        .collect();
    let tlv_choice: Vec<(&str, &str)> = tlv_words.iter().map(|(w, h)| (*w, h.as_str())).collect();

    registry.register(
        CONFIG_TREE,
        CommandSpec::new("lldp", "Configure LLDP parameters", ConfLldp)
            .option(OptionSpec::one_of(vec![Token::keyword(
                "enable",
                "Enable or disable LLDP",
            )]))
            .option(OptionSpec::all_ordered(vec![
                Token::keyword("holdtime", "Hold time multiplier"),
                Token::range(2, 10).help("Hold time multiplier"),
            ]))
            .option(OptionSpec::all_ordered(vec![
                Token::keyword("timer", "LLDP status transmit interval"),
                Token::range(5, 32768).help("Interval in seconds"),
            ]))
            .option(OptionSpec::all_ordered(vec![
                Token::keyword(
                    "select-tlv",
                    "Specify TLVs to send and receive in LLDP packets",
                ),
                Token::choice(&tlv_choice),
            ]))
            .option(OptionSpec::all_ordered(vec![
                Token::keyword("clear", "Clear LLDP information"),
                Token::choice(&[
                    ("counters", "Clear LLDP counters"),
                    ("neighbors", "Clear LLDP neighbor entries"),
                ]),
            ]))
            .flag(Flag::No),
    )?;

    registry.register(
        INTERFACE_TREE,
        CommandSpec::new("lldp", "Configure LLDP on this interface", InterfaceLldp)
            .option(
                OptionSpec::any_unordered(vec![
                    Token::keyword("reception", "Set LLDP reception"),
                    Token::keyword("transmission", "Set LLDP transmission"),
                ])
                .required(),
            )
            .flag(Flag::No),
    )?;

    registry.register(
        GLOBAL_TREE,
        CommandSpec::new("show lldp", "LLDP settings and statistics", ShowLldp)
            .option(OptionSpec::any_ordered(vec![
                Token::choice(&[
                    ("configuration", "LLDP configuration"),
                    ("statistics", "LLDP statistics"),
                ]),
                Token::name(NameKind::Interface),
            ]))
            .option(OptionSpec::one_of(vec![Token::keyword(
                "tlv",
                "TLVs advertised by LLDP",
            )])),
    )
}

/// Handle `[no] lldp ...` in configuration mode.
pub struct ConfLldp;

#[async_trait]
impl Handler for ConfLldp {
    async fn run(&self, ctx: &mut CommandContext<'_>, args: &Arguments) -> Result<CommandResult> {
        let enabled = !args.negated();
        let flag = if enabled { "true" } else { "false" };

        if args.has(0, 0) {
            set_global(ctx.db, "lldp_enable", flag).await?;
        }
        if let Some(holdtime) = args.get(1, 1) {
            set_or_clear(ctx.db, "lldp_hold", holdtime, enabled).await?;
        }
        if let Some(timer) = args.get(2, 1) {
            set_or_clear(ctx.db, "lldp_tx_interval", timer, enabled).await?;
        }
        if let Some(word) = args.get(3, 1).and_then(Value::as_str) {
            let tlv = TLVS
                .iter()
                .find(|t| t.word == word)
                .ok_or_else(|| CliError::invalid_value(word))?;
            set_global(ctx.db, tlv.key, flag).await?;
        }
        if let Some(what) = args.get(4, 1).and_then(Value::as_str) {
            let counter = match what {
                "counters" => "lldp_num_clear_counters_requested",
                _ => "lldp_num_clear_table_requested",
            };
            let status = ctx.db.get_map(SYSTEM_TABLE, "status", Vec::new()).await?;
            let next = status
                .get(counter)
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0)
                + 1;
            ctx.db
                .map_set_key(SYSTEM_TABLE, "status", counter, &next.to_string(), Vec::new())
                .await?;
        }
        Ok(CommandResult::Continue)
    }
}

async fn set_global(db: &dyn DatabaseClient, key: &str, value: &str) -> Result<()> {
    db.map_set_key(SYSTEM_TABLE, "other_config", key, value, Vec::new())
        .await
}

async fn set_or_clear(db: &dyn DatabaseClient, key: &str, value: &Value, set: bool) -> Result<()> {
    if set {
        set_global(db, key, &value.to_string()).await
    } else {
        db.map_delete_key(SYSTEM_TABLE, "other_config", key, Vec::new())
            .await
    }
}

/// Handle `[no] lldp {reception|transmission}` in interface mode.
pub struct InterfaceLldp;

#[async_trait]
impl Handler for InterfaceLldp {
    async fn run(&self, ctx: &mut CommandContext<'_>, args: &Arguments) -> Result<CommandResult> {
        let name = ctx
            .contexts
            .object(INTERFACE_TREE)
            .map(Value::to_string)
            .ok_or_else(|| CliError::command("No interface selected."))?;
        let condition = || vec![Condition::eq("name", name.as_str())];

        let config = ctx
            .db
            .get_map(INTERFACE_TABLE, "other_config", condition())
            .await?;
        let old = Direction::parse(config.get(DIRECTION_KEY).map(String::as_str));
        let mut new = old;
        if args.has(0, 0) {
            new.rx = !args.negated();
        }
        if args.has(0, 1) {
            new.tx = !args.negated();
        }

        if new != old {
            ctx.db
                .map_set_key(
                    INTERFACE_TABLE,
                    "other_config",
                    DIRECTION_KEY,
                    new.as_str(),
                    condition(),
                )
                .await?;
        }
        Ok(CommandResult::Continue)
    }
}

/// Handle `show lldp [configuration|statistics [<interface>]] [tlv]`.
pub struct ShowLldp;

#[async_trait]
impl Handler for ShowLldp {
    async fn run(&self, ctx: &mut CommandContext<'_>, args: &Arguments) -> Result<CommandResult> {
        let what = args.get(0, 0).and_then(Value::as_str);
        let interface = args.get(0, 1).and_then(Value::as_str).map(str::to_string);
        let tlv = args.has(1, 0);

        match what {
            Some("configuration") => show_configuration(ctx, interface.as_deref()).await?,
            Some("statistics") => show_statistics(ctx, interface.as_deref()).await?,
            _ if tlv => {}
            _ => return Err(CliError::IncompleteCommand),
        }
        if tlv {
            show_tlvs(ctx).await?;
        }
        Ok(CommandResult::Continue)
    }
}

async fn global_config(db: &dyn DatabaseClient) -> Result<BTreeMap<String, String>> {
    db.get_map(SYSTEM_TABLE, "other_config", Vec::new()).await
}

async fn show_configuration(ctx: &mut CommandContext<'_>, interface: Option<&str>) -> Result<()> {
    let config = global_config(ctx.db).await?;
    let get = |key: &str, default: &str| config.get(key).cloned().unwrap_or_else(|| default.to_string());

    let mut pairs = vec![
        (
            "Enabled".to_string(),
            yes_no(config.get("lldp_enable").is_some_and(|v| v == "true")),
        ),
        ("Hold time".to_string(), get("lldp_hold", DEFAULT_HOLDTIME)),
        (
            "Transmit interval".to_string(),
            get("lldp_tx_interval", DEFAULT_TIMER),
        ),
    ];
    if let Some(address) = config.get("lldp_mgmt_addr") {
        pairs.push(("Management address".to_string(), address.clone()));
    }
    ctx.info("LLDP global configuration:");
    ctx.emit(CommandOutput::key_values(pairs));
    ctx.info("");

    show_tlvs(ctx).await?;
    ctx.info("");

    let rows = interface_rows(ctx.db, interface, "other_config").await?;
    let table = rows
        .into_iter()
        .map(|(name, config)| {
            let direction = Direction::parse(decode_map(&config).get(DIRECTION_KEY).map(String::as_str));
            vec![name, yes_no(direction.rx), yes_no(direction.tx)]
        })
        .collect();
    ctx.info("Port configuration:");
    ctx.emit(CommandOutput::table(&["Interface", "Receive", "Transmit"], table).indented(2));
    Ok(())
}

async fn show_statistics(ctx: &mut CommandContext<'_>, interface: Option<&str>) -> Result<()> {
    let rows = interface_rows(ctx.db, interface, "lldp_statistics").await?;
    let table = rows
        .into_iter()
        .map(|(name, stats)| {
            let stats = decode_map(&stats);
            let get = |key: &str| stats.get(key).cloned().unwrap_or_else(|| "0".to_string());
            vec![name, get("lldp_tx"), get("lldp_rx"), get("lldp_rx_discard")]
        })
        .collect();
    ctx.emit(CommandOutput::table(
        &["Interface", "Transmitted", "Received", "Discarded"],
        table,
    ));
    Ok(())
}

async fn show_tlvs(ctx: &mut CommandContext<'_>) -> Result<()> {
    let config = global_config(ctx.db).await?;
    let advertised: Vec<String> = TLVS
        .iter()
        .filter(|t| config.get(t.key).map_or(true, |v| v == "true"))
        .map(|t| format!("  {}", t.description))
        .collect();
    ctx.info("TLVs advertised:");
    if !advertised.is_empty() {
        ctx.info(advertised.join("\n"));
    }
    Ok(())
}

/// `(name, column)` for one interface or all of them, in name order.
async fn interface_rows(
    db: &dyn DatabaseClient,
    interface: Option<&str>,
    column: &str,
) -> Result<Vec<(String, Json)>> {
    let conditions = interface
        .map(|name| vec![Condition::eq("name", name)])
        .unwrap_or_default();
    let rows = db
        .select(INTERFACE_TABLE, conditions, Some(&["name", column]))
        .await?;
    let mut out: Vec<(String, Json)> = rows
        .into_iter()
        .filter_map(|mut row| {
            let name = row.get("name")?.as_str()?.to_string();
            let value = row.remove(column).unwrap_or(Json::Null);
            Some((name, value))
        })
        .collect();
    out.sort_by(|a, b| natural_key(&a.0).cmp(&natural_key(&b.0)));
    Ok(out)
}

fn yes_no(value: bool) -> String {
    let text = if value { "Yes" } else { "No" };
    text.to_string()
}

/// Global LLDP lines that differ from the defaults.
pub async fn running_config(db: &dyn DatabaseClient) -> Result<Vec<String>> {
    let config = global_config(db).await?;
    let mut lines = Vec::new();

    if config.get("lldp_enable").is_some_and(|v| v == "true") {
        lines.push("lldp enable".to_string());
    }
    if let Some(hold) = config.get("lldp_hold").filter(|v| *v != DEFAULT_HOLDTIME) {
        lines.push(format!("lldp holdtime {hold}"));
    }
    if let Some(timer) = config.get("lldp_tx_interval").filter(|v| *v != DEFAULT_TIMER) {
        lines.push(format!("lldp timer {timer}"));
    }
    for tlv in &TLVS {
        if config.get(tlv.key).is_some_and(|v| v != "true") {
            lines.push(format!("no lldp select-tlv {}", tlv.word));
        }
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context::{Context, ContextStack};
    use crate::commands::handlers::testing::run;
    use crate::commands::options::{Bound, TokenId};
    use crate::db::MockDatabaseClient;
    use pretty_assertions::assert_eq;

    fn args(option: usize, values: Vec<Value>, flags: Vec<Flag>) -> Arguments {
        let tokens = values
            .into_iter()
            .enumerate()
            .map(|(slot, value)| Bound {
                source: TokenId { option, slot },
                value,
            })
            .collect();
        Arguments::new(tokens, flags)
    }

    fn word(w: &str) -> Value {
        Value::Word(w.to_string())
    }

    async fn other_config(db: &MockDatabaseClient) -> BTreeMap<String, String> {
        global_config(db).await.unwrap()
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!(Direction::parse(None).as_str(), "rxtx");
        assert_eq!(Direction::parse(Some("off")), Direction { rx: false, tx: false });
        assert_eq!(Direction::parse(Some("tx")), Direction { rx: false, tx: true });
        assert_eq!(Direction { rx: true, tx: false }.as_str(), "rx");
    }

    #[tokio::test]
    async fn test_holdtime_set_and_negated() {
        let db = MockDatabaseClient::new();
        let mut contexts = ContextStack::new();
        let set = args(1, vec![word("holdtime"), Value::Integer(6)], vec![]);
        run(&ConfLldp, &db, &mut contexts, set).await.0.unwrap();
        assert_eq!(other_config(&db).await.get("lldp_hold").map(String::as_str), Some("6"));
        assert_eq!(running_config(&db).await.unwrap(), vec!["lldp holdtime 6"]);

        let unset = args(1, vec![word("holdtime"), Value::Integer(6)], vec![Flag::No]);
        run(&ConfLldp, &db, &mut contexts, unset).await.0.unwrap();
        assert!(!other_config(&db).await.contains_key("lldp_hold"));
    }

    #[tokio::test]
    async fn test_enable_and_select_tlv() {
        let db = MockDatabaseClient::new();
        let mut contexts = ContextStack::new();
        run(&ConfLldp, &db, &mut contexts, args(0, vec![word("enable")], vec![]))
            .await
            .0
            .unwrap();
        let no_tlv = args(3, vec![word("select-tlv"), word("system-name")], vec![Flag::No]);
        run(&ConfLldp, &db, &mut contexts, no_tlv).await.0.unwrap();

        assert_eq!(
            running_config(&db).await.unwrap(),
            vec!["lldp enable", "no lldp select-tlv system-name"]
        );
    }

    #[tokio::test]
    async fn test_clear_increments_counter() {
        let db = MockDatabaseClient::new();
        let mut contexts = ContextStack::new();
        for _ in 0..2 {
            let clear = args(4, vec![word("clear"), word("counters")], vec![]);
            run(&ConfLldp, &db, &mut contexts, clear).await.0.unwrap();
        }
        let status = db.get_map(SYSTEM_TABLE, "status", Vec::new()).await.unwrap();
        assert_eq!(
            status.get("lldp_num_clear_counters_requested").map(String::as_str),
            Some("2")
        );
    }

    #[tokio::test]
    async fn test_interface_direction() {
        let db = MockDatabaseClient::new();
        let mut contexts = ContextStack::new();
        contexts.push(Context::bound(INTERFACE_TREE, word("2")));

        let no_rx = args(0, vec![word("reception")], vec![Flag::No]);
        run(&InterfaceLldp, &db, &mut contexts, no_rx).await.0.unwrap();
        let config = db
            .get_map(INTERFACE_TABLE, "other_config", vec![Condition::eq("name", "2")])
            .await
            .unwrap();
        assert_eq!(config.get(DIRECTION_KEY).map(String::as_str), Some("tx"));

        let no_both = args(0, vec![word("reception"), word("transmission")], vec![Flag::No]);
        run(&InterfaceLldp, &db, &mut contexts, no_both).await.0.unwrap();
        let config = db
            .get_map(INTERFACE_TABLE, "other_config", vec![Condition::eq("name", "2")])
            .await
            .unwrap();
        assert_eq!(config.get(DIRECTION_KEY).map(String::as_str), Some("off"));
    }

    #[tokio::test]
    async fn test_show_configuration_for_interface() {
        let db = MockDatabaseClient::new();
        let show = args(0, vec![word("configuration"), word("3")], vec![]);
        let (result, lines) = run(&ShowLldp, &db, &mut ContextStack::new(), show).await;
        result.unwrap();
        assert_eq!(lines[0], "LLDP global configuration:");
        assert_eq!(lines[1], "  Enabled          : No");
        assert_eq!(lines[2], "  Hold time        : 4");
        assert_eq!(lines[3], "  Transmit interval: 30");
        assert_eq!(lines[5], "TLVs advertised:");
        assert_eq!(lines[6], "  Management address");
        assert_eq!(
            &lines[lines.len() - 3..],
            &[
                "Port configuration:".to_string(),
                "  Interface   Receive   Transmit".to_string(),
                "  3           Yes       Yes".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_show_without_section_is_incomplete() {
        let db = MockDatabaseClient::new();
        let (result, _) = run(&ShowLldp, &db, &mut ContextStack::new(), Arguments::default()).await;
        assert_eq!(result, Err(CliError::IncompleteCommand));
    }

    #[tokio::test]
    async fn test_show_tlv_only() {
        let db = MockDatabaseClient::new();
        let (_, lines) = run(&ShowLldp, &db, &mut ContextStack::new(), args(1, vec![word("tlv")], vec![])).await;
        assert_eq!(lines.len(), 10);
    }
}
