//! End-to-end dispatch scenarios.

use std::sync::Arc;

use ops_cli::commands::{register_builtin, CommandRouter, Registry};
use ops_cli::db::protocol::to_row;
use ops_cli::db::{
    DatabaseClient, FailingDatabaseClient, MockDatabaseClient, INTERFACE_TABLE, SYSTEM_TABLE,
};
use ops_cli::logging::DebugKeys;
use pretty_assertions::assert_eq;
use serde_json::json;

use super::{run, session, session_on};

#[tokio::test]
async fn test_vlan_enters_bound_mode() {
    let mut router = session();
    assert!(run(&mut router, &["configure terminal", "vlan 10"]).await.is_empty());
    assert_eq!(router.prompt(), "switch(vlan-10)# ");

    assert_eq!(
        run(&mut router, &["show vlan 10"]).await,
        vec!["ID   Name     State   Reason", "10   VLAN10"]
    );
    assert_eq!(run(&mut router, &["pwc"]).await, vec!["config", "  vlan 10"]);
}

#[tokio::test]
async fn test_abbreviated_words() {
    let mut router = session();
    run(&mut router, &["conf t"]).await;
    assert_eq!(router.prompt(), "switch(config)# ");
    assert_eq!(
        run(&mut router, &["sh vl sum"]).await,
        vec!["Number of existing VLANs: 1"]
    );
}

#[tokio::test]
async fn test_exit_three_times_terminates() {
    let mut router = session();
    run(&mut router, &["configure terminal", "vlan 10"]).await;
    assert!(!router.dispatch("exit").await.terminate);
    assert_eq!(router.prompt(), "switch(config)# ");
    assert!(!router.dispatch("exit").await.terminate);
    assert_eq!(router.prompt(), "switch> ");
    assert!(router.dispatch("exit").await.terminate);
}

#[tokio::test]
async fn test_quit_only_at_top_level() {
    let mut router = session();
    run(&mut router, &["configure terminal"]).await;
    assert_eq!(run(&mut router, &["quit"]).await, vec!["% No such command."]);
    run(&mut router, &["exit"]).await;
    assert!(router.dispatch("quit").await.terminate);
}

#[tokio::test]
async fn test_lldp_holdtime_and_negation() {
    let mut router = session();
    run(&mut router, &["configure terminal", "lldp holdtime 6"]).await;
    let config = run(&mut router, &["show running-configuration"]).await;
    assert_eq!(config[0], "lldp holdtime 6");

    assert!(run(&mut router, &["no lldp holdtime 6"]).await.is_empty());
    let config = run(&mut router, &["show running-configuration"]).await;
    assert!(!config.iter().any(|l| l.starts_with("lldp holdtime")));

    assert_eq!(
        run(&mut router, &["lldp holdtime 11"]).await,
        vec!["% Required option missing."]
    );
}

#[tokio::test]
async fn test_ambiguous_tlv_prefix_changes_nothing() {
    let db = Arc::new(MockDatabaseClient::new());
    let mut router = session_on(db.clone());
    run(&mut router, &["configure terminal"]).await;
    let before = db.rows(SYSTEM_TABLE);

    for line in ["lldp select-tlv port", "no lldp select-tlv port", "no lldp select-tlv port-vlan"] {
        assert_eq!(run(&mut router, &[line]).await, vec!["% Ambiguous command."], "{line}");
    }
    assert_eq!(db.rows(SYSTEM_TABLE), before);

    assert!(run(&mut router, &["no lldp select-tlv port-vlan-n"]).await.is_empty());
    assert_eq!(
        run(&mut router, &["show running-configuration"]).await,
        vec!["no lldp select-tlv port-vlan-name", "vlan 1", "    no shutdown"]
    );
}

#[tokio::test]
async fn test_interface_named_like_a_keyword() {
    let db = Arc::new(MockDatabaseClient::new());
    db.insert(
        INTERFACE_TABLE,
        to_row(json!({ "name": "mgmt", "link_state": "up" })),
    )
    .await
    .unwrap();
    let mut router = session_on(db);

    assert_eq!(
        run(&mut router, &["show interface mgmt brief"]).await,
        vec!["Interface mgmt is up"]
    );
}

#[tokio::test]
async fn test_running_configuration_collects_every_section() {
    let mut router = session();
    run(
        &mut router,
        &[
            "configure terminal",
            "lldp enable",
            "lldp select-tlv system-name",
            "no lldp select-tlv port-description",
            "vlan 20",
            "no shutdown",
            "exit",
            "interface 3",
            "no lldp transmission",
            "no shutdown",
        ],
    )
    .await;

    assert_eq!(
        run(&mut router, &["show running-configuration"]).await,
        vec![
            "lldp enable",
            "no lldp select-tlv port-description",
            "vlan 1",
            "    no shutdown",
            "vlan 20",
            "    no shutdown",
            "interface 3",
            "    no lldp transmission",
            "    no shutdown",
        ]
    );
}

#[tokio::test]
async fn test_interface_mode() {
    let mut router = session();
    run(&mut router, &["configure terminal", "interface 2"]).await;
    assert_eq!(router.prompt(), "switch(interface-2)# ");

    assert_eq!(
        run(&mut router, &["lldp"]).await,
        vec!["% Required option missing."]
    );
    assert!(run(&mut router, &["no lldp reception"]).await.is_empty());
    assert_eq!(
        run(&mut router, &["show lldp configuration 2"]).await.last().map(String::as_str),
        Some("  2           No        Yes")
    );

    run(&mut router, &["exit"]).await;
    assert_eq!(
        run(&mut router, &["no interface 2"]).await,
        vec!["% No such command."]
    );
    assert_eq!(
        run(&mut router, &["interface 99"]).await,
        vec!["% Invalid option 99."]
    );
}

#[tokio::test]
async fn test_show_commands_from_any_mode() {
    let mut router = session();
    run(&mut router, &["configure terminal", "vlan 1"]).await;
    assert_eq!(
        run(&mut router, &["show interface 4 brief"]).await,
        vec!["Interface 4 is down (administratively down)"]
    );
    assert_eq!(run(&mut router, &["show lldp tlv"]).await.len(), 10);
    assert_eq!(
        run(&mut router, &["show lldp"]).await,
        vec!["% Incomplete command."]
    );
}

#[tokio::test]
async fn test_debug_keys_toggle() {
    let mut router = session();
    assert!(run(&mut router, &["debug ovsdb"]).await.is_empty());
    assert_eq!(run(&mut router, &["show debug"]).await, vec!["ovsdb"]);
    assert!(router.debug_keys().is_enabled("ovsdb"));

    run(&mut router, &["no debug ovsdb"]).await;
    assert!(run(&mut router, &["show debug"]).await.is_empty());
    assert_eq!(
        run(&mut router, &["debug kernel"]).await,
        vec!["% Invalid option kernel."]
    );
}

#[tokio::test]
async fn test_error_lines() {
    let mut router = session();
    let cases = [
        ("bogus", "% No such command."),
        ("vlan 10", "% No such command."),
        ("sh v", "% Ambiguous command."),
        ("show version", "% Required option missing."),
        ("show version hardware software", "% Too many options: only one of them may be given."),
        ("configure terminal extra", "% Invalid option extra."),
        ("help bogus", "% No help available: unknown command."),
    ];
    for (line, expected) in cases {
        assert_eq!(run(&mut router, &[line]).await, vec![expected], "{line}");
    }
    assert!(router.contexts().is_empty());
}

#[tokio::test]
async fn test_help_command() {
    let mut router = session();
    assert_eq!(
        run(&mut router, &["help show vlan"]).await,
        vec![
            "Show VLAN configuration",
            "Usage: show vlan [<1-4095>|internal|summary]",
        ]
    );

    run(&mut router, &["configure terminal", "interface 1"]).await;
    assert_eq!(
        run(&mut router, &["help lldp"]).await,
        vec![
            "Configure LLDP on this interface",
            "Usage: [no] lldp {[reception] [transmission]}",
        ]
    );
}

#[tokio::test]
async fn test_database_failure_is_one_line() {
    let mut registry = Registry::new();
    register_builtin(&mut registry).unwrap();
    let mut router = CommandRouter::new(
        registry,
        Arc::new(FailingDatabaseClient),
        DebugKeys::detached(""),
        "switch",
    );

    assert_eq!(
        run(&mut router, &["show vlan"]).await,
        vec!["% Database error: connection refused"]
    );
    assert!(run(&mut router, &["pwc"]).await.is_empty());
}
