//! Completion and inline help against the built-in command set.

use ops_cli::commands::complete::CR;
use pretty_assertions::assert_eq;

use super::{run, session};

fn texts(completion: &ops_cli::commands::Completion) -> Vec<&str> {
    completion.items.iter().map(|i| i.text.as_str()).collect()
}

#[tokio::test]
async fn test_start_of_line_in_config_mode() {
    let mut router = session();
    run(&mut router, &["configure terminal"]).await;
    let c = router.complete("").await.unwrap();
    assert_eq!(
        texts(&c),
        vec!["vlan", "interface", "lldp", "show", "exit", "pwc", "debug"]
    );
}

#[tokio::test]
async fn test_unique_word_completes() {
    let router = session();
    assert_eq!(router.complete("conf").await.unwrap().unique(), Some("configure"));
    assert_eq!(router.complete("help sh").await.unwrap().unique(), Some("show"));
    assert_eq!(
        router.complete("show running").await.unwrap().unique(),
        Some("running-configuration")
    );
}

#[tokio::test]
async fn test_interface_names_come_from_the_database() {
    let mut router = session();
    run(&mut router, &["configure terminal"]).await;
    let c = router.complete("interface ").await.unwrap();
    assert_eq!(texts(&c), vec!["1", "2", "3", "4", "bridge_normal"]);
    assert!(!c.executable);

    let c = router.complete("interface b").await.unwrap();
    assert_eq!(c.unique(), Some("bridge_normal"));
}

#[tokio::test]
async fn test_show_lldp_candidates() {
    let router = session();
    let c = router.complete("show lldp ").await.unwrap();
    assert_eq!(texts(&c), vec!["configuration", "statistics", "tlv"]);
    assert!(c.executable);

    let c = router.complete("show lldp configuration ").await.unwrap();
    assert_eq!(texts(&c), vec!["1", "2", "3", "4", "bridge_normal", "tlv"]);
}

#[tokio::test]
async fn test_tlv_choice_shares_a_prefix() {
    let mut router = session();
    run(&mut router, &["configure terminal"]).await;
    let c = router.complete("no lldp select-tlv port-v").await.unwrap();
    assert_eq!(texts(&c), vec!["port-vlan-id", "port-vlan-name"]);
    assert_eq!(c.common_prefix(), Some("port-vlan-".to_string()));
}

#[tokio::test]
async fn test_integer_placeholder_and_cr() {
    let router = session();
    let c = router.complete("show vlan ").await.unwrap();
    assert_eq!(texts(&c), vec!["<1-4095>", "internal", "summary"]);
    assert_eq!(c.unique(), None);
    let help: Vec<String> = c.help_items().into_iter().map(|i| i.text).collect();
    assert_eq!(help.last().map(String::as_str), Some(CR));
}

#[tokio::test]
async fn test_negated_line_is_executable_only_where_allowed() {
    let mut router = session();
    run(&mut router, &["configure terminal"]).await;
    assert!(router.complete("no lldp holdtime 6 ").await.unwrap().executable);
    assert!(!router.complete("no interface 2 ").await.unwrap().executable);
}
