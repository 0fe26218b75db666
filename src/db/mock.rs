//! Mock database clients for testing.
//!
//! [`MockDatabaseClient`] keeps tables in memory and evaluates the same
//! operations the OVSDB server would, closely enough for command handlers.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::protocol::{self, to_row as row, Condition, Mutation, Operation, OperationResult, Row};
use super::{DatabaseClient, INTERFACE_TABLE, SYSTEM_TABLE, VLAN_TABLE};
use crate::error::{CliError, Result};

/// An in-memory database seeded with a small switch.
#[derive(Debug)]
pub struct MockDatabaseClient {
    tables: Mutex<BTreeMap<String, Vec<Row>>>,
    next_uuid: AtomicU64,
}

impl MockDatabaseClient {
    /// Creates a mock with a system row, four ports, a bridge and VLAN 1.
    pub fn new() -> Self {
        let mut tables = BTreeMap::new();
        tables.insert(SYSTEM_TABLE.to_string(), vec![system_row("switch")]);

        let mut interfaces: Vec<Row> = ["1", "2", "3", "4"]
            .iter()
            .map(|name| interface_row(name, "system"))
            .collect();
        interfaces.push(interface_row("bridge_normal", "internal"));
        tables.insert(INTERFACE_TABLE.to_string(), interfaces);

        tables.insert(VLAN_TABLE.to_string(), vec![vlan_row(1, "DEFAULT_VLAN_1")]);

        Self {
            tables: Mutex::new(tables),
            next_uuid: AtomicU64::new(1),
        }
    }

    /// Creates a mock whose system row carries `hostname`.
    pub fn with_hostname(hostname: &str) -> Self {
        let mock = Self::new();
        if let Ok(mut tables) = mock.tables.lock() {
            tables.insert(SYSTEM_TABLE.to_string(), vec![system_row(hostname)]);
        }
        mock
    }

    /// Copy of every row in `table`.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .lock()
            .map(|t| t.get(table).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    fn execute(
        &self,
        tables: &mut BTreeMap<String, Vec<Row>>,
        op: Operation,
    ) -> Result<OperationResult> {
        let table_name = op.table().to_string();
        let rows = tables
            .get_mut(&table_name)
            .ok_or_else(|| CliError::collaborator(format!("unknown table {table_name}")))?;

        match op {
            Operation::Select {
                conditions,
                columns,
                ..
            } => {
                let mut selected = Vec::new();
                for row in rows.iter() {
                    if matches_all(row, &conditions)? {
                        selected.push(project(row, columns.as_deref()));
                    }
                }
                Ok(OperationResult {
                    rows: selected,
                    ..Default::default()
                })
            }
            Operation::Insert { row, .. } => {
                let serial = self.next_uuid.fetch_add(1, Ordering::Relaxed);
                let uuid = json!(["uuid", format!("00000000-0000-0000-0000-{serial:012}")]);
                let mut row = row;
                row.insert("_uuid".to_string(), uuid.clone());
                rows.push(row);
                Ok(OperationResult {
                    uuid: Some(uuid),
                    ..Default::default()
                })
            }
            Operation::Update {
                conditions, row, ..
            } => {
                let mut count = 0;
                for target in rows.iter_mut() {
                    if matches_all(target, &conditions)? {
                        for (column, value) in &row {
                            target.insert(column.clone(), value.clone());
                        }
                        count += 1;
                    }
                }
                Ok(OperationResult {
                    count: Some(count),
                    ..Default::default()
                })
            }
            Operation::Mutate {
                conditions,
                mutations,
                ..
            } => {
                let mut count = 0;
                for target in rows.iter_mut() {
                    if matches_all(target, &conditions)? {
                        for mutation in &mutations {
                            apply_mutation(target, mutation)?;
                        }
                        count += 1;
                    }
                }
                Ok(OperationResult {
                    count: Some(count),
                    ..Default::default()
                })
            }
        }
    }
}

impl Default for MockDatabaseClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn transact(&self, operations: Vec<Operation>) -> Result<Vec<OperationResult>> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| CliError::collaborator("mock database poisoned"))?;

        // Work on a copy so a failing operation leaves the tables untouched.
        let mut working = tables.clone();
        let mut results = Vec::with_capacity(operations.len());
        for op in operations {
            results.push(self.execute(&mut working, op)?);
        }
        *tables = working;
        Ok(results)
    }
}

/// A database client whose every operation fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingDatabaseClient;

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn transact(&self, _operations: Vec<Operation>) -> Result<Vec<OperationResult>> {
        Err(CliError::collaborator("connection refused"))
    }
}

fn system_row(hostname: &str) -> Row {
    row(json!({
        "hostname": hostname,
        "mgmt_intf_status": protocol::encode_map([
            ("hostname", hostname),
            ("link_state", "up"),
            ("ip", "192.168.1.10"),
            ("subnet_mask", "24"),
            ("default_gateway", "192.168.1.1"),
        ]),
        "other_config": protocol::encode_map([
            ("min_internal_vlan", "1024"),
            ("max_internal_vlan", "4094"),
            ("internal_vlan_policy", "ascending"),
        ]),
        "status": json!(["map", []]),
        "software_info": protocol::encode_map([
            ("os_name", "OpenSwitch"),
            ("build_id", "0.1.0"),
        ]),
        "switch_info": protocol::encode_map([
            ("product_name", "Mock switch"),
            ("vendor", "Mock"),
            ("serial_number", "0000"),
        ]),
    }))
}

fn interface_row(name: &str, kind: &str) -> Row {
    row(json!({
        "name": name,
        "type": kind,
        "admin_state": "down",
        "link_state": "down",
        "mtu": 1500,
        "link_speed": 1_000_000_000u64,
        "link_resets": 0,
        "duplex": "full",
        "mac_in_use": "00:00:00:00:00:00",
        "user_config": protocol::encode_map([("admin", "down")]),
        "other_config": json!(["map", []]),
        "hw_intf_info": protocol::encode_map([
            ("connector", "SFP_PLUS"),
            ("max_speed", "10000"),
            ("pluggable", "true"),
        ]),
    }))
}

fn vlan_row(id: i64, name: &str) -> Row {
    row(json!({
        "id": id,
        "name": name,
        "admin": "up",
        "oper_state": "up",
        "oper_state_reason": "ok",
        "internal_usage": json!(["map", []]),
    }))
}

fn matches_all(row: &Row, conditions: &[Condition]) -> Result<bool> {
    for Condition(column, function, value) in conditions {
        let actual = row.get(column).unwrap_or(&Value::Null);
        let holds = match function.as_str() {
            "==" => actual == value,
            "!=" => actual != value,
            other => {
                return Err(CliError::collaborator(format!(
                    "unsupported condition function {other}"
                )))
            }
        };
        if !holds {
            return Ok(false);
        }
    }
    Ok(true)
}

fn project(row: &Row, columns: Option<&[String]>) -> Row {
    match columns {
        None => row.clone(),
        Some(columns) => columns
            .iter()
            .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
            .collect(),
    }
}

fn apply_mutation(row: &mut Row, mutation: &Mutation) -> Result<()> {
    let Mutation(column, mutator, value) = mutation;
    let mut current = row
        .get(column)
        .map(protocol::decode_map)
        .unwrap_or_default();

    match mutator.as_str() {
        "insert" => {
            for (key, val) in protocol::decode_map(value) {
                current.entry(key).or_insert(val);
            }
        }
        "delete" => match value.as_array().map(Vec::as_slice) {
            Some([Value::String(tag), Value::Array(keys)]) if tag == "set" => {
                for key in keys {
                    current.remove(&protocol::atom_to_string(key));
                }
            }
            _ => {
                for key in protocol::decode_map(value).keys() {
                    current.remove(key);
                }
            }
        },
        other => {
            return Err(CliError::collaborator(format!(
                "unsupported mutator {other}"
            )))
        }
    }

    let pairs: Vec<(&str, &str)> = current
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    row.insert(column.clone(), protocol::encode_map(pairs));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_select_with_projection() {
        let db = MockDatabaseClient::new();
        let rows = db
            .select(INTERFACE_TABLE, vec![Condition::eq("name", "2")], Some(&["name", "mtu"]))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[0]["mtu"], 1500);
    }

    #[tokio::test]
    async fn test_insert_then_select() {
        let db = MockDatabaseClient::new();
        db.insert(VLAN_TABLE, vlan_row(10, "VLAN10")).await.unwrap();
        let rows = db
            .select(VLAN_TABLE, vec![Condition::eq("id", 10)], None)
            .await
            .unwrap();
        assert_eq!(rows[0]["name"], "VLAN10");
        assert!(rows[0].contains_key("_uuid"));
    }

    #[tokio::test]
    async fn test_update_counts_rows() {
        let db = MockDatabaseClient::new();
        let count = db
            .update(
                INTERFACE_TABLE,
                vec![Condition("type".into(), "==".into(), json!("system"))],
                row(json!({"mtu": 9000})),
            )
            .await
            .unwrap();
        assert_eq!(count, 4);
    }

    #[tokio::test]
    async fn test_map_insert_keeps_existing_key() {
        let db = MockDatabaseClient::new();
        let mutate = |v: &str| {
            Operation::mutate(
                SYSTEM_TABLE,
                Vec::new(),
                vec![Mutation::map_insert("other_config", "k", v)],
            )
        };
        db.transact(vec![mutate("a"), mutate("b")]).await.unwrap();
        let map = db.get_map(SYSTEM_TABLE, "other_config", Vec::new()).await.unwrap();
        assert_eq!(map.get("k").map(String::as_str), Some("a"));
    }

    #[tokio::test]
    async fn test_failed_transaction_is_atomic() {
        let db = MockDatabaseClient::new();
        let result = db
            .transact(vec![
                Operation::insert(VLAN_TABLE, vlan_row(20, "VLAN20")),
                Operation::select("NoSuchTable", Vec::new(), None),
            ])
            .await;
        assert!(result.is_err());
        assert_eq!(db.rows(VLAN_TABLE).len(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_condition() {
        let db = MockDatabaseClient::new();
        let cond = Condition("mtu".into(), "<".into(), json!(2000));
        assert!(db.select(INTERFACE_TABLE, vec![cond], None).await.is_err());
    }

    #[tokio::test]
    async fn test_failing_client() {
        let err = FailingDatabaseClient.transact(Vec::new()).await.unwrap_err();
        assert_eq!(err, CliError::collaborator("connection refused"));
    }

    #[tokio::test]
    async fn test_with_hostname() {
        let db = MockDatabaseClient::with_hostname("leaf-1");
        assert_eq!(db.hostname().await.unwrap(), Some("leaf-1".to_string()));
    }
}
