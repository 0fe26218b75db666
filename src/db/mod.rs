//! Configuration database access.
//!
//! Command handlers talk to the device configuration through the
//! [`DatabaseClient`] trait. The real client speaks OVSDB over a socket; the
//! mock keeps tables in memory for tests and `--mock-db` sessions.

mod mock;
mod ovsdb;
pub mod protocol;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use ovsdb::{DocumentReader, OvsdbClient, ServerAddress};
pub use protocol::{Condition, Mutation, Operation, OperationResult, Row};

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::commands::token::{NameKind, Names};
use crate::config::ServerConfig;
use crate::error::{CliError, Result};

/// Table holding the single system row.
pub const SYSTEM_TABLE: &str = "System";
/// Table holding one row per interface.
pub const INTERFACE_TABLE: &str = "Interface";
/// Table holding one row per VLAN.
pub const VLAN_TABLE: &str = "VLAN";

/// Creates the socket client described by `config`.
pub fn connect(config: &ServerConfig) -> Result<OvsdbClient> {
    let address: ServerAddress = config.address.parse()?;
    Ok(OvsdbClient::new(
        address,
        config.database.clone(),
        Duration::from_millis(config.timeout_ms),
    ))
}

/// Trait defining the interface for configuration database clients.
///
/// Only `transact` is required; the rest are conveniences built on it.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Runs `operations` as one transaction and returns one result per operation.
    async fn transact(&self, operations: Vec<Operation>) -> Result<Vec<OperationResult>>;

    /// Selects rows, optionally projecting columns.
    async fn select(
        &self,
        table: &str,
        conditions: Vec<Condition>,
        columns: Option<&[&str]>,
    ) -> Result<Vec<Row>> {
        let results = self
            .transact(vec![Operation::select(table, conditions, columns)])
            .await?;
        Ok(results.into_iter().next().map(|r| r.rows).unwrap_or_default())
    }

    /// Reads a map column of the first matching row. Missing rows read as empty.
    async fn get_map(
        &self,
        table: &str,
        column: &str,
        conditions: Vec<Condition>,
    ) -> Result<BTreeMap<String, String>> {
        let rows = self.select(table, conditions, Some(&[column])).await?;
        Ok(rows
            .first()
            .and_then(|row| row.get(column))
            .map(protocol::decode_map)
            .unwrap_or_default())
    }

    /// Inserts a row.
    async fn insert(&self, table: &str, row: Row) -> Result<()> {
        self.transact(vec![Operation::insert(table, row)]).await?;
        Ok(())
    }

    /// Updates matching rows and returns how many changed.
    async fn update(&self, table: &str, conditions: Vec<Condition>, row: Row) -> Result<u64> {
        let results = self
            .transact(vec![Operation::update(table, conditions, row)])
            .await?;
        Ok(results.first().and_then(|r| r.count).unwrap_or(0))
    }

    /// Applies `mutations` to matching rows and returns how many changed.
    async fn mutate(
        &self,
        table: &str,
        conditions: Vec<Condition>,
        mutations: Vec<Mutation>,
    ) -> Result<u64> {
        let results = self
            .transact(vec![Operation::mutate(table, conditions, mutations)])
            .await?;
        Ok(results.first().and_then(|r| r.count).unwrap_or(0))
    }

    /// Sets one key of a map column, replacing any previous value.
    async fn map_set_key(
        &self,
        table: &str,
        column: &str,
        key: &str,
        value: &str,
        conditions: Vec<Condition>,
    ) -> Result<()> {
        self.mutate(
            table,
            conditions,
            vec![
                Mutation::map_delete(column, key),
                Mutation::map_insert(column, key, value),
            ],
        )
        .await?;
        Ok(())
    }

    /// Removes one key of a map column.
    async fn map_delete_key(
        &self,
        table: &str,
        column: &str,
        key: &str,
        conditions: Vec<Condition>,
    ) -> Result<()> {
        self.mutate(table, conditions, vec![Mutation::map_delete(column, key)])
            .await?;
        Ok(())
    }

    /// Names of all interfaces, sorted.
    async fn interface_names(&self) -> Result<Vec<String>> {
        let rows = self
            .select(INTERFACE_TABLE, Vec::new(), Some(&["name"]))
            .await?;
        let mut names: Vec<String> = rows
            .iter()
            .filter_map(|row| row.get("name").and_then(Value::as_str))
            .map(str::to_string)
            .collect();
        names.sort_by(|a, b| natural_key(a).cmp(&natural_key(b)));
        Ok(names)
    }

    /// Fetches a fresh snapshot of the given name kinds.
    async fn names(&self, kinds: &[NameKind]) -> Result<Names> {
        let mut names = Names::new();
        for kind in kinds {
            match kind {
                NameKind::Interface => names.insert(*kind, self.interface_names().await?),
            }
        }
        Ok(names)
    }

    /// Hostname from the management interface status, if set.
    async fn hostname(&self) -> Result<Option<String>> {
        let status = self
            .get_map(SYSTEM_TABLE, "mgmt_intf_status", Vec::new())
            .await?;
        Ok(status.get("hostname").filter(|h| !h.is_empty()).cloned())
    }
}

/// Orders names with numeric parts compared by value, so `2` sorts before `10`.
pub fn natural_key(name: &str) -> (bool, u64, &str) {
    match name.parse::<u64>() {
        Ok(n) => (false, n, name),
        Err(_) => (true, 0, name),
    }
}

/// Fails unless exactly one row matched.
pub fn expect_one(rows: Vec<Row>, what: &str) -> Result<Row> {
    let mut rows = rows.into_iter();
    match (rows.next(), rows.next()) {
        (Some(row), None) => Ok(row),
        (None, _) => Err(CliError::command(format!("No such {what}."))),
        (Some(_), Some(_)) => Err(CliError::collaborator(format!("duplicate {what} rows"))),
    }
}
