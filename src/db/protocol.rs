//! OVSDB JSON-RPC wire model.
//!
//! Requests are `transact` calls carrying a database name and a list of
//! operations. Maps travel as `["map", [[k, v], ...]]` and key sets as
//! `["set", [k, ...]]`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{CliError, Result};

/// A table row as sent or received.
pub type Row = Map<String, Value>;

/// A `[column, function, value]` condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition(pub String, pub String, pub Value);

impl Condition {
    /// `column == value`.
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Self(column.to_string(), "==".to_string(), value.into())
    }
}

/// A `[column, mutator, value]` mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mutation(pub String, pub String, pub Value);

impl Mutation {
    /// Adds map entries that are not present yet.
    pub fn map_insert(column: &str, key: &str, value: &str) -> Self {
        Self(
            column.to_string(),
            "insert".to_string(),
            encode_map([(key, value)]),
        )
    }

    /// Removes map entries by key.
    pub fn map_delete(column: &str, key: &str) -> Self {
        Self(
            column.to_string(),
            "delete".to_string(),
            json!(["set", [key]]),
        )
    }
}

/// One operation inside a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Operation {
    Select {
        table: String,
        #[serde(rename = "where")]
        conditions: Vec<Condition>,
        #[serde(skip_serializing_if = "Option::is_none")]
        columns: Option<Vec<String>>,
    },
    Insert {
        table: String,
        row: Row,
    },
    Update {
        table: String,
        #[serde(rename = "where")]
        conditions: Vec<Condition>,
        row: Row,
    },
    Mutate {
        table: String,
        #[serde(rename = "where")]
        conditions: Vec<Condition>,
        mutations: Vec<Mutation>,
    },
}

impl Operation {
    pub fn select(table: &str, conditions: Vec<Condition>, columns: Option<&[&str]>) -> Self {
        Self::Select {
            table: table.to_string(),
            conditions,
            columns: columns.map(|c| c.iter().map(|s| s.to_string()).collect()),
        }
    }

    pub fn insert(table: &str, row: Row) -> Self {
        Self::Insert {
            table: table.to_string(),
            row,
        }
    }

    pub fn update(table: &str, conditions: Vec<Condition>, row: Row) -> Self {
        Self::Update {
            table: table.to_string(),
            conditions,
            row,
        }
    }

    pub fn mutate(table: &str, conditions: Vec<Condition>, mutations: Vec<Mutation>) -> Self {
        Self::Mutate {
            table: table.to_string(),
            conditions,
            mutations,
        }
    }

    /// Name of the table the operation touches.
    pub fn table(&self) -> &str {
        match self {
            Self::Select { table, .. }
            | Self::Insert { table, .. }
            | Self::Update { table, .. }
            | Self::Mutate { table, .. } => table,
        }
    }
}

/// Result of one operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Builds the `transact` request envelope.
pub fn transact_request(database: &str, operations: &[Operation], id: u64) -> Result<Value> {
    let mut params = vec![Value::String(database.to_string())];
    for op in operations {
        params.push(
            serde_json::to_value(op)
                .map_err(|e| CliError::collaborator(format!("cannot encode request: {e}")))?,
        );
    }
    Ok(json!({
        "method": "transact",
        "params": params,
        "id": id,
    }))
}

/// A JSON-RPC response, or any other message the server sends.
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: Value,
}

impl Response {
    /// True if this message answers request `id`.
    pub fn answers(&self, id: u64) -> bool {
        self.id.as_u64() == Some(id)
    }

    /// Checks both error levels and returns the per-operation results.
    pub fn into_results(self) -> Result<Vec<OperationResult>> {
        if !self.error.is_null() {
            return Err(CliError::collaborator(describe_error(&self.error)));
        }
        let Value::Array(items) = self.result else {
            return Err(CliError::collaborator("response has no result list"));
        };

        let mut results = Vec::with_capacity(items.len());
        for item in items {
            let result: Option<OperationResult> = serde_json::from_value(item)
                .map_err(|e| CliError::collaborator(format!("malformed result: {e}")))?;
            let result = result.unwrap_or_default();
            if let Some(error) = &result.error {
                let msg = match &result.details {
                    Some(details) => format!("{error}: {details}"),
                    None => error.clone(),
                };
                return Err(CliError::collaborator(msg));
            }
            results.push(result);
        }
        Ok(results)
    }
}

fn describe_error(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        Value::Object(o) => o
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    }
}

/// Converts a JSON object into a row. Anything else yields an empty row.
pub fn to_row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}

/// Encodes key/value pairs as an OVSDB map.
pub fn encode_map<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Value {
    let pairs: Vec<Value> = pairs.into_iter().map(|(k, v)| json!([k, v])).collect();
    json!(["map", pairs])
}

/// Decodes an OVSDB map. Non-string atoms are rendered as JSON text.
pub fn decode_map(value: &Value) -> BTreeMap<String, String> {
    let pairs = match value.as_array().map(Vec::as_slice) {
        Some([Value::String(tag), Value::Array(pairs)]) if tag == "map" => pairs,
        _ => return BTreeMap::new(),
    };
    pairs
        .iter()
        .filter_map(|pair| match pair.as_array().map(Vec::as_slice) {
            Some([k, v]) => Some((atom_to_string(k), atom_to_string(v))),
            _ => None,
        })
        .collect()
}

/// Renders a scalar atom as plain text.
pub fn atom_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_select_wire_form() {
        let op = Operation::select(
            "Interface",
            vec![Condition::eq("name", "1")],
            Some(&["name", "other_config"]),
        );
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({
                "op": "select",
                "table": "Interface",
                "where": [["name", "==", "1"]],
                "columns": ["name", "other_config"],
            })
        );
    }

    #[test]
    fn test_update_uses_update_op() {
        let mut row = Row::new();
        row.insert("admin".to_string(), json!("down"));
        let op = Operation::update("VLAN", vec![Condition::eq("id", 10)], row);
        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(value["op"], "update");
        assert_eq!(value["where"], json!([["id", "==", 10]]));
    }

    #[test]
    fn test_mutations() {
        assert_eq!(
            serde_json::to_value(Mutation::map_insert("other_config", "lldp_hold", "6")).unwrap(),
            json!(["other_config", "insert", ["map", [["lldp_hold", "6"]]]])
        );
        assert_eq!(
            serde_json::to_value(Mutation::map_delete("other_config", "lldp_hold")).unwrap(),
            json!(["other_config", "delete", ["set", ["lldp_hold"]]])
        );
    }

    #[test]
    fn test_transact_envelope() {
        let ops = vec![Operation::select("System", Vec::new(), None)];
        let request = transact_request("OpenSwitch", &ops, 7).unwrap();
        assert_eq!(request["method"], "transact");
        assert_eq!(request["id"], 7);
        assert_eq!(request["params"][0], "OpenSwitch");
        assert_eq!(request["params"][1]["op"], "select");
        assert!(request["params"][1].get("columns").is_none());
    }

    #[test]
    fn test_response_results() {
        let response: Response = serde_json::from_value(json!({
            "id": 3,
            "result": [{"rows": [{"name": "1"}]}, {"count": 1}],
            "error": null,
        }))
        .unwrap();
        assert!(response.answers(3));
        let results = response.into_results().unwrap();
        assert_eq!(results[0].rows[0]["name"], "1");
        assert_eq!(results[1].count, Some(1));
    }

    #[test]
    fn test_response_envelope_error() {
        let response: Response =
            serde_json::from_value(json!({"id": 1, "result": null, "error": "unknown database"}))
                .unwrap();
        assert_eq!(
            response.into_results(),
            Err(CliError::collaborator("unknown database"))
        );
    }

    #[test]
    fn test_response_operation_error() {
        let response: Response = serde_json::from_value(json!({
            "id": 1,
            "result": [{"error": "constraint violation", "details": "bad id"}, null],
            "error": null,
        }))
        .unwrap();
        assert_eq!(
            response.into_results(),
            Err(CliError::collaborator("constraint violation: bad id"))
        );
    }

    #[test]
    fn test_map_codec() {
        let value = json!(["map", [["hostname", "switch"], ["count", 3]]]);
        let map = decode_map(&value);
        assert_eq!(map.get("hostname").map(String::as_str), Some("switch"));
        assert_eq!(map.get("count").map(String::as_str), Some("3"));
        assert!(decode_map(&json!("not a map")).is_empty());
        assert!(decode_map(&json!(["set", []])).is_empty());
        assert_eq!(decode_map(&encode_map([("a", "b")])).len(), 1);
    }
}
