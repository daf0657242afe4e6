//! Project and contribution records.
//!
//! Records are opaque JSON objects: the database schema owns types,
//! uniqueness and referential integrity. The only rule enforced here is
//! that creation payloads carry every required key.

use serde_json::{Map, Value};
use strum::{AsRefStr, Display};

use crate::error::ApiError;

/// A single table row as returned by the database.
pub type Row = Map<String, Value>;

/// Column flagging a project whose fundraising has ended.
pub const COMPLETED_COLUMN: &str = "is_completed";

/// Keys a new project must carry.
pub const PROJECT_REQUIRED_FIELDS: [&str; 8] = [
    "blob_id",
    "creator",
    "name",
    "target_amount",
    "reward_type",
    "img_blob_id",
    "currency",
    "early_investor_limit",
];

/// Keys a new contribution must carry.
pub const CONTRIBUTION_REQUIRED_FIELDS: [&str; 5] = [
    "project_blob_id",
    "investor_address",
    "amount",
    "tx_hash",
    "contribution_type",
];

/// Tables the backend reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Table {
    /// Fundraising campaigns.
    Projects,
    /// Funding transactions linked to a project.
    Contributions,
}

impl Table {
    /// Keys a creation payload for this table must contain.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            Table::Projects => &PROJECT_REQUIRED_FIELDS,
            Table::Contributions => &CONTRIBUTION_REQUIRED_FIELDS,
        }
    }
}

/// Required keys absent from `row`, in declaration order.
///
/// Only key presence counts; a `null` value is present.
pub fn missing_fields(row: &Row, required: &[&'static str]) -> Vec<&'static str> {
    required
        .iter()
        .copied()
        .filter(|key| !row.contains_key(*key))
        .collect()
}

/// Parse a creation request body for `table`.
///
/// A body that does not decode to a JSON object is an invalid body; an
/// object lacking a required key is a missing-fields error. Unknown keys
/// are kept as-is.
pub fn parse_payload(table: Table, body: &[u8]) -> Result<Row, ApiError> {
    let row = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(row)) => row,
        Ok(other) => {
            return Err(ApiError::InvalidBody(format!(
                "request body must be a JSON object, got {}",
                json_kind(&other)
            )))
        }
        Err(e) => return Err(ApiError::InvalidBody(format!("invalid JSON body: {}", e))),
    };

    let missing = missing_fields(&row, table.required_fields());
    if !missing.is_empty() {
        return Err(ApiError::MissingFields { table, missing });
    }

    Ok(row)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
