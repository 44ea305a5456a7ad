//! Project records and the shape check applied to the fetched payload.

use std::sync::Arc;

use log::debug;
use serde::Serialize;
use serde_json::Value;

pub const PERCENTAGE_FUNDED: &str = "percentage_funded";
pub const AMOUNT_PLEDGED: &str = "amount_pledged";

/// A single project entry.
///
/// Only presence of both fields is checked; the values are kept as they
/// appeared in the payload and may be of any JSON type.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Record {
    pub percentage_funded: Value,
    pub amount_pledged: Value,
}

/// Validated records in payload order. Frozen once loaded.
pub type RecordSet = Arc<[Record]>;

impl Record {
    /// Builds a record from a raw payload item, or `None` when the item is not
    /// an object or lacks one of the required fields.
    ///
    /// A field explicitly set to `null` still counts as present.
    pub fn from_value(item: Value) -> Option<Self> {
        let Value::Object(mut fields) = item else {
            return None;
        };
        let percentage_funded = fields.remove(PERCENTAGE_FUNDED)?;
        let amount_pledged = fields.remove(AMOUNT_PLEDGED)?;
        Some(Self {
            percentage_funded,
            amount_pledged,
        })
    }
}

/// Keeps the items that carry both required fields, preserving order.
pub fn validate(items: Vec<Value>) -> Vec<Record> {
    let total = items.len();
    let records: Vec<Record> = items.into_iter().filter_map(Record::from_value).collect();
    if records.len() != total {
        debug!(
            "dropped {} of {} items missing {} or {}",
            total - records.len(),
            total,
            PERCENTAGE_FUNDED,
            AMOUNT_PLEDGED
        );
    }
    records
}

/// Turns the parsed response body into records. A top-level value that is not
/// an array yields no records rather than an error.
pub fn records_from_payload(data: Value) -> Vec<Record> {
    match data {
        Value::Array(items) => validate(items),
        other => {
            debug!("payload is not an array ({}), treating as empty", kind(&other));
            Vec::new()
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
