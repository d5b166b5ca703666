// src/export/extract.rs

use serde::Serialize;
use serde_json::Value;

use crate::agent::providers::nodit::{GET_TOKEN_BALANCES, GET_TOKEN_TRANSFERS, GET_TRANSACTION};

/// Exportable rows gathered from a conversation's data-API tool results.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportableData {
    pub token_balances: Vec<Value>,
    pub token_transfers: Vec<Value>,
    pub transactions: Vec<Value>,
}

impl ExportableData {
    pub fn total_records(&self) -> usize {
        self.token_balances.len() + self.token_transfers.len() + self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_records() == 0
    }
}

fn array_at(data: &Value, key: &str) -> Option<Vec<Value>> {
    data.get(key).and_then(Value::as_array).cloned()
}

/// Takes `(tool name, action outcome)` pairs as emitted in tool-result events.
/// Failed outcomes and outcomes without data are skipped; a later result for
/// the same kind replaces an earlier one.
pub fn collect_exportable<'a, I>(results: I) -> ExportableData
where
    I: IntoIterator<Item = (&'a str, &'a Value)>,
{
    let mut out = ExportableData::default();

    for (tool, outcome) in results {
        let succeeded = outcome.get("success").and_then(Value::as_bool).unwrap_or(false);
        let data = match outcome.get("data") {
            Some(d) if succeeded && !d.is_null() => d,
            _ => continue,
        };

        match tool {
            GET_TOKEN_BALANCES => {
                if let Some(rows) = array_at(data, "items")
                    .or_else(|| array_at(data, "balances"))
                    .or_else(|| data.as_array().cloned())
                {
                    out.token_balances = rows;
                }
            }
            GET_TOKEN_TRANSFERS => {
                if let Some(rows) = array_at(data, "items").or_else(|| array_at(data, "transfers")) {
                    out.token_transfers = rows;
                }
            }
            GET_TRANSACTION => {
                out.transactions = match data {
                    Value::Array(rows) => rows.clone(),
                    single => vec![single.clone()],
                };
            }
            _ => {}
        }
    }

    out
}
