// src/export/json.rs

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::format::Record;
use super::{ExportError, ExportMetadata};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportInfo {
    timestamp: String,
    total_records: usize,
    format: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonExport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a ExportMetadata>,
    data: &'a [Record],
    export_info: ExportInfo,
}

/// Pretty-printed `{metadata, data, exportInfo}` document.
pub fn to_json(
    rows: &[Record],
    metadata: Option<&ExportMetadata>,
    now: DateTime<Utc>,
) -> Result<String, ExportError> {
    let doc = JsonExport {
        metadata,
        data: rows,
        export_info: ExportInfo {
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            total_records: rows.len(),
            format: "json",
        },
    };
    serde_json::to_string_pretty(&doc).map_err(|e| ExportError::Serialize(e.to_string()))
}
