// src/api/export.rs

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

use crate::export::{
    collect_exportable, create_portfolio_summary, export_data, ExportError, ExportFormat,
    ExportOptions, ExportedFile, RecordType,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub records: Vec<Value>,
    pub record_type: String,
    pub network: String,
    pub format: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub include_metadata: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummaryRequest {
    #[serde(default)]
    pub token_balances: Vec<Value>,
    #[serde(default)]
    pub token_transfers: Vec<Value>,
    #[serde(default)]
    pub transactions: Vec<Value>,
    pub network: String,
    pub format: String,
}

/// One `a:` tool result from a chat stream, paired with the tool that produced it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultEntry {
    pub tool_name: String,
    pub result: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationExportRequest {
    pub tool_results: Vec<ToolResultEntry>,
    pub record_type: String,
    pub network: String,
    pub format: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub include_metadata: Option<bool>,
}

fn error_response(err: ExportError) -> (StatusCode, String) {
    match err {
        ExportError::UnsupportedFormat(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        other => {
            error!("Export failed: {}", other);
            (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    }
}

fn attachment(file: ExportedFile) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", file.filename.replace('"', ""));
    (
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response()
}

pub async fn export_handler(
    Json(req): Json<ExportRequest>,
) -> Result<Response, (StatusCode, String)> {
    let format: ExportFormat = req.format.parse().map_err(error_response)?;
    let options = ExportOptions {
        format,
        filename: req.filename,
        include_metadata: req.include_metadata.unwrap_or(true),
    };

    let file = export_data(&req.records, &req.record_type, &req.network, &options)
        .map_err(error_response)?;
    info!(
        "Exported {} {} records as {} ({} bytes)",
        req.records.len(),
        req.record_type,
        file.filename,
        file.bytes.len()
    );
    Ok(attachment(file))
}

pub async fn portfolio_summary_handler(
    Json(req): Json<PortfolioSummaryRequest>,
) -> Result<Response, (StatusCode, String)> {
    let format: ExportFormat = req.format.parse().map_err(error_response)?;
    let summary: Vec<Value> = create_portfolio_summary(
        &req.token_balances,
        &req.token_transfers,
        &req.transactions,
        chrono::Utc::now(),
    )
    .into_iter()
    .map(Value::Object)
    .collect();

    let file = export_data(
        &summary,
        "portfolio-summary",
        &req.network,
        &ExportOptions::new(format),
    )
    .map_err(error_response)?;
    Ok(attachment(file))
}

/// Exports the data-API results of a chat transcript without the client
/// having to pick the rows out itself.
pub async fn conversation_export_handler(
    Json(req): Json<ConversationExportRequest>,
) -> Result<Response, (StatusCode, String)> {
    let format: ExportFormat = req.format.parse().map_err(error_response)?;
    let data = collect_exportable(
        req.tool_results
            .iter()
            .map(|entry| (entry.tool_name.as_str(), &entry.result)),
    );

    let record_type = RecordType::parse(&req.record_type);
    let rows = match &record_type {
        RecordType::TokenBalances => data.token_balances,
        RecordType::TokenTransfers => data.token_transfers,
        RecordType::Transactions => data.transactions,
        RecordType::PortfolioSummary if !data.is_empty() => create_portfolio_summary(
            &data.token_balances,
            &data.token_transfers,
            &data.transactions,
            chrono::Utc::now(),
        )
        .into_iter()
        .map(Value::Object)
        .collect(),
        RecordType::PortfolioSummary => Vec::new(),
        RecordType::Other(kind) => {
            return Err((
                StatusCode::BAD_REQUEST,
                format!("Cannot export {} from a conversation", kind),
            ))
        }
    };
    if rows.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("No {} found in the conversation", record_type.label()),
        ));
    }

    let options = ExportOptions {
        format,
        filename: req.filename,
        include_metadata: req.include_metadata.unwrap_or(true),
    };
    let file = export_data(&rows, record_type.as_str(), &req.network, &options)
        .map_err(error_response)?;
    info!(
        "Exported {} {} records from {} tool results as {}",
        rows.len(),
        record_type.as_str(),
        req.tool_results.len(),
        file.filename
    );
    Ok(attachment(file))
}
