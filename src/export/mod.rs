//! # Export Module
//!
//! Converts a record set (token balances, transfers, transactions or a
//! portfolio summary) into a downloadable CSV, JSON, PDF or XLSX file.
//!
//! Records are first normalised into a fixed column set for their type, then
//! handed to the serializer for the requested format. The whole file is
//! produced in memory; a failure anywhere returns an error and no bytes.

pub mod csv;
pub mod extract;
pub mod format;
pub mod json;
pub mod pdf;
pub mod xlsx;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

pub use extract::{collect_exportable, ExportableData};
pub use format::{
    create_portfolio_summary, format_token_balances, format_token_transfers, format_transactions,
    Record,
};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),
    #[error("Failed to serialize export: {0}")]
    Serialize(String),
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
    Pdf,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv;charset=utf-8",
            ExportFormat::Json => "application/json;charset=utf-8",
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "pdf" => Ok(ExportFormat::Pdf),
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Known record kinds. Anything else is exported as-is under its own name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordType {
    TokenBalances,
    TokenTransfers,
    Transactions,
    PortfolioSummary,
    Other(String),
}

impl RecordType {
    pub fn parse(s: &str) -> Self {
        match s {
            "token-balances" => RecordType::TokenBalances,
            "token-transfers" => RecordType::TokenTransfers,
            "transactions" => RecordType::Transactions,
            "portfolio-summary" => RecordType::PortfolioSummary,
            other => RecordType::Other(other.to_string()),
        }
    }

    /// Identifier used in file names.
    pub fn as_str(&self) -> &str {
        match self {
            RecordType::TokenBalances => "token-balances",
            RecordType::TokenTransfers => "token-transfers",
            RecordType::Transactions => "transactions",
            RecordType::PortfolioSummary => "portfolio-summary",
            RecordType::Other(s) => s,
        }
    }

    /// Human label written into metadata and report titles.
    pub fn label(&self) -> &str {
        match self {
            RecordType::TokenBalances => "Token Balances",
            RecordType::TokenTransfers => "Token Transfers",
            RecordType::Transactions => "Transactions",
            other => other.as_str(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    #[serde(rename = "type")]
    pub record_type: String,
    pub network: String,
    pub total_records: usize,
    pub export_date: String,
}

impl ExportMetadata {
    fn to_record(&self) -> Result<Record, ExportError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(ExportError::Serialize("metadata is not an object".into())),
            Err(e) => Err(ExportError::Serialize(e.to_string())),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    pub format: ExportFormat,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default = "default_include_metadata")]
    pub include_metadata: bool,
}

fn default_include_metadata() -> bool {
    true
}

impl ExportOptions {
    pub fn new(format: ExportFormat) -> Self {
        Self {
            format,
            filename: None,
            include_metadata: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportedFile {
    /// Writes the file into `dir` under its export name.
    pub fn save_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf, ExportError> {
        // Never let a caller-supplied name escape the target directory
        let name = Path::new(&self.filename)
            .file_name()
            .ok_or_else(|| ExportError::Serialize(format!("invalid file name '{}'", self.filename)))?;
        let path = dir.as_ref().join(name);
        std::fs::write(&path, &self.bytes)?;
        info!("Saved export to {}", path.display());
        Ok(path)
    }
}

/// `{type}_{network}_{YYYY-MM-DD}_{HH-MM-SS}.{ext}`, in UTC.
pub fn generate_filename(
    record_type: &str,
    network: &str,
    extension: &str,
    now: DateTime<Utc>,
) -> String {
    format!(
        "{}_{}_{}.{}",
        record_type,
        network,
        now.format("%Y-%m-%d_%H-%M-%S"),
        extension
    )
}

pub fn export_data(
    records: &[Value],
    record_type: &str,
    network: &str,
    options: &ExportOptions,
) -> Result<ExportedFile, ExportError> {
    export_data_at(records, record_type, network, options, Utc::now())
}

/// [`export_data`] with an explicit clock.
pub fn export_data_at(
    records: &[Value],
    record_type: &str,
    network: &str,
    options: &ExportOptions,
    now: DateTime<Utc>,
) -> Result<ExportedFile, ExportError> {
    let kind = RecordType::parse(record_type);
    let rows = match kind {
        RecordType::TokenBalances => format_token_balances(records, now),
        RecordType::TokenTransfers => format_token_transfers(records),
        RecordType::Transactions => format_transactions(records),
        RecordType::PortfolioSummary | RecordType::Other(_) => format::passthrough(records),
    };

    let metadata = ExportMetadata {
        record_type: kind.label().to_string(),
        network: network.to_string(),
        total_records: records.len(),
        export_date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
    };

    debug!(
        "Exporting {} {} records for {} as {}",
        records.len(),
        kind.as_str(),
        network,
        options.format
    );

    let bytes = match options.format {
        ExportFormat::Csv => csv::to_csv(&rows)?.into_bytes(),
        ExportFormat::Json => {
            let metadata = options.include_metadata.then_some(&metadata);
            json::to_json(&rows, metadata, now)?.into_bytes()
        }
        ExportFormat::Pdf => pdf::to_pdf(&rows, &metadata, now)?,
        ExportFormat::Xlsx => xlsx::to_xlsx(&rows, &metadata.to_record()?)?,
    };

    let filename = match options.filename.as_deref() {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => generate_filename(kind.as_str(), network, options.format.extension(), now),
    };

    Ok(ExportedFile {
        filename,
        content_type: options.format.content_type(),
        bytes,
    })
}
