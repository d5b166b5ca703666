// src/export/csv.rs

use csv::{QuoteStyle, Terminator, WriterBuilder};

use super::format::{cell_text, headers, is_truthy, Record};
use super::ExportError;

/// Header row from the first record's keys, then one line per record.
/// Falsy values become empty cells. Empty input yields an empty string.
pub fn to_csv(rows: &[Record]) -> Result<String, ExportError> {
    if rows.is_empty() {
        return Ok(String::new());
    }
    let columns = headers(rows);

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(&columns)?;
    for row in rows {
        writer.write_record(columns.iter().map(|col| match row.get(col) {
            Some(v) if is_truthy(v) => cell_text(v),
            _ => String::new(),
        }))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Serialize(e.to_string()))?;
    let mut text = String::from_utf8(bytes).map_err(|e| ExportError::Serialize(e.to_string()))?;
    // Lines are joined, not terminated
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(values: Vec<serde_json::Value>) -> Vec<Record> {
        values
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert_eq!(to_csv(&[]).unwrap(), "");
    }

    #[test]
    fn quotes_only_when_needed() {
        let csv = to_csv(&rows(vec![
            json!({"Name": "Plain", "Note": "a, b", "Quote": "say \"hi\""}),
            json!({"Name": "Multi", "Note": "line\nbreak", "Quote": ""}),
        ]))
        .unwrap();
        assert_eq!(
            csv,
            "Name,Note,Quote\nPlain,\"a, b\",\"say \"\"hi\"\"\"\nMulti,\"line\nbreak\","
        );
    }

    #[test]
    fn falsy_and_missing_cells_are_blank() {
        let csv = to_csv(&rows(vec![
            json!({"A": 0, "B": false, "C": null, "D": 7}),
            json!({"A": 1}),
        ]))
        .unwrap();
        assert_eq!(csv, "A,B,C,D\n,,,7\n1,,,");
    }
}
