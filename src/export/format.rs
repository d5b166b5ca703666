//! Record normalisation into fixed export column sets.
//!
//! Source records come straight from data-API responses, so field names vary.
//! Each column takes the first alternative that is truthy (non-empty string,
//! non-zero number, `true`, or any array/object) and falls back to a default.

use chrono::{DateTime, SecondsFormat, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Map, Value};

lazy_static! {
    static ref LEADING_NUMBER: Regex =
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").expect("static regex");
}

pub type Record = Map<String, Value>;

pub fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn pick(source: &Value, keys: &[&str], default: Value) -> Value {
    keys.iter()
        .filter_map(|k| source.get(*k))
        .find(|v| is_truthy(v))
        .cloned()
        .unwrap_or(default)
}

/// Reads the longest numeric prefix of a string ("12.5 USD" is 12.5) and
/// falls back to zero when there is none.
pub fn parse_float(v: &Value) -> f64 {
    match v {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => LEADING_NUMBER
            .find(s.trim_start())
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .filter(|f| f.is_finite())
            .unwrap_or(0.0),
        _ => 0.0,
    }
}

fn iso(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn record(pairs: Vec<(&str, Value)>) -> Record {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

pub fn format_token_balances(balances: &[Value], now: DateTime<Utc>) -> Vec<Record> {
    balances
        .iter()
        .map(|b| {
            record(vec![
                ("TokenAddress", pick(b, &["tokenAddress", "contractAddress"], json!(""))),
                ("TokenName", pick(b, &["name", "tokenName"], json!(""))),
                ("TokenSymbol", pick(b, &["symbol", "tokenSymbol"], json!(""))),
                ("Balance", pick(b, &["balance", "amount"], json!("0"))),
                ("Decimals", pick(b, &["decimals"], json!("18"))),
                ("USDValue", pick(b, &["usdValue", "value"], json!("0"))),
                ("Network", pick(b, &["network"], json!(""))),
                ("LastUpdated", pick(b, &["lastUpdated"], json!(iso(now)))),
            ])
        })
        .collect()
}

pub fn format_token_transfers(transfers: &[Value]) -> Vec<Record> {
    transfers
        .iter()
        .map(|t| {
            record(vec![
                ("TransactionHash", pick(t, &["transactionHash", "hash"], json!(""))),
                ("From", pick(t, &["from", "fromAddress"], json!(""))),
                ("To", pick(t, &["to", "toAddress"], json!(""))),
                ("TokenAddress", pick(t, &["tokenAddress", "contractAddress"], json!(""))),
                ("TokenName", pick(t, &["tokenName", "name"], json!(""))),
                ("TokenSymbol", pick(t, &["tokenSymbol", "symbol"], json!(""))),
                ("Amount", pick(t, &["amount", "value"], json!("0"))),
                ("USDValue", pick(t, &["usdValue", "valueUSD"], json!("0"))),
                ("BlockNumber", pick(t, &["blockNumber", "block"], json!(""))),
                ("Timestamp", pick(t, &["timestamp", "blockTimestamp"], json!(""))),
                ("Network", pick(t, &["network"], json!(""))),
                ("GasUsed", pick(t, &["gasUsed"], json!(""))),
                ("GasPrice", pick(t, &["gasPrice"], json!(""))),
            ])
        })
        .collect()
}

pub fn format_transactions(transactions: &[Value]) -> Vec<Record> {
    transactions
        .iter()
        .map(|tx| {
            let ok = ["status", "isSuccessful"]
                .iter()
                .any(|k| tx.get(*k).map_or(false, is_truthy));
            record(vec![
                ("TransactionHash", pick(tx, &["transactionHash", "hash"], json!(""))),
                ("From", pick(tx, &["from", "fromAddress"], json!(""))),
                ("To", pick(tx, &["to", "toAddress"], json!(""))),
                ("Value", pick(tx, &["value"], json!("0"))),
                ("USDValue", pick(tx, &["usdValue"], json!("0"))),
                ("BlockNumber", pick(tx, &["blockNumber", "block"], json!(""))),
                ("Timestamp", pick(tx, &["timestamp", "blockTimestamp"], json!(""))),
                ("Network", pick(tx, &["network"], json!(""))),
                ("GasUsed", pick(tx, &["gasUsed"], json!(""))),
                ("GasPrice", pick(tx, &["gasPrice"], json!(""))),
                ("Status", json!(if ok { "Success" } else { "Failed" })),
                ("Method", pick(tx, &["method", "functionName"], json!(""))),
            ])
        })
        .collect()
}

/// One summary row: totals, summed USD value and the ten largest positions.
pub fn create_portfolio_summary(
    balances: &[Value],
    transfers: &[Value],
    transactions: &[Value],
    now: DateTime<Utc>,
) -> Vec<Record> {
    let usd = |b: &Value| parse_float(&pick(b, &["usdValue"], json!("0")));
    let total_usd: f64 = balances.iter().map(usd).sum();

    let mut ranked: Vec<&Value> = balances.iter().collect();
    ranked.sort_by(|a, b| usd(b).total_cmp(&usd(a)));
    let top: Vec<Value> = ranked
        .into_iter()
        .take(10)
        .map(|b| {
            json!({
                "Token": pick(b, &["name", "tokenName"], json!("Unknown")),
                "Symbol": pick(b, &["symbol", "tokenSymbol"], json!("")),
                "USDValue": pick(b, &["usdValue"], json!("0")),
            })
        })
        .collect();

    vec![record(vec![
        ("TotalTokens", json!(balances.len())),
        ("TotalTransfers", json!(transfers.len())),
        ("TotalTransactions", json!(transactions.len())),
        ("TotalUSDValue", json!(total_usd)),
        ("ExportDate", json!(iso(now))),
        ("TopTokens", Value::Array(top)),
    ])]
}

/// Passes arbitrary rows through; non-object rows are wrapped as `{value: ..}`.
pub fn passthrough(rows: &[Value]) -> Vec<Record> {
    rows.iter()
        .map(|row| match row {
            Value::Object(map) => map.clone(),
            other => record(vec![("value", other.clone())]),
        })
        .collect()
}

/// Text of a cell for tabular outputs. Nested values are rendered as JSON.
pub fn cell_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Column order: keys of the first row.
pub fn headers(rows: &[Record]) -> Vec<String> {
    rows.first()
        .map(|r| r.keys().cloned().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap()
    }

    #[test]
    fn balances_use_fallback_keys_and_defaults() {
        let rows = format_token_balances(
            &[json!({"contractAddress": "0xt", "tokenName": "Tether", "symbol": "", "tokenSymbol": "USDT", "amount": "5", "decimals": 0})],
            now(),
        );
        let r = &rows[0];
        assert_eq!(r["TokenAddress"], json!("0xt"));
        assert_eq!(r["TokenName"], json!("Tether"));
        assert_eq!(r["TokenSymbol"], json!("USDT"));
        assert_eq!(r["Balance"], json!("5"));
        // 0 is falsy, so the default applies
        assert_eq!(r["Decimals"], json!("18"));
        assert_eq!(r["LastUpdated"], json!("2025-03-04T05:06:07.000Z"));
        assert_eq!(headers(&rows)[0], "TokenAddress");
    }

    #[test]
    fn parse_float_reads_numeric_prefix() {
        assert_eq!(parse_float(&json!("12.5 USD")), 12.5);
        assert_eq!(parse_float(&json!("  -3.25e2kg")), -325.0);
        assert_eq!(parse_float(&json!(".5")), 0.5);
        assert_eq!(parse_float(&json!("7.")), 7.0);
        assert_eq!(parse_float(&json!("1e")), 1.0);
        assert_eq!(parse_float(&json!("USD 12")), 0.0);
        assert_eq!(parse_float(&json!("")), 0.0);
        assert_eq!(parse_float(&json!(42)), 42.0);
        assert_eq!(parse_float(&Value::Null), 0.0);
    }

    #[test]
    fn transaction_status_follows_either_flag() {
        let rows = format_transactions(&[
            json!({"hash": "0x1", "isSuccessful": true}),
            json!({"hash": "0x2", "status": 0}),
            json!({"hash": "0x3", "status": "0x1"}),
        ]);
        let statuses: Vec<&Value> = rows.iter().map(|r| &r["Status"]).collect();
        assert_eq!(statuses, vec![&json!("Success"), &json!("Failed"), &json!("Success")]);
        assert_eq!(rows[0]["TransactionHash"], json!("0x1"));
        assert_eq!(rows[0]["Value"], json!("0"));
    }

    #[test]
    fn summary_ranks_top_tokens() {
        let balances: Vec<Value> = (0..12)
            .map(|i| json!({"name": format!("T{}", i), "usdValue": format!("{}", i)}))
            .collect();
        let summary = create_portfolio_summary(&balances, &[json!({})], &[], now());
        let row = &summary[0];
        assert_eq!(row["TotalTokens"], json!(12));
        assert_eq!(row["TotalTransfers"], json!(1));
        assert_eq!(row["TotalUSDValue"], json!(66.0));
        let top = row["TopTokens"].as_array().unwrap();
        assert_eq!(top.len(), 10);
        assert_eq!(top[0]["Token"], json!("T11"));
    }
}
