// src/blockchain/rpc.rs

use anyhow::{anyhow, Context, Result};
use ethers_core::types::U256;
use reqwest::Client;
use serde_json::{json, Value};

/// Sends one JSON-RPC request and returns its `result` field.
pub async fn rpc_call(client: &Client, rpc_url: &str, method: &str, params: Value) -> Result<Value> {
    let payload = json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1
    });

    let response = client.post(rpc_url).json(&payload).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(anyhow!("RPC {} failed with {}: {}", method, status, body));
    }

    let v: Value = response
        .json()
        .await
        .with_context(|| format!("RPC {} returned a non-JSON body", method))?;
    if let Some(err) = v.get("error") {
        return Err(anyhow!("RPC Error in {}: {}", method, err));
    }
    v.get("result")
        .cloned()
        .ok_or_else(|| anyhow!("RPC response missing 'result' field: {:?}", v))
}

/// Sends several requests as one JSON-RPC batch. The returned entries follow
/// the order of `calls`, matched by id since nodes may answer out of order.
/// A failed entry does not fail the batch.
pub async fn rpc_batch(client: &Client, rpc_url: &str, calls: &[(&str, Value)]) -> Result<Vec<Result<Value>>> {
    let payload: Vec<Value> = calls
        .iter()
        .enumerate()
        .map(|(i, (method, params))| {
            json!({
                "jsonrpc": "2.0",
                "method": method,
                "params": params,
                "id": i + 1
            })
        })
        .collect();

    let response = client.post(rpc_url).json(&payload).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(anyhow!("RPC batch failed with {}: {}", status, body));
    }

    let body: Value = response
        .json()
        .await
        .context("RPC batch returned a non-JSON body")?;
    let replies = match body {
        Value::Array(replies) => replies,
        // Nodes without batch support answer with a single error object
        other => return Err(anyhow!("RPC batch rejected: {}", other)),
    };

    let mut out: Vec<Result<Value>> = calls
        .iter()
        .map(|(method, _)| Err(anyhow!("RPC {} got no reply in batch", method)))
        .collect();
    for reply in replies {
        let slot = reply
            .get("id")
            .and_then(Value::as_u64)
            .and_then(|id| usize::try_from(id).ok())
            .and_then(|id| id.checked_sub(1))
            .filter(|&i| i < out.len());
        let Some(i) = slot else { continue };
        let method = calls[i].0;
        out[i] = match (reply.get("error"), reply.get("result")) {
            (Some(err), _) => Err(anyhow!("RPC Error in {}: {}", method, err)),
            (None, Some(result)) => Ok(result.clone()),
            (None, None) => Err(anyhow!("RPC response missing 'result' field: {:?}", reply)),
        };
    }
    Ok(out)
}

/// Parses a 0x-prefixed quantity as returned by eth_* methods.
pub fn parse_quantity(v: &Value) -> Result<U256> {
    let s = v
        .as_str()
        .ok_or_else(|| anyhow!("expected hex quantity, got {}", v))?;
    Ok(U256::from_str_radix(s.trim_start_matches("0x"), 16)?)
}
