//! Nodit Web3 Data API provider.
//!
//! Every action is a single JSON POST to
//! `{base}/{network}/{chainType}/{resource}/{operation}`. The provider is
//! network-agnostic: the model names the network and chain type per call.

use std::fmt;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, error, info};
use validator::Validate;

use crate::agent::{
    parse_input, ActionOutcome, ActionProvider, ToolDefinition, NETWORK_SLUG, TX_HASH,
};

pub const GET_TOKEN_TRANSFERS: &str = "getTokenTransfersByAccount";
pub const GET_TOKEN_BALANCES: &str = "getTokenBalancesByAccount";
pub const GET_BLOCK: &str = "getBlockByNumber";
pub const GET_TRANSACTION: &str = "getTransactionByHash";

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransfersInput {
    #[validate(regex = "NETWORK_SLUG")]
    pub network: String,
    #[validate(regex = "NETWORK_SLUG")]
    pub chain_type: String,
    #[validate(length(min = 1))]
    pub account_address: String,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalancesInput {
    #[validate(regex = "NETWORK_SLUG")]
    pub network: String,
    #[validate(regex = "NETWORK_SLUG")]
    pub chain_type: String,
    #[validate(length(min = 1))]
    pub account_address: String,
    pub token_addresses: Option<Vec<String>>,
}

/// Block numbers arrive either as JSON numbers or strings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum BlockNumber {
    Number(u64),
    Text(String),
}

impl fmt::Display for BlockNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockNumber::Number(n) => write!(f, "{}", n),
            BlockNumber::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BlockInput {
    #[validate(regex = "NETWORK_SLUG")]
    pub network: String,
    #[validate(regex = "NETWORK_SLUG")]
    pub chain_type: String,
    pub block_number: BlockNumber,
    pub include_transactions: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInput {
    #[validate(regex = "NETWORK_SLUG")]
    pub network: String,
    #[validate(regex = "NETWORK_SLUG")]
    pub chain_type: String,
    #[validate(regex = "TX_HASH")]
    pub transaction_hash: String,
}

pub struct NoditProvider {
    api_key: SecretString,
    base_url: String,
    http: Client,
}

impl NoditProvider {
    pub fn new(api_key: SecretString, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let prefix: String = api_key.expose_secret().chars().take(8).collect();
        debug!(base_url = %base_url, "Nodit provider initialized with API key {}...", prefix);
        Self {
            api_key,
            base_url,
            http: Client::new(),
        }
    }

    fn endpoint(&self, network: &str, chain_type: &str, path: &str) -> String {
        format!("{}/{}/{}/{}", self.base_url, network, chain_type, path)
    }

    async fn post(&self, url: &str, body: Value, bearer: bool) -> Result<Value> {
        debug!(url = %url, "Nodit request");
        let mut request = self
            .http
            .post(url)
            .header("X-API-KEY", self.api_key.expose_secret())
            .header("accept", "application/json")
            .header("content-type", "application/json");
        if bearer {
            request = request.bearer_auth(self.api_key.expose_secret());
        }

        let response = request.json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Nodit API error: {} {} - {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or(""),
                text
            ));
        }
        Ok(response.json().await?)
    }

    /// Checks `GET {base}/health`.
    pub async fn test_connection(&self) -> ActionOutcome {
        let result = self
            .http
            .get(format!("{}/health", self.base_url))
            .header("X-API-KEY", self.api_key.expose_secret())
            .bearer_auth(self.api_key.expose_secret())
            .header("accept", "application/json")
            .send()
            .await;
        match result {
            Ok(resp) if resp.status().is_success() => {
                ActionOutcome::ok(Value::Null, "Nodit API is accessible")
            }
            Ok(resp) => ActionOutcome::fail(format!(
                "Health check failed: {} {}",
                resp.status().as_u16(),
                resp.status().canonical_reason().unwrap_or("")
            )),
            Err(e) => ActionOutcome::fail(e.to_string()),
        }
    }

    async fn token_transfers(&self, input: TokenTransfersInput) -> Result<ActionOutcome> {
        let url = self.endpoint(&input.network, &input.chain_type, "token/getTokenTransfersByAccount");
        let mut body = Map::new();
        body.insert("accountAddress".into(), json!(input.account_address));
        if let Some(from) = input.from_date.filter(|s| !s.is_empty()) {
            body.insert("fromDate".into(), json!(from));
        }
        if let Some(to) = input.to_date.filter(|s| !s.is_empty()) {
            body.insert("toDate".into(), json!(to));
        }
        if let Some(limit) = input.limit.filter(|n| *n != 0) {
            body.insert("limit".into(), json!(limit));
        }
        if let Some(offset) = input.offset.filter(|n| *n != 0) {
            body.insert("offset".into(), json!(offset));
        }

        let data = self.post(&url, Value::Object(body), true).await?;
        info!(account = %input.account_address, "Retrieved token transfers");
        Ok(ActionOutcome::ok(
            data,
            format!("Retrieved token transfers for account {}", input.account_address),
        ))
    }

    async fn token_balances(&self, input: TokenBalancesInput) -> Result<ActionOutcome> {
        let url = self.endpoint(&input.network, &input.chain_type, "token/getTokensOwnedByAccount");
        let mut body = Map::new();
        body.insert("accountAddress".into(), json!(input.account_address));
        if let Some(tokens) = input.token_addresses {
            body.insert("tokenAddresses".into(), json!(tokens));
        }

        let data = self.post(&url, Value::Object(body), true).await?;
        info!(account = %input.account_address, "Retrieved token balances");
        Ok(ActionOutcome::ok(
            data,
            format!("Retrieved token balances for account {}", input.account_address),
        ))
    }

    async fn block(&self, input: BlockInput) -> Result<ActionOutcome> {
        let url = self.endpoint(&input.network, &input.chain_type, "block/getBlockByNumber");
        let mut body = Map::new();
        body.insert("blockNumber".into(), json!(input.block_number.to_string()));
        if let Some(include) = input.include_transactions {
            body.insert("includeTransactions".into(), json!(include));
        }

        let data = self.post(&url, Value::Object(body), false).await?;
        Ok(ActionOutcome::ok(
            data,
            format!("Retrieved block {} information", input.block_number),
        ))
    }

    async fn transaction(&self, input: TransactionInput) -> Result<ActionOutcome> {
        let url = self.endpoint(&input.network, &input.chain_type, "transaction/getTransactionByHash");
        let body = json!({ "transactionHash": input.transaction_hash });

        let data = self.post(&url, body, false).await?;
        Ok(ActionOutcome::ok(
            data,
            format!("Retrieved transaction {} details", input.transaction_hash),
        ))
    }
}

fn network_props() -> Map<String, Value> {
    let mut props = Map::new();
    props.insert(
        "network".into(),
        json!({"type": "string", "description": "The blockchain network (e.g., 'ethereum', 'polygon')"}),
    );
    props.insert(
        "chainType".into(),
        json!({"type": "string", "description": "The chain type (e.g., 'mainnet', 'testnet')"}),
    );
    props
}

fn schema(extra: Value, required: &[&str]) -> Value {
    let mut props = network_props();
    if let Value::Object(extra) = extra {
        props.extend(extra);
    }
    let mut req = vec!["network", "chainType"];
    req.extend_from_slice(required);
    json!({"type": "object", "properties": props, "required": req})
}

#[async_trait]
impl ActionProvider for NoditProvider {
    fn name(&self) -> &'static str {
        "nodit"
    }

    fn supports_network(&self, _chain_id: u64) -> bool {
        true
    }

    fn actions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                GET_TOKEN_TRANSFERS,
                "Get token transfer history for a specific account",
                schema(
                    json!({
                        "accountAddress": {"type": "string", "description": "The account address to query"},
                        "fromDate": {"type": "string", "description": "Start date in ISO format (e.g., '2025-01-01T00:00:00+00:00')"},
                        "toDate": {"type": "string", "description": "End date in ISO format (e.g., '2025-01-31T00:00:00+00:00')"},
                        "limit": {"type": "number", "description": "Maximum number of results to return"},
                        "offset": {"type": "number", "description": "Number of results to skip"}
                    }),
                    &["accountAddress"],
                ),
            ),
            ToolDefinition::new(
                GET_TOKEN_BALANCES,
                "Get token balances for a specific account",
                schema(
                    json!({
                        "accountAddress": {"type": "string", "description": "The account address to query"},
                        "tokenAddresses": {"type": "array", "items": {"type": "string"}, "description": "Specific token contract addresses to query"}
                    }),
                    &["accountAddress"],
                ),
            ),
            ToolDefinition::new(
                GET_BLOCK,
                "Get block information by block number",
                schema(
                    json!({
                        "blockNumber": {"type": ["string", "number"], "description": "The block number to query"},
                        "includeTransactions": {"type": "boolean", "description": "Whether to include transaction details"}
                    }),
                    &["blockNumber"],
                ),
            ),
            ToolDefinition::new(
                GET_TRANSACTION,
                "Get transaction details by transaction hash",
                schema(
                    json!({
                        "transactionHash": {"type": "string", "description": "The transaction hash to query"}
                    }),
                    &["transactionHash"],
                ),
            ),
        ]
    }

    async fn call(&self, action: &str, args: Value) -> ActionOutcome {
        let result = match action {
            GET_TOKEN_TRANSFERS => match parse_input(args) {
                Ok(input) => self.token_transfers(input).await,
                Err(outcome) => return outcome,
            },
            GET_TOKEN_BALANCES => match parse_input(args) {
                Ok(input) => self.token_balances(input).await,
                Err(outcome) => return outcome,
            },
            GET_BLOCK => match parse_input(args) {
                Ok(input) => self.block(input).await,
                Err(outcome) => return outcome,
            },
            GET_TRANSACTION => match parse_input(args) {
                Ok(input) => self.transaction(input).await,
                Err(outcome) => return outcome,
            },
            other => return ActionOutcome::fail(format!("Unknown nodit action: {}", other)),
        };
        if let Err(e) = &result {
            error!(action, error = %e, "Nodit action failed");
        }
        result.into()
    }
}
