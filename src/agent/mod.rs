//! # Agent toolset
//!
//! A [`Toolset`] is assembled fresh for every chat request. It owns a wallet
//! client bound to the selected chain and the action providers that support
//! that chain. Nothing here is shared between requests.
//!
//! ## Providers
//! - `nodit` - Web3 Data API queries (transfers, balances, blocks, transactions)
//! - `contract-interactor` - named contract reads and writes on the selected chain
//! - `token-details` - ERC-20 metadata lookups
//! - `wallet` - agent wallet details, balance, message signing, native transfers
//!
//! The `showTransaction` tool is built in and only echoes a hash with its
//! explorer link.

pub mod providers;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::blockchain::{get_chain, ChainEntry, ContractRegistry, WalletClient};
use crate::config::Config;

use providers::{ContractInteractor, NoditProvider, TokenDetailsProvider, WalletActionProvider};

pub const SHOW_TRANSACTION_TOOL: &str = "showTransaction";

lazy_static! {
    pub(crate) static ref EVM_ADDRESS: Regex =
        Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("static regex");
    pub(crate) static ref TX_HASH: Regex =
        Regex::new(r"^0x[0-9a-fA-F]{64}$").expect("static regex");
    /// Network and chain type names become URL path segments
    pub(crate) static ref NETWORK_SLUG: Regex =
        Regex::new(r"^[a-z0-9-]+$").expect("static regex");
}

/// A callable tool as advertised to the model
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn new(name: &str, description: &str, parameters: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        }
    }
}

/// Result of one action; serializes as `{success, data, message}` or `{success, error}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionOutcome {
    pub fn ok(data: Value, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(error.into()),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| json!({"success": false, "error": e.to_string()}))
    }
}

impl From<anyhow::Result<ActionOutcome>> for ActionOutcome {
    fn from(result: anyhow::Result<ActionOutcome>) -> Self {
        result.unwrap_or_else(|e| ActionOutcome::fail(format!("{:#}", e)))
    }
}

/// One external capability exposed to the model as a set of named actions.
#[async_trait]
pub trait ActionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn supports_network(&self, chain_id: u64) -> bool;

    fn actions(&self) -> Vec<ToolDefinition>;

    /// Runs `action` with raw model-supplied arguments. Never panics or errors:
    /// every failure is reported through [`ActionOutcome::fail`].
    async fn call(&self, action: &str, args: Value) -> ActionOutcome;
}

/// Deserializes and validates action arguments.
pub(crate) fn parse_input<T>(args: Value) -> Result<T, ActionOutcome>
where
    T: DeserializeOwned + Validate,
{
    let input: T = serde_json::from_value(args)
        .map_err(|e| ActionOutcome::fail(format!("Invalid input: {}", e)))?;
    input
        .validate()
        .map_err(|e| ActionOutcome::fail(format!("Invalid input: {}", e)))?;
    Ok(input)
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Unsupported chain ID: {0}")]
    UnsupportedChain(u64),
    #[error("No RPC URL configured for chain {0}")]
    MissingRpcUrl(u64),
    #[error("Failed to create wallet client: {0}")]
    Wallet(#[source] anyhow::Error),
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct ShowTransactionInput {
    #[validate(regex = "TX_HASH")]
    transaction_hash: String,
}

/// Per-request set of callable tools
pub struct Toolset {
    chain: &'static ChainEntry,
    wallet: Arc<WalletClient>,
    providers: Vec<Box<dyn ActionProvider>>,
    routes: HashMap<String, usize>,
}

impl Toolset {
    /// Builds a fresh wallet client and provider list for `chain_id`.
    pub fn assemble(
        config: &Config,
        chain_id: u64,
        contracts: &ContractRegistry,
    ) -> Result<Self, AgentError> {
        let chain = get_chain(chain_id).ok_or(AgentError::UnsupportedChain(chain_id))?;
        let rpc_url = config
            .rpc_url_for(chain_id)
            .ok_or(AgentError::MissingRpcUrl(chain_id))?;
        let wallet = Arc::new(
            WalletClient::new(&config.agent_private_key, chain, rpc_url).map_err(AgentError::Wallet)?,
        );

        let mut providers: Vec<Box<dyn ActionProvider>> = vec![
            Box::new(WalletActionProvider::new(wallet.clone())),
            Box::new(ContractInteractor::new(chain_id, contracts.clone(), wallet.clone())),
            Box::new(TokenDetailsProvider::new(wallet.clone())),
        ];
        match &config.nodit_api_key {
            Some(key) => providers.push(Box::new(NoditProvider::new(
                key.clone(),
                config.nodit_base_url.clone(),
            ))),
            None => warn!("NODIT_API_KEY not set, Nodit tools are unavailable"),
        }

        Ok(Self::from_providers(chain, wallet, providers))
    }

    /// Keeps only providers that support `chain` and indexes their actions by name.
    pub fn from_providers(
        chain: &'static ChainEntry,
        wallet: Arc<WalletClient>,
        mut providers: Vec<Box<dyn ActionProvider>>,
    ) -> Self {
        providers.retain(|p| p.supports_network(chain.id));

        let mut routes = HashMap::new();
        for (idx, provider) in providers.iter().enumerate() {
            for action in provider.actions() {
                if routes.insert(action.name.clone(), idx).is_some() {
                    warn!(action = %action.name, provider = provider.name(), "Duplicate action name, last one wins");
                }
            }
        }

        info!(
            chain = chain.name,
            chain_id = chain.id,
            providers = providers.len(),
            tools = routes.len() + 1,
            "Toolset assembled"
        );
        Self {
            chain,
            wallet,
            providers,
            routes,
        }
    }

    pub fn chain(&self) -> &'static ChainEntry {
        self.chain
    }

    pub fn wallet_address(&self) -> String {
        self.wallet.checksum_address()
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Every tool the model may call, provider actions first
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> =
            self.providers.iter().flat_map(|p| p.actions()).collect();
        defs.push(ToolDefinition::new(
            SHOW_TRANSACTION_TOOL,
            "Show the transaction hash",
            json!({
                "type": "object",
                "properties": {
                    "transactionHash": {"type": "string", "description": "The transaction hash to show"}
                },
                "required": ["transactionHash"]
            }),
        ));
        defs
    }

    pub async fn execute(&self, name: &str, args: Value) -> ActionOutcome {
        debug!(tool = name, args = %args, "Executing tool");
        if name == SHOW_TRANSACTION_TOOL {
            return self.show_transaction(args);
        }
        match self.routes.get(name) {
            Some(&idx) => self.providers[idx].call(name, args).await,
            None => ActionOutcome::fail(format!("Unknown tool: {}", name)),
        }
    }

    fn show_transaction(&self, args: Value) -> ActionOutcome {
        let input: ShowTransactionInput = match parse_input(args) {
            Ok(input) => input,
            Err(outcome) => return outcome,
        };
        ActionOutcome::ok(
            json!({
                "transactionHash": input.transaction_hash,
                "explorerUrl": self.chain.tx_url(&input.transaction_hash),
            }),
            format!("Transaction {}", input.transaction_hash),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::chains::{BASE_CHAIN_ID, BASE_SEPOLIA_CHAIN_ID};
    use secrecy::SecretString;

    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn config() -> Config {
        Config {
            agent_private_key: SecretString::new(DEV_KEY.to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn outcome_shapes() {
        assert_eq!(
            ActionOutcome::ok(json!({"a": 1}), "done").to_value(),
            json!({"success": true, "data": {"a": 1}, "message": "done"})
        );
        assert_eq!(
            ActionOutcome::fail("boom").to_value(),
            json!({"success": false, "error": "boom"})
        );
    }

    #[test]
    fn rejects_unsupported_chain() {
        let err = Toolset::assemble(&config(), 999, &ContractRegistry::empty()).err().unwrap();
        assert_eq!(err.to_string(), "Unsupported chain ID: 999");
    }

    #[test]
    fn omits_nodit_without_api_key() {
        let toolset = Toolset::assemble(&config(), BASE_SEPOLIA_CHAIN_ID, &ContractRegistry::empty()).unwrap();
        let names: Vec<String> = toolset.definitions().into_iter().map(|d| d.name).collect();
        assert!(names.contains(&"read-contract".to_string()));
        assert!(names.contains(&"getTokenDetails".to_string()));
        assert!(names.contains(&"native_transfer".to_string()));
        assert!(!names.contains(&"getBlockByNumber".to_string()));
        assert_eq!(names.last().map(String::as_str), Some(SHOW_TRANSACTION_TOOL));
        assert_eq!(toolset.wallet_address(), "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    }

    #[test]
    fn includes_nodit_when_configured() {
        let mut cfg = config();
        cfg.nodit_api_key = Some(SecretString::new("test-key".to_string()));
        let toolset = Toolset::assemble(&cfg, BASE_CHAIN_ID, &ContractRegistry::empty()).unwrap();
        assert!(toolset.provider_names().contains(&"nodit"));
        assert_eq!(toolset.chain().id, BASE_CHAIN_ID);
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error_outcome() {
        let toolset = Toolset::assemble(&config(), BASE_SEPOLIA_CHAIN_ID, &ContractRegistry::empty()).unwrap();
        let out = toolset.execute("launchRocket", json!({})).await;
        assert_eq!(out, ActionOutcome::fail("Unknown tool: launchRocket"));
    }

    #[tokio::test]
    async fn show_transaction_links_explorer() {
        let toolset = Toolset::assemble(&config(), BASE_CHAIN_ID, &ContractRegistry::empty()).unwrap();
        let hash = format!("0x{}", "ab".repeat(32));
        let out = toolset
            .execute(SHOW_TRANSACTION_TOOL, json!({"transactionHash": hash}))
            .await;
        assert!(out.success);
        assert_eq!(
            out.data.unwrap()["explorerUrl"],
            json!(format!("https://basescan.org/tx/{}", hash))
        );

        let bad = toolset
            .execute(SHOW_TRANSACTION_TOOL, json!({"transactionHash": "0x12"}))
            .await;
        assert!(!bad.success);
    }
}
