// src/agent/providers/contract.rs

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ethers_core::types::{TransactionRequest, U256};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use validator::Validate;

use crate::agent::{parse_input, ActionOutcome, ActionProvider, ToolDefinition};
use crate::blockchain::abi::{encode_function_call, find_function, hex_to_bytes, token_to_json};
use crate::blockchain::{ContractRegistry, DeployedContract, WalletClient};

pub const READ_CONTRACT: &str = "read-contract";
pub const WRITE_CONTRACT: &str = "write-contract";

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContractInteractionInput {
    #[validate(length(min = 1))]
    pub contract_name: String,
    #[validate(length(min = 1))]
    pub function_name: String,
    #[serde(default)]
    pub function_args: Vec<String>,
    /// Wei, decimal string
    pub value: Option<String>,
}

/// Calls contracts listed in the deployed-contract registry, by name, on one chain.
pub struct ContractInteractor {
    chain_id: u64,
    contracts: ContractRegistry,
    wallet: Arc<WalletClient>,
}

impl ContractInteractor {
    pub fn new(chain_id: u64, contracts: ContractRegistry, wallet: Arc<WalletClient>) -> Self {
        if contracts.for_chain(chain_id).is_none() {
            warn!(
                chain_id,
                "No contracts configured for this chain, contract interactions will fail"
            );
        }
        Self {
            chain_id,
            contracts,
            wallet,
        }
    }

    /// Resolves the named contract or explains why it cannot be used.
    fn resolve(&self, name: &str) -> Result<&DeployedContract, String> {
        if self.contracts.for_chain(self.chain_id).is_none() {
            return Err(format!(
                "Contract interaction is not configured for chainId {}. Please ensure 'deployedContracts' is correctly set up.",
                self.chain_id
            ));
        }
        self.contracts.get(self.chain_id, name).ok_or_else(|| {
            format!(
                "Contract \"{}\" not found or not configured for chainId {}. Available on this chain (if configured): {}",
                name,
                self.chain_id,
                self.contracts.names(self.chain_id).join(", ")
            )
        })
    }

    async fn read(&self, contract: &DeployedContract, input: &ContractInteractionInput) -> Result<ActionOutcome> {
        let func = find_function(&contract.abi, &input.function_name)?;
        let data = encode_function_call(func, &input.function_args)?;
        let raw = self
            .wallet
            .call(&format!("{:?}", contract.address), &data)
            .await
            .with_context(|| format!("eth_call to {} failed", input.contract_name))?;
        let tokens = func
            .decode_output(&hex_to_bytes(&raw)?)
            .map_err(|e| anyhow!("failed to decode {} output: {}", input.function_name, e))?;

        let result = match tokens.as_slice() {
            [single] => token_to_json(single),
            many => Value::Array(many.iter().map(token_to_json).collect()),
        };
        let shown = match &result {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Ok(ActionOutcome::ok(
            json!({
                "contractName": input.contract_name,
                "functionName": input.function_name,
                "result": result,
            }),
            format!("Result of {} on {}: {}", input.function_name, input.contract_name, shown),
        ))
    }

    async fn write(&self, contract: &DeployedContract, input: &ContractInteractionInput) -> Result<ActionOutcome> {
        let func = find_function(&contract.abi, &input.function_name)?;
        let data = encode_function_call(func, &input.function_args)?;

        let mut tx = TransactionRequest::new().to(contract.address).data(data);
        if let Some(value) = input.value.as_deref().filter(|v| !v.is_empty()) {
            let wei = U256::from_dec_str(value).map_err(|e| anyhow!("invalid value '{}': {}", value, e))?;
            tx = tx.value(wei);
        }

        let sent = self.wallet.send_transaction(tx).await?;
        info!(
            contract = %input.contract_name,
            function = %input.function_name,
            tx_hash = %sent.tx_hash,
            "Contract write sent"
        );
        Ok(ActionOutcome::ok(
            json!({
                "contractName": input.contract_name,
                "functionName": input.function_name,
                "hash": sent.tx_hash,
            }),
            format!(
                "Sent {} on {}: {}",
                input.function_name, input.contract_name, sent.tx_hash
            ),
        ))
    }
}

fn interaction_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "contractName": {"type": "string", "description": "The name of the deployed contract"},
            "functionName": {"type": "string", "description": "The name of the function to call"},
            "functionArgs": {"type": "array", "items": {"type": "string"}, "description": "The arguments to pass to the function"},
            "value": {"type": "string", "description": "The value to send with the transaction, in wei"}
        },
        "required": ["contractName", "functionName", "functionArgs"]
    })
}

#[async_trait]
impl ActionProvider for ContractInteractor {
    fn name(&self) -> &'static str {
        "contract-interactor"
    }

    fn supports_network(&self, chain_id: u64) -> bool {
        chain_id == self.chain_id
    }

    fn actions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(READ_CONTRACT, "Call a read-only function on a contract", interaction_schema()),
            ToolDefinition::new(WRITE_CONTRACT, "Call a write function on a contract", interaction_schema()),
        ]
    }

    async fn call(&self, action: &str, args: Value) -> ActionOutcome {
        if action != READ_CONTRACT && action != WRITE_CONTRACT {
            return ActionOutcome::fail(format!("Unknown contract action: {}", action));
        }
        let input: ContractInteractionInput = match parse_input(args) {
            Ok(input) => input,
            Err(outcome) => return outcome,
        };
        let contract = match self.resolve(&input.contract_name) {
            Ok(contract) => contract,
            Err(message) => return ActionOutcome::fail(message),
        };

        if action == READ_CONTRACT {
            self.read(contract, &input).await.into()
        } else {
            self.write(contract, &input).await.into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::chains::{get_chain, BASE_CHAIN_ID};
    use secrecy::SecretString;

    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn wallet() -> Arc<WalletClient> {
        let chain = get_chain(BASE_CHAIN_ID).unwrap();
        // Unroutable: any network I/O would fail the test
        Arc::new(WalletClient::new(&SecretString::new(DEV_KEY.into()), chain, "http://127.0.0.1:1").unwrap())
    }

    fn registry() -> ContractRegistry {
        ContractRegistry::from_json(
            r#"{"8453": {"Greeter": {"address": "0x5FbDB2315678afecb367f032d93F642f64180aa3", "abi": []}}}"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn unconfigured_chain_is_reported_without_calling() {
        let provider = ContractInteractor::new(10, registry(), wallet());
        let out = provider
            .call(READ_CONTRACT, json!({"contractName": "Greeter", "functionName": "greet", "functionArgs": []}))
            .await;
        assert_eq!(
            out.error.as_deref(),
            Some("Contract interaction is not configured for chainId 10. Please ensure 'deployedContracts' is correctly set up.")
        );
    }

    #[tokio::test]
    async fn unknown_contract_lists_available_ones() {
        let provider = ContractInteractor::new(BASE_CHAIN_ID, registry(), wallet());
        let out = provider
            .call(WRITE_CONTRACT, json!({"contractName": "Vault", "functionName": "deposit", "functionArgs": []}))
            .await;
        assert_eq!(
            out.error.as_deref(),
            Some("Contract \"Vault\" not found or not configured for chainId 8453. Available on this chain (if configured): Greeter")
        );
    }

    #[test]
    fn supports_only_its_chain() {
        let provider = ContractInteractor::new(BASE_CHAIN_ID, registry(), wallet());
        assert!(provider.supports_network(BASE_CHAIN_ID));
        assert!(!provider.supports_network(1));
    }

    #[tokio::test]
    async fn missing_function_becomes_error_outcome() {
        let provider = ContractInteractor::new(BASE_CHAIN_ID, registry(), wallet());
        let out = provider
            .call(READ_CONTRACT, json!({"contractName": "Greeter", "functionName": "greet", "functionArgs": []}))
            .await;
        assert!(!out.success);
        assert!(out.error.unwrap().contains("function 'greet' not found"));
    }
}
