// src/agent/providers/wallet.rs

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ethers_core::types::U256;
use ethers_core::utils::{format_ether, parse_ether};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use validator::Validate;

use crate::agent::{parse_input, ActionOutcome, ActionProvider, ToolDefinition, EVM_ADDRESS};
use crate::blockchain::WalletClient;

pub const GET_WALLET_DETAILS: &str = "get_wallet_details";
pub const GET_BALANCE: &str = "get_balance";
pub const SIGN_MESSAGE: &str = "sign_message";
pub const NATIVE_TRANSFER: &str = "native_transfer";

#[derive(Debug, Deserialize, Validate)]
pub struct SignMessageInput {
    #[validate(length(min = 1))]
    pub message: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NativeTransferInput {
    #[validate(regex = "EVM_ADDRESS")]
    pub to: String,
    /// Whole native units, e.g. "0.01"
    #[validate(length(min = 1))]
    pub value: String,
}

/// Standard actions on the agent's own wallet
pub struct WalletActionProvider {
    wallet: Arc<WalletClient>,
}

impl WalletActionProvider {
    pub fn new(wallet: Arc<WalletClient>) -> Self {
        Self { wallet }
    }

    async fn wallet_details(&self) -> Result<ActionOutcome> {
        let address = self.wallet.checksum_address();
        let balance = self.wallet.get_balance(&address).await?;
        let chain = self.wallet.chain();
        Ok(ActionOutcome::ok(
            json!({
                "address": address,
                "network": {"chainId": chain.id, "name": chain.name},
                "balance": balance,
            }),
            format!("Wallet {} on {} (chainId: {})", address, chain.name, chain.id),
        ))
    }

    async fn balance(&self) -> Result<ActionOutcome> {
        let address = self.wallet.checksum_address();
        let balance = self.wallet.get_balance(&address).await?;
        let ether = U256::from_dec_str(&balance.amount)
            .map(format_ether)
            .unwrap_or_else(|_| balance.amount.clone());
        Ok(ActionOutcome::ok(
            json!({"address": address, "balance": balance, "formatted": ether}),
            format!("Native balance of {} is {}", address, ether),
        ))
    }

    async fn sign(&self, input: SignMessageInput) -> Result<ActionOutcome> {
        let signature = self.wallet.sign_message(&input.message).await?;
        Ok(ActionOutcome::ok(
            json!({"signature": format!("0x{}", signature)}),
            format!("Signed message with {}", self.wallet.checksum_address()),
        ))
    }

    async fn transfer(&self, input: NativeTransferInput) -> Result<ActionOutcome> {
        let wei = parse_ether(&input.value)
            .map_err(|e| anyhow!("invalid amount '{}': {}", input.value, e))?;
        let sent = self.wallet.transfer_native(&input.to, wei).await?;
        info!(to = %input.to, value = %input.value, tx_hash = %sent.tx_hash, "Native transfer sent");
        Ok(ActionOutcome::ok(
            json!({
                "transactionHash": sent.tx_hash,
                "to": input.to,
                "value": input.value,
                "explorerUrl": self.wallet.chain().tx_url(&sent.tx_hash),
            }),
            format!("Transferred {} to {}", input.value, input.to),
        ))
    }
}

#[async_trait]
impl ActionProvider for WalletActionProvider {
    fn name(&self) -> &'static str {
        "wallet"
    }

    fn supports_network(&self, _chain_id: u64) -> bool {
        true
    }

    fn actions(&self) -> Vec<ToolDefinition> {
        let no_args = json!({"type": "object", "properties": {}});
        vec![
            ToolDefinition::new(
                GET_WALLET_DETAILS,
                "Get the agent wallet's address, network and native balance",
                no_args.clone(),
            ),
            ToolDefinition::new(GET_BALANCE, "Get the agent wallet's native balance", no_args),
            ToolDefinition::new(
                SIGN_MESSAGE,
                "Sign a message with the agent wallet (EIP-191)",
                json!({
                    "type": "object",
                    "properties": {"message": {"type": "string", "description": "The message to sign"}},
                    "required": ["message"]
                }),
            ),
            ToolDefinition::new(
                NATIVE_TRANSFER,
                "Transfer native currency from the agent wallet",
                json!({
                    "type": "object",
                    "properties": {
                        "to": {"type": "string", "description": "The destination address"},
                        "value": {"type": "string", "description": "The amount to transfer in whole units, e.g. 0.01"}
                    },
                    "required": ["to", "value"]
                }),
            ),
        ]
    }

    async fn call(&self, action: &str, args: Value) -> ActionOutcome {
        match action {
            GET_WALLET_DETAILS => self.wallet_details().await.into(),
            GET_BALANCE => self.balance().await.into(),
            SIGN_MESSAGE => match parse_input(args) {
                Ok(input) => self.sign(input).await.into(),
                Err(outcome) => outcome,
            },
            NATIVE_TRANSFER => match parse_input(args) {
                Ok(input) => self.transfer(input).await.into(),
                Err(outcome) => outcome,
            },
            other => ActionOutcome::fail(format!("Unknown wallet action: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::chains::{get_chain, BASE_SEPOLIA_CHAIN_ID};
    use secrecy::SecretString;

    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn provider() -> WalletActionProvider {
        let chain = get_chain(BASE_SEPOLIA_CHAIN_ID).unwrap();
        WalletActionProvider::new(Arc::new(
            WalletClient::new(&SecretString::new(DEV_KEY.into()), chain, "http://127.0.0.1:1").unwrap(),
        ))
    }

    #[tokio::test]
    async fn signs_without_network() {
        let out = provider().call(SIGN_MESSAGE, json!({"message": "gm"})).await;
        assert!(out.success);
        let sig = out.data.unwrap()["signature"].as_str().unwrap().to_string();
        assert!(sig.starts_with("0x"));
        assert_eq!(sig.len(), 2 + 130);
    }

    #[tokio::test]
    async fn rpc_failure_becomes_error_outcome() {
        let out = provider().call(GET_BALANCE, json!({})).await;
        assert!(!out.success);
        assert!(out.error.is_some());
    }

    #[tokio::test]
    async fn transfer_validates_recipient() {
        let out = provider()
            .call(NATIVE_TRANSFER, json!({"to": "vitalik.eth", "value": "1"}))
            .await;
        assert!(out.error.unwrap().starts_with("Invalid input"));
    }
}
