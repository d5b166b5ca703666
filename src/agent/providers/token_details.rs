// src/agent/providers/token_details.rs

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ethers_core::abi::Token;
use ethers_core::types::{Address, Bytes};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use validator::Validate;

use crate::agent::{parse_input, ActionOutcome, ActionProvider, ToolDefinition, EVM_ADDRESS};
use crate::blockchain::abi::{decode_string, decode_u256, encode_call};
use crate::blockchain::WalletClient;

pub const GET_TOKEN_DETAILS: &str = "getTokenDetails";

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TokenDetailsInput {
    #[validate(regex = "EVM_ADDRESS")]
    pub contract_address: String,
}

/// ERC-20 metadata read through the request's wallet client
pub struct TokenDetailsProvider {
    wallet: Arc<WalletClient>,
}

impl TokenDetailsProvider {
    pub fn new(wallet: Arc<WalletClient>) -> Self {
        Self { wallet }
    }

    async fn details(&self, input: TokenDetailsInput) -> Result<ActionOutcome> {
        let token = input.contract_address.as_str();
        let holder: Address = self.wallet.address();

        let signatures = ["name()", "symbol()", "decimals()", "totalSupply()", "balanceOf(address)"];
        let calls: Vec<Bytes> = signatures
            .iter()
            .map(|sig| match *sig {
                "balanceOf(address)" => encode_call(sig, vec![Token::Address(holder)]),
                _ => encode_call(sig, vec![]),
            })
            .collect();

        // One batch round trip; a reverted field reads as missing
        let replies = self.wallet.call_many(token, &calls).await?;
        let fields: Vec<Option<Value>> = replies
            .into_iter()
            .zip(signatures)
            .map(|(reply, sig)| match reply {
                Ok(v) => Some(v),
                Err(e) => {
                    debug!(token, sig, error = %e, "Token field call failed");
                    None
                }
            })
            .collect();
        let [name, symbol, decimals, total_supply, balance]: [Option<Value>; 5] = fields
            .try_into()
            .map_err(|_| anyhow!("incomplete batch reply for {}", token))?;

        let name = name.as_ref().and_then(decode_string);
        let symbol = symbol.as_ref().and_then(decode_string);
        let total_supply = total_supply.as_ref().and_then(decode_u256);
        if name.is_none() && symbol.is_none() && total_supply.is_none() {
            return Err(anyhow!(
                "{} does not look like an ERC20 token on {}",
                token,
                self.wallet.chain().name
            ));
        }

        let decimals = decimals.as_ref().and_then(decode_u256).map(|d| d.low_u32());
        let data = json!({
            "contractAddress": token,
            "chainId": self.wallet.chain().id,
            "name": name,
            "symbol": symbol,
            "decimals": decimals,
            "totalSupply": total_supply.map(|n| n.to_string()),
            "balance": balance.as_ref().and_then(decode_u256).map(|n| n.to_string()),
        });
        let message = format!(
            "Details for {} ({}) at {}",
            name.as_deref().unwrap_or("unknown"),
            symbol.as_deref().unwrap_or("?"),
            token
        );
        Ok(ActionOutcome::ok(data, message))
    }
}

#[async_trait]
impl ActionProvider for TokenDetailsProvider {
    fn name(&self) -> &'static str {
        "token-details"
    }

    fn supports_network(&self, _chain_id: u64) -> bool {
        true
    }

    fn actions(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition::new(
            GET_TOKEN_DETAILS,
            "Fetches name, symbol, decimals, total supply and the agent wallet's balance for an ERC20 token contract address",
            json!({
                "type": "object",
                "properties": {
                    "contractAddress": {"type": "string", "description": "The ERC20 token contract address"}
                },
                "required": ["contractAddress"]
            }),
        )]
    }

    async fn call(&self, action: &str, args: Value) -> ActionOutcome {
        if action != GET_TOKEN_DETAILS {
            return ActionOutcome::fail(format!("Unknown token action: {}", action));
        }
        match parse_input::<TokenDetailsInput>(args) {
            Ok(input) => self.details(input).await.into(),
            Err(outcome) => outcome,
        }
    }
}
