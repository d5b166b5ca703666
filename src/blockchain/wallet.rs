//! Request-scoped wallet client.
//!
//! Every chat request builds its own `WalletClient` from the agent key, bound to
//! the selected chain. Nonces are read from the node on each send, so nothing is
//! cached between requests.

use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use ethers_core::types::{Address, Bytes, Signature, TransactionRequest, U256};
use ethers_core::utils::to_checksum;
use ethers_signers::{LocalWallet, Signer};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::blockchain::chains::ChainEntry;
use crate::blockchain::rpc::{parse_quantity, rpc_batch, rpc_call};

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub tx_hash: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub amount: String,
    pub denom: String,
}

#[derive(Clone)]
pub struct WalletClient {
    wallet: LocalWallet,
    chain: &'static ChainEntry,
    rpc_url: String,
    http: Client,
}

impl WalletClient {
    pub fn new(
        private_key: &SecretString,
        chain: &'static ChainEntry,
        rpc_url: impl Into<String>,
    ) -> Result<Self> {
        let wallet = LocalWallet::from_str(private_key.expose_secret().trim())
            .map_err(|e| anyhow!("Invalid agent private key: {}", e))?
            .with_chain_id(chain.id);
        Ok(Self {
            wallet,
            chain,
            rpc_url: rpc_url.into(),
            http: Client::new(),
        })
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    pub fn checksum_address(&self) -> String {
        to_checksum(&self.wallet.address(), None)
    }

    pub fn chain(&self) -> &'static ChainEntry {
        self.chain
    }

    pub async fn get_balance(&self, address: &str) -> Result<BalanceResponse> {
        let result = rpc_call(
            &self.http,
            &self.rpc_url,
            "eth_getBalance",
            json!([address, "latest"]),
        )
        .await?;
        Ok(BalanceResponse {
            amount: parse_quantity(&result)?.to_string(),
            // For EVM chains, the native balance is returned in wei
            denom: "wei".to_string(),
        })
    }

    /// Executes an `eth_call` against `to` and returns the raw hex result.
    pub async fn call(&self, to: &str, data: &Bytes) -> Result<Value> {
        rpc_call(
            &self.http,
            &self.rpc_url,
            "eth_call",
            json!([{"to": to, "data": format!("0x{}", hex::encode(data))}, "latest"]),
        )
        .await
    }

    /// Runs several `eth_call`s against `to` in one batch round trip.
    pub async fn call_many(&self, to: &str, calls: &[Bytes]) -> Result<Vec<Result<Value>>> {
        let requests: Vec<(&str, Value)> = calls
            .iter()
            .map(|data| {
                (
                    "eth_call",
                    json!([{"to": to, "data": format!("0x{}", hex::encode(data))}, "latest"]),
                )
            })
            .collect();
        rpc_batch(&self.http, &self.rpc_url, &requests).await
    }

    pub async fn sign_message(&self, message: &str) -> Result<Signature> {
        Ok(self.wallet.sign_message(message).await?)
    }

    /// Fills nonce, gas and gas price from the node, signs locally and broadcasts.
    pub async fn send_transaction(&self, tx_request: TransactionRequest) -> Result<TransactionResponse> {
        let from_address = self.wallet.address();

        let nonce = parse_quantity(
            &rpc_call(
                &self.http,
                &self.rpc_url,
                "eth_getTransactionCount",
                json!([format!("{:?}", from_address), "pending"]),
            )
            .await?,
        )?;

        let mut tx = tx_request
            .from(from_address)
            .nonce(nonce)
            .chain_id(self.chain.id);

        // If gas is not provided, estimate it via eth_estimateGas
        if tx.gas.is_none() {
            let call_obj = serde_json::to_value(&tx)?;
            let gas = parse_quantity(
                &rpc_call(&self.http, &self.rpc_url, "eth_estimateGas", json!([call_obj]))
                    .await
                    .context("Failed to estimate gas")?,
            )?;
            tx = tx.gas(gas);
        }

        if tx.gas_price.is_none() {
            let gas_price = parse_quantity(
                &rpc_call(&self.http, &self.rpc_url, "eth_gasPrice", json!([])).await?,
            )?;
            tx = tx.gas_price(gas_price);
        }

        debug!(chain_id = self.chain.id, nonce = %nonce, "Signing transaction");
        let signature = self.wallet.sign_transaction(&tx.clone().into()).await?;
        let raw_tx = tx.rlp_signed(&signature);

        let result = rpc_call(
            &self.http,
            &self.rpc_url,
            "eth_sendRawTransaction",
            json!([format!("0x{}", hex::encode(raw_tx))]),
        )
        .await?;
        let tx_hash = result
            .as_str()
            .ok_or_else(|| anyhow!("eth_sendRawTransaction returned no hash"))?
            .to_string();

        info!(chain = self.chain.name, tx_hash = %tx_hash, "Transaction broadcast");
        Ok(TransactionResponse { tx_hash })
    }

    pub async fn transfer_native(&self, to: &str, value_wei: U256) -> Result<TransactionResponse> {
        let to = Address::from_str(to).map_err(|e| anyhow!("Invalid recipient address: {}", e))?;
        self.send_transaction(TransactionRequest::new().to(to).value(value_wei))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::chains::{get_chain, BASE_SEPOLIA_CHAIN_ID};

    // Well-known anvil/hardhat development key #0
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn derives_address_from_key() {
        let chain = get_chain(BASE_SEPOLIA_CHAIN_ID).unwrap();
        let client =
            WalletClient::new(&SecretString::new(DEV_KEY.to_string()), chain, chain.rpc_url).unwrap();
        assert_eq!(
            client.checksum_address(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
        assert_eq!(client.chain().id, BASE_SEPOLIA_CHAIN_ID);
    }

    #[test]
    fn rejects_malformed_key() {
        let chain = get_chain(BASE_SEPOLIA_CHAIN_ID).unwrap();
        assert!(WalletClient::new(&SecretString::new("0x1234".to_string()), chain, chain.rpc_url).is_err());
    }

    #[tokio::test]
    async fn signs_messages_locally() {
        let chain = get_chain(BASE_SEPOLIA_CHAIN_ID).unwrap();
        let client =
            WalletClient::new(&SecretString::new(DEV_KEY.to_string()), chain, chain.rpc_url).unwrap();
        let sig = client.sign_message("hello").await.unwrap();
        assert!(sig.verify("hello", client.address()).is_ok());
    }
}
