// src/blockchain/contracts.rs

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use ethers_core::abi::Abi;
use ethers_core::types::Address;
use serde::Deserialize;

/// A contract the agent may call by name
#[derive(Debug, Clone, Deserialize)]
pub struct DeployedContract {
    pub address: Address,
    pub abi: Abi,
}

/// chainId -> contractName -> contract. Loaded once, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ContractRegistry {
    chains: Arc<HashMap<u64, HashMap<String, DeployedContract>>>,
}

impl ContractRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses a registry document of the form
    /// `{ "<chainId>": { "<ContractName>": { "address": "0x..", "abi": [..] } } }`.
    pub fn from_json(raw: &str) -> Result<Self> {
        let parsed: HashMap<String, HashMap<String, DeployedContract>> =
            serde_json::from_str(raw).context("Invalid deployed contracts JSON")?;
        let mut chains = HashMap::with_capacity(parsed.len());
        for (chain_id, contracts) in parsed {
            let id = chain_id
                .parse::<u64>()
                .with_context(|| format!("'{}' is not a chain id", chain_id))?;
            chains.insert(id, contracts);
        }
        Ok(Self {
            chains: Arc::new(chains),
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read contracts file {}", path.display()))?;
        Self::from_json(&raw)
    }

    pub fn for_chain(&self, chain_id: u64) -> Option<&HashMap<String, DeployedContract>> {
        self.chains.get(&chain_id).filter(|c| !c.is_empty())
    }

    pub fn get(&self, chain_id: u64, name: &str) -> Option<&DeployedContract> {
        self.for_chain(chain_id).and_then(|c| c.get(name))
    }

    /// Contract names configured on a chain, sorted for stable messages
    pub fn names(&self, chain_id: u64) -> Vec<String> {
        let mut names: Vec<String> = self
            .for_chain(chain_id)
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}
