// src/blockchain/mod.rs

pub mod abi;
pub mod chains;
pub mod contracts;
pub mod rpc;
pub mod wallet;

pub use chains::{get_chain, ChainEntry};
pub use contracts::{ContractRegistry, DeployedContract};
pub use wallet::WalletClient;
