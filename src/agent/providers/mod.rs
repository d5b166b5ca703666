// src/agent/providers/mod.rs

pub mod contract;
pub mod nodit;
pub mod token_details;
pub mod wallet;

pub use contract::ContractInteractor;
pub use nodit::NoditProvider;
pub use token_details::TokenDetailsProvider;
pub use wallet::WalletActionProvider;
