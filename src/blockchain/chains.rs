//! Static registry of the EVM networks the assistant can operate on.

use serde::Serialize;

pub const ETHEREUM_CHAIN_ID: u64 = 1;
pub const BASE_CHAIN_ID: u64 = 8453;
pub const BASE_SEPOLIA_CHAIN_ID: u64 = 84532;
pub const OPTIMISM_CHAIN_ID: u64 = 10;
pub const ARBITRUM_CHAIN_ID: u64 = 42161;
pub const POLYGON_CHAIN_ID: u64 = 137;
pub const AVALANCHE_CHAIN_ID: u64 = 43114;
pub const BLAST_CHAIN_ID: u64 = 81457;

const ZERO_FACTORY: &str = "0x0000000000000000000000000000000000000000";

/// Display metadata and connection details for one supported network
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainEntry {
    pub id: u64,
    pub name: &'static str,
    pub icon: &'static str,
    pub explorer: &'static str,
    pub rpc_url: &'static str,
    pub factory_address: &'static str,
}

impl ChainEntry {
    /// Explorer link for a transaction hash
    pub fn tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer, tx_hash)
    }
}

lazy_static::lazy_static! {
    static ref CHAINS: Vec<ChainEntry> = vec![
        ChainEntry {
            id: ETHEREUM_CHAIN_ID,
            name: "Ethereum",
            icon: "⟠",
            explorer: "https://etherscan.io",
            rpc_url: "https://eth.llamarpc.com",
            factory_address: ZERO_FACTORY,
        },
        ChainEntry {
            id: BASE_CHAIN_ID,
            name: "Base",
            icon: "🟦",
            explorer: "https://basescan.org",
            rpc_url: "https://mainnet.base.org",
            factory_address: "0x777777751622c0d3258f214F9DF38E35BF45baF3",
        },
        ChainEntry {
            id: BASE_SEPOLIA_CHAIN_ID,
            name: "Base Sepolia",
            icon: "🔵",
            explorer: "https://sepolia.basescan.org",
            rpc_url: "https://sepolia.base.org",
            factory_address: "0x777777751622c0d3258f214F9DF38E35BF45baF3",
        },
        ChainEntry {
            id: OPTIMISM_CHAIN_ID,
            name: "Optimism",
            icon: "🟧",
            explorer: "https://optimistic.etherscan.io",
            rpc_url: "https://mainnet.optimism.io",
            factory_address: "0x7777777F279eba3d3Ad8F4E708545291A6fDBA8B",
        },
        ChainEntry {
            id: ARBITRUM_CHAIN_ID,
            name: "Arbitrum",
            icon: "🟨",
            explorer: "https://arbiscan.io",
            rpc_url: "https://arb1.arbitrum.io/rpc",
            factory_address: "0x7777777F279eba3d3Ad8F4E708545291A6fDBA8B",
        },
        ChainEntry {
            id: POLYGON_CHAIN_ID,
            name: "Polygon",
            icon: "🟣",
            explorer: "https://polygonscan.com",
            rpc_url: "https://polygon-rpc.com",
            factory_address: ZERO_FACTORY,
        },
        ChainEntry {
            id: AVALANCHE_CHAIN_ID,
            name: "Avalanche",
            icon: "🔺",
            explorer: "https://snowtrace.io",
            rpc_url: "https://api.avax.network/ext/bc/C/rpc",
            factory_address: ZERO_FACTORY,
        },
        ChainEntry {
            id: BLAST_CHAIN_ID,
            name: "Blast",
            icon: "💥",
            explorer: "https://blastscan.io",
            rpc_url: "https://rpc.blast.io",
            factory_address: "0x7777777F279eba3d3Ad8F4E708545291A6fDBA8B",
        },
    ];
}

pub fn get_chain(chain_id: u64) -> Option<&'static ChainEntry> {
    CHAINS.iter().find(|c| c.id == chain_id)
}

pub fn is_supported(chain_id: u64) -> bool {
    get_chain(chain_id).is_some()
}

pub fn all_chains() -> &'static [ChainEntry] {
    &CHAINS
}
