// src/chat/prompt.rs

use crate::blockchain::ChainEntry;
use crate::personality::Personality;

/// Personality prompt plus the per-request context: data-API usage hints,
/// contract configuration guidance, the active chain and the user's address.
pub fn build_system_prompt(
    personality: &Personality,
    chain: &ChainEntry,
    user_address: &str,
    contracts_configured: bool,
) -> String {
    let mut prompt = personality.system_prompt.clone();
    prompt.push_str("\n\n");
    prompt.push_str(
        "When using Nodit tools, specify the network (e.g., 'ethereum') and chainType (e.g., 'mainnet' or 'testnet').\n",
    );
    prompt.push_str(
        "When creating coins or sending transactions, clearly state the action to be taken and ask for confirmation if appropriate or if parameters are ambiguous.\n",
    );
    if !contracts_configured {
        prompt.push_str(
            "If the user asks about contract interactions and a specific contract is not found or configured, politely inform them that the full contract details are not yet available for that contract on this chain, and offer standard ERC20 calls or other tools instead.\n",
        );
    }
    prompt.push_str(&format!(
        "You are currently configured to work with {} (chainId: {}). Tools like 'getTokenDetails' will operate on this chain unless otherwise specified by the user.\n",
        chain.name, chain.id
    ));
    prompt.push_str(&format!("The current user's address is {}.", user_address));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::get_chain;
    use crate::personality::get_personality;

    #[test]
    fn appends_request_context() {
        let chain = get_chain(8453).unwrap();
        let prompt = build_system_prompt(get_personality("gensler"), chain, "0xabc", false);
        assert!(prompt.starts_with("Good morning."));
        assert!(prompt.contains("configured to work with Base (chainId: 8453)"));
        assert!(prompt.ends_with("The current user's address is 0xabc."));
        assert!(prompt.contains("politely inform them"));

        let prompt = build_system_prompt(get_personality("gensler"), chain, "0xabc", true);
        assert!(!prompt.contains("politely inform them"));
    }
}
