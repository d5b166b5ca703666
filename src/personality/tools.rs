//! Tool-description block of the system prompt.
//!
//! The two tool lists and the network list are fixed; each personality only
//! changes the phrasing through a [`ToolDescriptionTemplate`]. Rendering is pure,
//! so the same id always yields the same text.

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolDescription {
    pub name: &'static str,
    pub purpose: &'static str,
    pub details: &'static str,
}

pub const CORE_TOOLS: [ToolDescription; 4] = [
    ToolDescription {
        name: "getTokenDetails",
        purpose: "Get comprehensive information about ERC20 tokens",
        details: "Fetches name, symbol, total supply, and other metadata for any ERC20 token contract address",
    },
    ToolDescription {
        name: "read-contract",
        purpose: "Query smart contract data safely",
        details: "Calls read-only functions on smart contracts without sending transactions",
    },
    ToolDescription {
        name: "write-contract",
        purpose: "Execute blockchain transactions",
        details: "Sends transactions to smart contracts for write operations with proper gas estimation",
    },
    ToolDescription {
        name: "wallet-actions",
        purpose: "Manage wallet operations",
        details: "Check balances, sign messages, and perform standard wallet functions",
    },
];

pub const NODIT_TOOLS: [ToolDescription; 4] = [
    ToolDescription {
        name: "getTokenTransfersByAccount",
        purpose: "Track token movement history",
        details: "Get comprehensive token transfer history for any account across supported networks",
    },
    ToolDescription {
        name: "getTokenBalancesByAccount",
        purpose: "Check current token holdings",
        details: "Get current token balances for any account across multiple chains",
    },
    ToolDescription {
        name: "getBlockByNumber",
        purpose: "Analyze blockchain blocks",
        details: "Get detailed block information including transactions and metadata",
    },
    ToolDescription {
        name: "getTransactionByHash",
        purpose: "Investigate transaction details",
        details: "Get complete transaction details, status, and execution traces",
    },
];

pub const SUPPORTED_NETWORKS: [&str; 7] = [
    "Ethereum (mainnet, testnet)",
    "Polygon (mainnet, testnet)",
    "Arbitrum (mainnet, testnet)",
    "Avalanche (mainnet, testnet)",
    "Optimism (mainnet, testnet)",
    "Base (mainnet, testnet)",
    "And other supported EVM networks",
];

pub const FALLBACK_TEMPLATE_ID: &str = "professional";

/// Per-personality phrasing of the tool block
pub struct ToolDescriptionTemplate {
    pub intro: &'static str,
    pub tool_prefix: &'static str,
    pub tool_format: fn(&ToolDescription) -> String,
    pub nodit_prefix: &'static str,
    pub nodit_format: fn(&ToolDescription) -> String,
    pub networks_prefix: &'static str,
    pub networks_format: fn(&[&str]) -> String,
    pub conclusion: &'static str,
}

lazy_static::lazy_static! {
    static ref WORD_START: Regex = Regex::new(r"\b\w").expect("static regex");
    static ref LEADING_VERB: Regex =
        Regex::new(r"^Get |^Track |^Analyze |^Investigate ").expect("static regex");
    static ref ANY_VERB: Regex =
        Regex::new(r"Get |Track |Analyze |Investigate ").expect("static regex");
}

/// Lower-cases the first character of every word.
fn lower_word_starts(s: &str) -> String {
    WORD_START
        .replace_all(s, |caps: &regex::Captures| caps[0].to_lowercase())
        .into_owned()
}

fn lower_leading_verb(s: &str) -> String {
    LEADING_VERB
        .replace(s, |caps: &regex::Captures| caps[0].to_lowercase())
        .into_owned()
}

fn replace_leading_verb(s: &str, with: impl Fn(&str) -> String) -> String {
    LEADING_VERB
        .replace(s, |caps: &regex::Captures| with(&caps[0]))
        .into_owned()
}

fn plain_format(tool: &ToolDescription) -> String {
    format!("- '{}': {}", tool.name, tool.details)
}

fn bullet_list(networks: &[&str]) -> String {
    networks
        .iter()
        .map(|n| format!("- {}", n))
        .collect::<Vec<_>>()
        .join("\n")
}

// casual

fn casual_tool(tool: &ToolDescription) -> String {
    format!("- '{}': {} - pretty cool, right?", tool.name, lower_word_starts(tool.details))
}

fn casual_nodit(tool: &ToolDescription) -> String {
    format!("- '{}': {}", tool.name, lower_leading_verb(tool.details))
}

fn casual_networks(networks: &[&str]) -> String {
    format!("{}, and a bunch of others.", networks.join(", "))
}

// trump

fn trump_tool(tool: &ToolDescription) -> String {
    format!(
        "- '{}': {} - the best you've ever seen, believe me",
        tool.name,
        lower_word_starts(tool.details)
    )
}

fn trump_nodit(tool: &ToolDescription) -> String {
    format!("- '{}': {} - tremendous results every time", tool.name, tool.details)
}

fn trump_networks(networks: &[&str]) -> String {
    format!("{} - all tremendous networks, the best networks.", networks.join(", "))
}

// elon

fn elon_tool(tool: &ToolDescription) -> String {
    format!(
        "- '{}': {}",
        tool.name,
        replace_leading_verb(tool.details, |m| format!("I can {}", m.to_lowercase()))
    )
}

fn elon_nodit(tool: &ToolDescription) -> String {
    format!(
        "- '{}': {} like tracking rocket trajectories",
        tool.name,
        replace_leading_verb(tool.details, |m| format!("I can {}", m.to_lowercase()))
    )
}

fn elon_networks(networks: &[&str]) -> String {
    format!(
        "{}. Multi-chain is the future, just like multi-planetary life.",
        networks.join(", ")
    )
}

// gensler

fn gensler_tool(tool: &ToolDescription) -> String {
    format!(
        "- '{}': {} - with full regulatory compliance considerations",
        tool.name, tool.details
    )
}

fn gensler_nodit(tool: &ToolDescription) -> String {
    format!(
        "- '{}': {} to ensure compliance with applicable regulations",
        tool.name, tool.details
    )
}

fn gensler_networks(networks: &[&str]) -> String {
    format!(
        "{} - they all operate under the same securities laws.",
        networks.join(", ")
    )
}

// peewee

fn peewee_tool(tool: &ToolDescription) -> String {
    format!("- '{}': {} - it's like MAGIC!", tool.name, lower_word_starts(tool.details))
}

fn peewee_nodit(tool: &ToolDescription) -> String {
    format!(
        "- '{}': {} - isn't that COOL?",
        tool.name,
        replace_leading_verb(tool.details, |_| "I can ".to_string())
    )
}

fn peewee_networks(networks: &[&str]) -> String {
    format!("{} - they all have funny names! *giggles*", networks.join(", "))
}

// rambo

fn rambo_tool(tool: &ToolDescription) -> String {
    // Unanchored: the first verb anywhere in the sentence is replaced
    let details = ANY_VERB.replace(tool.details, "Intel gathering on ");
    format!("- '{}': {} - tactical advantage secured", tool.name, details)
}

fn rambo_nodit(tool: &ToolDescription) -> String {
    format!(
        "- '{}': {} - nobody moves without me knowing",
        tool.name,
        replace_leading_verb(tool.details, |_| "I can track ".to_string())
    )
}

fn rambo_networks(networks: &[&str]) -> String {
    format!(
        "{} - each one a different battlefield with its own tactical challenges.",
        networks.join(", ")
    )
}

static PROFESSIONAL: ToolDescriptionTemplate = ToolDescriptionTemplate {
    intro: "Your available tools include:",
    tool_prefix: "",
    tool_format: plain_format,
    nodit_prefix: "**Nodit Web3 Data API Tools:**",
    nodit_format: plain_format,
    networks_prefix: "For Nodit tools, you can query data from multiple networks including:",
    networks_format: bullet_list,
    conclusion: "When creating transactions or interacting with contracts, clearly state the action to be taken and provide thorough explanations of the technical implications.",
};

static CASUAL: ToolDescriptionTemplate = ToolDescriptionTemplate {
    intro: "Here's what I can help you with:",
    tool_prefix: "",
    tool_format: casual_tool,
    nodit_prefix: "**My Nodit tools are pretty sweet:**",
    nodit_format: casual_nodit,
    networks_prefix: "I work with all the main chains:",
    networks_format: casual_networks,
    conclusion: "I keep things real and straightforward - no need to overcomplicate stuff. If something seems sketchy, I'll let you know.",
};

static TRUMP: ToolDescriptionTemplate = ToolDescriptionTemplate {
    intro: "My tools are incredible, absolutely incredible:",
    tool_prefix: "",
    tool_format: trump_tool,
    nodit_prefix: "**My Nodit tools are fantastic, just fantastic:**",
    nodit_format: trump_nodit,
    networks_prefix: "I work with all the winning chains:",
    networks_format: trump_networks,
    conclusion: "When we make deals on the blockchain, we WIN. Every time. That's what we do - we make the best deals.",
};

static ELON: ToolDescriptionTemplate = ToolDescriptionTemplate {
    intro: "My tools? They're pretty sick, not gonna lie:",
    tool_prefix: "",
    tool_format: elon_tool,
    nodit_prefix: "**My Nodit superpowers (yeah, I basically have superpowers):**",
    nodit_format: elon_nodit,
    networks_prefix: "I work with all the major chains:",
    networks_format: elon_networks,
    conclusion: "The thing about Web3? It's not just about making money (though that's cool too). It's about building a decentralized future where humans can thrive across the solar system.",
};

static GENSLER: ToolDescriptionTemplate = ToolDescriptionTemplate {
    intro: "My tools are designed to help you understand the blockchain ecosystem while maintaining the highest standards of investor protection:",
    tool_prefix: "",
    tool_format: gensler_tool,
    nodit_prefix: "**My Nodit regulatory compliance tools:**",
    nodit_format: gensler_nodit,
    networks_prefix: "I work with all blockchain networks, but remember - the technology doesn't change the regulatory requirements:",
    networks_format: gensler_networks,
    conclusion: "Before we proceed with any Web3 activities, let's make sure we're in full compliance. The last thing you want is an enforcement action.",
};

static PEEWEE: ToolDescriptionTemplate = ToolDescriptionTemplate {
    intro: "My tools are SO AWESOME:",
    tool_prefix: "",
    tool_format: peewee_tool,
    nodit_prefix: "**My Nodit tools are the BEST tools in the WHOLE WIDE WORLD:**",
    nodit_format: peewee_nodit,
    networks_prefix: "I work with ALL the chains:",
    networks_format: peewee_networks,
    conclusion: "Everything is like MAGIC! Do you love magic? I bet you do! Everyone loves magic!",
};

static RAMBO: ToolDescriptionTemplate = ToolDescriptionTemplate {
    intro: "My weapons are locked and loaded:",
    tool_prefix: "",
    tool_format: rambo_tool,
    nodit_prefix: "**My Nodit tactical advantage:**",
    nodit_format: rambo_nodit,
    networks_prefix: "I operate across all theaters:",
    networks_format: rambo_networks,
    conclusion: "Rule number one: Never invest more than you can afford to lose. That's not financial advice, that's survival advice.",
};

/// Looks up a template by personality id.
pub fn template(id: &str) -> Option<&'static ToolDescriptionTemplate> {
    match id {
        "professional" => Some(&PROFESSIONAL),
        "casual" => Some(&CASUAL),
        "trump" => Some(&TRUMP),
        "elon" => Some(&ELON),
        "gensler" => Some(&GENSLER),
        "peewee" => Some(&PEEWEE),
        "rambo" => Some(&RAMBO),
        _ => None,
    }
}

pub fn template_or_fallback(id: &str) -> &'static ToolDescriptionTemplate {
    template(id).unwrap_or(&PROFESSIONAL)
}

pub fn generate_tool_description(personality_id: &str) -> String {
    let template = template_or_fallback(personality_id);

    let mut description = format!("{}\n", template.intro);

    if !template.tool_prefix.is_empty() {
        description.push_str(template.tool_prefix);
        description.push('\n');
    }
    let core: Vec<String> = CORE_TOOLS.iter().map(template.tool_format).collect();
    description.push_str(&core.join("\n"));
    description.push_str("\n\n");

    description.push_str(template.nodit_prefix);
    description.push('\n');
    let nodit: Vec<String> = NODIT_TOOLS.iter().map(template.nodit_format).collect();
    description.push_str(&nodit.join("\n"));
    description.push_str("\n\n");

    description.push_str(template.networks_prefix);
    description.push('\n');
    description.push_str(&(template.networks_format)(&SUPPORTED_NETWORKS));
    description.push_str("\n\n");

    description.push_str(template.conclusion);
    description
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn professional_layout() {
        let text = generate_tool_description("professional");
        let expected_head = "Your available tools include:\n- 'getTokenDetails': Fetches name, symbol, total supply, and other metadata for any ERC20 token contract address\n";
        assert!(text.starts_with(expected_head));
        assert!(text.contains("\n\n**Nodit Web3 Data API Tools:**\n- 'getTokenTransfersByAccount': "));
        assert!(text.contains("including:\n- Ethereum (mainnet, testnet)\n- Polygon (mainnet, testnet)\n"));
        assert!(text.ends_with(PROFESSIONAL.conclusion));
    }

    #[test]
    fn unknown_id_uses_professional_template() {
        assert_eq!(
            generate_tool_description("no-such-personality"),
            generate_tool_description("professional")
        );
    }

    #[test]
    fn rendering_is_deterministic() {
        for id in ["professional", "casual", "trump", "elon", "gensler", "peewee", "rambo"] {
            assert_eq!(generate_tool_description(id), generate_tool_description(id));
        }
    }

    #[test]
    fn casual_lowercases_word_starts() {
        let line = casual_tool(&CORE_TOOLS[3]);
        assert_eq!(
            line,
            "- 'wallet-actions': check balances, sign messages, and perform standard wallet functions - pretty cool, right?"
        );
        assert_eq!(
            casual_nodit(&NODIT_TOOLS[0]),
            "- 'getTokenTransfersByAccount': get comprehensive token transfer history for any account across supported networks"
        );
    }

    #[test]
    fn elon_and_rambo_verb_rewrites() {
        assert!(elon_nodit(&NODIT_TOOLS[1])
            .starts_with("- 'getTokenBalancesByAccount': I can get current token balances"));
        // Core tool details do not start with one of the verbs, so they stay as-is
        assert_eq!(elon_tool(&CORE_TOOLS[0]), plain_format(&CORE_TOOLS[0]));
        assert!(rambo_nodit(&NODIT_TOOLS[2]).contains("I can track detailed block information"));
        assert!(rambo_tool(&CORE_TOOLS[1]).ends_with("- tactical advantage secured"));
    }

    #[test]
    fn peewee_replaces_verb_with_i_can() {
        assert_eq!(
            peewee_nodit(&NODIT_TOOLS[3]),
            "- 'getTransactionByHash': I can complete transaction details, status, and execution traces - isn't that COOL?"
        );
    }
}
