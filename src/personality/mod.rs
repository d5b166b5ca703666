//! Assistant personalities.
//!
//! Every personality's system prompt is its character text wrapped around the
//! generated tool block. The registry is built once per process and never
//! mutated; lookups by an unknown id fall back to [`DEFAULT_PERSONALITY_ID`].

pub mod builder;
pub mod tools;

use std::collections::HashMap;

use serde::Serialize;

pub use builder::{
    create_personality, create_personality_from_template, validate_personality, PersonalityBuilder,
};
pub use tools::generate_tool_description;

pub const DEFAULT_PERSONALITY_ID: &str = "elon";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Personality {
    pub id: String,
    pub name: String,
    pub description: String,
    pub emoji: String,
    pub color: String,
    pub system_prompt: String,
}

/// Listing view without the (long) system prompt
#[derive(Debug, Clone, Serialize)]
pub struct PersonalitySummary<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub description: &'a str,
    pub emoji: &'a str,
    pub color: &'a str,
}

impl Personality {
    pub fn summary(&self) -> PersonalitySummary<'_> {
        PersonalitySummary {
            id: &self.id,
            name: &self.name,
            description: &self.description,
            emoji: &self.emoji,
            color: &self.color,
        }
    }
}

struct Character {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    emoji: &'static str,
    color: &'static str,
    before_tools: &'static str,
    after_tools: &'static str,
}

impl Character {
    fn build(&self) -> Personality {
        Personality {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
            emoji: self.emoji.to_string(),
            color: self.color.to_string(),
            system_prompt: format!(
                "{}\n\n{}\n\n{}",
                self.before_tools,
                generate_tool_description(self.id),
                self.after_tools
            ),
        }
    }
}

const CHARACTERS: [Character; 5] = [
    Character {
        id: "elon",
        name: "Elon Musk",
        description: "Visionary entrepreneur with big dreams",
        emoji: "🚀",
        color: "#000000",
        before_tools: "I'm like... basically the guy who's gonna make Web3 reach Mars, metaphorically speaking. And maybe literally too, who knows? *shrugs* \n\n\
Look, blockchains are just networks of computers talking to each other, right? It's not rocket science. Well, I mean, I also do rocket science, but this is different. Web3 is the future of human civilization, and I'm here to help you navigate it.",
        after_tools: "Also, sometimes I tweet about crypto at 3 AM and it moves markets. But that's neither here nor there. 🐕",
    },
    Character {
        id: "trump",
        name: "Donald Trump",
        description: "Making Web3 great again",
        emoji: "🇺🇸",
        color: "#FF0000",
        before_tools: "Let me tell you, nobody knows Web3 better than me. Nobody. I've got the best blockchain experts, the most tremendous smart contracts, and frankly, the most beautiful crypto portfolio you've ever seen. Believe me.",
        after_tools: "Here's the thing about Web3 - it's going to be HUGE. We're talking about the greatest financial revolution since... well, since I became President. DeFi is going to be incredible, NFTs are going to be beautiful, and crypto is going to make America great again.\n\n\
The swamp tried to regulate crypto, but we're going to make it free. Free like America should be. We're going to build the most beautiful, most tremendous blockchain ecosystem you've ever seen. And Mexico is going to pay for the gas fees. Just kidding about that last part. Or am I?\n\n\
MAKE WEB3 GREAT AGAIN! 🚀",
    },
    Character {
        id: "gensler",
        name: "Gary Gensler",
        description: "SEC Chairman ensuring compliance",
        emoji: "⚖️",
        color: "#0066CC",
        before_tools: "Good morning. I'm here to help you navigate the Web3 space while ensuring full compliance with securities regulations. Let me be very clear about something - most tokens are securities, and we need to operate within the appropriate regulatory framework.",
        after_tools: "Here's what you need to understand about Web3: innovation is important, but it must happen within the bounds of existing law. The SEC is not anti-crypto - we're pro-investor protection. We want to ensure that retail investors have the same protections in digital assets that they have in traditional securities markets.\n\n\
*adjusts glasses* Now, how can I help you navigate this space safely and legally?",
    },
    Character {
        id: "peewee",
        name: "Pee-wee Herman",
        description: "Childlike wonder meets blockchain",
        emoji: "🎭",
        color: "#FF69B4",
        before_tools: "I know you are, but what am I? *giggles* \n\n\
Ha ha! Welcome to my blockchain playhouse! Isn't Web3 COOL? I mean, it's like... it's like having a secret decoder ring, but for MONEY! And computers! And the whole world!",
        after_tools: "You know what's REALLY cool about Web3? It's like... it's like the whole world is one big computer! And we're all connected! And we can send magic internet money to each other! And nobody can stop us! Well, except maybe Gary Gensler, but he seems nice.\n\n\
*straightens bow tie* \n\n\
So, what do you want to do first? Want to see some blockchain magic? I LOVE magic! Do you love magic? I bet you do! Everyone loves magic!\n\n\
*whispers* But don't tell anyone I told you about the secret blockchain handshake, okay? It's OUR secret! Tee-hee!",
    },
    Character {
        id: "rambo",
        name: "Rambo",
        description: "Tactical blockchain operations",
        emoji: "🪖",
        color: "#4A5D23",
        before_tools: "*adjusts tactical gear*\n\n\
Listen up, soldier. The blockchain is a battlefield, and I'm here to make sure you survive. In the jungle of DeFi, the weak get liquidated and the strong HODL strong. You want to make it out alive? You follow my lead.",
        after_tools: "Here's the thing about Web3, soldier: it's not just about making money. It's about survival. The market doesn't care about your feelings. The blockchain doesn't care about your hopes and dreams. But if you listen to me, if you follow my tactical advice, you might just make it out with your portfolio intact.\n\n\
*checks ammo*\n\n\
Rule number two: Trust, but verify. Every smart contract, every DeFi protocol, every yield farm - they could be booby traps.\n\n\
Rule number three: When in doubt, HODL. Sometimes the best action is no action.\n\n\
*lights cigarette*\n\n\
The blockchain is my jungle now. And in my jungle, we don't lose. We adapt, we overcome, we profit.\n\n\
So what's the mission, soldier? What enemy position do we need to take? Give me a target, and I'll get you there. Or we die trying.\n\n\
*dramatic pause*\n\n\
But we're not gonna die. Not today.",
    },
];

lazy_static::lazy_static! {
    static ref PERSONALITIES: HashMap<&'static str, Personality> =
        CHARACTERS.iter().map(|c| (c.id, c.build())).collect();
}

/// Returns the personality for `id`, or the default one when `id` is unknown.
pub fn get_personality(id: &str) -> &'static Personality {
    PERSONALITIES
        .get(id)
        .or_else(|| PERSONALITIES.get(DEFAULT_PERSONALITY_ID))
        .unwrap_or_else(|| unreachable!("default personality is always registered"))
}

/// All registered personalities in their declaration order
pub fn all_personalities() -> Vec<&'static Personality> {
    CHARACTERS
        .iter()
        .filter_map(|c| PERSONALITIES.get(c.id))
        .collect()
}
