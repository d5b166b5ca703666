// src/config.rs

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use secrecy::SecretString;
use url::Url;

use crate::blockchain::chains::BASE_SEPOLIA_CHAIN_ID;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4-turbo-preview";
pub const DEFAULT_NODIT_BASE_URL: &str = "https://web3.nodit.io/v1";

// A struct to hold all configuration, loaded once at startup from the .env file.
#[derive(Clone, Debug)]
pub struct Config {
    // Server settings
    pub port: u16,

    // LLM provider
    pub openai_api_key: SecretString,
    pub openai_base_url: String,
    pub openai_model: String,

    /// Key of the agent wallet that signs contract writes and transfers.
    /// A fresh signer is built from it for every chat request.
    pub agent_private_key: SecretString,

    /// HS256 key used to verify session tokens issued by the sign-in flow
    pub session_secret: SecretString,

    // Nodit Web3 Data API
    pub nodit_api_key: Option<SecretString>,
    pub nodit_base_url: String,

    // Blockchain settings
    pub default_chain_id: u64,
    /// Per-chain RPC overrides, keyed by numeric chain id
    pub chain_rpc_urls: HashMap<u64, String>,
    pub contracts_path: Option<String>,

    // Chat loop limits
    pub max_steps: usize,
    pub max_duration: Duration,
}

impl Config {
    /// RPC URL for a chain, preferring an explicit override over the registry default
    pub fn rpc_url_for(&self, chain_id: u64) -> Option<String> {
        self.chain_rpc_urls.get(&chain_id).cloned().or_else(|| {
            crate::blockchain::chains::get_chain(chain_id).map(|c| c.rpc_url.to_string())
        })
    }

    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load variables from the .env file into the environment
        dotenvy::dotenv().ok();

        let openai_api_key = env::var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?;
        let agent_private_key =
            env::var("AGENT_PRIVATE_KEY").context("AGENT_PRIVATE_KEY must be set")?;
        let session_secret = non_empty(
            "SESSION_SECRET",
            env::var("SESSION_SECRET").context("SESSION_SECRET must be set")?,
        )?;

        let openai_base_url = env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string());
        Url::parse(&openai_base_url).context("OPENAI_BASE_URL must be a valid URL")?;

        let nodit_base_url =
            env::var("NODIT_BASE_URL").unwrap_or_else(|_| DEFAULT_NODIT_BASE_URL.to_string());
        Url::parse(&nodit_base_url).context("NODIT_BASE_URL must be a valid URL")?;

        // Optional JSON map of chain_id -> RPC URL overriding the registry
        let chain_rpc_urls = match env::var("CHAIN_RPC_URLS") {
            Ok(raw) => parse_rpc_overrides(&raw)?,
            Err(_) => HashMap::new(),
        };

        Ok(Config {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,

            openai_api_key: SecretString::new(openai_api_key),
            openai_base_url,
            openai_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.to_string()),

            agent_private_key: SecretString::new(agent_private_key),
            session_secret: SecretString::new(session_secret),

            nodit_api_key: env::var("NODIT_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty())
                .map(SecretString::new),
            nodit_base_url,

            default_chain_id: env::var("DEFAULT_CHAIN_ID")
                .unwrap_or_else(|_| BASE_SEPOLIA_CHAIN_ID.to_string())
                .parse()
                .context("DEFAULT_CHAIN_ID must be a valid number")?,
            chain_rpc_urls,
            contracts_path: env::var("CONTRACTS_PATH").ok(),

            max_steps: env::var("CHAT_MAX_STEPS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("CHAT_MAX_STEPS must be a valid number")?,
            max_duration: Duration::from_secs(
                env::var("CHAT_MAX_DURATION_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .context("CHAT_MAX_DURATION_SECS must be a valid number")?,
            ),
        })
    }
}

/// Secrets that sign or verify anything must not be blank.
fn non_empty(name: &str, value: String) -> Result<String> {
    if value.trim().is_empty() {
        bail!("{} must not be empty", name);
    }
    Ok(value)
}

fn parse_rpc_overrides(raw: &str) -> Result<HashMap<u64, String>> {
    let map: HashMap<String, String> =
        serde_json::from_str(raw).context("Invalid CHAIN_RPC_URLS JSON format")?;
    let mut out = HashMap::with_capacity(map.len());
    for (chain_id, url) in map {
        let id = chain_id
            .parse::<u64>()
            .with_context(|| format!("CHAIN_RPC_URLS key '{}' is not a chain id", chain_id))?;
        Url::parse(&url).with_context(|| format!("CHAIN_RPC_URLS entry for {} is not a URL", id))?;
        out.insert(id, url);
    }
    Ok(out)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            openai_api_key: SecretString::new(String::new()),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            agent_private_key: SecretString::new(String::new()),
            session_secret: SecretString::new(String::new()),
            nodit_api_key: None,
            nodit_base_url: DEFAULT_NODIT_BASE_URL.to_string(),
            default_chain_id: BASE_SEPOLIA_CHAIN_ID,
            chain_rpc_urls: HashMap::new(),
            contracts_path: None,
            max_steps: 5,
            max_duration: Duration::from_secs(30),
        }
    }
}
