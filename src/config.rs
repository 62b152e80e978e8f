use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Credentials and endpoint for the completion provider. Read once at
/// construction; nothing else in the process consults the environment.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl ProviderConfig {
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("OPENAI_API_KEY")
            .context("OPENAI_API_KEY not set; the completion provider needs an API key")?;
        let base_url = env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let model = env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub provider: ProviderConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let addr = env::var("SUPPORTLINE_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.into());
        let bind_addr = addr
            .parse()
            .with_context(|| format!("invalid SUPPORTLINE_ADDR: {addr}"))?;

        Ok(Self {
            bind_addr,
            provider: ProviderConfig::from_env()?,
        })
    }
}
