//! Client configuration from environment variables.

use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::constants::DEFAULT_RPC_URL;
use crate::error::{GatherFiError, Result};
use crate::retry::RetryPolicy;
use crate::token::TokenMints;

pub const RPC_URL_ENV_VAR: &str = "GATHERFI_RPC_URL";
pub const PROGRAM_ID_ENV_VAR: &str = "GATHERFI_PROGRAM_ID";
pub const USDC_MINT_ENV_VAR: &str = "GATHERFI_USDC_MINT";
pub const USDT_MINT_ENV_VAR: &str = "GATHERFI_USDT_MINT";
pub const CACHE_TTL_ENV_VAR: &str = "GATHERFI_CACHE_TTL_MS";
pub const CACHE_CAPACITY_ENV_VAR: &str = "GATHERFI_CACHE_CAPACITY";
pub const RETRY_ATTEMPTS_ENV_VAR: &str = "GATHERFI_RETRY_ATTEMPTS";
pub const RETRY_BASE_ENV_VAR: &str = "GATHERFI_RETRY_BASE_MS";

/// Everything needed to talk to one deployment of the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub rpc_url: String,
    pub program_id: Pubkey,
    pub mints: TokenMints,
    pub cache: CacheConfig,
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            program_id: crate::ID,
            mints: TokenMints::default(),
            cache: CacheConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Create configuration from environment variables, falling back to
    /// devnet defaults for anything unset
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let rpc_url = var(RPC_URL_ENV_VAR).unwrap_or(defaults.rpc_url);
        let program_id =
            parse_or(var(PROGRAM_ID_ENV_VAR), PROGRAM_ID_ENV_VAR, defaults.program_id)?;
        let usdc = parse_or(var(USDC_MINT_ENV_VAR), USDC_MINT_ENV_VAR, defaults.mints.usdc)?;
        let usdt = parse_or(var(USDT_MINT_ENV_VAR), USDT_MINT_ENV_VAR, defaults.mints.usdt)?;

        let ttl_ms = parse_or(
            var(CACHE_TTL_ENV_VAR),
            CACHE_TTL_ENV_VAR,
            defaults.cache.ttl.as_millis() as u64,
        )?;
        let capacity = parse_or(
            var(CACHE_CAPACITY_ENV_VAR),
            CACHE_CAPACITY_ENV_VAR,
            defaults.cache.capacity,
        )?;
        if capacity == 0 {
            return Err(GatherFiError::Config(format!(
                "{} must be at least 1",
                CACHE_CAPACITY_ENV_VAR
            )));
        }

        let attempts = parse_or(
            var(RETRY_ATTEMPTS_ENV_VAR),
            RETRY_ATTEMPTS_ENV_VAR,
            defaults.retry.max_retries,
        )?;
        let base_ms = parse_or(
            var(RETRY_BASE_ENV_VAR),
            RETRY_BASE_ENV_VAR,
            defaults.retry.base_delay.as_millis() as u64,
        )?;

        Ok(Self {
            rpc_url,
            program_id,
            mints: TokenMints::new(usdc, usdt),
            cache: CacheConfig {
                ttl: Duration::from_millis(ttl_ms),
                capacity,
            },
            retry: RetryPolicy::new(attempts, Duration::from_millis(base_ms)),
        })
    }

    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }

    pub fn with_program_id(mut self, program_id: Pubkey) -> Self {
        self.program_id = program_id;
        self
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| GatherFiError::Config(format!("invalid {} '{}': {}", key, value, e))),
    }
}
