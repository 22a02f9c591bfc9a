//! Fns to read variables from the environment more conveniently, and the configuration the
//! service needs at startup.

use std::{env, time::Duration};

use thiserror::Error;
use tracing::debug;

use crate::{
    bscscan::BSCSCAN_API,
    registry::{self, Chain},
    supply::DEFAULT_CACHE_TTL,
    units::WholeTokens,
};

const SECRET_LOG_BLACKLIST: [&str; 1] = ["BSCSCAN_API_KEY"];

fn obfuscate_if_secret(blacklist: &[&str], key: &str, value: &str) -> String {
    if blacklist.contains(&key) {
        let mut last_four = value.to_string();
        last_four.drain(0..value.len().saturating_sub(4));
        format!("****{last_four}")
    } else {
        value.to_string()
    }
}

/// Get an environment variable, encoding found or missing as Option, and panic otherwise.
pub fn get_env_var(key: &str) -> Option<String> {
    let var = match env::var(key) {
        Err(env::VarError::NotPresent) => None,
        Err(e) => panic!("{e}"),
        Ok(var) => Some(var),
    };

    if let Some(ref existing_var) = var {
        let output = obfuscate_if_secret(&SECRET_LOG_BLACKLIST, key, existing_var);
        debug!("env var {key}: {output}");
    } else {
        debug!("env var {key} requested but not found")
    };

    var
}

pub fn get_env_bool(key: &str) -> Option<bool> {
    get_env_var(key).map(|var| match var.to_lowercase().as_str() {
        "true" => true,
        "false" => false,
        "t" => true,
        "f" => false,
        "1" => true,
        "0" => false,
        str => panic!("invalid bool value {str} for {key}"),
    })
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub bscscan_api_key: String,
    pub bscscan_api_url: String,
    pub cache_ttl: Duration,
    pub max_supply: WholeTokens,
    pub port: u16,
    pub token_contract: String,
    pub token_symbol: String,
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<String, ConfigError> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn parse_optional<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|err| ConfigError::Invalid {
                key,
                reason: err.to_string(),
            }),
    }
}

impl EnvConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(get_env_var)
    }

    /// Validates everything up front, a malformed value never makes it past startup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bscscan_api_key = required(&lookup, "BSCSCAN_API_KEY")?;

        let token_contract = required(&lookup, "TOKEN_CONTRACT_ADDRESS")?;
        registry::validate_address(Chain::Bsc, &token_contract).map_err(|err| {
            ConfigError::Invalid {
                key: "TOKEN_CONTRACT_ADDRESS",
                reason: err.to_string(),
            }
        })?;

        let max_supply = required(&lookup, "TOKEN_MAX_SUPPLY")?
            .parse::<WholeTokens>()
            .map_err(|err| ConfigError::Invalid {
                key: "TOKEN_MAX_SUPPLY",
                reason: err.to_string(),
            })?;
        if max_supply == 0 {
            return Err(ConfigError::Invalid {
                key: "TOKEN_MAX_SUPPLY",
                reason: "must be greater than zero".to_string(),
            });
        }

        let cache_ttl_seconds =
            parse_optional(&lookup, "CACHE_TTL_SECONDS", DEFAULT_CACHE_TTL.as_secs())?;

        Ok(Self {
            bscscan_api_key,
            bscscan_api_url: lookup("BSCSCAN_API_URL").unwrap_or_else(|| BSCSCAN_API.to_string()),
            cache_ttl: Duration::from_secs(cache_ttl_seconds),
            max_supply,
            port: parse_optional(&lookup, "PORT", 3000)?,
            token_contract,
            token_symbol: lookup("TOKEN_SYMBOL").unwrap_or_else(|| "SDM".to_string()),
        })
    }
}
