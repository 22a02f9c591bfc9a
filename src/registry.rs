//! The fixed list of addresses whose holdings do not count towards circulating supply.

use std::fmt::Display;

use serde::Serialize;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Chain {
    #[serde(rename = "BSC")]
    Bsc,
}

impl Chain {
    /// EVM addresses are `0x` followed by 20 bytes of hex.
    fn is_well_formed(&self, address: &str) -> bool {
        match self {
            Chain::Bsc => {
                address.len() == 42
                    && address.starts_with("0x")
                    && address[2..].chars().all(|c| c.is_ascii_hexdigit())
            }
        }
    }
}

impl Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Chain::Bsc => write!(f, "BSC"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExcludedAddress {
    pub address: String,
    pub chain: Chain,
    /// What kind of holder this is, e.g. a vesting contract.
    pub category: String,
    /// Which allocation round or purpose the holder serves.
    pub wallet_label: String,
}

impl ExcludedAddress {
    pub fn new(address: &str, chain: Chain, category: &str, wallet_label: &str) -> Self {
        Self {
            address: address.to_string(),
            chain,
            category: category.to_string(),
            wallet_label: wallet_label.to_string(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("malformed excluded addresses: {}", .0.join(", "))]
    MalformedAddresses(Vec<String>),
}

/// Checks a single address against the rules of the given chain.
pub fn validate_address(chain: Chain, address: &str) -> Result<(), RegistryError> {
    if chain.is_well_formed(address) {
        Ok(())
    } else {
        Err(RegistryError::MalformedAddresses(vec![address.to_string()]))
    }
}

#[derive(Clone, Debug)]
pub struct AddressRegistry(Vec<ExcludedAddress>);

impl AddressRegistry {
    /// Rejects the whole list if any entry is malformed, naming every bad address.
    pub fn new(addresses: Vec<ExcludedAddress>) -> Result<Self, RegistryError> {
        let malformed: Vec<String> = addresses
            .iter()
            .filter(|excluded| !excluded.chain.is_well_formed(&excluded.address))
            .map(|excluded| excluded.address.clone())
            .collect();

        if malformed.is_empty() {
            Ok(Self(addresses))
        } else {
            Err(RegistryError::MalformedAddresses(malformed))
        }
    }

    /// The vesting contracts holding not yet released allocations of the tracked token.
    pub fn built_in() -> Result<Self, RegistryError> {
        use Chain::Bsc;

        const TEAM_FINANCE: &str = "TeamFinance Vesting";
        const PAD: &str = "ChainGPT Pad Vesting";

        Self::new(vec![
            ExcludedAddress::new(
                "0x2234a8b8801a455F5E3fC53B597062bB9b1E9d15",
                Bsc,
                TEAM_FINANCE,
                "Seed Round (ref: tokenomics)",
            ),
            ExcludedAddress::new(
                "0x574997D4e07476954c7BBDAa6f785eeB3A5A9c42",
                Bsc,
                PAD,
                "Private Round (ref: tokenomics)",
            ),
            ExcludedAddress::new(
                "0x59779C59F473cF53fcE9ef60439f9Bf83E4A3b26",
                Bsc,
                TEAM_FINANCE,
                "Strategic Round (ref: tokenomics)",
            ),
            ExcludedAddress::new(
                "0xD196dc2aa8C4c1d392830488aC9833451b84cB7b",
                Bsc,
                PAD,
                "Public (IDO) Round (ref: tokenomics)",
            ),
            ExcludedAddress::new(
                "0xdCfd1F3Aeea3369bC55B8a3beEE94d9FD5D96Ed2",
                Bsc,
                TEAM_FINANCE,
                "Liquidity Round (ref: tokenomics)",
            ),
            ExcludedAddress::new(
                "0x193364EC780eFD52D89D202Fcecd3Dd2D347925e",
                Bsc,
                TEAM_FINANCE,
                "Marketing Round (ref: tokenomics)",
            ),
            ExcludedAddress::new(
                "0xe8B9988Bede0AA3e9b8659fB5D1b5474195A0c33",
                Bsc,
                TEAM_FINANCE,
                "Ecosystem Round (ref: tokenomics)",
            ),
            ExcludedAddress::new(
                "0x2411b49688f7ec4b113d2a072164e3690006ea4c",
                Bsc,
                TEAM_FINANCE,
                "DAO Round (ref: tokenomics)",
            ),
            ExcludedAddress::new(
                "0x561CCAF59F6394c49F716F7B4de72eACD35E19E4",
                Bsc,
                TEAM_FINANCE,
                "Team Round (ref: tokenomics)",
            ),
            ExcludedAddress::new(
                "0xa8a50aDbdddf1162920D79ed34629d3B3D77Db2C",
                Bsc,
                TEAM_FINANCE,
                "Team Round (ref: tokenomics)",
            ),
            ExcludedAddress::new(
                "0x45306Bc13B202DDc5870143977d2c9657fb3e1AE",
                Bsc,
                TEAM_FINANCE,
                "Team Round (ref: tokenomics)",
            ),
            ExcludedAddress::new(
                "0xdC3d9cCA151d241b322EB5388Aa3C6948C3259C6",
                Bsc,
                TEAM_FINANCE,
                "Seed Round (ref: tokenomics)",
            ),
            ExcludedAddress::new(
                "0x15317799f8E78B81dccb55B3cD0F4EA190276E96",
                Bsc,
                PAD,
                "KOLs Round (ref: tokenomics)",
            ),
        ])
    }

    pub fn list(&self) -> &[ExcludedAddress] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
