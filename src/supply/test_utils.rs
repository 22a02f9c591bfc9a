use crate::{
    registry::{AddressRegistry, Chain, ExcludedAddress},
    units::{TokenAmount, WholeTokens},
};

use super::RawBalance;

pub const TOKEN_CONTRACT: &str = "0x9f3bcbe48e8b754f331dfc694a894e8e686ac31d";

/// A well-formed, distinct address for every index.
pub fn holder_address(index: usize) -> String {
    format!("0x{:040x}", index + 1)
}

pub fn excluded_address(index: usize) -> ExcludedAddress {
    ExcludedAddress::new(
        &holder_address(index),
        Chain::Bsc,
        "TeamFinance Vesting",
        &format!("Round {index}"),
    )
}

pub fn registry_of(count: usize) -> AddressRegistry {
    AddressRegistry::new((0..count).map(excluded_address).collect()).unwrap()
}

pub fn raw_balance(index: usize, whole_tokens: WholeTokens) -> RawBalance {
    RawBalance {
        holder: excluded_address(index),
        balance: TokenAmount::from_whole_tokens(whole_tokens),
    }
}
