//! Circulating supply of the tracked token, derived from the balances of excluded addresses and
//! the supply the ledger index reports for the token contract.
mod balances;
mod service;
#[cfg(test)]
pub mod test_utils;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::{
    registry::ExcludedAddress,
    units::{TokenAmount, WholeTokens},
};

pub use balances::BalanceFetcher;
pub use service::{SupplyError, SupplyService, DEFAULT_CACHE_TTL};

/// Balance of one excluded address, as reported during a single fetch pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RawBalance {
    #[serde(flatten)]
    pub holder: ExcludedAddress,
    pub balance: TokenAmount,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyMetrics {
    pub max_supply: WholeTokens,
    pub total_supply_raw: TokenAmount,
    pub excluded_balance_sum_raw: TokenAmount,
    pub burnt_tokens: WholeTokens,
    pub circulating_supply: WholeTokens,
    pub total_supply_minus_burn: WholeTokens,
}

/// Everything one fetch pass produced, balances sorted largest first.
#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplySnapshot {
    pub balances: Vec<RawBalance>,
    pub fetched_at: DateTime<Utc>,
    pub metrics: SupplyMetrics,
}

/// A derived figure came out negative. Either the configured max supply is wrong or the upstream
/// data is inconsistent, clamping would hide both.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArithmeticAnomaly {
    #[error("total supply of {total_supply} exceeds max supply of {max_supply}")]
    TotalSupplyAboveMax {
        max_supply: WholeTokens,
        total_supply: WholeTokens,
    },
    #[error("excluded balances of {excluded} exceed the {remaining} tokens left after burns")]
    ExcludedAboveSupply {
        excluded: WholeTokens,
        remaining: WholeTokens,
    },
    #[error("sum of excluded balances overflows")]
    BalanceSumOverflow,
}

pub fn sum_balances(balances: &[RawBalance]) -> Result<TokenAmount, ArithmeticAnomaly> {
    balances
        .iter()
        .try_fold(TokenAmount::default(), |sum, raw| sum.checked_add(raw.balance))
        .ok_or(ArithmeticAnomaly::BalanceSumOverflow)
}

pub fn calculate_metrics(
    max_supply: WholeTokens,
    total_supply_raw: TokenAmount,
    excluded_balance_sum_raw: TokenAmount,
) -> Result<SupplyMetrics, ArithmeticAnomaly> {
    let total_supply = total_supply_raw.whole_tokens();
    let excluded = excluded_balance_sum_raw.whole_tokens();

    let burnt_tokens = max_supply.checked_sub(total_supply).ok_or(
        ArithmeticAnomaly::TotalSupplyAboveMax {
            max_supply,
            total_supply,
        },
    )?;

    let total_supply_minus_burn = max_supply - burnt_tokens;

    let circulating_supply = max_supply
        .checked_sub(excluded)
        .and_then(|remaining| remaining.checked_sub(burnt_tokens))
        .ok_or(ArithmeticAnomaly::ExcludedAboveSupply {
            excluded,
            remaining: total_supply_minus_burn,
        })?;

    Ok(SupplyMetrics {
        max_supply,
        total_supply_raw,
        excluded_balance_sum_raw,
        burnt_tokens,
        circulating_supply,
        total_supply_minus_burn,
    })
}

/// Largest balance first. The sort is stable so equal balances keep registry order.
pub fn sort_by_balance_desc(mut balances: Vec<RawBalance>) -> Vec<RawBalance> {
    balances.sort_by(|a, b| b.balance.cmp(&a.balance));
    balances
}
