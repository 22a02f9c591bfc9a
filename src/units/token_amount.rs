use std::{fmt::Display, num::ParseIntError, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{WholeTokens, TOKEN_UNIT_SCALE};

/// An amount of the token in its smallest unit. No decimal scaling is implied, use
/// `whole_tokens` to get to an amount a human would recognize.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(into = "String")]
#[serde(try_from = "String")]
pub struct TokenAmount(pub u128);

impl TokenAmount {
    pub fn from_whole_tokens(whole: WholeTokens) -> Self {
        Self(whole * TOKEN_UNIT_SCALE)
    }

    /// Truncates anything below one whole token.
    pub fn whole_tokens(&self) -> WholeTokens {
        let TokenAmount(amount) = self;
        amount / TOKEN_UNIT_SCALE
    }

    pub fn checked_add(self, TokenAmount(rhs): Self) -> Option<Self> {
        let TokenAmount(lhs) = self;
        lhs.checked_add(rhs).map(TokenAmount)
    }
}

impl Display for TokenAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let TokenAmount(amount) = self;
        write!(f, "{amount}")
    }
}

impl From<TokenAmount> for String {
    fn from(TokenAmount(amount): TokenAmount) -> Self {
        amount.to_string()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseTokenAmountError {
    #[error("token amount must be plain decimal digits, got {0:?}")]
    NotDigits(String),
    #[error(transparent)]
    Int(#[from] ParseIntError),
}

impl FromStr for TokenAmount {
    type Err = ParseTokenAmountError;

    /// Only bare digits, u128 parsing alone would also take a leading `+`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(ParseTokenAmountError::NotDigits(s.to_string()));
        }

        Ok(TokenAmount(s.parse::<u128>()?))
    }
}

impl TryFrom<String> for TokenAmount {
    type Error = ParseTokenAmountError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse::<TokenAmount>()
    }
}
