mod token_amount;

pub use token_amount::TokenAmount;

/// Count of smallest units in one whole token (18 decimals).
pub const TOKEN_UNIT_SCALE: u128 = 1_000_000_000_000_000_000;

/// An amount of whole tokens, truncated.
pub type WholeTokens = u128;
