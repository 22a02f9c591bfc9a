//! Client for the BscScan API, an Etherscan compatible ledger index for BNB Smart Chain.
use std::time::Duration;

use async_trait::async_trait;
use format_url::FormatUrl;
use mockall::automock;
use serde::Deserialize;
use thiserror::Error;
use tracing::trace;

use crate::units::TokenAmount;

pub const BSCSCAN_API: &str = "https://api.bscscan.com/api";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request to ledger api failed: {0}")]
    Http(reqwest::Error),
    #[error("ledger api rejected request: {message}: {result}")]
    Rejected { message: String, result: String },
    #[error("ledger api returned a result that is not an unsigned integer: {0}")]
    Unparseable(String),
}

// Request URLs carry the API key, never let them end up in an error.
impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        UpstreamError::Http(err.without_url())
    }
}

/// Both the balance and the supply endpoints answer in this envelope. On failure `status` is
/// "0" and `result` holds a human readable reason instead of an amount.
#[derive(Debug, Deserialize)]
struct BscScanEnvelope {
    status: String,
    message: String,
    result: String,
}

impl TryFrom<BscScanEnvelope> for TokenAmount {
    type Error = UpstreamError;

    fn try_from(envelope: BscScanEnvelope) -> Result<Self, Self::Error> {
        if envelope.status != "1" {
            return Err(UpstreamError::Rejected {
                message: envelope.message,
                result: envelope.result,
            });
        }

        envelope
            .result
            .parse::<TokenAmount>()
            .map_err(|_| UpstreamError::Unparseable(envelope.result))
    }
}

/// Read access to token balances as tracked by an upstream ledger index. Amounts are in the
/// token's smallest unit.
#[automock]
#[async_trait]
pub trait TokenLedger {
    async fn get_token_balance(
        &self,
        contract: &str,
        address: &str,
    ) -> Result<TokenAmount, UpstreamError>;
    async fn get_token_supply(&self, contract: &str) -> Result<TokenAmount, UpstreamError>;
}

pub struct BscScanHttp {
    api_key: String,
    api_url: String,
    client: reqwest::Client,
}

impl BscScanHttp {
    pub fn new(api_url: &str, api_key: &str) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            api_key: api_key.to_string(),
            api_url: api_url.to_string(),
            client,
        })
    }

    async fn get_amount(
        &self,
        query_params: Vec<(&str, &str)>,
    ) -> Result<TokenAmount, UpstreamError> {
        let url = FormatUrl::new(&self.api_url)
            .with_query_params(query_params)
            .format_url();

        let envelope = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<BscScanEnvelope>()
            .await?;

        trace!(
            status = %envelope.status,
            result = %envelope.result,
            "ledger api response"
        );

        envelope.try_into()
    }
}

#[async_trait]
impl TokenLedger for BscScanHttp {
    async fn get_token_balance(
        &self,
        contract: &str,
        address: &str,
    ) -> Result<TokenAmount, UpstreamError> {
        self.get_amount(vec![
            ("module", "account"),
            ("action", "tokenbalance"),
            ("contractaddress", contract),
            ("address", address),
            ("tag", "latest"),
            ("apikey", &self.api_key),
        ])
        .await
    }

    async fn get_token_supply(&self, contract: &str) -> Result<TokenAmount, UpstreamError> {
        self.get_amount(vec![
            ("module", "stats"),
            ("action", "tokensupply"),
            ("contractaddress", contract),
            ("apikey", &self.api_key),
        ])
        .await
    }
}
