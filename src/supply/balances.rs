use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    bscscan::{TokenLedger, UpstreamError},
    rate_limit::RateLimiter,
    registry::AddressRegistry,
    units::TokenAmount,
};

use super::RawBalance;

/// Queries the ledger one address at a time, every call passing through the rate limiter first.
pub struct BalanceFetcher {
    ledger: Arc<dyn TokenLedger + Send + Sync>,
    rate_limiter: Arc<dyn RateLimiter + Send + Sync>,
}

impl BalanceFetcher {
    pub fn new(
        ledger: Arc<dyn TokenLedger + Send + Sync>,
        rate_limiter: Arc<dyn RateLimiter + Send + Sync>,
    ) -> Self {
        Self {
            ledger,
            rate_limiter,
        }
    }

    /// Balances in registry order. Fails on the first query that fails, without retrying and
    /// without returning the balances collected so far.
    pub async fn fetch_all(
        &self,
        registry: &AddressRegistry,
        token_contract: &str,
    ) -> Result<Vec<RawBalance>, UpstreamError> {
        let mut balances = Vec::with_capacity(registry.len());

        for holder in registry.list() {
            self.rate_limiter.until_ready().await;

            let balance = self
                .ledger
                .get_token_balance(token_contract, &holder.address)
                .await
                .map_err(|err| {
                    warn!(address = %holder.address, %err, "failed to fetch excluded balance");
                    err
                })?;

            debug!(address = %holder.address, %balance, "fetched excluded balance");

            balances.push(RawBalance {
                holder: holder.clone(),
                balance,
            });
        }

        Ok(balances)
    }

    pub async fn fetch_total_supply(
        &self,
        token_contract: &str,
    ) -> Result<TokenAmount, UpstreamError> {
        self.rate_limiter.until_ready().await;

        let total_supply = self.ledger.get_token_supply(token_contract).await?;

        debug!(%total_supply, "fetched total supply");

        Ok(total_supply)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use tokio::time::Instant;

    use super::*;
    use crate::{
        bscscan::MockTokenLedger,
        rate_limit::{FixedIntervalGate, UPSTREAM_MIN_INTERVAL},
        supply::test_utils::{holder_address, registry_of, TOKEN_CONTRACT},
    };

    fn fetcher_with(ledger: MockTokenLedger) -> BalanceFetcher {
        BalanceFetcher::new(Arc::new(ledger), Arc::new(FixedIntervalGate::default()))
    }

    #[tokio::test(start_paused = true)]
    async fn spaces_every_call_test() {
        let calls: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(vec![]));
        let calls_clone = calls.clone();

        let mut ledger = MockTokenLedger::new();
        ledger
            .expect_get_token_balance()
            .times(13)
            .returning(move |_, _| {
                calls_clone.lock().unwrap().push(Instant::now());
                Ok(TokenAmount::from_whole_tokens(1))
            });

        let balances = fetcher_with(ledger)
            .fetch_all(&registry_of(13), TOKEN_CONTRACT)
            .await
            .unwrap();

        assert_eq!(balances.len(), 13);
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 13);
        for pair in calls.windows(2) {
            assert!(pair[1] - pair[0] >= UPSTREAM_MIN_INTERVAL);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn queries_in_registry_order_test() {
        let queried: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(vec![]));
        let queried_clone = queried.clone();

        let mut ledger = MockTokenLedger::new();
        ledger
            .expect_get_token_balance()
            .times(4)
            .returning(move |contract, address| {
                assert_eq!(contract, TOKEN_CONTRACT);
                queried_clone.lock().unwrap().push(address.to_string());
                Ok(TokenAmount(0))
            });

        let balances = fetcher_with(ledger)
            .fetch_all(&registry_of(4), TOKEN_CONTRACT)
            .await
            .unwrap();

        let expected: Vec<String> = (0..4).map(holder_address).collect();
        assert_eq!(*queried.lock().unwrap(), expected);
        let returned: Vec<String> = balances
            .into_iter()
            .map(|raw| raw.holder.address)
            .collect();
        assert_eq!(returned, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_at_first_failure_test() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let mut ledger = MockTokenLedger::new();
        ledger
            .expect_get_token_balance()
            .times(3)
            .returning(move |_, _| {
                let call = call_count_clone.fetch_add(1, Ordering::SeqCst);
                if call == 2 {
                    Err(UpstreamError::Unparseable("NOTOK".to_string()))
                } else {
                    Ok(TokenAmount::from_whole_tokens(5))
                }
            });

        let result = fetcher_with(ledger)
            .fetch_all(&registry_of(6), TOKEN_CONTRACT)
            .await;

        assert!(matches!(result, Err(UpstreamError::Unparseable(_))));
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn total_supply_shares_rate_limit_test() {
        let mut ledger = MockTokenLedger::new();
        ledger
            .expect_get_token_balance()
            .times(1)
            .returning(|_, _| Ok(TokenAmount(1)));
        ledger
            .expect_get_token_supply()
            .times(1)
            .returning(|_| Ok(TokenAmount::from_whole_tokens(900)));

        let fetcher = fetcher_with(ledger);
        let start = Instant::now();
        fetcher
            .fetch_all(&registry_of(1), TOKEN_CONTRACT)
            .await
            .unwrap();
        let total_supply = fetcher.fetch_total_supply(TOKEN_CONTRACT).await.unwrap();

        assert_eq!(total_supply, TokenAmount::from_whole_tokens(900));
        assert!(start.elapsed() >= UPSTREAM_MIN_INTERVAL);
    }
}
