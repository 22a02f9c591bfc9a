use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::{
    bscscan::{BscScanHttp, UpstreamError},
    caching::{CacheKey, TtlCache},
    env::EnvConfig,
    performance::TimedExt,
    rate_limit::FixedIntervalGate,
    registry::AddressRegistry,
    units::{TokenAmount, WholeTokens},
};

use super::{
    calculate_metrics, sort_by_balance_desc, sum_balances, ArithmeticAnomaly, BalanceFetcher,
    SupplyMetrics, SupplySnapshot,
};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Error)]
pub enum SupplyError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    Anomaly(#[from] ArithmeticAnomaly),
}

/// Serves supply snapshots from cache, running a fetch pass against the ledger on a miss. Misses
/// on the same key are serialized, callers that waited on a running pass get its result.
pub struct SupplyService {
    cache_ttl: Duration,
    fetcher: BalanceFetcher,
    in_flight: Mutex<HashMap<CacheKey, Arc<tokio::sync::Mutex<()>>>>,
    max_supply: WholeTokens,
    registry: AddressRegistry,
    snapshots: TtlCache<Arc<SupplySnapshot>>,
    token_contract: String,
    total_supplies: TtlCache<TokenAmount>,
}

impl SupplyService {
    pub fn new(
        registry: AddressRegistry,
        fetcher: BalanceFetcher,
        token_contract: &str,
        max_supply: WholeTokens,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            cache_ttl,
            fetcher,
            in_flight: Mutex::new(HashMap::new()),
            max_supply,
            registry,
            snapshots: TtlCache::new(),
            token_contract: token_contract.to_string(),
            total_supplies: TtlCache::new(),
        }
    }

    /// Wires the BscScan client, the shared rate limit gate and the built-in registry together.
    pub fn from_env_config(config: &EnvConfig) -> anyhow::Result<Self> {
        let registry = AddressRegistry::built_in()?;
        let ledger = BscScanHttp::new(&config.bscscan_api_url, &config.bscscan_api_key)?;
        let gate = FixedIntervalGate::default();
        let fetcher = BalanceFetcher::new(Arc::new(ledger), Arc::new(gate));

        Ok(Self::new(
            registry,
            fetcher,
            &config.token_contract,
            config.max_supply,
            config.cache_ttl,
        ))
    }

    pub fn registry(&self) -> &AddressRegistry {
        &self.registry
    }

    pub async fn get_snapshot(&self, key: &CacheKey) -> Result<Arc<SupplySnapshot>, SupplyError> {
        if let Some(snapshot) = self.snapshots.get(key) {
            debug!(%key, "supply cache hit");
            return Ok(snapshot);
        }

        let key_lock = self.in_flight_lock(key);
        let _guard = key_lock.lock().await;

        // Whoever held the lock before us may have just filled the cache.
        if let Some(snapshot) = self.snapshots.get(key) {
            debug!(%key, "supply cache filled while waiting");
            return Ok(snapshot);
        }

        debug!(%key, "supply cache miss");

        let snapshot = Arc::new(
            self.fetch_snapshot()
                .timed("fetch-supply-snapshot")
                .await
                .map_err(|err| {
                    error!(%key, %err, "supply fetch pass failed");
                    err
                })?,
        );

        self.snapshots.set(key.clone(), snapshot.clone(), self.cache_ttl);

        Ok(snapshot)
    }

    pub async fn get_metrics(&self, key: &CacheKey) -> Result<SupplyMetrics, SupplyError> {
        self.get_snapshot(key).await.map(|snapshot| snapshot.metrics)
    }

    /// The cached total supply, or a freshly fetched one flagged `true`. A fresh value is only
    /// cached once the pass that fetched it succeeds.
    async fn get_total_supply(&self) -> Result<(TokenAmount, bool), UpstreamError> {
        if let Some(total_supply) = self.total_supplies.get(&CacheKey::TotalSupply) {
            return Ok((total_supply, false));
        }

        let total_supply = self.fetcher.fetch_total_supply(&self.token_contract).await?;

        Ok((total_supply, true))
    }

    async fn fetch_snapshot(&self) -> Result<SupplySnapshot, SupplyError> {
        let balances = self
            .fetcher
            .fetch_all(&self.registry, &self.token_contract)
            .await?;
        let (total_supply_raw, is_fresh) = self.get_total_supply().await?;

        let excluded_balance_sum_raw = sum_balances(&balances)?;
        let metrics =
            calculate_metrics(self.max_supply, total_supply_raw, excluded_balance_sum_raw)?;

        if is_fresh {
            self.total_supplies
                .set(CacheKey::TotalSupply, total_supply_raw, self.cache_ttl);
        }

        info!(
            addresses = balances.len(),
            burnt_tokens = %metrics.burnt_tokens,
            circulating_supply = %metrics.circulating_supply,
            "computed supply metrics"
        );

        Ok(SupplySnapshot {
            balances: sort_by_balance_desc(balances),
            fetched_at: Utc::now(),
            metrics,
        })
    }

    fn in_flight_lock(&self, key: &CacheKey) -> Arc<tokio::sync::Mutex<()>> {
        self.in_flight
            .lock()
            .unwrap()
            .entry(key.clone())
            .or_default()
            .clone()
    }
}
