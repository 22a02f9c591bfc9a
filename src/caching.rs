use std::{collections::HashMap, fmt::Display, sync::RwLock, time::Duration};

use tokio::time::Instant;

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Custom(String),
    Supply,
    TotalSupply,
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Custom(key) => write!(f, "{key}"),
            Self::Supply => write!(f, "supply"),
            Self::TotalSupply => write!(f, "total-supply"),
        }
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        match key {
            "supply" => Self::Supply,
            "total-supply" => Self::TotalSupply,
            key => Self::Custom(key.to_string()),
        }
    }
}

#[derive(Debug)]
struct CacheEntry<V> {
    expires_at: Instant,
    value: V,
}

/// Values expire `ttl` after they were set. Expired entries read as absent but stay in memory
/// until overwritten, the set of keys is small and fixed.
#[derive(Debug)]
pub struct TtlCache<V>(RwLock<HashMap<CacheKey, CacheEntry<V>>>);

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self(RwLock::new(HashMap::new()))
    }

    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let entries = self.0.read().unwrap();
        entries
            .get(key)
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.value.clone())
    }

    pub fn set(&self, key: CacheKey, value: V, ttl: Duration) {
        let entry = CacheEntry {
            expires_at: Instant::now() + ttl,
            value,
        };
        self.0.write().unwrap().insert(key, entry);
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
