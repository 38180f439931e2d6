//! In-memory forecast cache keyed by period and generation date

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use shared::{ForecastPeriod, HybridForecastResult};
use tokio::sync::RwLock;

struct CacheEntry {
    result: HybridForecastResult,
    stored_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

/// Last write wins; expired entries are pruned on insert
pub struct ForecastCache {
    entries: RwLock<HashMap<(ForecastPeriod, NaiveDate), CacheEntry>>,
    ttl: Duration,
}

impl ForecastCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn get(&self, period: ForecastPeriod, generated_on: NaiveDate) -> Option<HybridForecastResult> {
        let entries = self.entries.read().await;
        entries
            .get(&(period, generated_on))
            .filter(|entry| entry.is_fresh(self.ttl))
            .map(|entry| entry.result.clone())
    }

    pub async fn insert(&self, generated_on: NaiveDate, result: HybridForecastResult) {
        let ttl = self.ttl;
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.is_fresh(ttl));
        entries.insert(
            (result.period, generated_on),
            CacheEntry {
                result,
                stored_at: Instant::now(),
            },
        );
    }
}
