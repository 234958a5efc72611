//! In-memory caching using moka
//!
//! Profiles are read on every gate check and change only when the plan is
//! switched, so they are cached with a short TTL and invalidated on writes.
//! Subscription status itself is never cached; it depends on `now`.

use moka::future::Cache;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::subscription::models::Profile;

const PLAN_PRICE_KEY: &str = "plan_professional";

/// Application cache for account profiles and platform settings
#[derive(Clone)]
pub struct AppCache {
    /// Profiles (user id -> Profile)
    pub profiles: Cache<Uuid, Arc<Profile>>,
    /// Platform settings (key -> value)
    pub settings: Cache<String, Decimal>,
}

impl AppCache {
    /// Create a cache whose profile entries expire after `profile_ttl`
    pub fn new(profile_ttl: Duration) -> Self {
        Self {
            // Profiles: 10k entries, idle entries dropped after the TTL as well
            profiles: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(profile_ttl)
                .time_to_idle(profile_ttl)
                .build(),

            // Settings: a handful of keys, 30 min TTL
            settings: Cache::builder()
                .max_capacity(16)
                .time_to_live(Duration::from_secs(30 * 60))
                .build(),
        }
    }

    pub async fn plan_price(&self) -> Option<Decimal> {
        self.settings.get(PLAN_PRICE_KEY).await
    }

    pub async fn set_plan_price(&self, price: Decimal) {
        self.settings.insert(PLAN_PRICE_KEY.to_string(), price).await;
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            profiles_size: self.profiles.entry_count(),
            settings_size: self.settings.entry_count(),
        }
    }

    /// Invalidate all caches
    pub fn invalidate_all(&self) {
        self.profiles.invalidate_all();
        self.settings.invalidate_all();
        info!("All caches invalidated");
    }

    /// Drop the cached profile of one user
    pub async fn invalidate_profile(&self, user_id: Uuid) {
        self.profiles.invalidate(&user_id).await;
        info!("Profile cache invalidated for user: {}", user_id);
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

/// Cache statistics for monitoring endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub profiles_size: u64,
    pub settings_size: u64,
}
