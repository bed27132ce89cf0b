use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::CacheStore;
use crate::evaluation::{self, CombinedFlagInfo};
use crate::sources::{fetch_combined, FetchError, FlagSources};

// How long a combined flag+rule snapshot stays cached. Flag changes become
// visible to evaluation within at most this window.
const CACHE_TTL: Duration = Duration::from_secs(30);

/// The decision engine: cache-aside lookup over the concurrent
/// flag/rule fan-out, plus the pure evaluation step.
#[derive(Clone)]
pub struct Engine {
    sources: Arc<dyn FlagSources>,
    cache: Arc<dyn CacheStore>,
}

impl Engine {
    pub fn new(sources: Arc<dyn FlagSources>, cache: Arc<dyn CacheStore>) -> Self {
        Self { sources, cache }
    }

    /// Compute the boolean decision for a (user, flag) pair
    pub async fn decide(&self, user_id: &str, flag_name: &str) -> Result<bool, FetchError> {
        let info = self.combined_flag_info(flag_name).await?;
        Ok(evaluation::evaluate(&info, user_id))
    }

    /// Cache-aside lookup of the combined flag+rule snapshot.
    /// A corrupt cached value is treated as a miss, never as an error; a
    /// failed cache write loses only the caching side effect.
    pub async fn combined_flag_info(
        &self,
        flag_name: &str,
    ) -> Result<CombinedFlagInfo, FetchError> {
        let cache_key = format!("flag_info:{}", flag_name);

        // 1. Try the cache
        match self.cache.get(&cache_key).await {
            Ok(Some(raw)) => match serde_json::from_str::<CombinedFlagInfo>(&raw) {
                Ok(info) => {
                    debug!(flag_name, "cache hit");
                    return Ok(info);
                }
                Err(e) => {
                    // Treat as a miss and refetch
                    warn!(flag_name, error = %e, "corrupt cache entry, refetching");
                }
            },
            Ok(None) => debug!(flag_name, "cache miss"),
            Err(e) => warn!(flag_name, error = %e, "cache read failed, falling back to sources"),
        }

        // 2. Miss: fan out to both sources
        let info = fetch_combined(self.sources.as_ref(), flag_name).await?;

        // 3. Store the snapshot; only complete values are ever cached
        match serde_json::to_string(&info) {
            Ok(raw) => {
                if let Err(e) = self.cache.set(&cache_key, raw, CACHE_TTL).await {
                    warn!(flag_name, error = %e, "cache write failed");
                }
            }
            Err(e) => warn!(flag_name, error = %e, "failed to serialize cache entry"),
        }

        Ok(info)
    }
}
