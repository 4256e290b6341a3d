use redis::AsyncCommands;
use tracing::{debug, warn};

use crate::trust::aggregation::RankedCompany;

const GENERATION_KEY: &str = "bond:ranking:generation";

/// Redis-backed cache for ranking responses.
///
/// Entries are keyed by a generation counter; bumping the counter on every
/// evaluation write invalidates all cached limits at once. Redis failures are
/// logged and treated as a miss.
#[derive(Clone)]
pub struct RankingCache {
    client: redis::Client,
    ttl_secs: u64,
}

pub fn ranking_key(generation: i64, limit: usize) -> String {
    format!("bond:ranking:{generation}:{limit}")
}

impl RankingCache {
    pub fn new(client: redis::Client, ttl_secs: u64) -> Self {
        Self { client, ttl_secs }
    }

    pub async fn get(&self, limit: usize) -> Option<Vec<RankedCompany>> {
        match self.try_get(limit).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!("Ranking cache read failed: {e}");
                None
            }
        }
    }

    pub async fn put(&self, limit: usize, ranking: &[RankedCompany]) {
        if self.ttl_secs == 0 {
            return;
        }
        if let Err(e) = self.try_put(limit, ranking).await {
            warn!("Ranking cache write failed: {e}");
        }
    }

    pub async fn invalidate(&self) {
        let result: redis::RedisResult<i64> = async {
            let mut con = self.client.get_multiplexed_async_connection().await?;
            con.incr(GENERATION_KEY, 1).await
        }
        .await;
        match result {
            Ok(generation) => debug!("Ranking cache invalidated (generation {generation})"),
            Err(e) => warn!("Ranking cache invalidation failed: {e}"),
        }
    }

    async fn try_get(&self, limit: usize) -> redis::RedisResult<Option<Vec<RankedCompany>>> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let generation: Option<i64> = con.get(GENERATION_KEY).await?;
        let raw: Option<String> = con.get(ranking_key(generation.unwrap_or(0), limit)).await?;
        Ok(raw.and_then(|r| serde_json::from_str(&r).ok()))
    }

    async fn try_put(&self, limit: usize, ranking: &[RankedCompany]) -> redis::RedisResult<()> {
        let payload = match serde_json::to_string(ranking) {
            Ok(p) => p,
            Err(e) => {
                warn!("Ranking serialization failed: {e}");
                return Ok(());
            }
        };
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let generation: Option<i64> = con.get(GENERATION_KEY).await?;
        con.set_ex(
            ranking_key(generation.unwrap_or(0), limit),
            payload,
            self.ttl_secs,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranking_key_includes_generation_and_limit() {
        assert_eq!(ranking_key(0, 20), "bond:ranking:0:20");
        assert_ne!(ranking_key(1, 20), ranking_key(2, 20));
    }

    #[tokio::test]
    async fn test_unreachable_redis_is_a_miss() {
        let client = redis::Client::open("redis://127.0.0.1:1/").unwrap();
        let cache = RankingCache::new(client, 60);
        assert!(cache.get(20).await.is_none());
        // must not panic
        cache.put(20, &[]).await;
        cache.invalidate().await;
    }
}
