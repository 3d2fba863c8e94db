use async_trait::async_trait;
use deadpool_redis::Pool;
use redis::AsyncCommands;

use crate::error::{AppError, Result};
use crate::invite::CommunityDirectory;
use crate::models::Community;

fn community_key(community_id: &str) -> String {
    format!("community:{}", community_id)
}

/// Community records in Redis
#[derive(Clone)]
pub struct CommunityRepository {
    pool: Pool,
}

impl CommunityRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Get community by ID
    pub async fn get_community(&self, community_id: &str) -> Result<Option<Community>> {
        let mut conn = self.pool.get().await?;

        let json: Option<String> = conn.get(community_key(community_id)).await?;

        match json {
            Some(data) => {
                let community: Community = serde_json::from_str(&data)?;
                Ok(Some(community))
            }
            None => Ok(None),
        }
    }

    /// Insert or replace a community record
    pub async fn put_community(&self, community: &Community) -> Result<()> {
        let mut conn = self.pool.get().await?;
        let json = serde_json::to_string(community)?;

        conn.set::<_, _, ()>(community_key(&community.id), &json)
            .await?;

        tracing::info!(community_id = %community.id, "Community stored");
        Ok(())
    }

    /// Check Redis connection health
    pub async fn health_check(&self) -> Result<bool> {
        let mut conn = self.pool.get().await?;

        let pong: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| AppError::RedisError(e.to_string()))?;

        Ok(pong == "PONG")
    }
}

#[async_trait]
impl CommunityDirectory for CommunityRepository {
    async fn find_community(&self, community_id: &str) -> Result<Option<Community>> {
        self.get_community(community_id).await
    }
}
