use shared::models::CandidateTally;
use sqlx::PgPool;
use tracing::debug;

use crate::store::{StoreError, VoteRecord, VoteStore};

/// Postgres-backed store. Uniqueness of votes relies on the
/// `unique_device_vote` constraint of the `votes` table.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[rocket::async_trait]
impl VoteStore for PgStore {
    async fn list_candidates(&self) -> Result<Vec<CandidateTally>, StoreError> {
        let rows = sqlx::query_as::<_, CandidateTally>(
            "SELECT v.id, v.title, v.description, v.youtube_url, v.thumbnail, v.video_url,
                    COUNT(vt.id) AS vote_count
             FROM videos v
             LEFT JOIN votes vt ON vt.video_choice = v.id
             GROUP BY v.id
             ORDER BY v.id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_vote(&self, device_fingerprint: &str) -> Result<Option<VoteRecord>, StoreError> {
        let record = sqlx::query_as::<_, VoteRecord>(
            "SELECT id, device_fingerprint, video_choice, created_at
             FROM votes WHERE device_fingerprint = $1",
        )
        .bind(device_fingerprint)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn insert_vote_if_absent(
        &self,
        device_fingerprint: &str,
        video_choice: i32,
    ) -> Result<bool, StoreError> {
        // Dropping the transaction on an error path rolls it back and
        // returns the connection to the pool.
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_scalar::<_, i32>(
            "INSERT INTO votes (device_fingerprint, video_choice)
             VALUES ($1, $2)
             ON CONFLICT ON CONSTRAINT unique_device_vote DO NOTHING
             RETURNING id",
        )
        .bind(device_fingerprint)
        .bind(video_choice)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        if let Some(id) = inserted {
            debug!("Inserted vote row {}", id);
        }
        Ok(inserted.is_some())
    }

    async fn set_video_url(&self, video_id: i32, video_url: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE videos SET video_url = $1 WHERE id = $2")
            .bind(video_url)
            .bind(video_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
