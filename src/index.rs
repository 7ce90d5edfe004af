//! The review vector index.
//!
//! One SQLite table holds every indexed review: scope column for
//! partitioning, `(scope, seq_id)` primary key, and the embedding stored
//! as a little-endian f32 BLOB. Queries load the scope's rows, score them
//! by cosine similarity in Rust, and return the top-k.
//!
//! The orchestrator treats the index as append-only within a run: it never
//! updates or deletes an existing sequence id. A re-run of the same scope
//! replaces rows via the primary key.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use crate::models::QueryHit;

/// Handle to the vector index, scoped per project (or user+project).
///
/// Constructed once at process start and passed by reference into the
/// orchestrator and the Q&A path.
pub struct ReviewIndex {
    pool: SqlitePool,
}

impl ReviewIndex {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Store one review embedding under `(scope, seq_id)`.
    pub async fn add(
        &self,
        scope: &str,
        seq_id: u32,
        vector: &[f32],
        file: &str,
        summary: &str,
        model: &str,
    ) -> Result<()> {
        let blob = vec_to_blob(vector);
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO review_vectors (scope, seq_id, file, summary, embedding, model, dims, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(scope, seq_id) DO UPDATE SET
                file = excluded.file,
                summary = excluded.summary,
                embedding = excluded.embedding,
                model = excluded.model,
                dims = excluded.dims,
                created_at = excluded.created_at
            "#,
        )
        .bind(scope)
        .bind(seq_id as i64)
        .bind(file)
        .bind(summary)
        .bind(&blob)
        .bind(model)
        .bind(vector.len() as i64)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Nearest-neighbor lookup: cosine similarity against every vector in
    /// the scope, sorted descending, truncated to `top_k`.
    pub async fn query(&self, scope: &str, vector: &[f32], top_k: usize) -> Result<Vec<QueryHit>> {
        let rows = sqlx::query(
            "SELECT seq_id, file, summary, embedding FROM review_vectors WHERE scope = ?",
        )
        .bind(scope)
        .fetch_all(&self.pool)
        .await?;

        let mut hits: Vec<QueryHit> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let stored = blob_to_vec(&blob);
                let score = cosine_similarity(vector, &stored) as f64;
                QueryHit {
                    sequence_id: row.get::<i64, _>("seq_id") as u32,
                    file: row.get("file"),
                    summary: row.get("summary"),
                    score,
                }
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(top_k);

        Ok(hits)
    }

    /// Number of indexed reviews in a scope.
    pub async fn count(&self, scope: &str) -> Result<u32> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM review_vectors WHERE scope = ?")
            .bind(scope)
            .fetch_one(&self.pool)
            .await?;
        Ok(n as u32)
    }

    /// Whether a sequence id exists in a scope. Used by tests and the
    /// report browser to flag unindexed records.
    pub async fn contains(&self, scope: &str, seq_id: u32) -> Result<bool> {
        let n: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM review_vectors WHERE scope = ? AND seq_id = ?",
        )
        .bind(scope)
        .bind(seq_id as i64)
        .fetch_one(&self.pool)
        .await?;
        Ok(n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate;

    async fn memory_index() -> ReviewIndex {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        migrate::apply_schema(&pool).await.unwrap();
        ReviewIndex::new(pool)
    }

    #[tokio::test]
    async fn add_and_query_orders_by_similarity() {
        let index = memory_index().await;

        index
            .add("proj", 1, &[1.0, 0.0], "a.py", "first", "m")
            .await
            .unwrap();
        index
            .add("proj", 2, &[0.0, 1.0], "b.py", "second", "m")
            .await
            .unwrap();
        index
            .add("proj", 3, &[0.9, 0.1], "c.py", "third", "m")
            .await
            .unwrap();

        let hits = index.query("proj", &[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].sequence_id, 1);
        assert_eq!(hits[1].sequence_id, 3);
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn scopes_are_isolated() {
        let index = memory_index().await;

        index
            .add("alice:demo", 1, &[1.0, 0.0], "a.py", "s", "m")
            .await
            .unwrap();

        let hits = index.query("bob:demo", &[1.0, 0.0], 5).await.unwrap();
        assert!(hits.is_empty());
        assert_eq!(index.count("alice:demo").await.unwrap(), 1);
        assert!(!index.contains("bob:demo", 1).await.unwrap());
    }

    #[tokio::test]
    async fn rerun_replaces_by_sequence_id() {
        let index = memory_index().await;

        index
            .add("proj", 1, &[1.0, 0.0], "a.py", "old", "m")
            .await
            .unwrap();
        index
            .add("proj", 1, &[0.0, 1.0], "a.py", "new", "m")
            .await
            .unwrap();

        assert_eq!(index.count("proj").await.unwrap(), 1);
        let hits = index.query("proj", &[0.0, 1.0], 1).await.unwrap();
        assert_eq!(hits[0].summary, "new");
    }
}
