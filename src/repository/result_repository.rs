use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Sqlite, SqliteConnection};
use uuid::Uuid;

use crate::{
    error::Result,
    models::{Cohort, NewRoundResult, RoundResult},
};

const RESULT_COLUMNS: &str = "id, round_id, user_id, total_score, rank, cohort, computed_at";

#[derive(FromRow, Clone, Debug)]
pub struct ResultWithName {
    pub user_id: Uuid,
    pub display_name: String,
    pub total_score: i64,
    pub rank: u32,
    pub cohort: Cohort,
}

#[derive(Debug, Clone)]
pub struct ResultRepository {
    pool: Pool<Sqlite>,
}

impl ResultRepository {
    pub fn new(pool: Pool<Sqlite>) -> ResultRepository {
        ResultRepository { pool }
    }

    pub async fn list_for_round(&self, round_id: Uuid) -> Result<Vec<RoundResult>> {
        let results = sqlx::query_as::<_, RoundResult>(&format!(
            "SELECT {RESULT_COLUMNS} FROM round_results \
             WHERE round_id = $1 \
             ORDER BY rank"
        ))
        .bind(round_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(results)
    }

    pub async fn list_for_round_with_names(&self, round_id: Uuid) -> Result<Vec<ResultWithName>> {
        let rows = sqlx::query_as::<_, ResultWithName>(
            "SELECT
                 r.user_id AS user_id,
                 u.display_name AS display_name,
                 r.total_score AS total_score,
                 r.rank AS rank,
                 r.cohort AS cohort
             FROM round_results r
             JOIN users u ON u.id = r.user_id
             WHERE r.round_id = $1
             ORDER BY r.rank",
        )
        .bind(round_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Wipes and rewrites the round's results. Runs inside the caller's
    /// transaction so a reader never sees a half-replaced set.
    pub async fn replace_for_round(
        &self,
        conn: &mut SqliteConnection,
        round_id: Uuid,
        results: &[NewRoundResult],
        computed_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query("DELETE FROM round_results WHERE round_id = $1")
            .bind(round_id)
            .execute(&mut *conn)
            .await?;

        for result in results {
            sqlx::query(
                "INSERT INTO round_results \
                     (id, round_id, user_id, total_score, rank, cohort, computed_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(Uuid::new_v4())
            .bind(round_id)
            .bind(result.user_id)
            .bind(result.total_score)
            .bind(result.rank)
            .bind(result.cohort)
            .bind(computed_at)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }
}
