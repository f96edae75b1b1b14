use chrono::NaiveDate;
use sqlx::{FromRow, Pool, Sqlite, SqliteConnection};
use uuid::Uuid;

use crate::{
    error::Result,
    models::{ParticipantStatus, ReadingLog},
};

const LOG_COLUMNS: &str = "id, round_id, user_id, date, minutes, score, book_finished, comment";

/// One leaderboard line: an active participant with their running score.
#[derive(FromRow, Clone, Debug)]
pub struct LeaderboardRow {
    pub user_id: Uuid,
    pub display_name: String,
    pub total_score: i64,
    pub total_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct ReadingLogRepository {
    pool: Pool<Sqlite>,
}

impl ReadingLogRepository {
    pub fn new(pool: Pool<Sqlite>) -> ReadingLogRepository {
        ReadingLogRepository { pool }
    }

    pub async fn get_for_user_date(
        &self,
        round_id: Uuid,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<ReadingLog>> {
        let log = sqlx::query_as::<_, ReadingLog>(&format!(
            "SELECT {LOG_COLUMNS} FROM reading_logs \
             WHERE round_id = $1 AND user_id = $2 AND date = $3"
        ))
        .bind(round_id)
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(log)
    }

    pub async fn list_for_user(&self, round_id: Uuid, user_id: Uuid) -> Result<Vec<ReadingLog>> {
        let logs = sqlx::query_as::<_, ReadingLog>(&format!(
            "SELECT {LOG_COLUMNS} FROM reading_logs \
             WHERE round_id = $1 AND user_id = $2 \
             ORDER BY date"
        ))
        .bind(round_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    /// Per-user score sums for the round; users with no logs are absent
    /// (the engine counts them as zero).
    pub async fn aggregate_scores(&self, round_id: Uuid) -> Result<Vec<(Uuid, i64)>> {
        let mut conn = self.pool.acquire().await?;
        self.aggregate_scores_on(&mut conn, round_id).await
    }

    pub async fn aggregate_scores_on(
        &self,
        conn: &mut SqliteConnection,
        round_id: Uuid,
    ) -> Result<Vec<(Uuid, i64)>> {
        let rows = sqlx::query_as::<_, (Uuid, i64)>(
            "SELECT user_id, COALESCE(SUM(score), 0) AS total_score \
             FROM reading_logs \
             WHERE round_id = $1 \
             GROUP BY user_id",
        )
        .bind(round_id)
        .fetch_all(conn)
        .await?;

        Ok(rows)
    }

    /// Inserts or overwrites the single log row for `(round, user, date)`.
    /// Minutes, score and metadata replace the previous values; nothing
    /// accumulates.
    #[allow(clippy::too_many_arguments)]
    pub async fn upsert(
        &self,
        round_id: Uuid,
        user_id: Uuid,
        date: NaiveDate,
        minutes: u32,
        score: u8,
        book_finished: bool,
        comment: Option<String>,
    ) -> Result<ReadingLog> {
        let log = sqlx::query_as::<_, ReadingLog>(&format!(
            "INSERT INTO reading_logs \
                 (id, round_id, user_id, date, minutes, score, book_finished, comment) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (round_id, user_id, date) DO UPDATE SET \
                 minutes = excluded.minutes, \
                 score = excluded.score, \
                 book_finished = excluded.book_finished, \
                 comment = excluded.comment \
             RETURNING {LOG_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(round_id)
        .bind(user_id)
        .bind(date)
        .bind(minutes)
        .bind(score)
        .bind(book_finished)
        .bind(comment)
        .fetch_one(&self.pool)
        .await?;

        Ok(log)
    }

    /// Active participants with their running totals, best score first,
    /// ties by display name ascending.
    pub async fn leaderboard(&self, round_id: Uuid) -> Result<Vec<LeaderboardRow>> {
        let rows = sqlx::query_as::<_, LeaderboardRow>(
            "SELECT
                 p.user_id AS user_id,
                 u.display_name AS display_name,
                 COALESCE(SUM(l.score), 0) AS total_score,
                 COALESCE(SUM(l.minutes), 0) AS total_minutes
             FROM round_participants p
             JOIN users u ON u.id = p.user_id
             LEFT JOIN reading_logs l
                 ON l.round_id = p.round_id AND l.user_id = p.user_id
             WHERE p.round_id = $1 AND p.status = $2
             GROUP BY p.user_id, u.display_name
             ORDER BY total_score DESC, u.display_name ASC",
        )
        .bind(round_id)
        .bind(ParticipantStatus::Active)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
