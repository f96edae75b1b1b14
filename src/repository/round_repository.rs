use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite, SqliteConnection};
use uuid::Uuid;

use crate::{
    error::Result,
    models::{NewRound, Round, RoundStatus},
};

const ROUND_COLUMNS: &str = "id, group_id, year, month, status, \
     registration_deadline_day, timezone, started_at, closed_at";

#[derive(Debug, Clone)]
pub struct RoundRepository {
    pool: Pool<Sqlite>,
}

impl RoundRepository {
    pub fn new(pool: Pool<Sqlite>) -> RoundRepository {
        RoundRepository { pool }
    }

    pub async fn get(&self, round_id: Uuid) -> Result<Option<Round>> {
        let round = sqlx::query_as::<_, Round>(&format!(
            "SELECT {ROUND_COLUMNS} FROM rounds WHERE id = $1"
        ))
        .bind(round_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(round)
    }

    pub async fn get_by_period(
        &self,
        group_id: Uuid,
        year: i32,
        month: u8,
    ) -> Result<Option<Round>> {
        let mut conn = self.pool.acquire().await?;
        self.get_by_period_on(&mut conn, group_id, year, month).await
    }

    /// Same lookup usable inside a transaction (the idempotent guard of
    /// the automatic close path runs there).
    pub async fn get_by_period_on(
        &self,
        conn: &mut SqliteConnection,
        group_id: Uuid,
        year: i32,
        month: u8,
    ) -> Result<Option<Round>> {
        let round = sqlx::query_as::<_, Round>(&format!(
            "SELECT {ROUND_COLUMNS} FROM rounds \
             WHERE group_id = $1 AND year = $2 AND month = $3"
        ))
        .bind(group_id)
        .bind(year)
        .bind(month)
        .fetch_optional(conn)
        .await?;

        Ok(round)
    }

    pub async fn list_for_group(&self, group_id: Uuid, limit: i64) -> Result<Vec<Round>> {
        let rounds = sqlx::query_as::<_, Round>(&format!(
            "SELECT {ROUND_COLUMNS} FROM rounds \
             WHERE group_id = $1 \
             ORDER BY year DESC, month DESC \
             LIMIT $2"
        ))
        .bind(group_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rounds)
    }

    pub async fn get_last_completed(&self, group_id: Uuid) -> Result<Option<Round>> {
        let round = sqlx::query_as::<_, Round>(&format!(
            "SELECT {ROUND_COLUMNS} FROM rounds \
             WHERE group_id = $1 AND status = $2 \
             ORDER BY year DESC, month DESC \
             LIMIT 1"
        ))
        .bind(group_id)
        .bind(RoundStatus::ResultsPublished)
        .fetch_optional(&self.pool)
        .await?;

        Ok(round)
    }

    /// Rounds the periodic tick should look at: everything that has not
    /// reached a closed state yet.
    pub async fn list_tickable(&self) -> Result<Vec<Round>> {
        let rounds = sqlx::query_as::<_, Round>(&format!(
            "SELECT {ROUND_COLUMNS} FROM rounds \
             WHERE status IN ($1, $2) \
             ORDER BY year, month"
        ))
        .bind(RoundStatus::RegistrationOpen)
        .bind(RoundStatus::Locked)
        .fetch_all(&self.pool)
        .await?;

        Ok(rounds)
    }

    pub async fn create(&self, new_round: NewRound) -> Result<Round> {
        let mut transaction = self.pool.begin().await?;
        let round = self.insert(&mut transaction, new_round).await?;
        transaction.commit().await?;
        Ok(round)
    }

    pub async fn insert(&self, conn: &mut SqliteConnection, new_round: NewRound) -> Result<Round> {
        let round = sqlx::query_as::<_, Round>(&format!(
            "INSERT INTO rounds (
                 id,
                 group_id,
                 year,
                 month,
                 status,
                 registration_deadline_day,
                 timezone,
                 started_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {ROUND_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new_round.group_id)
        .bind(new_round.year)
        .bind(new_round.month)
        .bind(new_round.status)
        .bind(new_round.registration_deadline_day)
        .bind(new_round.timezone)
        .bind(new_round.started_at)
        .fetch_one(conn)
        .await?;

        Ok(round)
    }

    pub async fn update_status(
        &self,
        round_id: Uuid,
        status: RoundStatus,
        started_at: Option<DateTime<Utc>>,
        closed_at: Option<DateTime<Utc>>,
    ) -> Result<Round> {
        let mut conn = self.pool.acquire().await?;
        self.update_status_on(&mut conn, round_id, status, started_at, closed_at)
            .await
    }

    pub async fn update_status_on(
        &self,
        conn: &mut SqliteConnection,
        round_id: Uuid,
        status: RoundStatus,
        started_at: Option<DateTime<Utc>>,
        closed_at: Option<DateTime<Utc>>,
    ) -> Result<Round> {
        let round = sqlx::query_as::<_, Round>(&format!(
            "UPDATE rounds \
             SET status = $2, started_at = $3, closed_at = $4 \
             WHERE id = $1 \
             RETURNING {ROUND_COLUMNS}"
        ))
        .bind(round_id)
        .bind(status)
        .bind(started_at)
        .bind(closed_at)
        .fetch_one(conn)
        .await?;

        Ok(round)
    }
}
