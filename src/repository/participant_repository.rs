use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite, SqliteConnection};
use uuid::Uuid;

use crate::{
    error::Result,
    models::{Participant, ParticipantStatus},
};

const PARTICIPANT_COLUMNS: &str = "id, round_id, user_id, status, joined_at, left_at";

#[derive(Debug, Clone)]
pub struct ParticipantRepository {
    pool: Pool<Sqlite>,
}

impl ParticipantRepository {
    pub fn new(pool: Pool<Sqlite>) -> ParticipantRepository {
        ParticipantRepository { pool }
    }

    pub async fn get_for_user(&self, round_id: Uuid, user_id: Uuid) -> Result<Option<Participant>> {
        let participant = sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM round_participants \
             WHERE round_id = $1 AND user_id = $2"
        ))
        .bind(round_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(participant)
    }

    pub async fn list_for_round(&self, round_id: Uuid) -> Result<Vec<Participant>> {
        let mut conn = self.pool.acquire().await?;
        self.list_for_round_on(&mut conn, round_id).await
    }

    pub async fn list_for_round_on(
        &self,
        conn: &mut SqliteConnection,
        round_id: Uuid,
    ) -> Result<Vec<Participant>> {
        let participants = sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM round_participants \
             WHERE round_id = $1 \
             ORDER BY joined_at"
        ))
        .bind(round_id)
        .fetch_all(conn)
        .await?;

        Ok(participants)
    }

    pub async fn create(
        &self,
        round_id: Uuid,
        user_id: Uuid,
        joined_at: DateTime<Utc>,
    ) -> Result<Participant> {
        let participant = sqlx::query_as::<_, Participant>(&format!(
            "INSERT INTO round_participants (id, round_id, user_id, status, joined_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {PARTICIPANT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(round_id)
        .bind(user_id)
        .bind(ParticipantStatus::Active)
        .bind(joined_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(participant)
    }

    pub async fn update_status(
        &self,
        participant_id: Uuid,
        status: ParticipantStatus,
        left_at: Option<DateTime<Utc>>,
    ) -> Result<Participant> {
        let participant = sqlx::query_as::<_, Participant>(&format!(
            "UPDATE round_participants \
             SET status = $2, left_at = $3 \
             WHERE id = $1 \
             RETURNING {PARTICIPANT_COLUMNS}"
        ))
        .bind(participant_id)
        .bind(status)
        .bind(left_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(participant)
    }
}
