use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Sqlite, SqliteConnection};
use uuid::Uuid;

use crate::{
    error::Result,
    models::{ExchangePair, NewExchangePair},
};

const PAIR_COLUMNS: &str = "id, round_id, giver_user_id, receiver_user_id, \
     giver_marked_given_at, receiver_marked_received_at";

#[derive(FromRow, Clone, Debug)]
pub struct PairWithNames {
    pub id: Uuid,
    pub giver_user_id: Uuid,
    pub giver_name: String,
    pub receiver_user_id: Uuid,
    pub receiver_name: String,
}

#[derive(Debug, Clone)]
pub struct ExchangePairRepository {
    pool: Pool<Sqlite>,
}

impl ExchangePairRepository {
    pub fn new(pool: Pool<Sqlite>) -> ExchangePairRepository {
        ExchangePairRepository { pool }
    }

    pub async fn get(&self, pair_id: Uuid) -> Result<Option<ExchangePair>> {
        let pair = sqlx::query_as::<_, ExchangePair>(&format!(
            "SELECT {PAIR_COLUMNS} FROM exchange_pairs WHERE id = $1"
        ))
        .bind(pair_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(pair)
    }

    /// Pairs where the user is involved on either side.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ExchangePair>> {
        let pairs = sqlx::query_as::<_, ExchangePair>(&format!(
            "SELECT {PAIR_COLUMNS} FROM exchange_pairs \
             WHERE giver_user_id = $1 OR receiver_user_id = $1"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(pairs)
    }

    pub async fn list_for_round(&self, round_id: Uuid) -> Result<Vec<ExchangePair>> {
        let pairs = sqlx::query_as::<_, ExchangePair>(&format!(
            "SELECT {PAIR_COLUMNS} FROM exchange_pairs WHERE round_id = $1"
        ))
        .bind(round_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(pairs)
    }

    pub async fn list_for_round_with_names(&self, round_id: Uuid) -> Result<Vec<PairWithNames>> {
        let rows = sqlx::query_as::<_, PairWithNames>(
            "SELECT
                 p.id AS id,
                 p.giver_user_id AS giver_user_id,
                 giver.display_name AS giver_name,
                 p.receiver_user_id AS receiver_user_id,
                 receiver.display_name AS receiver_name
             FROM exchange_pairs p
             JOIN users giver ON giver.id = p.giver_user_id
             JOIN users receiver ON receiver.id = p.receiver_user_id
             WHERE p.round_id = $1",
        )
        .bind(round_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Wipes and rewrites the round's pairs inside the caller's
    /// transaction.
    pub async fn replace_for_round(
        &self,
        conn: &mut SqliteConnection,
        round_id: Uuid,
        pairs: &[NewExchangePair],
    ) -> Result<()> {
        sqlx::query("DELETE FROM exchange_pairs WHERE round_id = $1")
            .bind(round_id)
            .execute(&mut *conn)
            .await?;

        for pair in pairs {
            sqlx::query(
                "INSERT INTO exchange_pairs (id, round_id, giver_user_id, receiver_user_id) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(Uuid::new_v4())
            .bind(round_id)
            .bind(pair.giver_user_id)
            .bind(pair.receiver_user_id)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    pub async fn mark_given(&self, pair_id: Uuid, at: DateTime<Utc>) -> Result<ExchangePair> {
        let pair = sqlx::query_as::<_, ExchangePair>(&format!(
            "UPDATE exchange_pairs \
             SET giver_marked_given_at = $2 \
             WHERE id = $1 \
             RETURNING {PAIR_COLUMNS}"
        ))
        .bind(pair_id)
        .bind(at)
        .fetch_one(&self.pool)
        .await?;

        Ok(pair)
    }

    pub async fn mark_received(&self, pair_id: Uuid, at: DateTime<Utc>) -> Result<ExchangePair> {
        let pair = sqlx::query_as::<_, ExchangePair>(&format!(
            "UPDATE exchange_pairs \
             SET receiver_marked_received_at = $2 \
             WHERE id = $1 \
             RETURNING {PAIR_COLUMNS}"
        ))
        .bind(pair_id)
        .bind(at)
        .fetch_one(&self.pool)
        .await?;

        Ok(pair)
    }
}
