//! Exchange obligations after a round closes: each pair's giver and
//! receiver independently confirm their side of the handover.

use std::sync::Arc;

use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::{
    clock::Clock,
    error::{Error, Result},
    models::ExchangePair,
    repository::ExchangePairRepository,
};

pub struct ExchangeService {
    pairs: ExchangePairRepository,
    clock: Arc<dyn Clock>,
}

impl ExchangeService {
    pub fn new(pool: Pool<Sqlite>, clock: Arc<dyn Clock>) -> ExchangeService {
        ExchangeService {
            pairs: ExchangePairRepository::new(pool),
            clock,
        }
    }

    pub async fn get_pair(&self, pair_id: Uuid) -> Result<ExchangePair> {
        self.pairs.get(pair_id).await?.ok_or(Error::PairNotFound)
    }

    /// Pairs the user sits on, giving or receiving.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ExchangePair>> {
        self.pairs.list_for_user(user_id).await
    }

    pub async fn list_for_round(&self, round_id: Uuid) -> Result<Vec<ExchangePair>> {
        self.pairs.list_for_round(round_id).await
    }

    /// Giver-only confirmation. The first call stamps the time; repeats
    /// keep the original stamp.
    #[tracing::instrument(skip(self))]
    pub async fn mark_given(&self, pair_id: Uuid, user_id: Uuid) -> Result<ExchangePair> {
        let pair = self.get_pair(pair_id).await?;
        if pair.giver_user_id != user_id {
            return Err(Error::NotAllowed);
        }
        if pair.giver_marked_given_at.is_some() {
            return Ok(pair);
        }

        self.pairs.mark_given(pair_id, self.clock.now_utc()).await
    }

    /// Receiver-only confirmation, same stamping rule as [`mark_given`].
    ///
    /// [`mark_given`]: ExchangeService::mark_given
    #[tracing::instrument(skip(self))]
    pub async fn mark_received(&self, pair_id: Uuid, user_id: Uuid) -> Result<ExchangePair> {
        let pair = self.get_pair(pair_id).await?;
        if pair.receiver_user_id != user_id {
            return Err(Error::NotAllowed);
        }
        if pair.receiver_marked_received_at.is_some() {
            return Ok(pair);
        }

        self.pairs
            .mark_received(pair_id, self.clock.now_utc())
            .await
    }
}
