use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum::Display;
use uuid::Uuid;

/// One user's membership record within a specific round.
#[derive(FromRow, Clone, Debug)]
pub struct Participant {
    pub id: Uuid,
    pub round_id: Uuid,
    pub user_id: Uuid,
    pub status: ParticipantStatus,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, sqlx::Type, Display, Serialize, Deserialize,
)]
#[sqlx(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Active,
    LeftBeforeDeadline,
    Locked,
    PenaltyLeft,
    RemovedByAdmin,
}

impl Participant {
    /// Admin-removed participants are excluded from scoring and pairing.
    pub fn counts_for_results(&self) -> bool {
        self.status != ParticipantStatus::RemovedByAdmin
    }
}
