use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum::Display;
use uuid::Uuid;

/// One month-long competition instance for a group.
///
/// At most one round exists per `(group_id, year, month)`; the schema
/// enforces this with a unique constraint.
#[derive(FromRow, Clone, Debug)]
pub struct Round {
    pub id: Uuid,
    pub group_id: Uuid,
    pub year: i32,
    pub month: u8,
    pub status: RoundStatus,
    /// Day of the month (1-31) until which joining and leaving are allowed.
    pub registration_deadline_day: u8,
    /// IANA zone name; all deadline math for this round happens in it.
    pub timezone: String,
    pub started_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewRound {
    pub group_id: Uuid,
    pub year: i32,
    pub month: u8,
    pub status: RoundStatus,
    pub registration_deadline_day: u8,
    pub timezone: String,
    pub started_at: Option<DateTime<Utc>>,
}

/// Linear lifecycle; `ResultsPublished` is terminal. The next period gets
/// a fresh `Round` row, never a reset of the old one.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, sqlx::Type, Display, Serialize, Deserialize,
)]
#[sqlx(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    Draft,
    RegistrationOpen,
    Locked,
    Closed,
    ResultsPublished,
}

impl Round {
    pub fn is_closed(&self) -> bool {
        matches!(
            self.status,
            RoundStatus::Closed | RoundStatus::ResultsPublished
        )
    }
}
