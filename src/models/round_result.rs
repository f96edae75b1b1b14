use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum::Display;
use uuid::Uuid;

/// The computed outcome for one participant of a finished round.
///
/// Results are derived artifacts: recomputing a round replaces all of
/// them wholesale, they are never patched row by row.
#[derive(FromRow, Clone, Debug)]
pub struct RoundResult {
    pub id: Uuid,
    pub round_id: Uuid,
    pub user_id: Uuid,
    pub total_score: i64,
    /// Dense 1..N ranking; ties are broken by ascending user id.
    pub rank: u32,
    pub cohort: Cohort,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRoundResult {
    pub user_id: Uuid,
    pub total_score: i64,
    pub rank: u32,
    pub cohort: Cohort,
}

/// Winner/loser classification assigned at result computation. The top
/// `floor(N/2)` ranked participants win; an odd N yields one extra loser.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, sqlx::Type, Display, Serialize, Deserialize,
)]
#[sqlx(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Cohort {
    Winner,
    Loser,
}
