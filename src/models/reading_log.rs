use chrono::NaiveDate;
use sqlx::FromRow;
use uuid::Uuid;

/// One user's logged reading for one calendar day within a round.
///
/// `score` is derived from `minutes` (1 if at least 30, else 0) with the
/// exception of the month's last day, which always scores 0. At most one
/// log exists per `(round_id, user_id, date)`; re-logging overwrites.
#[derive(FromRow, Clone, Debug)]
pub struct ReadingLog {
    pub id: Uuid,
    pub round_id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub minutes: u32,
    pub score: u8,
    pub book_finished: bool,
    pub comment: Option<String>,
}
