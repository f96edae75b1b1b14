use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A directed book-exchange obligation created at round close: the giver
/// (a loser) owes a book to the receiver (a winner).
///
/// Each side marks its half of the hand-off independently; there is
/// exactly one legal caller per timestamp, so last-write-wins is fine.
#[derive(FromRow, Clone, Debug)]
pub struct ExchangePair {
    pub id: Uuid,
    pub round_id: Uuid,
    pub giver_user_id: Uuid,
    pub receiver_user_id: Uuid,
    pub giver_marked_given_at: Option<DateTime<Utc>>,
    pub receiver_marked_received_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewExchangePair {
    pub giver_user_id: Uuid,
    pub receiver_user_id: Uuid,
}
