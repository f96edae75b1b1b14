use chrono::NaiveDate;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Domain error for the round core.
///
/// Every validation or state-precondition failure is surfaced to the
/// caller with a specific variant; the transport layer maps them to
/// responses via [`Error::kind`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("round not found")]
    RoundNotFound,

    #[error("user is not a participant of this round")]
    NotAParticipant,

    #[error("exchange pair not found")]
    PairNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("registration is not open")]
    RoundNotJoinable,

    #[error("already left this round")]
    AlreadyLeft,

    #[error("cannot leave after day {0}")]
    DeadlinePassed(u8),

    #[error("round is closed")]
    RoundClosed,

    #[error("correction period has ended")]
    CorrectionOver,

    #[error("the last day of the month cannot be logged before it arrives")]
    LastDayNotReached,

    #[error("not allowed")]
    NotAllowed,

    #[error("round already exists for this period")]
    RoundAlreadyExists,

    #[error("round has no participants")]
    NoParticipants,

    #[error("minutes out of range: {0}")]
    InvalidMinutes(u32),

    #[error("date {0} is outside the round's month")]
    DateOutsideRound(NaiveDate),

    #[error("invalid period {year}-{month:02}")]
    InvalidPeriod { year: i32, month: u8 },

    #[error("invalid registration deadline day {0}")]
    InvalidDeadlineDay(u8),

    #[error("unknown timezone {0:?}")]
    UnknownTimezone(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Coarse classification exposed to the transport layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidTransition,
    Conflict,
    Validation,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        use Error::*;

        match self {
            RoundNotFound | NotAParticipant | PairNotFound | UserNotFound => ErrorKind::NotFound,

            RoundNotJoinable | AlreadyLeft | DeadlinePassed(_) | RoundClosed | CorrectionOver
            | LastDayNotReached | NotAllowed => ErrorKind::InvalidTransition,

            RoundAlreadyExists | NoParticipants => ErrorKind::Conflict,

            InvalidMinutes(_)
            | DateOutsideRound(_)
            | InvalidPeriod { .. }
            | InvalidDeadlineDay(_)
            | UnknownTimezone(_) => ErrorKind::Validation,

            Database(_) => ErrorKind::Internal,
        }
    }

    /// True when the underlying database rejected a duplicate row. Used as
    /// a backstop behind the explicit existence checks.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db_err)) => {
                db_err.kind() == sqlx::error::ErrorKind::UniqueViolation
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_classify_representative_variants() {
        assert_eq!(Error::RoundNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(Error::DeadlinePassed(10).kind(), ErrorKind::InvalidTransition);
        assert_eq!(Error::RoundAlreadyExists.kind(), ErrorKind::Conflict);
        assert_eq!(Error::NoParticipants.kind(), ErrorKind::Conflict);
        assert_eq!(Error::InvalidMinutes(5000).kind(), ErrorKind::Validation);
    }
}
