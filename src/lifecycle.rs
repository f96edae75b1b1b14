//! Pure tick-decision logic for the round lifecycle.
//!
//! The scheduler asks `decide` what to do with a round at a given
//! instant and applies the answer elsewhere, so this logic is testable
//! without a clock or a store.

use chrono::{DateTime, Utc};

use crate::{
    deadline,
    error::Result,
    models::{Round, RoundStatus},
};

/// What the periodic tick should do with one round right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickAction {
    /// Nothing to do.
    Keep,
    /// Registration deadline has passed: move to `Locked`.
    Lock,
    /// The month is over (fully elapsed, or last day at/after the
    /// correction cutoff): compute results, publish, seed next round.
    CloseAndPublish,
}

pub fn decide(round: &Round, now_utc: DateTime<Utc>) -> Result<TickAction> {
    match round.status {
        RoundStatus::RegistrationOpen => {
            let today = deadline::today_in_round_tz(round, now_utc)?;
            // The month-elapsed check catches a round that slept through
            // its own month (scheduler downtime): the day of month alone
            // would look like a fresh registration window again.
            if !deadline::is_before_join_deadline(round, today)
                || deadline::has_month_elapsed(round, today)
            {
                Ok(TickAction::Lock)
            } else {
                Ok(TickAction::Keep)
            }
        }
        RoundStatus::Locked => {
            let today = deadline::today_in_round_tz(round, now_utc)?;
            if deadline::has_month_elapsed(round, today)
                || deadline::is_past_correction_cutoff(round, now_utc)?
            {
                Ok(TickAction::CloseAndPublish)
            } else {
                Ok(TickAction::Keep)
            }
        }
        RoundStatus::Draft | RoundStatus::Closed | RoundStatus::ResultsPublished => {
            Ok(TickAction::Keep)
        }
    }
}

/// The period following `(year, month)`, wrapping December into January.
pub fn next_period(year: i32, month: u8) -> (i32, u8) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}
