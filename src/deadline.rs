//! Deadline evaluation for a round.
//!
//! Every time-gated decision in the crate goes through this module. All
//! comparisons happen in the round's own time zone, never the caller's.
//! Everything here is a pure function of its inputs.

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;

use crate::{
    error::{Error, Result},
    models::Round,
};

/// Local hour (inclusive) at which the last-day correction window ends.
pub const CORRECTION_CUTOFF_HOUR: u32 = 20;

/// Resolves the round's IANA zone name.
pub fn round_tz(round: &Round) -> Result<Tz> {
    round
        .timezone
        .parse()
        .map_err(|_| Error::UnknownTimezone(round.timezone.clone()))
}

/// "Now" converted into the round's zone.
pub fn local_now(round: &Round, now_utc: DateTime<Utc>) -> Result<DateTime<Tz>> {
    Ok(now_utc.with_timezone(&round_tz(round)?))
}

/// Today's calendar date as seen from the round's zone.
pub fn today_in_round_tz(round: &Round, now_utc: DateTime<Utc>) -> Result<NaiveDate> {
    Ok(local_now(round, now_utc)?.date_naive())
}

pub fn days_in_month(year: i32, month: u8) -> Result<u32> {
    let first = first_of_month(year, month)?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let next_first = first_of_month(next_year, next_month)?;
    Ok((next_first - first).num_days() as u32)
}

/// Calendar last day of the round's month.
pub fn last_day_of_month(round: &Round) -> Result<NaiveDate> {
    let last = days_in_month(round.year, round.month)?;
    NaiveDate::from_ymd_opt(round.year, round.month as u32, last).ok_or(Error::InvalidPeriod {
        year: round.year,
        month: round.month,
    })
}

/// True while joining and leaving are still allowed: the local day of
/// month has not passed `registration_deadline_day`.
pub fn is_before_join_deadline(round: &Round, today: NaiveDate) -> bool {
    today.day() <= round.registration_deadline_day as u32
}

/// True on the last calendar day of the round's month, strictly before
/// the correction cutoff hour of that day (round-local).
pub fn is_within_correction_window(round: &Round, now_utc: DateTime<Utc>) -> Result<bool> {
    let local = local_now(round, now_utc)?;
    let last_day = last_day_of_month(round)?;
    Ok(local.date_naive() == last_day && local.hour() < CORRECTION_CUTOFF_HOUR)
}

/// True once the wall-clock date is strictly after the round's month.
pub fn has_month_elapsed(round: &Round, today: NaiveDate) -> bool {
    (today.year(), today.month()) > (round.year, round.month as u32)
}

/// True on the last calendar day once the round-local clock reaches the
/// correction cutoff hour. Used by the lifecycle tick.
pub fn is_past_correction_cutoff(round: &Round, now_utc: DateTime<Utc>) -> Result<bool> {
    let local = local_now(round, now_utc)?;
    let last_day = last_day_of_month(round)?;
    Ok(local.date_naive() == last_day && local.hour() >= CORRECTION_CUTOFF_HOUR)
}

fn first_of_month(year: i32, month: u8) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month as u32, 1).ok_or(Error::InvalidPeriod { year, month })
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};
    use test_log::test;
    use uuid::Uuid;

    use crate::models::RoundStatus;

    use super::*;

    fn round(year: i32, month: u8, deadline_day: u8, tz: &str) -> Round {
        Round {
            id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            year,
            month,
            status: RoundStatus::RegistrationOpen,
            registration_deadline_day: deadline_day,
            timezone: tz.to_string(),
            started_at: None,
            closed_at: None,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn join_deadline_holds_on_the_deadline_day() {
        let rnd = round(2026, 3, 10, "UTC");
        assert!(is_before_join_deadline(&rnd, date(2026, 3, 10)));
        assert!(!is_before_join_deadline(&rnd, date(2026, 3, 11)));
    }

    #[test]
    fn last_day_of_month_handles_lengths_and_leap_years() {
        assert_eq!(
            last_day_of_month(&round(2026, 3, 10, "UTC")).unwrap(),
            date(2026, 3, 31)
        );
        assert_eq!(
            last_day_of_month(&round(2026, 4, 10, "UTC")).unwrap(),
            date(2026, 4, 30)
        );
        assert_eq!(
            last_day_of_month(&round(2026, 2, 10, "UTC")).unwrap(),
            date(2026, 2, 28)
        );
        assert_eq!(
            last_day_of_month(&round(2028, 2, 10, "UTC")).unwrap(),
            date(2028, 2, 29)
        );
    }

    #[test]
    fn correction_window_is_last_day_before_cutoff() {
        let rnd = round(2026, 3, 10, "UTC");

        assert!(!is_within_correction_window(&rnd, utc(2026, 3, 30, 12, 0)).unwrap());
        assert!(is_within_correction_window(&rnd, utc(2026, 3, 31, 0, 0)).unwrap());
        assert!(is_within_correction_window(&rnd, utc(2026, 3, 31, 19, 59)).unwrap());
        assert!(!is_within_correction_window(&rnd, utc(2026, 3, 31, 20, 0)).unwrap());
    }

    #[test]
    fn correction_window_uses_the_round_zone() {
        // 15:30 UTC on March 31 is 20:30 in Almaty (UTC+5): window over
        // there, still open for a UTC round.
        let almaty = round(2026, 3, 10, "Asia/Almaty");
        let utc_round = round(2026, 3, 10, "UTC");
        let now = utc(2026, 3, 31, 15, 30);

        assert!(!is_within_correction_window(&almaty, now).unwrap());
        assert!(is_within_correction_window(&utc_round, now).unwrap());
    }

    #[test]
    fn local_date_can_differ_from_utc_date() {
        // 21:00 UTC on March 31 is already April 1 in Almaty.
        let rnd = round(2026, 3, 10, "Asia/Almaty");
        let today = today_in_round_tz(&rnd, utc(2026, 3, 31, 21, 0)).unwrap();
        assert_eq!(today, date(2026, 4, 1));
        assert!(has_month_elapsed(&rnd, today));
    }

    #[test]
    fn month_elapsed_is_strict() {
        let rnd = round(2026, 3, 10, "UTC");
        assert!(!has_month_elapsed(&rnd, date(2026, 3, 31)));
        assert!(has_month_elapsed(&rnd, date(2026, 4, 1)));
        assert!(has_month_elapsed(&rnd, date(2027, 1, 1)));

        let december = round(2026, 12, 10, "UTC");
        assert!(!has_month_elapsed(&december, date(2026, 12, 31)));
        assert!(has_month_elapsed(&december, date(2027, 1, 1)));
    }

    #[test]
    fn unknown_zone_is_rejected() {
        let rnd = round(2026, 3, 10, "Mars/Olympus_Mons");
        assert!(matches!(round_tz(&rnd), Err(Error::UnknownTimezone(_))));
    }
}
