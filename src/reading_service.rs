//! Daily activity logging and the derived binary score, plus the
//! calendar and leaderboard views built on top of the log.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::{
    clock::Clock,
    deadline,
    error::{Error, Result},
    models::{ParticipantStatus, ReadingLog},
    repository::{
        LeaderboardRow, ParticipantRepository, ReadingLogRepository, RoundRepository,
    },
};

/// Minutes read on one day at or above this threshold earn the day's
/// point.
pub const SCORE_THRESHOLD_MINUTES: u32 = 30;

const MAX_MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, Clone)]
pub struct LogActivity {
    pub date: NaiveDate,
    pub minutes: u32,
    pub book_finished: bool,
    pub comment: Option<String>,
}

/// One cell of a user's month calendar. Days without a log row come
/// back zeroed so the view always covers the full month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub minutes: u32,
    pub score: u8,
    pub book_finished: bool,
}

#[derive(Debug, Clone)]
pub struct ActivityCalendar {
    pub round_id: Uuid,
    pub user_id: Uuid,
    pub days: Vec<CalendarDay>,
    pub total_minutes: u32,
    pub total_score: i64,
}

pub struct ReadingService {
    rounds: RoundRepository,
    participants: ParticipantRepository,
    reading_logs: ReadingLogRepository,
    clock: Arc<dyn Clock>,
}

impl ReadingService {
    pub fn new(pool: Pool<Sqlite>, clock: Arc<dyn Clock>) -> ReadingService {
        ReadingService {
            rounds: RoundRepository::new(pool.clone()),
            participants: ParticipantRepository::new(pool.clone()),
            reading_logs: ReadingLogRepository::new(pool),
            clock,
        }
    }

    /// Records (or corrects) one day's reading. A repeated call for the
    /// same day overwrites the previous entry.
    ///
    /// The month's last calendar day is a grace day: it may only be
    /// logged on the day itself, before the correction cutoff, and it
    /// always scores zero.
    #[tracing::instrument(skip(self, activity), fields(date = %activity.date))]
    pub async fn log_activity(
        &self,
        round_id: Uuid,
        user_id: Uuid,
        activity: LogActivity,
    ) -> Result<ReadingLog> {
        let round = self
            .rounds
            .get(round_id)
            .await?
            .ok_or(Error::RoundNotFound)?;
        if round.is_closed() {
            return Err(Error::RoundClosed);
        }

        // Leavers may keep logging (and are still scored at close); only
        // an admin removal revokes access to the log.
        let participant = self
            .participants
            .get_for_user(round_id, user_id)
            .await?
            .ok_or(Error::NotAParticipant)?;
        if participant.status == ParticipantStatus::RemovedByAdmin {
            return Err(Error::NotAllowed);
        }

        if activity.minutes > MAX_MINUTES_PER_DAY {
            return Err(Error::InvalidMinutes(activity.minutes));
        }
        if (activity.date.year(), activity.date.month())
            != (round.year, round.month as u32)
        {
            return Err(Error::DateOutsideRound(activity.date));
        }

        let now = self.clock.now_utc();
        let today = deadline::today_in_round_tz(&round, now)?;
        let last_day = deadline::last_day_of_month(&round)?;

        // Once the month is over (or the last-day cutoff has passed) the
        // log is frozen until the round closes on the next tick.
        if deadline::has_month_elapsed(&round, today)
            || deadline::is_past_correction_cutoff(&round, now)?
        {
            return Err(Error::CorrectionOver);
        }
        if activity.date == last_day && today < last_day {
            return Err(Error::LastDayNotReached);
        }

        let score = if activity.date == last_day {
            0
        } else {
            u8::from(activity.minutes >= SCORE_THRESHOLD_MINUTES)
        };

        self.reading_logs
            .upsert(
                round_id,
                user_id,
                activity.date,
                activity.minutes,
                score,
                activity.book_finished,
                activity.comment,
            )
            .await
    }

    /// The user's full month, one cell per calendar day, with running
    /// totals.
    pub async fn calendar_for_user(
        &self,
        round_id: Uuid,
        user_id: Uuid,
    ) -> Result<ActivityCalendar> {
        let round = self
            .rounds
            .get(round_id)
            .await?
            .ok_or(Error::RoundNotFound)?;

        let logs = self.reading_logs.list_for_user(round_id, user_id).await?;

        let day_count = deadline::days_in_month(round.year, round.month)?;
        let mut days = Vec::with_capacity(day_count as usize);
        for day in 1..=day_count {
            let date = NaiveDate::from_ymd_opt(round.year, round.month as u32, day).ok_or(
                Error::InvalidPeriod {
                    year: round.year,
                    month: round.month,
                },
            )?;
            let logged = logs.iter().find(|log| log.date == date);
            days.push(match logged {
                Some(log) => CalendarDay {
                    date,
                    minutes: log.minutes,
                    score: log.score,
                    book_finished: log.book_finished,
                },
                None => CalendarDay {
                    date,
                    minutes: 0,
                    score: 0,
                    book_finished: false,
                },
            });
        }

        Ok(ActivityCalendar {
            round_id,
            user_id,
            total_minutes: days.iter().map(|d| d.minutes).sum(),
            total_score: days.iter().map(|d| d.score as i64).sum(),
            days,
        })
    }

    /// Running standings for the round's active participants.
    pub async fn leaderboard(&self, round_id: Uuid) -> Result<Vec<LeaderboardRow>> {
        self.rounds
            .get(round_id)
            .await?
            .ok_or(Error::RoundNotFound)?;
        self.reading_logs.leaderboard(round_id).await
    }
}
