//! Round lifecycle commands and queries: creation, status transitions,
//! participation, and the close/publish computation.

use std::{collections::HashMap, sync::Arc};

use chrono_tz::Tz;
use rand::{rngs::StdRng, SeedableRng};
use sqlx::{Pool, Sqlite};
use tracing::info;
use uuid::Uuid;

use crate::{
    clock::Clock,
    deadline,
    engine::{self, PairingCandidate, RankedParticipant, ScoredParticipant},
    error::{Error, Result},
    lifecycle,
    models::{
        NewExchangePair, NewRound, NewRoundResult, Participant, ParticipantStatus, Round,
        RoundStatus,
    },
    repository::{
        ExchangePairRepository, PairWithNames, ParticipantRepository, ReadingLogRepository,
        ResultRepository, ResultWithName, RoundRepository, UserRepository,
    },
};

pub const DEFAULT_REGISTRATION_DEADLINE_DAY: u8 = 10;

#[derive(Debug, Clone)]
pub struct CreateRound {
    pub group_id: Uuid,
    pub year: i32,
    pub month: u8,
    pub timezone: String,
    pub registration_deadline_day: u8,
}

/// What one result computation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSummary {
    pub round_id: Uuid,
    pub participants: usize,
    pub winners: usize,
    pub losers: usize,
    pub pairs: usize,
}

/// Published outcome of a round, resolved to display names for the
/// reporting layer.
#[derive(Debug, Clone)]
pub struct RoundResultsView {
    pub round_id: Uuid,
    pub year: i32,
    pub month: u8,
    pub results: Vec<ResultWithName>,
    pub pairs: Vec<PairWithNames>,
}

pub struct RoundService {
    pool: Pool<Sqlite>,
    rounds: RoundRepository,
    participants: ParticipantRepository,
    reading_logs: ReadingLogRepository,
    users: UserRepository,
    results: ResultRepository,
    pairs: ExchangePairRepository,
    clock: Arc<dyn Clock>,
}

impl RoundService {
    pub fn new(pool: Pool<Sqlite>, clock: Arc<dyn Clock>) -> RoundService {
        RoundService {
            rounds: RoundRepository::new(pool.clone()),
            participants: ParticipantRepository::new(pool.clone()),
            reading_logs: ReadingLogRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            results: ResultRepository::new(pool.clone()),
            pairs: ExchangePairRepository::new(pool.clone()),
            pool,
            clock,
        }
    }

    pub async fn get_round(&self, round_id: Uuid) -> Result<Round> {
        self.rounds.get(round_id).await?.ok_or(Error::RoundNotFound)
    }

    pub async fn get_by_period(
        &self,
        group_id: Uuid,
        year: i32,
        month: u8,
    ) -> Result<Option<Round>> {
        self.rounds.get_by_period(group_id, year, month).await
    }

    pub async fn list_for_group(&self, group_id: Uuid, limit: i64) -> Result<Vec<Round>> {
        self.rounds.list_for_group(group_id, limit).await
    }

    pub async fn get_last_completed(&self, group_id: Uuid) -> Result<Option<Round>> {
        self.rounds.get_last_completed(group_id).await
    }

    pub async fn get_participant(&self, round_id: Uuid, user_id: Uuid) -> Result<Participant> {
        self.participants
            .get_for_user(round_id, user_id)
            .await?
            .ok_or(Error::NotAParticipant)
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_round(&self, create: CreateRound) -> Result<Round> {
        if !(1..=12).contains(&create.month) {
            return Err(Error::InvalidPeriod {
                year: create.year,
                month: create.month,
            });
        }
        if !(1..=31).contains(&create.registration_deadline_day) {
            return Err(Error::InvalidDeadlineDay(create.registration_deadline_day));
        }
        create
            .timezone
            .parse::<Tz>()
            .map_err(|_| Error::UnknownTimezone(create.timezone.clone()))?;

        if self
            .rounds
            .get_by_period(create.group_id, create.year, create.month)
            .await?
            .is_some()
        {
            return Err(Error::RoundAlreadyExists);
        }

        self.rounds
            .create(NewRound {
                group_id: create.group_id,
                year: create.year,
                month: create.month,
                status: RoundStatus::Draft,
                registration_deadline_day: create.registration_deadline_day,
                timezone: create.timezone,
                started_at: None,
            })
            .await
            // The unique constraint backstops a concurrent create.
            .map_err(|err| {
                if err.is_unique_violation() {
                    Error::RoundAlreadyExists
                } else {
                    err
                }
            })
    }

    /// Admin transition. Unconditional beyond existence; stamps
    /// `started_at`/`closed_at` on first entry into the relevant states.
    #[tracing::instrument(skip(self))]
    pub async fn set_status(&self, round_id: Uuid, status: RoundStatus) -> Result<Round> {
        let round = self.get_round(round_id).await?;
        let now = self.clock.now_utc();

        let started_at = match status {
            RoundStatus::RegistrationOpen => round.started_at.or(Some(now)),
            _ => round.started_at,
        };
        let closed_at = match status {
            RoundStatus::Closed | RoundStatus::ResultsPublished => round.closed_at.or(Some(now)),
            _ => round.closed_at,
        };

        self.rounds
            .update_status(round_id, status, started_at, closed_at)
            .await
    }

    /// Joining is idempotent: an already-active participant is returned
    /// as-is, and one who left (or was removed) is reactivated.
    #[tracing::instrument(skip(self))]
    pub async fn join(&self, round_id: Uuid, user_id: Uuid) -> Result<Participant> {
        let round = self.get_round(round_id).await?;
        if round.status != RoundStatus::RegistrationOpen {
            return Err(Error::RoundNotJoinable);
        }
        self.users.get(user_id).await?.ok_or(Error::UserNotFound)?;

        match self.participants.get_for_user(round_id, user_id).await? {
            None => {
                self.participants
                    .create(round_id, user_id, self.clock.now_utc())
                    .await
            }
            Some(participant)
                if matches!(
                    participant.status,
                    ParticipantStatus::LeftBeforeDeadline | ParticipantStatus::RemovedByAdmin
                ) =>
            {
                self.participants
                    .update_status(participant.id, ParticipantStatus::Active, None)
                    .await
            }
            Some(participant) => Ok(participant),
        }
    }

    /// Leaving is only allowed while the participant is active and the
    /// registration deadline has not passed in the round's zone.
    #[tracing::instrument(skip(self))]
    pub async fn leave(&self, round_id: Uuid, user_id: Uuid) -> Result<Participant> {
        let round = self.get_round(round_id).await?;

        let participant = self
            .participants
            .get_for_user(round_id, user_id)
            .await?
            .ok_or(Error::NotAParticipant)?;

        if participant.status != ParticipantStatus::Active {
            return Err(Error::AlreadyLeft);
        }

        let now = self.clock.now_utc();
        let today = deadline::today_in_round_tz(&round, now)?;
        if !deadline::is_before_join_deadline(&round, today) {
            return Err(Error::DeadlinePassed(round.registration_deadline_day));
        }

        self.participants
            .update_status(
                participant.id,
                ParticipantStatus::LeftBeforeDeadline,
                Some(now),
            )
            .await
    }

    /// Admin removal; the participant is excluded from scoring from then
    /// on but the row is kept.
    #[tracing::instrument(skip(self))]
    pub async fn remove_participant(&self, round_id: Uuid, user_id: Uuid) -> Result<Participant> {
        self.get_round(round_id).await?;

        let participant = self
            .participants
            .get_for_user(round_id, user_id)
            .await?
            .ok_or(Error::NotAParticipant)?;

        self.participants
            .update_status(
                participant.id,
                ParticipantStatus::RemovedByAdmin,
                Some(self.clock.now_utc()),
            )
            .await
    }

    pub async fn get_round_results(&self, round_id: Uuid) -> Result<RoundResultsView> {
        let round = self.get_round(round_id).await?;

        Ok(RoundResultsView {
            round_id,
            year: round.year,
            month: round.month,
            results: self.results.list_for_round_with_names(round_id).await?,
            pairs: self.pairs.list_for_round_with_names(round_id).await?,
        })
    }

    /// Manual (admin) result computation. Idempotent: wipes and rewrites
    /// Results and ExchangePairs every call. Does not seed the next
    /// period's round; that is the automatic tick's job.
    #[tracing::instrument(skip(self))]
    pub async fn compute_and_publish_results(&self, round_id: Uuid) -> Result<RoundSummary> {
        let round = self.get_round(round_id).await?;
        self.publish(&round, false).await
    }

    /// Automatic close path: same computation, then seeds the next
    /// period's round in `registration_open` unless it already exists.
    #[tracing::instrument(skip(self, round), fields(round_id = %round.id))]
    pub async fn close_round_and_seed_next(&self, round: &Round) -> Result<RoundSummary> {
        self.publish(round, true).await
    }

    /// One transaction for the whole close: results, pairs, status flip
    /// and (optionally) the next round either all land or none do.
    async fn publish(&self, round: &Round, seed_next: bool) -> Result<RoundSummary> {
        let now = self.clock.now_utc();
        let mut tx = self.pool.begin().await?;

        let participants = self
            .participants
            .list_for_round_on(&mut tx, round.id)
            .await?;
        let eligible: Vec<&Participant> = participants
            .iter()
            .filter(|p| p.counts_for_results())
            .collect();
        if eligible.is_empty() {
            return Err(Error::NoParticipants);
        }

        let scores: HashMap<Uuid, i64> = self
            .reading_logs
            .aggregate_scores_on(&mut tx, round.id)
            .await?
            .into_iter()
            .collect();

        let user_ids: Vec<Uuid> = eligible.iter().map(|p| p.user_id).collect();
        let genders: HashMap<Uuid, _> = self
            .users
            .get_by_ids_on(&mut tx, &user_ids)
            .await?
            .into_iter()
            .map(|user| (user.id, user.gender))
            .collect();

        let ranked = engine::rank_participants(
            user_ids
                .iter()
                .map(|&user_id| ScoredParticipant {
                    user_id,
                    total_score: scores.get(&user_id).copied().unwrap_or(0),
                })
                .collect(),
        )?;

        let candidate = |user_id: Uuid| PairingCandidate {
            user_id,
            gender: genders.get(&user_id).copied().flatten(),
        };
        let (winners, losers): (Vec<&RankedParticipant>, Vec<&RankedParticipant>) = ranked
            .iter()
            .partition(|r| r.cohort == crate::models::Cohort::Winner);
        let winner_candidates: Vec<_> = winners.iter().map(|r| candidate(r.user_id)).collect();
        let loser_candidates: Vec<_> = losers.iter().map(|r| candidate(r.user_id)).collect();

        let mut rng = StdRng::from_entropy();
        let planned =
            engine::pair_losers_to_winners(&loser_candidates, &winner_candidates, &mut rng);

        let new_results: Vec<NewRoundResult> = ranked
            .iter()
            .map(|r| NewRoundResult {
                user_id: r.user_id,
                total_score: r.total_score,
                rank: r.rank,
                cohort: r.cohort,
            })
            .collect();
        self.results
            .replace_for_round(&mut tx, round.id, &new_results, now)
            .await?;

        let new_pairs: Vec<NewExchangePair> = planned
            .iter()
            .map(|p| NewExchangePair {
                giver_user_id: p.giver_user_id,
                receiver_user_id: p.receiver_user_id,
            })
            .collect();
        self.pairs
            .replace_for_round(&mut tx, round.id, &new_pairs)
            .await?;

        self.rounds
            .update_status_on(
                &mut tx,
                round.id,
                RoundStatus::ResultsPublished,
                round.started_at,
                round.closed_at.or(Some(now)),
            )
            .await?;

        if seed_next {
            let (next_year, next_month) = lifecycle::next_period(round.year, round.month);
            let existing = self
                .rounds
                .get_by_period_on(&mut tx, round.group_id, next_year, next_month)
                .await?;
            if existing.is_none() {
                self.rounds
                    .insert(
                        &mut tx,
                        NewRound {
                            group_id: round.group_id,
                            year: next_year,
                            month: next_month,
                            status: RoundStatus::RegistrationOpen,
                            registration_deadline_day: round.registration_deadline_day,
                            timezone: round.timezone.clone(),
                            started_at: Some(now),
                        },
                    )
                    .await?;
                info!(
                    "Seeded next round {next_year}-{next_month:02} for group {}",
                    round.group_id
                );
            }
        }

        tx.commit().await?;

        Ok(RoundSummary {
            round_id: round.id,
            participants: ranked.len(),
            winners: winner_candidates.len(),
            losers: loser_candidates.len(),
            pairs: planned.len(),
        })
    }
}
