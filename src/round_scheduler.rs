//! Periodic background tick that advances round lifecycles.
//!
//! Every interval the scheduler sweeps all rounds that can still move,
//! asks [`lifecycle::decide`] what to do with each, and applies the
//! answer. A failure on one round is logged and the sweep carries on.

use std::sync::Arc;

use sqlx::{Pool, Sqlite};
use tokio::{select, sync::Notify, task::JoinHandle, time::MissedTickBehavior};
use tracing::{error, info, info_span, Instrument};

use crate::{
    clock::Clock,
    error::Result,
    lifecycle::{self, TickAction},
    models::RoundStatus,
    repository::RoundRepository,
    round_service::RoundService,
};

pub const DEFAULT_TICK_INTERVAL_SECONDS: u64 = 60;

/// What one sweep did, for the logs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub examined: usize,
    pub locked: usize,
    pub published: usize,
    pub failed: usize,
}

pub struct RoundScheduler {
    rounds: RoundRepository,
    round_service: Arc<RoundService>,
    clock: Arc<dyn Clock>,
}

impl RoundScheduler {
    pub fn new(
        pool: Pool<Sqlite>,
        round_service: Arc<RoundService>,
        clock: Arc<dyn Clock>,
    ) -> RoundScheduler {
        RoundScheduler {
            rounds: RoundRepository::new(pool),
            round_service,
            clock,
        }
    }

    /// Spawns the tick loop. It runs until `shutdown` is notified.
    pub fn start(self, tick_interval_seconds: u64, shutdown: Arc<Notify>) -> JoinHandle<()> {
        tokio::spawn(
            async move {
                let mut interval =
                    tokio::time::interval(std::time::Duration::from_secs(tick_interval_seconds));
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

                info!("Round scheduler started, ticking every {tick_interval_seconds}s");

                loop {
                    select! {
                        _ = interval.tick() => {
                            match self.sweep().await {
                                Ok(stats) if stats.examined > 0 => {
                                    info!(
                                        "Sweep done: {} examined, {} locked, {} published, {} failed",
                                        stats.examined, stats.locked, stats.published, stats.failed
                                    );
                                }
                                Ok(_) => {}
                                Err(err) => error!("Sweep failed before examining rounds: {err}"),
                            }
                        }

                        _ = shutdown.notified() => {
                            info!("Round scheduler shutting down");
                            break;
                        }
                    }
                }
            }
            .instrument(info_span!("round_scheduler")),
        )
    }

    /// One pass over every round that can still advance. Per-round
    /// failures are recorded and skipped so one bad round cannot stall
    /// the rest; it will be retried on the next tick.
    pub async fn sweep(&self) -> Result<SweepStats> {
        let now = self.clock.now_utc();
        let rounds = self.rounds.list_tickable().await?;

        let mut stats = SweepStats {
            examined: rounds.len(),
            ..SweepStats::default()
        };

        for round in rounds {
            let action = match lifecycle::decide(&round, now) {
                Ok(action) => action,
                Err(err) => {
                    error!("Could not evaluate round {}: {err}", round.id);
                    stats.failed += 1;
                    continue;
                }
            };

            match action {
                TickAction::Keep => {}
                TickAction::Lock => {
                    match self
                        .round_service
                        .set_status(round.id, RoundStatus::Locked)
                        .await
                    {
                        Ok(_) => {
                            info!(
                                "Locked round {} ({}-{:02})",
                                round.id, round.year, round.month
                            );
                            stats.locked += 1;
                        }
                        Err(err) => {
                            error!("Could not lock round {}: {err}", round.id);
                            stats.failed += 1;
                        }
                    }
                }
                TickAction::CloseAndPublish => {
                    match self.round_service.close_round_and_seed_next(&round).await {
                        Ok(summary) => {
                            info!(
                                "Published round {} ({}-{:02}): {} participants, {} pairs",
                                round.id,
                                round.year,
                                round.month,
                                summary.participants,
                                summary.pairs
                            );
                            stats.published += 1;
                        }
                        Err(err) => {
                            error!("Could not close round {}: {err}", round.id);
                            stats.failed += 1;
                        }
                    }
                }
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use test_log::test;
    use uuid::Uuid;

    use crate::{
        clock::FixedClock,
        round_service::{CreateRound, DEFAULT_REGISTRATION_DEADLINE_DAY},
        testing,
    };

    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    struct Fixture {
        scheduler: RoundScheduler,
        rounds: Arc<RoundService>,
        clock: Arc<FixedClock>,
        pool: Pool<Sqlite>,
    }

    async fn fixture(start: DateTime<Utc>) -> Fixture {
        let pool = testing::test_pool().await;
        let clock = Arc::new(FixedClock::new(start));
        let rounds = Arc::new(RoundService::new(pool.clone(), clock.clone()));
        Fixture {
            scheduler: RoundScheduler::new(pool.clone(), rounds.clone(), clock.clone()),
            rounds,
            clock,
            pool,
        }
    }

    async fn open_round(fx: &Fixture, group_id: Uuid, year: i32, month: u8) -> Uuid {
        let round = fx
            .rounds
            .create_round(CreateRound {
                group_id,
                year,
                month,
                timezone: "UTC".to_string(),
                registration_deadline_day: DEFAULT_REGISTRATION_DEADLINE_DAY,
            })
            .await
            .unwrap();
        fx.rounds
            .set_status(round.id, RoundStatus::RegistrationOpen)
            .await
            .unwrap();
        round.id
    }

    #[test(tokio::test)]
    async fn sweep_locks_open_rounds_past_the_deadline() {
        let fx = fixture(at(2026, 3, 2, 9)).await;
        let round_id = open_round(&fx, Uuid::new_v4(), 2026, 3).await;

        // Still within the registration window: untouched.
        let stats = fx.scheduler.sweep().await.unwrap();
        assert_eq!(stats.locked, 0);

        fx.clock.set(at(2026, 3, 11, 0));
        let stats = fx.scheduler.sweep().await.unwrap();
        assert_eq!(stats.locked, 1);
        assert_eq!(
            fx.rounds.get_round(round_id).await.unwrap().status,
            RoundStatus::Locked
        );
    }

    #[test(tokio::test)]
    async fn sweep_publishes_and_seeds_the_next_round_exactly_once() {
        let fx = fixture(at(2026, 3, 2, 9)).await;
        let group_id = Uuid::new_v4();
        let round_id = open_round(&fx, group_id, 2026, 3).await;

        let user = testing::seed_user(&fx.pool, "Aliya", None).await;
        fx.rounds.join(round_id, user.id).await.unwrap();

        fx.clock.set(at(2026, 3, 11, 0));
        fx.scheduler.sweep().await.unwrap();

        fx.clock.set(at(2026, 4, 1, 0));
        let stats = fx.scheduler.sweep().await.unwrap();
        assert_eq!(stats.published, 1);

        let closed = fx.rounds.get_round(round_id).await.unwrap();
        assert_eq!(closed.status, RoundStatus::ResultsPublished);
        assert_eq!(closed.closed_at, Some(at(2026, 4, 1, 0)));

        let april = fx
            .rounds
            .get_by_period(group_id, 2026, 4)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(april.status, RoundStatus::RegistrationOpen);

        // Repeating the sweep changes nothing: the closed round is no
        // longer tickable and April already exists.
        let stats = fx.scheduler.sweep().await.unwrap();
        assert_eq!(stats.published, 0);
        assert_eq!(stats.failed, 0);
        let still_april = fx
            .rounds
            .get_by_period(group_id, 2026, 4)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(still_april.id, april.id);
    }

    #[test(tokio::test)]
    async fn one_failing_round_does_not_stop_the_sweep() {
        let fx = fixture(at(2026, 3, 2, 9)).await;
        // Empty round: closing it fails with NoParticipants.
        let empty_id = open_round(&fx, Uuid::new_v4(), 2026, 3).await;

        let group_id = Uuid::new_v4();
        let busy_id = open_round(&fx, group_id, 2026, 3).await;
        let user = testing::seed_user(&fx.pool, "Bekzat", None).await;
        fx.rounds.join(busy_id, user.id).await.unwrap();

        fx.clock.set(at(2026, 3, 11, 0));
        fx.scheduler.sweep().await.unwrap();

        fx.clock.set(at(2026, 4, 1, 0));
        let stats = fx.scheduler.sweep().await.unwrap();

        assert_eq!(stats.failed, 1);
        assert_eq!(stats.published, 1);
        assert_eq!(
            fx.rounds.get_round(empty_id).await.unwrap().status,
            RoundStatus::Locked
        );
        assert_eq!(
            fx.rounds.get_round(busy_id).await.unwrap().status,
            RoundStatus::ResultsPublished
        );
    }

    #[test(tokio::test)]
    async fn start_stops_on_shutdown_notification() {
        let fx = fixture(at(2026, 3, 2, 9)).await;
        let shutdown = Arc::new(Notify::new());

        let handle = fx.scheduler.start(3600, shutdown.clone());
        // `notify_one` stores a permit, so the signal is not lost even if
        // the loop has not reached its select yet.
        shutdown.notify_one();

        // The loop observes the notification on its next select pass.
        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("scheduler should stop after shutdown")
            .expect("scheduler task should not panic");
    }
}
