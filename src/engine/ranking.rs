use uuid::Uuid;

use crate::{
    error::{Error, Result},
    models::Cohort,
};

/// Aggregated input to ranking: one entry per eligible participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoredParticipant {
    pub user_id: Uuid,
    pub total_score: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RankedParticipant {
    pub user_id: Uuid,
    pub total_score: i64,
    pub rank: u32,
    pub cohort: Cohort,
}

/// Ranks participants descending by total score, ties broken by
/// ascending user id so the order is total and reproducible. Ranks are
/// dense 1..N; the top `floor(N/2)` form the winner cohort and the rest
/// (including the odd one out) are losers.
pub fn rank_participants(mut entries: Vec<ScoredParticipant>) -> Result<Vec<RankedParticipant>> {
    if entries.is_empty() {
        return Err(Error::NoParticipants);
    }

    entries.sort_by(|a, b| {
        b.total_score
            .cmp(&a.total_score)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });

    let winner_count = entries.len() / 2;

    Ok(entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| RankedParticipant {
            user_id: entry.user_id,
            total_score: entry.total_score,
            rank: (index + 1) as u32,
            cohort: if index < winner_count {
                Cohort::Winner
            } else {
                Cohort::Loser
            },
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn uid(n: u8) -> Uuid {
        Uuid::from_u128(n as u128)
    }

    fn scored(pairs: &[(u8, i64)]) -> Vec<ScoredParticipant> {
        pairs
            .iter()
            .map(|&(n, total_score)| ScoredParticipant {
                user_id: uid(n),
                total_score,
            })
            .collect()
    }

    #[test]
    fn empty_input_is_a_conflict() {
        assert!(matches!(
            rank_participants(Vec::new()),
            Err(Error::NoParticipants)
        ));
    }

    #[test]
    fn five_participants_with_ties_rank_deterministically() {
        // Scores [10, 10, 5, 3, 3] for users u1..u5: winners are the top
        // two by score then id, the tied tail is ordered by id.
        let ranked =
            rank_participants(scored(&[(3, 5), (5, 3), (1, 10), (4, 3), (2, 10)])).unwrap();

        let order: Vec<_> = ranked.iter().map(|r| r.user_id).collect();
        assert_eq!(order, vec![uid(1), uid(2), uid(3), uid(4), uid(5)]);

        let ranks: Vec<_> = ranked.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);

        let cohorts: Vec<_> = ranked.iter().map(|r| r.cohort).collect();
        assert_eq!(
            cohorts,
            vec![
                Cohort::Winner,
                Cohort::Winner,
                Cohort::Loser,
                Cohort::Loser,
                Cohort::Loser,
            ]
        );
    }

    #[test]
    fn winner_count_is_floor_of_half() {
        for n in 1..=7u8 {
            let entries = scored(&(1..=n).map(|i| (i, i as i64)).collect::<Vec<_>>());
            let ranked = rank_participants(entries).unwrap();

            let winners = ranked.iter().filter(|r| r.cohort == Cohort::Winner).count();
            let losers = ranked.iter().filter(|r| r.cohort == Cohort::Loser).count();
            assert_eq!(winners, n as usize / 2);
            assert_eq!(winners + losers, n as usize);
        }
    }

    #[test]
    fn single_participant_is_a_loser() {
        let ranked = rank_participants(scored(&[(1, 42)])).unwrap();
        assert_eq!(ranked[0].cohort, Cohort::Loser);
        assert_eq!(ranked[0].rank, 1);
    }

    #[test]
    fn ranking_is_idempotent_for_unchanged_input() {
        let entries = scored(&[(1, 4), (2, 4), (3, 9), (4, 0)]);
        let first = rank_participants(entries.clone()).unwrap();
        let second = rank_participants(entries).unwrap();
        assert_eq!(first, second);
    }
}
