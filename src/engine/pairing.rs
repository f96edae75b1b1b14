use std::collections::BTreeMap;

use rand::{seq::SliceRandom, Rng};
use uuid::Uuid;

use crate::models::Gender;

/// One participant entering the pairing step, with the recorded gender
/// used for receiver preference.
#[derive(Clone, Copy, Debug)]
pub struct PairingCandidate {
    pub user_id: Uuid,
    pub gender: Option<Gender>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlannedPair {
    pub giver_user_id: Uuid,
    pub receiver_user_id: Uuid,
}

/// Pairs each loser (in ranking order) with a receiving winner.
///
/// Winners sit in per-gender pools, each shuffled once up front with the
/// injected RNG, so two runs may hand out different receivers while
/// cohort membership stays fixed. A loser prefers a winner of the same
/// recorded gender and falls back to any remaining winner. When winners
/// run out, the remaining losers simply get no pair: coverage is partial
/// by design when cohorts are uneven across genders.
pub fn pair_losers_to_winners<R: Rng>(
    losers: &[PairingCandidate],
    winners: &[PairingCandidate],
    rng: &mut R,
) -> Vec<PlannedPair> {
    // BTreeMap keeps the fallback scan order stable, so a pinned seed
    // yields one exact pairing.
    let mut pools: BTreeMap<Option<Gender>, Vec<Uuid>> = BTreeMap::new();
    for winner in winners {
        pools.entry(winner.gender).or_default().push(winner.user_id);
    }
    for pool in pools.values_mut() {
        pool.shuffle(rng);
    }

    let mut pairs = Vec::with_capacity(losers.len().min(winners.len()));

    for loser in losers {
        let preferred = pools.get_mut(&loser.gender).and_then(|pool| pool.pop());
        let receiver = preferred.or_else(|| pools.values_mut().find_map(|pool| pool.pop()));

        let Some(receiver) = receiver else {
            break;
        };

        // Cohorts are disjoint, so a giver can never draw themself.
        debug_assert_ne!(loser.user_id, receiver);

        pairs.push(PlannedPair {
            giver_user_id: loser.user_id,
            receiver_user_id: receiver,
        });
    }

    pairs
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use test_log::test;

    use super::*;

    fn uid(n: u8) -> Uuid {
        Uuid::from_u128(n as u128)
    }

    fn candidate(n: u8, gender: Option<Gender>) -> PairingCandidate {
        PairingCandidate {
            user_id: uid(n),
            gender,
        }
    }

    #[test]
    fn every_giver_appears_at_most_once_and_never_self() {
        let losers: Vec<_> = (1..=5).map(|n| candidate(n, None)).collect();
        let winners: Vec<_> = (6..=10).map(|n| candidate(n, None)).collect();

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let pairs = pair_losers_to_winners(&losers, &winners, &mut rng);

        assert_eq!(pairs.len(), 5);
        let givers: HashSet<_> = pairs.iter().map(|p| p.giver_user_id).collect();
        assert_eq!(givers.len(), pairs.len());
        for pair in &pairs {
            assert_ne!(pair.giver_user_id, pair.receiver_user_id);
        }
    }

    #[test]
    fn gender_preference_wins_when_available() {
        let losers = vec![
            candidate(1, Some(Gender::Female)),
            candidate(2, Some(Gender::Male)),
        ];
        let winners = vec![
            candidate(3, Some(Gender::Male)),
            candidate(4, Some(Gender::Female)),
        ];

        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let pairs = pair_losers_to_winners(&losers, &winners, &mut rng);

        assert_eq!(
            pairs,
            vec![
                PlannedPair {
                    giver_user_id: uid(1),
                    receiver_user_id: uid(4),
                },
                PlannedPair {
                    giver_user_id: uid(2),
                    receiver_user_id: uid(3),
                },
            ]
        );
    }

    #[test]
    fn falls_back_to_any_winner_when_preferred_pool_is_empty() {
        let losers = vec![candidate(1, Some(Gender::Female))];
        let winners = vec![candidate(2, Some(Gender::Male))];

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let pairs = pair_losers_to_winners(&losers, &winners, &mut rng);

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].receiver_user_id, uid(2));
    }

    #[test]
    fn exhausted_winners_leave_remaining_losers_unpaired() {
        let losers: Vec<_> = (1..=4).map(|n| candidate(n, None)).collect();
        let winners = vec![candidate(5, None), candidate(6, None)];

        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let pairs = pair_losers_to_winners(&losers, &winners, &mut rng);

        assert_eq!(pairs.len(), 2);
        // Ranking order: the best-ranked losers get the pairs.
        assert_eq!(pairs[0].giver_user_id, uid(1));
        assert_eq!(pairs[1].giver_user_id, uid(2));
    }

    #[test]
    fn no_winners_means_no_pairs() {
        let losers = vec![candidate(1, None)];
        let pairs = pair_losers_to_winners(&losers, &[], &mut ChaCha8Rng::seed_from_u64(3));
        assert!(pairs.is_empty());
    }

    #[test]
    fn pinned_seed_reproduces_the_exact_pairing() {
        let losers: Vec<_> = (1..=3).map(|n| candidate(n, None)).collect();
        let winners: Vec<_> = (4..=6).map(|n| candidate(n, None)).collect();

        let first =
            pair_losers_to_winners(&losers, &winners, &mut ChaCha8Rng::seed_from_u64(42));
        let second =
            pair_losers_to_winners(&losers, &winners, &mut ChaCha8Rng::seed_from_u64(42));

        assert_eq!(first, second);
    }
}
