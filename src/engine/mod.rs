//! Scoring, ranking and pairing for a round that is ready to close.
//!
//! Pure computation over in-memory data; the service layer feeds it
//! aggregated scores and persists its output.

mod pairing;
mod ranking;

pub use pairing::{pair_losers_to_winners, PairingCandidate, PlannedPair};
pub use ranking::{rank_participants, RankedParticipant, ScoredParticipant};
