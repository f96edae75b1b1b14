mod exchange_pair_repository;
mod participant_repository;
mod reading_log_repository;
mod result_repository;
mod round_repository;
mod user_repository;

pub use exchange_pair_repository::{ExchangePairRepository, PairWithNames};
pub use participant_repository::ParticipantRepository;
pub use reading_log_repository::{LeaderboardRow, ReadingLogRepository};
pub use result_repository::{ResultRepository, ResultWithName};
pub use round_repository::RoundRepository;
pub use user_repository::UserRepository;
