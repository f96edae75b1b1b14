mod exchange_pair;
mod participant;
mod reading_log;
mod round;
mod round_result;
mod user;

pub use exchange_pair::{ExchangePair, NewExchangePair};
pub use participant::{Participant, ParticipantStatus};
pub use reading_log::ReadingLog;
pub use round::{NewRound, Round, RoundStatus};
pub use round_result::{Cohort, NewRoundResult, RoundResult};
pub use user::{Gender, NewUser, SystemRole, User};
