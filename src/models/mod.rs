mod channel;
mod conversation;
mod message;
mod relatedness;
mod stats;

pub use channel::{Channel, Community, StatisticsTable};
pub use conversation::Conversation;
pub(crate) use message::is_special_token;
pub use message::{Message, Timestamp, parse_conversation_label};
pub use relatedness::{CandidatePair, NEUTRAL_PROBABILITY, Relatedness, RelatednessLookup, weight};
pub use stats::{ChannelStats, Statistics, Stats, Timings};
