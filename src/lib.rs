//! Turn harness - deterministic conversation-turn simulation for bot tests
//!
//! Plays both the channel (user) and the adapter (bot transport) for one
//! fixed conversation: simulated user activities go in, the bot's turn
//! handler runs, and its replies are queued so a [`TestFlow`] can assert on
//! them in the order they were sent.

// Getters and constructors are plain data access; flagging each one is noise
#![allow(clippy::must_use_candidate)]
// Public names read as `turn_harness::HarnessConfig`, not `config::Config`
#![allow(clippy::module_name_repetitions)]

pub mod activity;
pub mod config;
pub mod error;
pub mod flow;
pub mod harness;
pub mod telemetry;

#[cfg(test)]
mod testing;

pub use activity::{
    Activity, ActivityType, ChannelAccount, ConversationAccount, ConversationIdentity,
    ResourceResponse,
};
pub use config::HarnessConfig;
pub use error::HarnessError;
pub use flow::{ExpectedReply, TestFlow};
pub use harness::{ConversationHarness, Middleware, Next, ReplyQueue, TurnContext, TurnHandler};
