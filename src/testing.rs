//! Collaborator fixtures for end-to-end flow tests
//!
//! Stand-ins for the bot logic a real test would plug in: a name prompt with
//! an optional validator, a bot that answers from a background task, and a
//! bot that edits its own replies.

use crate::activity::Activity;
use crate::error::HarnessError;
use crate::harness::{TurnContext, TurnHandler};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Name prompt
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptState {
    Idle,
    AwaitingName,
}

/// Asks for a name, then compliments it
///
/// With a minimum length set, short names are re-prompted instead of
/// accepted.
pub struct NamePromptBot {
    state: Mutex<PromptState>,
    min_len: Option<usize>,
}

impl NamePromptBot {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PromptState::Idle),
            min_len: None,
        }
    }

    /// Only accept names longer than `min_len` characters
    pub fn longer_than(min_len: usize) -> Self {
        Self {
            min_len: Some(min_len),
            ..Self::new()
        }
    }

    fn accepts(&self, name: &str) -> bool {
        self.min_len.map_or(true, |min| name.chars().count() > min)
    }
}

#[async_trait]
impl TurnHandler for NamePromptBot {
    async fn on_turn(&self, ctx: TurnContext) -> Result<(), HarnessError> {
        let name = ctx.activity().text().unwrap_or_default().to_string();

        // Decide under the lock, send after releasing it
        let reply = {
            let mut state = self.state.lock().unwrap();
            match *state {
                PromptState::Idle => {
                    *state = PromptState::AwaitingName;
                    "Please type your name.".to_string()
                }
                PromptState::AwaitingName if self.accepts(&name) => {
                    *state = PromptState::Idle;
                    format!("{name} is a great name!")
                }
                PromptState::AwaitingName => format!(
                    "Please send a name that is longer than {} characters.",
                    self.min_len.unwrap_or_default()
                ),
            }
        };

        ctx.send_text(reply).await?;
        Ok(())
    }
}

// ============================================================================
// Proactive bot
// ============================================================================

/// Acknowledges immediately, then answers from a background task
pub struct ProactiveBot {
    pub delay: Duration,
}

#[async_trait]
impl TurnHandler for ProactiveBot {
    async fn on_turn(&self, ctx: TurnContext) -> Result<(), HarnessError> {
        ctx.send_text("working on it").await?;

        let harness = Arc::clone(ctx.harness());
        let text = ctx.activity().text().unwrap_or_default().to_uppercase();
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = harness.send_proactive(Activity::message(text)).await {
                tracing::error!(error = %e, "Proactive send failed");
            }
        });
        Ok(())
    }
}

// ============================================================================
// Editing bot
// ============================================================================

/// Sends a draft and a footer, rewrites the draft and retracts the footer
pub async fn editing_bot(ctx: TurnContext) -> Result<(), HarnessError> {
    let draft = ctx.send_text("draft answer").await?;
    let footer = ctx.send_text("(thinking...)").await?;

    let updated = ctx.update_activity(Activity::message("final answer").with_id(draft.id))?;
    if !updated {
        return Err(HarnessError::turn("draft vanished before update"));
    }
    if !ctx.delete_activity(&footer.id) {
        return Err(HarnessError::turn("footer vanished before delete"));
    }
    Ok(())
}

/// Types, pauses via a delay activity, then answers
pub async fn typing_bot(ctx: TurnContext) -> Result<(), HarnessError> {
    ctx.send_activities([
        Activity::typing(),
        Activity::delay(Duration::from_millis(50)),
        Activity::message("thanks for waiting"),
    ])
    .await?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ActivityType;
    use crate::config::HarnessConfig;
    use crate::flow::TestFlow;
    use crate::harness::ConversationHarness;
    use std::time::Instant;

    fn harness() -> Arc<ConversationHarness> {
        crate::telemetry::init_logging();
        Arc::new(ConversationHarness::new())
    }

    #[tokio::test]
    async fn test_name_prompt() {
        TestFlow::new(harness(), NamePromptBot::new())
            .send("hello")
            .assert_reply("Please type your name.")
            .send("John")
            .assert_reply("John is a great name!")
            .send("Hi again")
            .assert_reply("Please type your name.")
            .send("1")
            .assert_reply("1 is a great name!")
            .start_test()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_name_prompt_retries_short_name() {
        TestFlow::new(harness(), NamePromptBot::longer_than(3))
            .send("hello")
            .assert_reply("Please type your name.")
            .send("hi")
            .assert_reply("Please send a name that is longer than 3 characters.")
            .send("John")
            .assert_reply("John is a great name!")
            .start_test()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_name_prompt_with_test_sugar() {
        TestFlow::new(harness(), NamePromptBot::longer_than(3))
            .test("hello", "Please type your name.")
            .test("hi", "Please send a name that is longer than 3 characters.")
            .test("John", "John is a great name!")
            .start_test()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_wrong_expectation_names_both_texts() {
        let err = TestFlow::new(harness(), NamePromptBot::new())
            .send("hello")
            .assert_reply_within("What is your name?", Some("prompt"), Duration::from_secs(1))
            .start_test()
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("prompt: Text should match"));
        assert!(message.contains("What is your name?"));
        assert!(message.contains("Please type your name."));
    }

    #[tokio::test]
    async fn test_proactive_reply_arrives_within_timeout() {
        let bot = ProactiveBot {
            delay: Duration::from_millis(50),
        };
        TestFlow::new(harness(), bot)
            .send("status")
            .assert_reply("working on it")
            .assert_reply("STATUS")
            .start_test()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_proactive_reply_is_stamped_for_the_bot() {
        let harness = harness();
        let identity = harness.identity().clone();
        let bot = ProactiveBot {
            delay: Duration::from_millis(10),
        };
        TestFlow::new(Arc::clone(&harness), bot)
            .send("status")
            .assert_reply("working on it")
            .assert_reply_matches("proactive identity", move |reply: &Activity| {
                let id_ok = reply.id.as_deref().is_some_and(|id| !id.is_empty());
                if id_ok
                    && reply.from.as_ref() == Some(&identity.bot)
                    && reply.recipient.as_ref() == Some(&identity.user)
                    && reply.conversation.as_ref() == Some(&identity.conversation)
                    && reply.text() == Some("STATUS")
                {
                    Ok(())
                } else {
                    Err(HarnessError::assertion(format!("bad proactive reply {reply:?}")))
                }
            })
            .start_test()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_proactive_reply_too_late_times_out() {
        let bot = ProactiveBot {
            delay: Duration::from_millis(500),
        };
        let config = HarnessConfig::default().with_reply_timeout(Duration::from_millis(50));
        let err = TestFlow::new(harness(), bot)
            .with_config(config)
            .send("status")
            .assert_reply("working on it")
            .assert_reply("STATUS")
            .start_test()
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_edited_replies() {
        let harness = harness();
        TestFlow::new(Arc::clone(&harness), editing_bot)
            .send("question")
            .assert_reply("final answer")
            .start_test()
            .await
            .unwrap();
        assert!(harness.pending_replies().is_empty());
    }

    #[tokio::test]
    async fn test_delay_activity_is_never_a_reply() {
        let start = Instant::now();
        TestFlow::new(harness(), typing_bot)
            .send("hi")
            .assert_reply(Activity::typing())
            .assert_reply("thanks for waiting")
            .start_test()
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_replies_carry_harness_identity() {
        let harness = harness();
        let identity = harness.identity().clone();
        TestFlow::new(Arc::clone(&harness), NamePromptBot::new())
            .send("hello")
            .assert_reply_matches("identity", move |reply: &Activity| {
                let stamped = reply.channel_id.as_deref() == Some(identity.channel_id.as_str())
                    && reply.conversation.as_ref() == Some(&identity.conversation)
                    && reply.from.as_ref() == Some(&identity.bot)
                    && reply.activity_type == ActivityType::Message;
                if stamped {
                    Ok(())
                } else {
                    Err(HarnessError::assertion(format!("bad identity on {reply:?}")))
                }
            })
            .start_test()
            .await
            .unwrap();
    }
}
