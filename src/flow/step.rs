//! Deferred operations a flow runs in order

use crate::activity::Activity;
use crate::error::HarnessError;
use crate::harness::{ConversationHarness, TurnHandler};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Check applied to a popped reply
pub(crate) type Validator = Arc<dyn Fn(&Activity) -> Result<(), HarnessError> + Send + Sync>;

pub(crate) enum Step {
    SendText(String),
    SendActivity(Activity),
    Delay(Duration),
    AssertReply {
        validate: Validator,
        description: String,
        timeout: Duration,
    },
}

impl Step {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::SendText(_) => "send_text",
            Self::SendActivity(_) => "send_activity",
            Self::Delay(_) => "delay",
            Self::AssertReply { .. } => "assert_reply",
        }
    }

    pub(crate) async fn run(
        self,
        harness: &Arc<ConversationHarness>,
        handler: &dyn TurnHandler,
        poll_interval: Duration,
    ) -> Result<(), HarnessError> {
        match self {
            Self::SendText(text) => harness.send_text_to_bot(&text, handler).await,
            Self::SendActivity(activity) => harness.submit_inbound(activity, handler).await,
            Self::Delay(duration) => {
                tokio::time::sleep(duration).await;
                Ok(())
            }
            Self::AssertReply {
                validate,
                description,
                timeout,
            } => {
                let reply = next_reply(harness, &description, timeout, poll_interval).await?;
                // Popped before validation: a mismatch discards the reply
                validate(&reply)
            }
        }
    }
}

/// Pop the oldest reply, sleeping between empty checks until `timeout`
async fn next_reply(
    harness: &ConversationHarness,
    description: &str,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Activity, HarnessError> {
    let start = Instant::now();
    loop {
        if let Some(reply) = harness.pop_next_reply() {
            return Ok(reply);
        }
        if start.elapsed() > timeout {
            return Err(HarnessError::timeout(timeout, description));
        }
        tokio::time::sleep(poll_interval).await;
    }
}
