//! Activities and the conversation identity stamped onto them
//!
//! Field names follow the channel wire format (`type`, `serviceUrl`,
//! `replyToId`, ...) so fixtures can be written as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::error::HarnessError;

/// Kind of activity exchanged between user and bot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityType {
    #[default]
    Message,
    Typing,
    Event,
    ConversationUpdate,
    EndOfConversation,
    /// Transport hint: pause for `value` milliseconds. Consumed by the
    /// harness, never queued as a reply.
    Delay,
}

impl ActivityType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Typing => "typing",
            Self::Event => "event",
            Self::ConversationUpdate => "conversationUpdate",
            Self::EndOfConversation => "endOfConversation",
            Self::Delay => "delay",
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user or bot account on the channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelAccount {
    pub id: String,
    pub name: String,
}

impl ChannelAccount {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// The conversation an activity belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationAccount {
    #[serde(default)]
    pub is_group: bool,
    pub id: String,
    pub name: String,
}

impl ConversationAccount {
    pub fn new(is_group: bool, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            is_group,
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Fixed channel/user/bot/conversation identity of one harness
///
/// Override individual fields with struct update syntax; the rest fall back
/// to the synthetic test identity:
///
/// ```
/// use turn_harness::ConversationIdentity;
///
/// let identity = ConversationIdentity {
///     channel_id: "emulator".to_string(),
///     ..ConversationIdentity::default()
/// };
/// assert_eq!(identity.service_url, "https://test.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationIdentity {
    pub channel_id: String,
    pub service_url: String,
    pub user: ChannelAccount,
    pub bot: ChannelAccount,
    pub conversation: ConversationAccount,
}

impl Default for ConversationIdentity {
    fn default() -> Self {
        Self {
            channel_id: "test".to_string(),
            service_url: "https://test.com".to_string(),
            user: ChannelAccount::new("user1", "User1"),
            bot: ChannelAccount::new("bot", "Bot"),
            conversation: ConversationAccount::new(false, "convo1", "Conversation1"),
        }
    }
}

impl ConversationIdentity {
    /// Reject identities that cannot address a conversation
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the empty field.
    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.channel_id.is_empty() {
            return Err(HarnessError::validation("channel_id", "must not be empty"));
        }
        if self.conversation.id.is_empty() {
            return Err(HarnessError::validation(
                "conversation.id",
                "must not be empty",
            ));
        }
        Ok(())
    }

    /// Stamp the user-to-bot direction onto an activity
    pub(crate) fn apply_inbound(&self, activity: &mut Activity) {
        self.apply_common(activity);
        activity.from = Some(self.user.clone());
        activity.recipient = Some(self.bot.clone());
    }

    /// Stamp the bot-to-user direction onto an activity
    pub(crate) fn apply_outbound(&self, activity: &mut Activity) {
        self.apply_common(activity);
        activity.from = Some(self.bot.clone());
        activity.recipient = Some(self.user.clone());
    }

    fn apply_common(&self, activity: &mut Activity) {
        activity.channel_id = Some(self.channel_id.clone());
        activity.service_url = Some(self.service_url.clone());
        activity.conversation = Some(self.conversation.clone());
    }
}

/// A single message or event exchanged between simulated user and bot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type", default)]
    pub activity_type: ActivityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Free-form payload; for `delay` activities the pause in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Activity {
    pub fn new(activity_type: ActivityType) -> Self {
        Self {
            activity_type,
            ..Self::default()
        }
    }

    pub fn message(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::new(ActivityType::Message)
        }
    }

    pub fn typing() -> Self {
        Self::new(ActivityType::Typing)
    }

    pub fn delay(duration: Duration) -> Self {
        let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        Self {
            value: Some(Value::from(ms)),
            ..Self::new(ActivityType::Delay)
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn is_message(&self) -> bool {
        self.activity_type == ActivityType::Message
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Pause requested by a `delay` activity
    ///
    /// Returns `Ok(None)` for every other activity type.
    ///
    /// # Errors
    ///
    /// Returns a validation error when a `delay` has no non-negative integer
    /// `value`.
    pub fn delay_duration(&self) -> Result<Option<Duration>, HarnessError> {
        if self.activity_type != ActivityType::Delay {
            return Ok(None);
        }
        self.value
            .as_ref()
            .and_then(Value::as_u64)
            .map(|ms| Some(Duration::from_millis(ms)))
            .ok_or_else(|| {
                HarnessError::validation(
                    "value",
                    "delay activity needs a non-negative integer millisecond value",
                )
            })
    }
}

/// Handle returned for a sent activity, used later to update or delete it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceResponse {
    pub id: String,
}
