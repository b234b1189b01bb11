//! In-process stand-in for a channel and its adapter
//!
//! Owns one fixed conversation identity, mints activity ids, routes inbound
//! activities through the middleware pipeline into the turn handler, and
//! keeps the bot's replies in order until a test asserts on them.

mod context;
mod reply_queue;
mod traits;


pub use context::TurnContext;
pub use reply_queue::ReplyQueue;
pub use traits::{Middleware, Next, TurnHandler};

use crate::activity::{Activity, ConversationIdentity, ResourceResponse};
use crate::error::HarnessError;
use std::sync::{Arc, Mutex, PoisonError};

/// Simulated channel + adapter for a single conversation
///
/// Id minting and reply queue mutation are guarded by separate locks so a
/// background send never waits on an inbound submission and vice versa.
pub struct ConversationHarness {
    identity: ConversationIdentity,
    next_id: Mutex<u64>,
    replies: ReplyQueue,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl Default for ConversationHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationHarness {
    /// Harness with the synthetic `test` channel identity
    pub fn new() -> Self {
        Self::build(ConversationIdentity::default())
    }

    /// Harness bound to a caller supplied identity
    ///
    /// # Errors
    ///
    /// Returns a validation error if the identity has no channel or
    /// conversation id.
    pub fn with_identity(identity: ConversationIdentity) -> Result<Self, HarnessError> {
        identity.validate()?;
        Ok(Self::build(identity))
    }

    fn build(identity: ConversationIdentity) -> Self {
        tracing::debug!(
            channel = %identity.channel_id,
            conversation = %identity.conversation.id,
            "Conversation harness created"
        );
        Self {
            identity,
            next_id: Mutex::new(0),
            replies: ReplyQueue::new(),
            middleware: Vec::new(),
        }
    }

    /// Append a middleware; they run in registration order around the handler
    #[must_use]
    pub fn with_middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    pub fn identity(&self) -> &ConversationIdentity {
        &self.identity
    }

    /// Mint the next activity id
    pub(crate) fn next_id(&self) -> String {
        let mut next = self.next_id.lock().unwrap_or_else(PoisonError::into_inner);
        let id = *next;
        *next += 1;
        id.to_string()
    }

    /// Message activity from the user, with a fresh id
    pub fn make_activity(&self, text: Option<&str>) -> Activity {
        let mut activity = Activity {
            text: text.map(ToString::to_string),
            ..Activity::default()
        };
        self.identity.apply_inbound(&mut activity);
        activity.id = Some(self.next_id());
        activity
    }

    /// Run one turn for an activity from the user
    ///
    /// Identity fields, a fresh id and a timestamp are stamped in a single
    /// critical section, so concurrent submissions get ids in the order they
    /// entered it. Resolves when the handler finishes.
    ///
    /// # Errors
    ///
    /// Propagates any error from a middleware or the handler.
    pub async fn submit_inbound(
        self: &Arc<Self>,
        mut activity: Activity,
        handler: &dyn TurnHandler,
    ) -> Result<(), HarnessError> {
        {
            let mut next = self.next_id.lock().unwrap_or_else(PoisonError::into_inner);
            self.identity.apply_inbound(&mut activity);
            activity.id = Some(next.to_string());
            activity.timestamp = Some(chrono::Utc::now());
            *next += 1;
        }

        tracing::debug!(
            activity_id = activity.id.as_deref().unwrap_or_default(),
            activity_type = %activity.activity_type,
            text = activity.text.as_deref().unwrap_or_default(),
            "Processing inbound activity"
        );

        let ctx = TurnContext::new(activity, Arc::clone(self));
        let result = Next::new(&self.middleware, handler).run(ctx).await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Turn failed");
        }
        result
    }

    /// `make_activity` followed by `submit_inbound`
    ///
    /// # Errors
    ///
    /// Propagates any error from a middleware or the handler.
    pub async fn send_text_to_bot(
        self: &Arc<Self>,
        text: &str,
        handler: &dyn TurnHandler,
    ) -> Result<(), HarnessError> {
        let activity = self.make_activity(Some(text));
        self.submit_inbound(activity, handler).await
    }

    /// Send an activity from the bot outside of any turn
    ///
    /// Stamped like a turn reply: bot-to-user identity, a fresh id unless the
    /// activity brings one, and a timestamp. The returned id is the handle for
    /// later updates and deletes.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a `delay` without a millisecond value.
    pub async fn send_proactive(
        &self,
        activity: Activity,
    ) -> Result<ResourceResponse, HarnessError> {
        self.send_outbound(activity, None).await
    }

    /// Stamp an outbound activity and hand it to `record_outbound`
    pub(crate) async fn send_outbound(
        &self,
        mut activity: Activity,
        reply_to: Option<&str>,
    ) -> Result<ResourceResponse, HarnessError> {
        self.identity.apply_outbound(&mut activity);
        let id = match &activity.id {
            Some(id) => id.clone(),
            None => {
                let id = self.next_id();
                activity.id = Some(id.clone());
                id
            }
        };
        if let Some(reply_to) = reply_to {
            activity.reply_to_id = Some(reply_to.to_string());
        }
        activity.timestamp = Some(chrono::Utc::now());

        self.record_outbound(activity).await?;
        Ok(ResourceResponse { id })
    }

    /// Accept an already stamped activity from the bot
    ///
    /// A `delay` activity pauses the caller for its value in milliseconds and
    /// is dropped; anything else joins the tail of the reply queue.
    pub(crate) async fn record_outbound(&self, activity: Activity) -> Result<(), HarnessError> {
        if let Some(delay) = activity.delay_duration()? {
            tracing::debug!(delay_ms = %delay.as_millis(), "Delay activity");
            tokio::time::sleep(delay).await;
            return Ok(());
        }

        tracing::debug!(
            activity_id = activity.id.as_deref().unwrap_or_default(),
            activity_type = %activity.activity_type,
            "Reply queued"
        );
        self.replies.push(activity);
        Ok(())
    }

    /// Replace the first queued reply with this id
    pub fn update_outbound(&self, id: &str, activity: Activity) -> bool {
        let found = self.replies.replace(id, activity);
        tracing::debug!(activity_id = id, found, "Update reply");
        found
    }

    /// Remove the first queued reply with this id
    pub fn delete_outbound(&self, id: &str) -> bool {
        let found = self.replies.remove(id);
        tracing::debug!(activity_id = id, found, "Delete reply");
        found
    }

    /// Take the oldest reply, if any
    pub fn pop_next_reply(&self) -> Option<Activity> {
        self.replies.pop()
    }

    /// Non-destructive view of the queued replies, oldest first
    pub fn pending_replies(&self) -> Vec<Activity> {
        self.replies.snapshot()
    }

    /// Always fails: the harness models exactly one fixed conversation
    ///
    /// # Errors
    ///
    /// Always returns [`HarnessError::NotImplemented`].
    #[allow(clippy::unused_self)] // Adapter surface parity
    pub fn create_conversation(&self) -> Result<(), HarnessError> {
        Err(HarnessError::NotImplemented("create_conversation"))
    }
}
