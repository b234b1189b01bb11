//! Per-turn view handed to the bot logic

use super::ConversationHarness;
use crate::activity::{Activity, ActivityType, ResourceResponse};
use crate::error::HarnessError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The inbound activity of one turn plus the outbound operations
///
/// Cheap to clone; clones share the `responded` flag.
#[derive(Clone)]
pub struct TurnContext {
    inner: Arc<TurnState>,
}

struct TurnState {
    activity: Activity,
    harness: Arc<ConversationHarness>,
    responded: AtomicBool,
}

impl TurnContext {
    pub(crate) fn new(activity: Activity, harness: Arc<ConversationHarness>) -> Self {
        Self {
            inner: Arc::new(TurnState {
                activity,
                harness,
                responded: AtomicBool::new(false),
            }),
        }
    }

    /// The stamped inbound activity
    pub fn activity(&self) -> &Activity {
        &self.inner.activity
    }

    /// Whether anything other than a delay was sent during this turn
    pub fn responded(&self) -> bool {
        self.inner.responded.load(Ordering::SeqCst)
    }

    /// Owning harness; clone it to send proactively with
    /// [`ConversationHarness::send_proactive`] after the turn ends
    pub fn harness(&self) -> &Arc<ConversationHarness> {
        &self.inner.harness
    }

    /// Send one activity to the user
    ///
    /// Identity fields are overwritten with the harness identity. An id is
    /// minted when the activity has none.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a `delay` without a millisecond value.
    pub async fn send_activity(
        &self,
        activity: Activity,
    ) -> Result<ResourceResponse, HarnessError> {
        let is_delay = activity.activity_type == ActivityType::Delay;
        let response = self
            .inner
            .harness
            .send_outbound(activity, self.inner.activity.id.as_deref())
            .await?;
        if !is_delay {
            self.inner.responded.store(true, Ordering::SeqCst);
        }
        Ok(response)
    }

    /// # Errors
    ///
    /// See [`TurnContext::send_activity`].
    pub async fn send_text(
        &self,
        text: impl Into<String>,
    ) -> Result<ResourceResponse, HarnessError> {
        self.send_activity(Activity::message(text)).await
    }

    /// Send several activities in order; stops at the first failure
    ///
    /// # Errors
    ///
    /// Returns the first error from [`TurnContext::send_activity`].
    pub async fn send_activities(
        &self,
        activities: impl IntoIterator<Item = Activity>,
    ) -> Result<Vec<ResourceResponse>, HarnessError> {
        let mut responses = Vec::new();
        for activity in activities {
            responses.push(self.send_activity(activity).await?);
        }
        Ok(responses)
    }

    /// Replace a previously sent activity that is still queued
    ///
    /// # Errors
    ///
    /// Returns a validation error if `activity` carries no id.
    pub fn update_activity(&self, mut activity: Activity) -> Result<bool, HarnessError> {
        let Some(id) = activity.id.clone() else {
            return Err(HarnessError::validation(
                "activity.id",
                "an update needs the id of the activity it replaces",
            ));
        };
        self.inner.harness.identity().apply_outbound(&mut activity);
        Ok(self.inner.harness.update_outbound(&id, activity))
    }

    /// Retract a previously sent activity that is still queued
    pub fn delete_activity(&self, id: &str) -> bool {
        self.inner.harness.delete_outbound(id)
    }
}

impl std::fmt::Debug for TurnContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnContext")
            .field("activity", &self.inner.activity)
            .field("responded", &self.responded())
            .finish_non_exhaustive()
    }
}
