//! Fluent, immutable test flows
//!
//! A flow is a chain of deferred steps. Each builder call returns a new flow
//! whose completion awaits the receiver's completion first, so steps run in
//! the order written and a failure skips everything after it. Completions are
//! shared: branching two flows off a common prefix runs the prefix once, and
//! awaiting a finished flow again returns the cached outcome.
//!
//! ```no_run
//! # async fn run() -> Result<(), turn_harness::HarnessError> {
//! use std::sync::Arc;
//! use turn_harness::{ConversationHarness, HarnessError, TestFlow, TurnContext};
//!
//! async fn greeter(ctx: TurnContext) -> Result<(), HarnessError> {
//!     ctx.send_text("Please type your name.").await?;
//!     Ok(())
//! }
//!
//! TestFlow::new(Arc::new(ConversationHarness::new()), greeter)
//!     .send("hello")
//!     .assert_reply("Please type your name.")
//!     .start_test()
//!     .await
//! # }
//! ```

mod expect;
mod step;


pub use expect::ExpectedReply;

use crate::activity::Activity;
use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::harness::{ConversationHarness, TurnHandler};
use futures::future::{self, BoxFuture, FutureExt, Shared};
use std::sync::Arc;
use std::time::Duration;
use step::Step;

type Completion = Shared<BoxFuture<'static, Result<(), HarnessError>>>;

/// One link of a test flow: everything before it plus its own step
#[derive(Clone)]
pub struct TestFlow {
    harness: Arc<ConversationHarness>,
    handler: Arc<dyn TurnHandler>,
    config: HarnessConfig,
    completion: Completion,
    depth: usize,
}

impl TestFlow {
    /// Empty flow driving `handler` through `harness`
    ///
    /// Timing comes from [`HarnessConfig::from_env`]; override it per flow
    /// with [`TestFlow::with_config`].
    pub fn new(harness: Arc<ConversationHarness>, handler: impl TurnHandler + 'static) -> Self {
        Self {
            harness,
            handler: Arc::new(handler),
            config: HarnessConfig::from_env(),
            completion: future::ready(Ok(())).boxed().shared(),
            depth: 0,
        }
    }

    /// Timing for steps added after this call
    #[must_use]
    pub fn with_config(&self, config: HarnessConfig) -> Self {
        Self {
            config,
            ..self.clone()
        }
    }

    pub fn harness(&self) -> &Arc<ConversationHarness> {
        &self.harness
    }

    /// Number of steps in the chain
    pub fn len(&self) -> usize {
        self.depth
    }

    pub fn is_empty(&self) -> bool {
        self.depth == 0
    }

    fn then(&self, step: Step) -> Self {
        let previous = self.completion.clone();
        let harness = Arc::clone(&self.harness);
        let handler = Arc::clone(&self.handler);
        let poll_interval = self.config.poll_interval;
        let index = self.depth + 1;

        let completion = async move {
            previous.await?;

            let kind = step.kind();
            tracing::debug!(step = index, kind, "Flow step started");
            let result = step.run(&harness, handler.as_ref(), poll_interval).await;
            match &result {
                Ok(()) => tracing::debug!(step = index, kind, "Flow step passed"),
                Err(e) => tracing::warn!(step = index, kind, error = %e, "Flow step failed"),
            }
            result
        }
        .boxed()
        .shared();

        self.link(completion)
    }

    /// Link that fails on its own, before any earlier step runs
    fn reject(&self, error: HarnessError) -> Self {
        tracing::warn!(error = %error, "Flow step rejected");
        self.link(future::ready(Err(error)).boxed().shared())
    }

    fn link(&self, completion: Completion) -> Self {
        Self {
            harness: Arc::clone(&self.harness),
            handler: Arc::clone(&self.handler),
            config: self.config,
            completion,
            depth: self.depth + 1,
        }
    }

    /// User sends a text message
    #[must_use]
    pub fn send(&self, text: impl Into<String>) -> Self {
        self.then(Step::SendText(text.into()))
    }

    /// User sends a prepared activity; identity and id are restamped
    #[must_use]
    pub fn send_activity(&self, activity: Activity) -> Self {
        self.then(Step::SendActivity(activity))
    }

    /// Pause the flow
    #[must_use]
    pub fn delay(&self, duration: Duration) -> Self {
        self.then(Step::Delay(duration))
    }

    /// Next reply must match `expected`, within the configured timeout
    #[must_use]
    pub fn assert_reply(&self, expected: impl Into<ExpectedReply>) -> Self {
        self.assert_reply_within(expected, None, self.config.reply_timeout)
    }

    #[must_use]
    pub fn assert_reply_within(
        &self,
        expected: impl Into<ExpectedReply>,
        description: Option<&str>,
        timeout: Duration,
    ) -> Self {
        let expected = expected.into();
        let description = description.map_or_else(|| expected.describe(), ToString::to_string);
        let expected = match expected {
            ExpectedReply::Text(text) => self.harness.make_activity(Some(&text)),
            ExpectedReply::Activity(activity) => activity,
        };
        self.then(Step::AssertReply {
            validate: expect::matches_activity(expected, description.clone()),
            description,
            timeout,
        })
    }

    /// Next reply must satisfy `validate`; its error becomes the flow's error
    #[must_use]
    pub fn assert_reply_matches<F>(&self, description: &str, validate: F) -> Self
    where
        F: Fn(&Activity) -> Result<(), HarnessError> + Send + Sync + 'static,
    {
        self.assert_reply_matches_within(description, validate, self.config.reply_timeout)
    }

    #[must_use]
    pub fn assert_reply_matches_within<F>(
        &self,
        description: &str,
        validate: F,
        timeout: Duration,
    ) -> Self
    where
        F: Fn(&Activity) -> Result<(), HarnessError> + Send + Sync + 'static,
    {
        self.then(Step::AssertReply {
            validate: Arc::new(validate),
            description: description.to_string(),
            timeout,
        })
    }

    /// Next reply's text must equal one of `candidates`
    #[must_use]
    pub fn assert_reply_one_of(&self, candidates: &[&str]) -> Self {
        self.assert_reply_one_of_within(candidates, None, self.config.reply_timeout)
    }

    #[must_use]
    pub fn assert_reply_one_of_within(
        &self,
        candidates: &[&str],
        description: Option<&str>,
        timeout: Duration,
    ) -> Self {
        if candidates.is_empty() {
            return self.reject(HarnessError::validation(
                "candidates",
                "at least one candidate reply is required",
            ));
        }

        let candidates: Vec<String> = candidates.iter().map(ToString::to_string).collect();
        let step_description = description
            .map_or_else(|| format!("one of {candidates:?}"), ToString::to_string);
        self.then(Step::AssertReply {
            validate: expect::one_of(candidates, description.map(ToString::to_string)),
            description: step_description,
            timeout,
        })
    }

    /// `send(user_says)` then `assert_reply(expected)`
    #[must_use]
    pub fn test(&self, user_says: impl Into<String>, expected: impl Into<ExpectedReply>) -> Self {
        self.send(user_says).assert_reply(expected)
    }

    #[must_use]
    pub fn test_within(
        &self,
        user_says: impl Into<String>,
        expected: impl Into<ExpectedReply>,
        description: Option<&str>,
        timeout: Duration,
    ) -> Self {
        self.send(user_says).assert_reply_within(expected, description, timeout)
    }

    /// `send(user_says)` then `assert_reply_matches(description, validate)`
    #[must_use]
    pub fn test_matches<F>(
        &self,
        user_says: impl Into<String>,
        description: &str,
        validate: F,
    ) -> Self
    where
        F: Fn(&Activity) -> Result<(), HarnessError> + Send + Sync + 'static,
    {
        self.send(user_says).assert_reply_matches(description, validate)
    }

    /// Run the flow and report the first failure, if any
    ///
    /// Nothing runs until this is awaited. Awaiting it again, or awaiting a
    /// flow that shares this prefix, does not re-run finished steps.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any step.
    pub async fn start_test(&self) -> Result<(), HarnessError> {
        let result = self.completion.clone().await;
        match &result {
            Ok(()) => tracing::info!(steps = self.depth, "Flow passed"),
            Err(e) => tracing::info!(steps = self.depth, error = %e, "Flow failed"),
        }
        result
    }
}

impl std::fmt::Debug for TestFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestFlow")
            .field("steps", &self.depth)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
