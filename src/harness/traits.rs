//! Seams between the harness and the bot logic under test
//!
//! The turn handler is the only way the harness reaches the external
//! collaborator; middleware wraps it the way a channel adapter pipeline would.

use super::TurnContext;
use crate::error::HarnessError;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Bot logic for one turn
#[async_trait]
pub trait TurnHandler: Send + Sync {
    async fn on_turn(&self, ctx: TurnContext) -> Result<(), HarnessError>;
}

#[async_trait]
impl<F, Fut> TurnHandler for F
where
    F: Fn(TurnContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HarnessError>> + Send + 'static,
{
    async fn on_turn(&self, ctx: TurnContext) -> Result<(), HarnessError> {
        (self)(ctx).await
    }
}

/// Code run around every turn, in registration order
///
/// Call `next.run(ctx)` to continue the pipeline; returning without calling it
/// ends the turn before the handler sees it.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn on_turn(&self, ctx: TurnContext, next: Next<'_>) -> Result<(), HarnessError>;
}

/// Remainder of the middleware pipeline
pub struct Next<'a> {
    middleware: &'a [Arc<dyn Middleware>],
    handler: &'a dyn TurnHandler,
}

impl<'a> Next<'a> {
    pub(crate) fn new(middleware: &'a [Arc<dyn Middleware>], handler: &'a dyn TurnHandler) -> Self {
        Self {
            middleware,
            handler,
        }
    }

    /// Hand the turn to the next middleware, or to the handler after the last
    ///
    /// # Errors
    ///
    /// Propagates the first error raised further down the pipeline.
    pub async fn run(self, ctx: TurnContext) -> Result<(), HarnessError> {
        match self.middleware.split_first() {
            Some((first, rest)) => first.on_turn(ctx, Next::new(rest, self.handler)).await,
            None => self.handler.on_turn(ctx).await,
        }
    }
}
