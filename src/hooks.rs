//! Before-hooks and per-status error handlers.
//!
//! Before-hooks run, in registration order, for every request that matched a
//! route. Any hook may return [`HandlerError::Abort`] to skip the remaining
//! hooks and the handler. Error handlers are keyed by status code; the last one
//! registered for a code wins.

use std::collections::HashMap;
use std::sync::Arc;

use crate::context::RequestContext;
use crate::dispatcher::HandlerResponse;
use crate::error::HandlerError;

/// Runs before the matched handler.
pub trait BeforeHook: Send + Sync + 'static {
    /// # Errors
    ///
    /// An `Err` stops the pipeline and routes the request to the error path.
    fn before(&self, ctx: &mut RequestContext) -> Result<(), HandlerError>;
}

impl<F> BeforeHook for F
where
    F: Fn(&mut RequestContext) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    fn before(&self, ctx: &mut RequestContext) -> Result<(), HandlerError> {
        self(ctx)
    }
}

/// Builds the response for one status code.
pub trait ErrorHandler: Send + Sync + 'static {
    fn handle(&self, ctx: &RequestContext) -> HandlerResponse;
}

impl<F> ErrorHandler for F
where
    F: Fn(&RequestContext) -> HandlerResponse + Send + Sync + 'static,
{
    fn handle(&self, ctx: &RequestContext) -> HandlerResponse {
        self(ctx)
    }
}

#[derive(Default, Clone)]
pub struct HookRegistry {
    before: Vec<Arc<dyn BeforeHook>>,
    errors: HashMap<u16, Arc<dyn ErrorHandler>>,
}

impl HookRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_before_handle(&mut self, hook: Arc<dyn BeforeHook>) {
        self.before.push(hook);
    }

    /// Install `handler` for `status`, returning the handler it replaced.
    pub fn add_error_handle(
        &mut self,
        status: u16,
        handler: Arc<dyn ErrorHandler>,
    ) -> Option<Arc<dyn ErrorHandler>> {
        self.errors.insert(status, handler)
    }

    /// Snapshot of the before-hooks in registration order.
    ///
    /// Callers run the snapshot without holding any registry lock, so a hook
    /// may itself register further hooks without deadlocking.
    #[must_use]
    pub fn before_hooks(&self) -> Vec<Arc<dyn BeforeHook>> {
        self.before.clone()
    }

    #[must_use]
    pub fn error_handler(&self, status: u16) -> Option<Arc<dyn ErrorHandler>> {
        self.errors.get(&status).cloned()
    }

    #[must_use]
    pub fn before_count(&self) -> usize {
        self.before.len()
    }
}
