//! Request-scoped error bag.
//!
//! The dispatcher attaches one bag per request; handlers append the typed
//! GitHub errors they swallow, and middleware reads the bag afterwards for
//! observability. The bag lives in the request context, so a handler that
//! fans out keeps appending through the same protected lists.

use crate::error::{GraphQlError, RawHttpError, RestError};
use gh_tools_core::{RequestContext, ToolError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct ErrorBag {
    rest: Mutex<Vec<RestError>>,
    graphql: Mutex<Vec<GraphQlError>>,
    raw: Mutex<Vec<RawHttpError>>,
}

impl ErrorBag {
    /// Attach a fresh bag to the context. Re-opening a context that already
    /// carries a bag resets all three lists so nested dispatches don't leak
    /// errors across calls.
    pub fn attach(ctx: &RequestContext) -> Arc<ErrorBag> {
        if let Some(existing) = ctx.get::<Arc<ErrorBag>>() {
            existing.reset();
            return existing;
        }
        let bag = Arc::new(ErrorBag::default());
        ctx.insert(Arc::clone(&bag));
        bag
    }

    /// The bag attached to this context, if the dispatcher opened one.
    pub fn from_ctx(ctx: &RequestContext) -> Option<Arc<ErrorBag>> {
        ctx.get::<Arc<ErrorBag>>()
    }

    pub fn push_rest(&self, err: RestError) {
        lock(&self.rest).push(err);
    }

    pub fn push_graphql(&self, err: GraphQlError) {
        lock(&self.graphql).push(err);
    }

    pub fn push_raw(&self, err: RawHttpError) {
        lock(&self.raw).push(err);
    }

    /// (rest, graphql, raw) list lengths.
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            lock(&self.rest).len(),
            lock(&self.graphql).len(),
            lock(&self.raw).len(),
        )
    }

    pub fn rest_errors(&self) -> Vec<RestError> {
        lock(&self.rest).clone()
    }

    pub fn graphql_errors(&self) -> Vec<GraphQlError> {
        lock(&self.graphql).clone()
    }

    pub fn raw_errors(&self) -> Vec<RawHttpError> {
        lock(&self.raw).clone()
    }

    fn reset(&self) {
        lock(&self.rest).clear();
        lock(&self.graphql).clear();
        lock(&self.raw).clear();
    }
}

fn lock<T>(m: &Mutex<Vec<T>>) -> MutexGuard<'_, Vec<T>> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Record a REST failure and produce the redacted error handlers return.
pub fn record_rest(ctx: &RequestContext, err: RestError) -> ToolError {
    let message = err.to_string();
    if let Some(bag) = ErrorBag::from_ctx(ctx) {
        bag.push_rest(err);
    }
    ToolError::external(message)
}

/// Record a GraphQL failure and produce the redacted error handlers return.
pub fn record_graphql(ctx: &RequestContext, err: GraphQlError) -> ToolError {
    let message = err.to_string();
    if let Some(bag) = ErrorBag::from_ctx(ctx) {
        bag.push_graphql(err);
    }
    ToolError::external(message)
}

/// Record a raw-HTTP failure and produce the redacted error handlers return.
pub fn record_raw(ctx: &RequestContext, err: RawHttpError) -> ToolError {
    let message = err.to_string();
    if let Some(bag) = ErrorBag::from_ctx(ctx) {
        bag.push_raw(err);
    }
    ToolError::external(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_reuses_and_resets() {
        let ctx = RequestContext::new();
        let first = ErrorBag::attach(&ctx);
        first.push_rest(RestError::new("GET", "/user", Some(500), "boom"));
        assert_eq!(first.counts(), (1, 0, 0));

        let second = ErrorBag::attach(&ctx);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.counts(), (0, 0, 0));
    }

    #[test]
    fn handlers_see_dispatcher_bag_through_cloned_ctx() {
        let ctx = RequestContext::new();
        let bag = ErrorBag::attach(&ctx);

        let handler_ctx = ctx.clone();
        let err = record_graphql(&handler_ctx, GraphQlError::new("q", "denied"));
        assert!(matches!(err, ToolError::External(_)));
        assert_eq!(bag.counts(), (0, 1, 0));
    }

    #[test]
    fn record_without_bag_still_returns_error() {
        let ctx = RequestContext::new();
        let err = record_raw(&ctx, RawHttpError::new("u", None, "net down"));
        assert!(matches!(err, ToolError::External(_)));
    }

    #[test]
    fn three_lists_are_independent() {
        let ctx = RequestContext::new();
        let bag = ErrorBag::attach(&ctx);
        bag.push_rest(RestError::new("GET", "/a", None, "x"));
        bag.push_raw(RawHttpError::new("u", None, "y"));
        bag.push_raw(RawHttpError::new("u2", None, "z"));
        assert_eq!(bag.counts(), (1, 0, 2));
        assert_eq!(bag.rest_errors().len(), 1);
        assert_eq!(bag.graphql_errors().len(), 0);
        assert_eq!(bag.raw_errors().len(), 2);
    }
}
