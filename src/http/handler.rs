//! Handler contract.
//!
//! A handler receives a request and asynchronously yields an [`Outcome`]:
//! either a response, which ends dispatch, or the request handed back so the
//! next handler in route-table order gets a chance at it.

use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;

/// Result of invoking a handler.
#[derive(Debug)]
pub enum Outcome {
    /// The handler produced the response for this request.
    Respond(Response),
    /// The handler declined; dispatch continues with the next entry.
    Pass(Request<Body>),
}

impl Outcome {
    /// Wrap anything convertible into a response.
    pub fn respond(response: impl IntoResponse) -> Self {
        Outcome::Respond(response.into_response())
    }
}

/// A path-scoped request handler.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, request: Request<Body>) -> BoxFuture<'static, Outcome>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    fn call(&self, request: Request<Body>) -> BoxFuture<'static, Outcome> {
        (self)(request).boxed()
    }
}

/// Reference-counted handler as stored in the registry and route table.
pub type SharedHandler = Arc<dyn Handler>;

/// Adapt a closure returning any `IntoResponse` into a handler that always
/// responds.
pub fn respond<F, Fut, R>(f: F) -> impl Handler
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    move |request: Request<Body>| {
        let fut = f(request);
        async move { Outcome::respond(fut.await) }
    }
}
