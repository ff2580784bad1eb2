//! Request extensions set by the dispatcher.
//!
//! # Responsibilities
//! - Record which route key a request was dispatched under
//! - Give handlers the path remaining after the matched prefix
//! - Expose the request ID assigned by the middleware stack

use axum::body::Body;
use axum::http::Request;

use crate::routing::RouteKey;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Route key the current request was dispatched under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRoute(pub RouteKey);

impl MatchedRoute {
    /// Path after the matched prefix, always starting with `/` (or empty).
    ///
    /// A path the key does not match is returned unchanged.
    pub fn remainder<'a>(&self, path: &'a str) -> &'a str {
        let len = self.0.as_str().len();
        if self.0.is_root() || !self.0.matches(path) {
            return path;
        }
        match path.get(len..) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
            // The key ended in `/`; keep it on the remainder.
            Some(rest) => &path[len - 1..len - 1 + rest.len() + 1],
            None => path,
        }
    }
}

/// Convenience accessors on incoming requests.
pub trait RequestExt {
    /// Route key this request was dispatched under, if any.
    fn matched_route(&self) -> Option<&RouteKey>;

    /// Request ID from the `x-request-id` header.
    fn request_id(&self) -> Option<&str>;
}

impl RequestExt for Request<Body> {
    fn matched_route(&self) -> Option<&RouteKey> {
        self.extensions().get::<MatchedRoute>().map(|m| &m.0)
    }

    fn request_id(&self) -> Option<&str> {
        self.headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::normalize;

    #[test]
    fn test_remainder() {
        let matched = MatchedRoute(normalize("/orders"));
        assert_eq!(matched.remainder("/orders"), "");
        assert_eq!(matched.remainder("/orders/42"), "/42");

        let root = MatchedRoute(RouteKey::root());
        assert_eq!(root.remainder("/orders/42"), "/orders/42");

        let slash = MatchedRoute(normalize("/static/"));
        assert_eq!(slash.remainder("/static/app.js"), "/app.js");

        // Paths outside the key come back whole, multibyte ones included.
        let nested = MatchedRoute(normalize("/a/"));
        assert_eq!(nested.remainder("/éb"), "/éb");
        assert_eq!(matched.remainder("/ordé"), "/ordé");
        assert_eq!(matched.remainder("/ordersx"), "/ordersx");
    }

    #[test]
    fn test_request_ext() {
        let mut req = Request::builder()
            .header("x-request-id", "abc")
            .body(Body::empty())
            .unwrap();
        assert_eq!(req.request_id(), Some("abc"));
        assert!(req.matched_route().is_none());

        req.extensions_mut().insert(MatchedRoute(normalize("/a")));
        assert_eq!(req.matched_route().map(|k| k.as_str()), Some("/a"));
    }
}
