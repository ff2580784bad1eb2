//! First-match request dispatch over a route table.
//!
//! # Responsibilities
//! - Build the Axum router the engine serves
//! - Walk route table entries whose key prefixes the request path
//! - Hand the request to each candidate until one responds
//! - Wire up middleware (tracing, request ID, timeout, body limit)

use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Router,
};
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::EngineConfig;
use crate::http::{MatchedRoute, Outcome, RequestExt};
use crate::observability::metrics;
use crate::routing::RouteTable;

/// Build the Axum router serving `table` with all middleware layers.
pub fn router(table: RouteTable, config: &EngineConfig) -> Router {
    Router::new()
        .fallback(dispatch)
        .with_state(table)
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
}

/// Dispatch a request to the first handler that responds.
async fn dispatch(State(table): State<RouteTable>, mut request: Request) -> Response {
    let start_time = Instant::now();
    let path = request.uri().path().to_string();

    for entry in table.candidates(&path) {
        request
            .extensions_mut()
            .insert(MatchedRoute(entry.key.clone()));

        match entry.handler.call(request).await {
            Outcome::Respond(response) => {
                metrics::record_request(entry.key.as_str(), response.status().as_u16(), start_time);
                return response;
            }
            Outcome::Pass(returned) => {
                tracing::trace!(route = %entry.key, path = %path, "Handler passed");
                request = returned;
            }
        }
    }

    tracing::debug!(
        request_id = request.request_id().unwrap_or("unknown"),
        path = %path,
        "No route matched"
    );
    metrics::record_request("none", StatusCode::NOT_FOUND.as_u16(), start_time);
    (StatusCode::NOT_FOUND, "No matching route found").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::respond;
    use crate::routing::EndpointRegistry;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn echo_route(tag: &'static str) -> impl crate::http::Handler {
        respond(move |req: Request<Body>| async move {
            let matched = req.matched_route().map(|k| k.to_string()).unwrap_or_default();
            format!("{tag}:{matched}")
        })
    }

    fn app(registry: &EndpointRegistry) -> Router {
        router(RouteTable::build(&registry.snapshot()), &EngineConfig::default())
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
        let res = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), 64 * 1024).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_specific_prefix_beats_root() {
        let registry = EndpointRegistry::default();
        registry.register("/", echo_route("root")).unwrap();
        registry.register("/orders", echo_route("orders")).unwrap();
        registry.register("health", echo_route("health")).unwrap();
        let app = app(&registry);

        assert_eq!(get(&app, "/orders/7").await, (StatusCode::OK, "orders:/orders".into()));
        assert_eq!(get(&app, "/ORDERS").await, (StatusCode::OK, "orders:/orders".into()));
        assert_eq!(get(&app, "/health").await, (StatusCode::OK, "health:/health".into()));
        assert_eq!(get(&app, "/ordersx").await, (StatusCode::OK, "root:".into()));
        assert_eq!(get(&app, "/").await, (StatusCode::OK, "root:".into()));
    }

    #[tokio::test]
    async fn test_no_match_is_not_found() {
        let registry = EndpointRegistry::default();
        registry.register("/orders", echo_route("orders")).unwrap();
        let app = app(&registry);

        let (status, _) = get(&app, "/health").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_pass_falls_through_in_table_order() {
        let registry = EndpointRegistry::default();
        registry
            .register("/orders", |req: Request<Body>| async move {
                if req.uri().query() == Some("mine") {
                    Outcome::respond("first")
                } else {
                    Outcome::Pass(req)
                }
            })
            .unwrap();
        registry.register("/orders", echo_route("second")).unwrap();
        registry.register("", echo_route("root")).unwrap();
        let app = app(&registry);

        assert_eq!(get(&app, "/orders?mine").await.1, "first");
        assert_eq!(get(&app, "/orders").await.1, "second:/orders");
    }

    #[tokio::test]
    async fn test_pass_everywhere_is_not_found() {
        let registry = EndpointRegistry::default();
        registry
            .register("", |req: Request<Body>| async move { Outcome::Pass(req) })
            .unwrap();
        let app = app(&registry);
        assert_eq!(get(&app, "/anything").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_request_id_propagated() {
        let registry = EndpointRegistry::default();
        registry.register("", echo_route("root")).unwrap();
        let app = app(&registry);

        let res = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(res.headers().contains_key("x-request-id"));

        let res = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("x-request-id", "given")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.headers()["x-request-id"], "given");
    }

    #[tokio::test]
    async fn test_slow_handler_times_out() {
        let registry = EndpointRegistry::default();
        registry
            .register(
                "/slow",
                respond(|_req| async {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    "late"
                }),
            )
            .unwrap();
        let config = EngineConfig {
            request_timeout_secs: 1,
            ..EngineConfig::default()
        };
        let app = router(RouteTable::build(&registry.snapshot()), &config);

        assert_eq!(get(&app, "/slow").await.0, StatusCode::REQUEST_TIMEOUT);
    }
}
