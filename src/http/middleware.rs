//! Axum integration.
//!
//! # Responsibilities
//! - Wrap every request in a span that declares the route attributes
//! - Drive `on_request` / `on_response` around the inner service
//! - Expose the [`RequestContext`] to handlers through request extensions
//! - Register routes with the telemetry registry as they are added
//!
//! # Design Decisions
//! - `Router::layer` wraps each endpoint after routing, so axum has already
//!   set [`MatchedPath`] by the time a plain layer runs.
//! - [`instrument`] mounts the finished router as the fallback of an outer,
//!   route-less router and layers the middleware there. It runs before
//!   routing, sees no [`MatchedPath`], and resolves through the registry
//!   (including 404 and 405 traffic).
//! - [`instrument_matched`] installs the middleware as a route layer and
//!   takes the exact pattern from axum; unmatched requests are not observed.

use std::sync::Arc;

use axum::body::HttpBody;
use axum::extract::{MatchedPath, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::MethodRouter;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::field::Empty;
use tracing::Span;

use crate::http::hooks::{RequestHead, ResponseEvent, RouteTelemetry};

/// Create the per-request span with every route attribute declared up front.
pub fn make_request_span(request: &Request) -> Span {
    tracing::info_span!(
        "http_request",
        http.method = %request.method(),
        http.target = %request.uri(),
        http.route = Empty,
        http.route.pattern = Empty,
        http.route.method = Empty,
        http.route.matched = Empty,
        http.route.confidence = Empty,
        http.request.id = Empty,
        http.user_agent = Empty,
        http.real_ip = Empty,
        http.host = Empty,
        http.original_url = Empty,
        http.status_code = Empty,
        http.response.size = Empty,
        http.response.content_type = Empty,
    )
}

/// Middleware that attributes each request to a route and records metrics.
pub async fn route_telemetry_middleware(
    State(telemetry): State<Arc<RouteTelemetry>>,
    mut request: Request,
    next: Next,
) -> Response {
    let method = request.method().as_str().to_owned();
    let target = request
        .uri()
        .path_and_query()
        .map_or_else(|| request.uri().path().to_owned(), |pq| pq.as_str().to_owned());
    let matched = request
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_owned());

    let span = Span::current();
    let context = telemetry.on_request(
        RequestHead {
            method: &method,
            target: &target,
            headers: request.headers(),
            matched_route: matched.as_deref(),
        },
        &span,
    );
    request.extensions_mut().insert(context.clone());

    let response = next.run(request).await;

    telemetry.on_response(
        ResponseEvent {
            method: &method,
            context: Some(&context),
            status: response.status().as_u16(),
            elapsed: context.elapsed(),
            response_headers: response.headers(),
            body_size_hint: response.body().size_hint().exact(),
        },
        &span,
    );
    response
}

/// Instrument every request before it is routed, including fallbacks.
///
/// Takes the finished router (state already provided).
pub fn instrument(router: Router, telemetry: Arc<RouteTelemetry>) -> Router {
    Router::new()
        .fallback_service(router)
        .layer(middleware::from_fn_with_state(
            telemetry,
            route_telemetry_middleware,
        ))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
}

/// Instrument matched routes only, using axum's own route pattern.
///
/// Applies to the routes already added to `router`.
pub fn instrument_matched<S>(router: Router<S>, telemetry: Arc<RouteTelemetry>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .route_layer(middleware::from_fn_with_state(
            telemetry,
            route_telemetry_middleware,
        ))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
}

/// Route registration that also feeds the telemetry registry.
pub trait RouterExt<S> {
    fn instrumented_route(
        self,
        telemetry: &RouteTelemetry,
        methods: &[&str],
        path: &str,
        method_router: MethodRouter<S>,
    ) -> Self;
}

impl<S> RouterExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn instrumented_route(
        self,
        telemetry: &RouteTelemetry,
        methods: &[&str],
        path: &str,
        method_router: MethodRouter<S>,
    ) -> Self {
        telemetry.on_route(methods.iter().copied(), path);
        self.route(path, method_router)
    }
}
