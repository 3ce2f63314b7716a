//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, Request};
use axum::routing::{get, post};
use axum::{Extension, Router};
use tokio::net::TcpListener;

use route_telemetry::config::HeaderConfig;
use route_telemetry::testing::InMemoryInstruments;
use route_telemetry::{
    instrument, MetricsRecorder, RequestContext, RouteRegistry, RouteTelemetry, RouterExt,
};

pub const SERVICE: &str = "test-service";

/// Telemetry wired to in-memory instruments, already `Ready`.
pub fn ready_telemetry() -> (Arc<RouteTelemetry>, InMemoryInstruments) {
    let instruments = InMemoryInstruments::new();
    let telemetry = uninitialized_telemetry();
    telemetry.recorder().initialize(&instruments).unwrap();
    (telemetry, instruments)
}

/// Telemetry whose metrics have not been initialized yet.
pub fn uninitialized_telemetry() -> Arc<RouteTelemetry> {
    Arc::new(RouteTelemetry::new(
        Arc::new(RouteRegistry::new()),
        Arc::new(MetricsRecorder::new(SERVICE)),
        HeaderConfig::default(),
    ))
}

/// Handler body: `"<route> <confidence> <request id>"`.
async fn describe(Extension(ctx): Extension<RequestContext>) -> String {
    format!(
        "{} {} {}",
        ctx.route(),
        ctx.confidence(),
        ctx.metadata.request_id
    )
}

async fn user(Path(id): Path<String>, Extension(ctx): Extension<RequestContext>) -> String {
    format!("user {id} via {}", ctx.route())
}

/// A small application with overlapping literal and parameter routes.
pub fn app(telemetry: &Arc<RouteTelemetry>) -> Router {
    let router = Router::new()
        .instrumented_route(telemetry, &["GET"], "/users/me", get(describe))
        .instrumented_route(telemetry, &["GET"], "/users/{id}", get(user))
        .instrumented_route(telemetry, &["POST"], "/users", post(describe))
        .instrumented_route(
            telemetry,
            &["GET"],
            "/orders/{order_id}/items/{item_id}",
            get(describe),
        );
    instrument(router, Arc::clone(telemetry))
}

#[allow(dead_code)]
pub fn request(method: &str, uri: &str) -> Request {
    axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Serve `app` on an ephemeral local port.
#[allow(dead_code)]
pub async fn spawn_server(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}
