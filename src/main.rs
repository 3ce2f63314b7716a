//! Demo service with route telemetry installed.
//!
//! ```text
//!   request ──▶ TraceLayer span ──▶ route_telemetry_middleware ──▶ handler
//!                                        │            │
//!                                        ▼            ▼
//!                                 RouteResolver   MetricsRecorder ──▶ Prometheus
//!                                  (registry)                        (scrape port)
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use clap::Parser;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;

use route_telemetry::config::{load_config, TelemetryConfig};
use route_telemetry::lifecycle::shutdown_signal;
use route_telemetry::observability::logging::init_logging;
use route_telemetry::observability::metrics::{install_prometheus_exporter, MetricsFacade};
use route_telemetry::{instrument, RequestContext, RouteRegistry, RouteTelemetry, RouterExt};

#[derive(Parser)]
#[command(name = "route-telemetry")]
#[command(about = "Demo HTTP service with route attribution and request metrics", long_about = None)]
struct Cli {
    /// TOML config file. Defaults and OTEL_* environment apply without one.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    init_logging(&config.logging)?;

    tracing::info!(
        service = %config.service.name,
        version = %config.service.version,
        environment = %config.service.environment,
        "route-telemetry starting"
    );

    let telemetry = Arc::new(RouteTelemetry::from_config(
        &config,
        Arc::new(RouteRegistry::new()),
    ));

    if config.metrics.enabled {
        install_prometheus_exporter(&config)?;
        telemetry.recorder().spawn_deferred_init(
            Arc::new(MetricsFacade),
            Duration::from_millis(config.metrics.init_delay_ms),
        );
    } else {
        tracing::info!("Metrics disabled");
    }

    let app = build_app(&config, telemetry);

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Requests running past `timeout` are answered with 408.
fn timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

fn build_app(config: &TelemetryConfig, telemetry: Arc<RouteTelemetry>) -> Router {
    let router = Router::new()
        .instrumented_route(&telemetry, &["GET"], "/health", get(health))
        .instrumented_route(&telemetry, &["GET"], "/users/{id}", get(get_user))
        .instrumented_route(&telemetry, &["GET"], "/users/me", get(current_user))
        .instrumented_route(&telemetry, &["POST"], "/orders", post(create_order))
        .instrumented_route(
            &telemetry,
            &["GET"],
            "/orders/{order_id}/items/{item_id}",
            get(get_order_item),
        )
        .layer(timeout_layer(Duration::from_secs(
            config.server.request_timeout_secs,
        )));

    instrument(router, telemetry)
}

async fn health() -> &'static str {
    "ok"
}

async fn get_user(Path(id): Path<String>, Extension(ctx): Extension<RequestContext>) -> Json<Value> {
    Json(json!({ "id": id, "route": ctx.route(), "request_id": ctx.metadata.request_id }))
}

async fn current_user(Extension(ctx): Extension<RequestContext>) -> Json<Value> {
    Json(json!({ "id": "me", "route": ctx.route() }))
}

async fn create_order(Json(order): Json<Value>) -> (StatusCode, Json<Value>) {
    (StatusCode::CREATED, Json(json!({ "created": order })))
}

async fn get_order_item(Path((order_id, item_id)): Path<(String, String)>) -> Json<Value> {
    Json(json!({ "order_id": order_id, "item_id": item_id }))
}
