//! Route metrics recording.
//!
//! # Responsibilities
//! - Create the four route-labelled instruments through an
//!   [`InstrumentFactory`] (the metrics backend seam)
//! - Record duration, request count and request/response sizes per
//!   `{http_method, http_route, http_status_code, service_name}`
//! - Install the Prometheus exporter used by the binary
//!
//! # Metrics
//! - `http_server_duration_milliseconds` (histogram, ms)
//! - `http_requests_total` (counter)
//! - `http_request_size_bytes` (histogram, bytes)
//! - `http_response_size_bytes` (histogram, bytes)
//!
//! # Design Decisions
//! - `Uninitialized → Initializing → Ready`; data points arriving before
//!   `Ready` are dropped, never queued
//! - Absent sizes are skipped rather than recorded as zero
//! - Updates go straight to the backend's per-label-set atomics; no lock is
//!   held across recording

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use metrics::{Label, Unit};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use tokio::task::JoinHandle;

use crate::config::TelemetryConfig;
use crate::error::{TelemetryError, TelemetryResult};

pub const HTTP_SERVER_DURATION: &str = "http_server_duration_milliseconds";
pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_SIZE: &str = "http_request_size_bytes";
pub const HTTP_RESPONSE_SIZE: &str = "http_response_size_bytes";

/// Label set shared by every route metric.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricLabels {
    pub http_method: String,
    pub http_route: String,
    pub http_status_code: String,
    pub service_name: String,
}

impl MetricLabels {
    pub fn new(method: &str, route: &str, status: u16, service_name: &str) -> Self {
        Self {
            http_method: method.to_string(),
            http_route: route.to_string(),
            http_status_code: status.to_string(),
            service_name: service_name.to_string(),
        }
    }

    /// Key/value pairs in a stable order.
    pub fn pairs(&self) -> [(&'static str, &str); 4] {
        [
            ("http_method", self.http_method.as_str()),
            ("http_route", self.http_route.as_str()),
            ("http_status_code", self.http_status_code.as_str()),
            ("service_name", self.service_name.as_str()),
        ]
    }

    fn to_labels(&self) -> Vec<Label> {
        self.pairs()
            .into_iter()
            .map(|(key, value)| Label::new(key, value.to_string()))
            .collect()
    }
}

/// A histogram handed out by the metrics backend.
pub trait HistogramInstrument: Send + Sync {
    fn record(&self, value: f64, labels: &MetricLabels) -> TelemetryResult<()>;
}

/// A monotonic counter handed out by the metrics backend.
pub trait CounterInstrument: Send + Sync {
    fn add(&self, value: u64, labels: &MetricLabels) -> TelemetryResult<()>;
}

/// Creates instruments. Implemented by the telemetry backend.
pub trait InstrumentFactory: Send + Sync {
    fn create_histogram(
        &self,
        name: &'static str,
        description: &'static str,
        unit: Unit,
    ) -> TelemetryResult<Arc<dyn HistogramInstrument>>;

    fn create_counter(
        &self,
        name: &'static str,
        description: &'static str,
    ) -> TelemetryResult<Arc<dyn CounterInstrument>>;
}

/// Instruments backed by the global `metrics` recorder.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsFacade;

struct FacadeHistogram {
    name: &'static str,
}

impl HistogramInstrument for FacadeHistogram {
    fn record(&self, value: f64, labels: &MetricLabels) -> TelemetryResult<()> {
        metrics::histogram!(self.name, labels.to_labels()).record(value);
        Ok(())
    }
}

struct FacadeCounter {
    name: &'static str,
}

impl CounterInstrument for FacadeCounter {
    fn add(&self, value: u64, labels: &MetricLabels) -> TelemetryResult<()> {
        metrics::counter!(self.name, labels.to_labels()).increment(value);
        Ok(())
    }
}

impl InstrumentFactory for MetricsFacade {
    fn create_histogram(
        &self,
        name: &'static str,
        description: &'static str,
        unit: Unit,
    ) -> TelemetryResult<Arc<dyn HistogramInstrument>> {
        metrics::describe_histogram!(name, unit, description);
        Ok(Arc::new(FacadeHistogram { name }))
    }

    fn create_counter(
        &self,
        name: &'static str,
        description: &'static str,
    ) -> TelemetryResult<Arc<dyn CounterInstrument>> {
        metrics::describe_counter!(name, Unit::Count, description);
        Ok(Arc::new(FacadeCounter { name }))
    }
}

/// Lifecycle of the metrics subsystem.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsState {
    Uninitialized = 0,
    Initializing = 1,
    Ready = 2,
}

impl From<u8> for MetricsState {
    fn from(val: u8) -> Self {
        match val {
            1 => MetricsState::Initializing,
            2 => MetricsState::Ready,
            _ => MetricsState::Uninitialized,
        }
    }
}

struct Instruments {
    duration: Arc<dyn HistogramInstrument>,
    requests: Arc<dyn CounterInstrument>,
    request_size: Arc<dyn HistogramInstrument>,
    response_size: Arc<dyn HistogramInstrument>,
}

impl Instruments {
    fn create(factory: &dyn InstrumentFactory) -> TelemetryResult<Self> {
        Ok(Self {
            duration: factory.create_histogram(
                HTTP_SERVER_DURATION,
                "HTTP server request duration with route labels",
                Unit::Milliseconds,
            )?,
            requests: factory
                .create_counter(HTTP_REQUESTS_TOTAL, "Total HTTP requests with route labels")?,
            request_size: factory.create_histogram(
                HTTP_REQUEST_SIZE,
                "HTTP request size with route labels",
                Unit::Bytes,
            )?,
            response_size: factory.create_histogram(
                HTTP_RESPONSE_SIZE,
                "HTTP response size with route labels",
                Unit::Bytes,
            )?,
        })
    }
}

/// Records route-labelled request metrics.
pub struct MetricsRecorder {
    state: AtomicU8,
    instruments: OnceLock<Instruments>,
    service_name: String,
}

impl std::fmt::Debug for MetricsRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRecorder")
            .field("state", &self.state())
            .field("service_name", &self.service_name)
            .finish()
    }
}

impl MetricsRecorder {
    /// Create an uninitialized recorder. Nothing is recorded until
    /// [`MetricsRecorder::initialize`] succeeds.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            state: AtomicU8::new(MetricsState::Uninitialized as u8),
            instruments: OnceLock::new(),
            service_name: service_name.into(),
        }
    }

    pub fn state(&self) -> MetricsState {
        MetricsState::from(self.state.load(Ordering::Acquire))
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Create the instruments and move to `Ready`.
    ///
    /// Concurrent or repeated calls are no-ops. A failed attempt returns the
    /// recorder to `Uninitialized` so it can be retried.
    pub fn initialize(&self, factory: &dyn InstrumentFactory) -> TelemetryResult<()> {
        if self
            .state
            .compare_exchange(
                MetricsState::Uninitialized as u8,
                MetricsState::Initializing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            tracing::debug!(state = ?self.state(), "Metrics initialization already underway");
            return Ok(());
        }

        match Instruments::create(factory) {
            Ok(instruments) => {
                // Only one caller can be past the CAS, so the cell is empty.
                let _ = self.instruments.set(instruments);
                self.state.store(MetricsState::Ready as u8, Ordering::Release);
                tracing::info!(service = %self.service_name, "Route metrics ready");
                Ok(())
            }
            Err(e) => {
                self.state
                    .store(MetricsState::Uninitialized as u8, Ordering::Release);
                Err(e)
            }
        }
    }

    /// Initialize on the tokio runtime after `delay`.
    pub fn spawn_deferred_init(
        self: &Arc<Self>,
        factory: Arc<dyn InstrumentFactory>,
        delay: Duration,
    ) -> JoinHandle<()> {
        let recorder = Arc::clone(self);
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if let Err(e) = recorder.initialize(factory.as_ref()) {
                tracing::warn!(error = %e, "Could not initialize route metrics");
            }
        })
    }

    /// Record one finished request. Never fails; problems are logged once
    /// and the data point is dropped.
    pub fn record(
        &self,
        method: &str,
        route: &str,
        status: u16,
        duration_ms: f64,
        request_size: Option<u64>,
        response_size: Option<u64>,
    ) {
        let labels = MetricLabels::new(method, route, status, &self.service_name);
        match self.try_record(&labels, duration_ms, request_size, response_size) {
            Ok(()) => {}
            Err(TelemetryError::MetricsNotReady) => {
                tracing::trace!(route = %route, "Metrics not ready, data point dropped");
            }
            Err(e) => {
                tracing::warn!(error = %e, route = %route, "Error recording route metrics");
            }
        }
    }

    /// Fallible core of [`MetricsRecorder::record`].
    pub fn try_record(
        &self,
        labels: &MetricLabels,
        duration_ms: f64,
        request_size: Option<u64>,
        response_size: Option<u64>,
    ) -> TelemetryResult<()> {
        if self.state() != MetricsState::Ready {
            return Err(TelemetryError::MetricsNotReady);
        }
        let instruments = self.instruments.get().ok_or(TelemetryError::MetricsNotReady)?;

        instruments.duration.record(duration_ms, labels)?;
        instruments.requests.add(1, labels)?;

        if let Some(size) = request_size {
            instruments.request_size.record(size as f64, labels)?;
        }
        if let Some(size) = response_size {
            instruments.response_size.record(size as f64, labels)?;
        }
        Ok(())
    }
}

/// Install the global Prometheus recorder with an HTTP scrape listener.
///
/// Must be called from within a tokio runtime.
pub fn install_prometheus_exporter(config: &TelemetryConfig) -> TelemetryResult<()> {
    let addr: SocketAddr = config.metrics.exporter_address.parse().map_err(|e| {
        TelemetryError::Exporter(format!("Invalid Prometheus listen address: {e}"))
    })?;
    let exporter = |e: &dyn std::fmt::Display| TelemetryError::Exporter(e.to_string());

    let mut builder = PrometheusBuilder::new()
        .with_http_listener(addr)
        .add_global_label("service_version", config.service.version.clone())
        .add_global_label("service_namespace", config.service.namespace.clone())
        .add_global_label("deployment_environment", config.service.environment.clone())
        .set_buckets_for_metric(
            Matcher::Full(HTTP_SERVER_DURATION.to_string()),
            &config.metrics.duration_buckets_ms,
        )
        .map_err(|e| exporter(&e))?;

    if let Some(instance) = &config.service.instance_id {
        builder = builder.add_global_label("service_instance_id", instance.clone());
    }

    for name in [HTTP_REQUEST_SIZE, HTTP_RESPONSE_SIZE] {
        builder = builder
            .set_buckets_for_metric(
                Matcher::Full(name.to_string()),
                &config.metrics.size_buckets_bytes,
            )
            .map_err(|e| exporter(&e))?;
    }

    builder.install().map_err(|e| {
        TelemetryError::Exporter(format!("Failed to start Prometheus exporter: {e}"))
    })?;

    tracing::info!(listen = %addr, "Prometheus metrics server started");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingInstruments, InMemoryInstruments};
    use std::thread;

    fn labels(route: &str, status: u16) -> MetricLabels {
        MetricLabels::new("GET", route, status, "svc")
    }

    #[test]
    fn test_record_before_ready_is_dropped() {
        let recorder = MetricsRecorder::new("svc");
        let instruments = InMemoryInstruments::new();

        recorder.record("GET", "/users/:id", 200, 15.0, None, Some(512));
        assert!(matches!(
            recorder.try_record(&labels("/users/:id", 200), 1.0, None, None),
            Err(TelemetryError::MetricsNotReady)
        ));

        recorder.initialize(&instruments).unwrap();
        assert_eq!(recorder.state(), MetricsState::Ready);
        // Earlier point was not queued
        assert_eq!(instruments.counter_value(HTTP_REQUESTS_TOTAL, &labels("/users/:id", 200)), 0);
    }

    #[test]
    fn test_record_skips_absent_sizes() {
        let recorder = MetricsRecorder::new("svc");
        let instruments = InMemoryInstruments::new();
        recorder.initialize(&instruments).unwrap();

        recorder.record("GET", "/users/:id", 200, 15.0, None, Some(512));

        let l = labels("/users/:id", 200);
        assert_eq!(instruments.histogram_values(HTTP_SERVER_DURATION, &l), vec![15.0]);
        assert_eq!(instruments.counter_value(HTTP_REQUESTS_TOTAL, &l), 1);
        assert!(instruments.histogram_values(HTTP_REQUEST_SIZE, &l).is_empty());
        assert_eq!(instruments.histogram_values(HTTP_RESPONSE_SIZE, &l), vec![512.0]);
    }

    #[test]
    fn test_concurrent_records_are_exact() {
        let recorder = MetricsRecorder::new("svc");
        let instruments = InMemoryInstruments::new();
        recorder.initialize(&instruments).unwrap();

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..125 {
                        recorder.record("GET", "/items/:id", 200, 2.0, Some(10), None);
                    }
                });
            }
        });

        let l = labels("/items/:id", 200);
        assert_eq!(instruments.counter_value(HTTP_REQUESTS_TOTAL, &l), 1000);
        assert_eq!(instruments.histogram_values(HTTP_SERVER_DURATION, &l).len(), 1000);
        assert_eq!(instruments.histogram_values(HTTP_REQUEST_SIZE, &l).len(), 1000);
    }

    #[test]
    fn test_failed_initialization_can_retry() {
        let recorder = MetricsRecorder::new("svc");
        assert!(recorder.initialize(&FailingInstruments::on_create()).is_err());
        assert_eq!(recorder.state(), MetricsState::Uninitialized);

        recorder.initialize(&InMemoryInstruments::new()).unwrap();
        assert_eq!(recorder.state(), MetricsState::Ready);
    }

    #[test]
    fn test_second_initialize_is_noop() {
        let recorder = MetricsRecorder::new("svc");
        let first = InMemoryInstruments::new();
        let second = InMemoryInstruments::new();
        recorder.initialize(&first).unwrap();
        recorder.initialize(&second).unwrap();

        recorder.record("GET", "/", 200, 1.0, None, None);
        assert_eq!(first.counter_value(HTTP_REQUESTS_TOTAL, &labels("/", 200)), 1);
        assert_eq!(second.counter_value(HTTP_REQUESTS_TOTAL, &labels("/", 200)), 0);
    }

    #[test]
    fn test_backend_failure_is_swallowed() {
        let recorder = MetricsRecorder::new("svc");
        recorder.initialize(&FailingInstruments::on_record()).unwrap();

        // Must not panic or propagate
        recorder.record("GET", "/", 500, 1.0, Some(1), Some(1));
        assert!(matches!(
            recorder.try_record(&labels("/", 500), 1.0, None, None),
            Err(TelemetryError::Instrument { .. })
        ));
    }

    #[tokio::test]
    async fn test_deferred_init() {
        let recorder = Arc::new(MetricsRecorder::new("svc"));
        let instruments = Arc::new(InMemoryInstruments::new());

        let handle = recorder.spawn_deferred_init(instruments.clone(), Duration::from_millis(20));
        assert_eq!(recorder.state(), MetricsState::Uninitialized);
        handle.await.unwrap();
        assert_eq!(recorder.state(), MetricsState::Ready);
    }

    #[test]
    fn test_facade_records_without_recorder() {
        // No global recorder installed: the facade is a no-op, never an error
        let recorder = MetricsRecorder::new("svc");
        recorder.initialize(&MetricsFacade).unwrap();
        assert!(recorder
            .try_record(&labels("/", 200), 3.0, Some(1), Some(2))
            .is_ok());
    }

    #[test]
    fn test_exporter_rejects_bad_listen_address() {
        let mut config = TelemetryConfig::default();
        config.metrics.exporter_address = "not-an-address".into();
        let err = install_prometheus_exporter(&config).unwrap_err();
        assert!(matches!(
            err,
            TelemetryError::Exporter(msg) if msg.starts_with("Invalid Prometheus listen address")
        ));
    }
}
