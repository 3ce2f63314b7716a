//! Test doubles for the telemetry backend.
//!
//! [`InMemoryInstruments`] stands in for the metrics backend and
//! [`RecordingSpan`] for the active trace span, so host applications can
//! assert on what the engine emitted without installing global recorders.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use metrics::Unit;

use crate::error::{TelemetryError, TelemetryResult};
use crate::observability::metrics::{
    CounterInstrument, HistogramInstrument, InstrumentFactory, MetricLabels,
};
use crate::observability::span::SpanSink;

type SeriesKey = (&'static str, MetricLabels);

/// Instrument factory that keeps every observation in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInstruments {
    histograms: Arc<DashMap<SeriesKey, Vec<f64>>>,
    counters: Arc<DashMap<SeriesKey, u64>>,
    descriptions: Arc<DashMap<&'static str, &'static str>>,
}

impl InMemoryInstruments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter total for one label set (0 if never incremented).
    pub fn counter_value(&self, name: &'static str, labels: &MetricLabels) -> u64 {
        self.counters
            .get(&(name, labels.clone()))
            .map(|v| *v.value())
            .unwrap_or(0)
    }

    /// Every observation recorded for one label set, in arrival order per thread.
    pub fn histogram_values(&self, name: &'static str, labels: &MetricLabels) -> Vec<f64> {
        self.histograms
            .get(&(name, labels.clone()))
            .map(|v| v.value().clone())
            .unwrap_or_default()
    }

    /// Distinct `http_route` values seen by an instrument.
    pub fn route_labels(&self, name: &'static str) -> HashSet<String> {
        let from_counters = self
            .counters
            .iter()
            .filter(|e| e.key().0 == name)
            .map(|e| e.key().1.http_route.clone());
        let from_histograms = self
            .histograms
            .iter()
            .filter(|e| e.key().0 == name)
            .map(|e| e.key().1.http_route.clone());
        from_counters.chain(from_histograms).collect()
    }

    /// Description an instrument was created with.
    pub fn description(&self, name: &'static str) -> Option<&'static str> {
        self.descriptions.get(name).map(|d| *d.value())
    }
}

struct MemoryHistogram {
    name: &'static str,
    series: Arc<DashMap<SeriesKey, Vec<f64>>>,
}

impl HistogramInstrument for MemoryHistogram {
    fn record(&self, value: f64, labels: &MetricLabels) -> TelemetryResult<()> {
        self.series
            .entry((self.name, labels.clone()))
            .or_default()
            .push(value);
        Ok(())
    }
}

struct MemoryCounter {
    name: &'static str,
    series: Arc<DashMap<SeriesKey, u64>>,
}

impl CounterInstrument for MemoryCounter {
    fn add(&self, value: u64, labels: &MetricLabels) -> TelemetryResult<()> {
        *self.series.entry((self.name, labels.clone())).or_default() += value;
        Ok(())
    }
}

impl InstrumentFactory for InMemoryInstruments {
    fn create_histogram(
        &self,
        name: &'static str,
        description: &'static str,
        _unit: Unit,
    ) -> TelemetryResult<Arc<dyn HistogramInstrument>> {
        self.descriptions.insert(name, description);
        Ok(Arc::new(MemoryHistogram {
            name,
            series: Arc::clone(&self.histograms),
        }))
    }

    fn create_counter(
        &self,
        name: &'static str,
        description: &'static str,
    ) -> TelemetryResult<Arc<dyn CounterInstrument>> {
        self.descriptions.insert(name, description);
        Ok(Arc::new(MemoryCounter {
            name,
            series: Arc::clone(&self.counters),
        }))
    }
}

/// Backend that fails either at instrument creation or on every update.
#[derive(Debug, Clone, Copy)]
pub struct FailingInstruments {
    fail_on_create: bool,
}

impl FailingInstruments {
    pub fn on_create() -> Self {
        Self {
            fail_on_create: true,
        }
    }

    pub fn on_record() -> Self {
        Self {
            fail_on_create: false,
        }
    }
}

struct Broken {
    name: &'static str,
}

impl Broken {
    fn error(&self) -> TelemetryError {
        TelemetryError::Instrument {
            name: self.name,
            reason: "backend unavailable".to_string(),
        }
    }
}

impl HistogramInstrument for Broken {
    fn record(&self, _value: f64, _labels: &MetricLabels) -> TelemetryResult<()> {
        Err(self.error())
    }
}

impl CounterInstrument for Broken {
    fn add(&self, _value: u64, _labels: &MetricLabels) -> TelemetryResult<()> {
        Err(self.error())
    }
}

impl InstrumentFactory for FailingInstruments {
    fn create_histogram(
        &self,
        name: &'static str,
        _description: &'static str,
        _unit: Unit,
    ) -> TelemetryResult<Arc<dyn HistogramInstrument>> {
        if self.fail_on_create {
            return Err(Broken { name }.error());
        }
        Ok(Arc::new(Broken { name }))
    }

    fn create_counter(
        &self,
        name: &'static str,
        _description: &'static str,
    ) -> TelemetryResult<Arc<dyn CounterInstrument>> {
        if self.fail_on_create {
            return Err(Broken { name }.error());
        }
        Ok(Arc::new(Broken { name }))
    }
}

/// Span double that stores attributes in a map.
#[derive(Debug, Default)]
pub struct RecordingSpan {
    attributes: DashMap<&'static str, String>,
    rejected: Vec<&'static str>,
    disabled: bool,
}

impl RecordingSpan {
    pub fn new() -> Self {
        Self::default()
    }

    /// A span that reports itself as not recording.
    pub fn disabled() -> Self {
        Self {
            disabled: true,
            ..Self::default()
        }
    }

    /// A span that refuses the given attribute keys.
    pub fn rejecting(keys: &[&'static str]) -> Self {
        Self {
            rejected: keys.to_vec(),
            ..Self::default()
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.attributes.get(key).map(|v| v.value().clone())
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl SpanSink for RecordingSpan {
    fn is_recording(&self) -> bool {
        !self.disabled
    }

    fn set_attribute(&self, key: &'static str, value: &str) -> TelemetryResult<()> {
        if self.disabled || self.rejected.contains(&key) {
            return Err(TelemetryError::SpanAttribute {
                key,
                reason: "rejected by test span".to_string(),
            });
        }
        self.attributes.insert(key, value.to_string());
        Ok(())
    }
}
