//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the ladder service: match
//! resolutions, rejections by reason, transferred rating points and read
//! operation latency.

use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the ladder service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Match resolution metrics
    match_metrics: MatchMetrics,

    /// Performance metrics
    performance_metrics: PerformanceMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Component health status
    pub component_health: IntGaugeVec,

    /// Participants known to the store
    pub participants: IntGauge,
}

/// Match resolution metrics
#[derive(Clone)]
pub struct MatchMetrics {
    /// Matches committed to the store
    pub matches_recorded_total: IntCounter,

    /// Match requests rejected, by error kind
    pub match_rejections_total: IntCounterVec,

    /// Rating points transferred per match
    pub rating_delta: Histogram,

    /// Replayed trajectories that disagreed with the stored rating
    pub inconsistencies_total: IntCounter,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// Duration of ladder operations
    pub operation_duration: HistogramVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let match_metrics = MatchMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            match_metrics,
            performance_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get service metrics
    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    /// Get match metrics
    pub fn matches(&self) -> &MatchMetrics {
        &self.match_metrics
    }

    /// Get performance metrics
    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Record a committed match
    pub fn record_match_recorded(&self, delta: u32, duration: Duration) {
        self.match_metrics.matches_recorded_total.inc();
        self.match_metrics.rating_delta.observe(f64::from(delta));
        self.record_operation("record_match", duration);
    }

    /// Record a rejected match request
    pub fn record_match_rejected(&self, reason: &str) {
        self.match_metrics
            .match_rejections_total
            .with_label_values(&[reason])
            .inc();
    }

    /// Record a trajectory/rating mismatch
    pub fn record_inconsistency(&self) {
        self.match_metrics.inconsistencies_total.inc();
    }

    /// Record operation duration
    pub fn record_operation(&self, operation: &str, duration: Duration) {
        self.performance_metrics
            .operation_duration
            .with_label_values(&[operation])
            .observe(duration.as_secs_f64());
    }

    /// Update the participant gauge
    pub fn update_participant_count(&self, count: usize) {
        self.service_metrics.participants.set(count as i64);
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Update component health
    pub fn update_component_health(&self, component: &str, healthy: bool) {
        let status = if healthy { 1 } else { 0 };
        self.service_metrics
            .component_health
            .with_label_values(&[component])
            .set(status);
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let health_status = IntGauge::new(
            "ladder_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let component_health = IntGaugeVec::new(
            Opts::new("ladder_component_health", "Component health status"),
            &["component"],
        )?;
        registry.register(Box::new(component_health.clone()))?;

        let participants = IntGauge::new("ladder_participants", "Participants in the store")?;
        registry.register(Box::new(participants.clone()))?;

        Ok(Self {
            health_status,
            component_health,
            participants,
        })
    }
}

impl MatchMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let matches_recorded_total =
            IntCounter::new("ladder_matches_recorded_total", "Total matches recorded")?;
        registry.register(Box::new(matches_recorded_total.clone()))?;

        let match_rejections_total = IntCounterVec::new(
            Opts::new(
                "ladder_match_rejections_total",
                "Match requests rejected by reason",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(match_rejections_total.clone()))?;

        let rating_delta = Histogram::with_opts(
            HistogramOpts::new("ladder_rating_delta", "Rating points transferred per match")
                .buckets(vec![2.0, 4.0, 8.0, 12.0, 16.0, 20.0, 24.0, 28.0, 32.0]),
        )?;
        registry.register(Box::new(rating_delta.clone()))?;

        let inconsistencies_total = IntCounter::new(
            "ladder_inconsistencies_total",
            "Replayed rating trajectories that disagreed with the stored rating",
        )?;
        registry.register(Box::new(inconsistencies_total.clone()))?;

        Ok(Self {
            matches_recorded_total,
            match_rejections_total,
            rating_delta,
            inconsistencies_total,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "ladder_operation_duration_seconds",
                "Ladder operation duration",
            )
            .buckets(vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
            &["operation"],
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        Ok(Self { operation_duration })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}
