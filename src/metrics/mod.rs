//! Metrics and monitoring for the ladder service
//!
//! This module provides Prometheus metrics collection and the HTTP server
//! that exposes them next to the health probes and the ladder API.

pub mod collector;
pub mod health;

pub use collector::{
    MatchMetrics, MetricsCollector, MetricsTimer, PerformanceMetrics, ServiceMetrics,
};
pub use health::{encode_metrics, HealthServer, HealthServerConfig};
