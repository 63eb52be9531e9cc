//! # treffpunkt-observability
//!
//! Observability-Crate fuer Treffpunkt:
//! - Prometheus-kompatible Metriken (`/metrics`)
//! - Health-Check-Endpunkt (`/health`)
//! - Structured Logging via tracing-subscriber
//! - Request-Metriken und Tracing-Layer

pub mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;

pub use health::{health_router, DbPruefer, HealthResponse, HealthState, HealthStatus};
pub use logging::logging_initialisieren;
pub use metrics::{metrics_router, TreffpunktMetriken};
pub use middleware::{request_metriken, request_trace_layer};

use axum::Router;

/// Router mit `/metrics` und `/health`
pub fn observability_router(metriken: TreffpunktMetriken, health: HealthState) -> Router {
    Router::new()
        .merge(metrics_router(metriken))
        .merge(health_router(health))
}
