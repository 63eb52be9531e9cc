//! Prometheus-kompatible Metriken fuer Treffpunkt
//!
//! Registrierte Metriken:
//! - `treffpunkt_hub_peers` – Gauge: Im Hub registrierte Peers
//! - `treffpunkt_room_peers` – Gauge: Peers in Live-Raeumen
//! - `treffpunkt_signaling_relayed_total` – Counter: Weitergeleitete Offer/Answer
//! - `treffpunkt_signaling_dropped_total` – Counter: Verworfene Raum-Nachrichten
//! - `treffpunkt_auth_failures_total` – Counter: Abgewiesene Anfragen ohne gueltige Session
//! - `treffpunkt_http_requests_total` – Counter: HTTP-Anfragen (method, path, status)
//! - `treffpunkt_http_request_duration_seconds` – Histogram: HTTP-Antwortzeit

use std::sync::Arc;

use anyhow::Result;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use treffpunkt_signaling::SignalingMetriken;

/// Alle Treffpunkt-Prometheus-Metriken
#[derive(Clone)]
pub struct TreffpunktMetriken {
    pub registry: Arc<Registry>,

    // Signaling
    pub hub_peers: IntGauge,
    pub room_peers: IntGauge,
    pub signaling_relayed_total: IntCounter,
    pub signaling_dropped_total: IntCounter,

    // Auth
    pub auth_failures_total: IntCounter,

    // HTTP
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,
}

impl TreffpunktMetriken {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        let hub_peers = IntGauge::with_opts(Opts::new(
            "treffpunkt_hub_peers",
            "Anzahl im Hub registrierter Peers",
        ))?;
        registry.register(Box::new(hub_peers.clone()))?;

        let room_peers = IntGauge::with_opts(Opts::new(
            "treffpunkt_room_peers",
            "Anzahl Peers in Live-Raeumen",
        ))?;
        registry.register(Box::new(room_peers.clone()))?;

        let signaling_relayed_total = IntCounter::with_opts(Opts::new(
            "treffpunkt_signaling_relayed_total",
            "Weitergeleitete Offer/Answer-Nachrichten",
        ))?;
        registry.register(Box::new(signaling_relayed_total.clone()))?;

        let signaling_dropped_total = IntCounter::with_opts(Opts::new(
            "treffpunkt_signaling_dropped_total",
            "Verworfene Raum-Nachrichten (Ziel fehlt, unbekanntes Event)",
        ))?;
        registry.register(Box::new(signaling_dropped_total.clone()))?;

        let auth_failures_total = IntCounter::with_opts(Opts::new(
            "treffpunkt_auth_failures_total",
            "Abgewiesene Anfragen ohne gueltige Session",
        ))?;
        registry.register(Box::new(auth_failures_total.clone()))?;

        let http_requests_total = IntCounterVec::new(
            Opts::new("treffpunkt_http_requests_total", "Gesamtanzahl HTTP-Anfragen"),
            &["method", "path", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "treffpunkt_http_request_duration_seconds",
                "HTTP-Antwortzeit in Sekunden",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
            &["method", "path"],
        )?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            hub_peers,
            room_peers,
            signaling_relayed_total,
            signaling_dropped_total,
            auth_failures_total,
            http_requests_total,
            http_request_duration_seconds,
        })
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl SignalingMetriken for TreffpunktMetriken {
    fn hub_peers_setzen(&self, anzahl: usize) {
        self.hub_peers.set(i64::try_from(anzahl).unwrap_or(i64::MAX));
    }

    fn raum_peer_betreten(&self) {
        self.room_peers.inc();
    }

    fn raum_peer_verlassen(&self) {
        self.room_peers.dec();
    }

    fn nachricht_weitergeleitet(&self) {
        self.signaling_relayed_total.inc();
    }

    fn nachricht_verworfen(&self) {
        self.signaling_dropped_total.inc();
    }
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router(metriken: TreffpunktMetriken) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(State(metriken): State<TreffpunktMetriken>) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
