//! Prometheus-kompatible Metriken fuer TeleTalkie
//!
//! Registrierte Metriken:
//! - `teletalkie_connections_active` – Gauge: Offene WebSocket-Verbindungen
//! - `teletalkie_rooms_active` – Gauge: Existierende Raeume
//! - `teletalkie_frames_relayed_total` – Counter: Zugestellte Relay-Frames
//! - `teletalkie_frames_dropped_total` – Counter: Wegen vollem Postfach verworfene Frames
//! - `teletalkie_floor_grants_total` – Counter: Erteilte Sprechrechte
//! - `teletalkie_floor_denials_total` – Counter: Abgelehnte Sprechrecht-Anfragen
//! - `teletalkie_http_request_duration_seconds` – Histogram: HTTP-Antwortzeit (method, status)
//!
//! Unter Linux kommen die Standard-Prozessmetriken (`process_*`) dazu.

use anyhow::Result;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Alle Relay-Metriken
#[derive(Clone)]
pub struct RelayMetrics {
    pub registry: Arc<Registry>,

    // Verbindungen und Raeume
    pub connections_active: IntGauge,
    pub rooms_active: IntGauge,

    // Relay
    pub frames_relayed_total: IntCounter,
    pub frames_dropped_total: IntCounter,

    // Sprechrecht
    pub floor_grants_total: IntCounter,
    pub floor_denials_total: IntCounter,

    // HTTP
    pub http_request_duration_seconds: HistogramVec,
}

impl RelayMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        let connections_active = IntGauge::with_opts(Opts::new(
            "teletalkie_connections_active",
            "Anzahl offener WebSocket-Verbindungen",
        ))?;
        registry.register(Box::new(connections_active.clone()))?;

        let rooms_active = IntGauge::with_opts(Opts::new(
            "teletalkie_rooms_active",
            "Anzahl existierender Raeume",
        ))?;
        registry.register(Box::new(rooms_active.clone()))?;

        let frames_relayed_total = IntCounter::with_opts(Opts::new(
            "teletalkie_frames_relayed_total",
            "Gesamtanzahl zugestellter Relay-Frames",
        ))?;
        registry.register(Box::new(frames_relayed_total.clone()))?;

        let frames_dropped_total = IntCounter::with_opts(Opts::new(
            "teletalkie_frames_dropped_total",
            "Gesamtanzahl verworfener Frames (Postfach voll)",
        ))?;
        registry.register(Box::new(frames_dropped_total.clone()))?;

        let floor_grants_total = IntCounter::with_opts(Opts::new(
            "teletalkie_floor_grants_total",
            "Gesamtanzahl erteilter Sprechrechte",
        ))?;
        registry.register(Box::new(floor_grants_total.clone()))?;

        let floor_denials_total = IntCounter::with_opts(Opts::new(
            "teletalkie_floor_denials_total",
            "Gesamtanzahl abgelehnter Sprechrecht-Anfragen",
        ))?;
        registry.register(Box::new(floor_denials_total.clone()))?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "teletalkie_http_request_duration_seconds",
                "HTTP-Antwortzeit in Sekunden",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
            &["method", "status"],
        )?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Self {
            registry: Arc::new(registry),
            connections_active,
            rooms_active,
            frames_relayed_total,
            frames_dropped_total,
            floor_grants_total,
            floor_denials_total,
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

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router(metriken: RelayMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(State(metriken): State<RelayMetrics>) -> impl IntoResponse {
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
