//! Health-Check-Endpunkt fuer TeleTalkie
//!
//! Endpoint: `GET /health`
//! Response: JSON mit Status, Version, Uptime sowie Raum- und Teilnehmerzahl

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Status des Health-Checks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// Server faehrt herunter, nimmt aber noch Anfragen an
    Draining,
}

/// Antwort des Health-Check-Endpunkts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub rooms: usize,
    pub peers: usize,
}

/// Momentane Auslastung des Relays
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Auslastung {
    pub raeume: usize,
    pub teilnehmer: usize,
}

type AuslastungsQuelle = Arc<dyn Fn() -> Auslastung + Send + Sync>;

/// Geteilter Zustand fuer den Health-Check-Handler
#[derive(Clone)]
pub struct HealthState {
    start_time: Arc<Instant>,
    herunterfahren: Arc<AtomicBool>,
    auslastung: AuslastungsQuelle,
}

impl HealthState {
    /// `auslastung` wird bei jeder Anfrage aufgerufen
    pub fn neu<F>(auslastung: F) -> Self
    where
        F: Fn() -> Auslastung + Send + Sync + 'static,
    {
        Self {
            start_time: Arc::new(Instant::now()),
            herunterfahren: Arc::new(AtomicBool::new(false)),
            auslastung: Arc::new(auslastung),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Markiert den Server als herunterfahrend (`/health` liefert dann 503)
    pub fn herunterfahren_melden(&self) {
        self.herunterfahren.store(true, Ordering::Relaxed);
    }

    pub fn status(&self) -> HealthStatus {
        if self.herunterfahren.load(Ordering::Relaxed) {
            HealthStatus::Draining
        } else {
            HealthStatus::Healthy
        }
    }

    pub fn antwort(&self) -> HealthResponse {
        let auslastung = (self.auslastung)();
        HealthResponse {
            status: self.status(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.uptime_seconds(),
            rooms: auslastung.raeume,
            peers: auslastung.teilnehmer,
        }
    }
}

/// Axum-Router fuer den `/health`-Endpunkt
pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}

/// `GET /health` – gibt den Serverstatus zurueck
async fn health_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let response = state.antwort();
    let http_status = match response.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Draining => StatusCode::SERVICE_UNAVAILABLE,
    };
    (http_status, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn state_mit(raeume: usize, teilnehmer: usize) -> HealthState {
        HealthState::neu(move || Auslastung { raeume, teilnehmer })
    }

    #[test]
    fn frischer_state_ist_healthy() {
        let state = state_mit(0, 0);
        assert!(state.uptime_seconds() < 5);
        assert_eq!(state.status(), HealthStatus::Healthy);
    }

    #[test]
    fn herunterfahren_setzt_draining() {
        let state = state_mit(0, 0);
        state.herunterfahren_melden();
        assert_eq!(state.status(), HealthStatus::Draining);
    }

    #[test]
    fn antwort_enthaelt_auslastung() {
        let response = state_mit(2, 5).antwort();
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(json.contains("\"rooms\":2"));
        assert!(json.contains("\"peers\":5"));
    }

    #[tokio::test]
    async fn endpunkt_liefert_200_und_503() {
        let state = state_mit(1, 1);
        let app = health_router(state.clone());

        let antwort = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(antwort.status(), StatusCode::OK);

        state.herunterfahren_melden();
        let antwort = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(antwort.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
