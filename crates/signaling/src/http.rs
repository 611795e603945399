//! HTTP-Router: WebSocket-Upgrade, statische Dateien, Observability
//!
//! `/manifest.json` und `/sw.js` bekommen eigene Header, damit Browser die
//! App als PWA installieren und den Service Worker fuer `/` registrieren.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocketUpgrade},
        ConnectInfo, Query, State,
    },
    http::{header, HeaderName, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use teletalkie_core::TeletalkieError;
use teletalkie_observability::{health_router, metrics_router, request_timing_layer, timing_middleware};
use tower::ServiceBuilder;
use tower_http::{
    services::{ServeDir, ServeFile},
    set_header::SetResponseHeaderLayer,
};

use crate::connection::ClientVerbindung;
use crate::state::RelayState;

/// Query-Parameter des WebSocket-Endpunkts
#[derive(Debug, Default, Deserialize)]
pub struct WsParameter {
    pub room: Option<String>,
    pub name: Option<String>,
}

impl WsParameter {
    /// Prueft die Parameter; leere Werte gelten als fehlend
    pub fn pruefen(self) -> Result<(String, String), TeletalkieError> {
        let room = self
            .room
            .filter(|r| !r.is_empty())
            .ok_or(TeletalkieError::FehlenderParameter("room"))?;
        let name = self
            .name
            .filter(|n| !n.is_empty())
            .ok_or(TeletalkieError::FehlenderParameter("name"))?;
        Ok((room, name))
    }
}

/// Baut den vollstaendigen Router
pub fn router(state: Arc<RelayState>) -> Router {
    let web = state.config.web_verzeichnis.clone();

    let manifest = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/manifest+json"),
        ))
        .service(ServeFile::new(web.join("manifest.json")));

    let service_worker = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/javascript"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("service-worker-allowed"),
            HeaderValue::from_static("/"),
        ))
        .service(ServeFile::new(web.join("sw.js")));

    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(Arc::clone(&state))
        .merge(metrics_router(state.metriken.clone()))
        .merge(health_router(state.health.clone()))
        .route_service("/manifest.json", manifest)
        .route_service("/sw.js", service_worker)
        .fallback_service(ServeDir::new(web))
        .layer(middleware::from_fn_with_state(
            state.metriken.clone(),
            timing_middleware,
        ))
        .layer(request_timing_layer())
}

/// `GET /ws?room=<raum>&name=<name>` – WebSocket-Upgrade
///
/// Fehlende oder leere Parameter werden vor dem Upgrade mit 400 abgelehnt.
async fn ws_handler(
    State(state): State<Arc<RelayState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    Query(parameter): Query<WsParameter>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let (raum, name) = match parameter.pruefen() {
        Ok(werte) => werte,
        Err(e) => {
            tracing::debug!(fehler = %e, "WebSocket-Anfrage abgelehnt");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    let upgrade = match upgrade {
        Ok(upgrade) => upgrade,
        Err(rejection) => return rejection.into_response(),
    };

    let remote = connect_info.map(|ConnectInfo(addr)| addr);
    let max = state.config.max_frame_groesse;

    upgrade
        .max_message_size(max)
        .max_frame_size(max)
        .on_failed_upgrade(|fehler| {
            tracing::warn!(%fehler, "WebSocket-Upgrade fehlgeschlagen");
        })
        .on_upgrade(move |socket| async move {
            ClientVerbindung::neu(state, remote)
                .verarbeiten(socket, raum, name)
                .await;
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
