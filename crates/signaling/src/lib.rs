//! teletalkie-signaling – HTTP/WebSocket Relay
//!
//! Dieser Crate verbindet das Netz mit der Raum-Verwaltung: HTTP-Router fuer
//! statische Dateien und Observability-Endpunkte, WebSocket-Upgrade auf
//! `/ws` und pro Verbindung ein Task-Paar aus Eingangs- und Ausgangs-Schleife.
//!
//! ## Architektur
//!
//! ```text
//! TcpListener (klartext_bedienen / tls_bedienen)
//!     |
//!     v
//! axum Router (http::router)
//!     +-- GET /ws            -> WebSocket-Upgrade -> ClientVerbindung
//!     +-- GET /metrics       -> Prometheus
//!     +-- GET /health        -> Health-Check
//!     +-- /manifest.json, /sw.js, /*  -> statische Dateien
//!
//! ClientVerbindung (pro Verbindung)
//!     +-- Eingangs-Schleife  (Socket -> relay::frame_ausfuehren -> Room)
//!     +-- Ausgangs-Schleife  (Postfach + Ping-Ticker -> Socket)
//!     Erste beendete Schleife bricht die andere ueber ein CancellationToken ab.
//! ```

pub mod connection;
pub mod error;
pub mod http;
pub mod relay;
pub mod serve;
pub mod state;

// Bequeme Re-Exporte
pub use connection::ClientVerbindung;
pub use error::{SignalingError, SignalingResult};
pub use http::router;
pub use serve::{klartext_bedienen, tls_bedienen};
pub use state::{RelayConfig, RelayState};
