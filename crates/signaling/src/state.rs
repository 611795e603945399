//! Geteilter Zustand des Relay-Servers
//!
//! Enthaelt den Hub, die Laufzeit-Konfiguration, die Metriken und ein
//! Shutdown-Token. Jede Verbindung bekommt ein Kind-Token davon.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use teletalkie_observability::{Auslastung, HealthState, RelayMetrics};
use teletalkie_protocol::MAX_FRAME_GROESSE;
use teletalkie_room::{Hub, POSTFACH_GROESSE};
use tokio_util::sync::CancellationToken;

use crate::error::{SignalingError, SignalingResult};

/// Laufzeit-Konfiguration einer Relay-Instanz
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Kapazitaet des Postfachs pro Teilnehmer
    pub postfach_groesse: usize,
    /// Abstand zwischen zwei Keepalive-Pings
    pub ping_intervall: Duration,
    /// Obergrenze fuer jeden Schreibvorgang und jeden Ping
    pub schreib_timeout: Duration,
    /// Maximale Groesse einer eingehenden WebSocket-Nachricht
    pub max_frame_groesse: usize,
    /// Verzeichnis mit den statischen Web-Dateien
    pub web_verzeichnis: PathBuf,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            postfach_groesse: POSTFACH_GROESSE,
            ping_intervall: Duration::from_secs(30),
            schreib_timeout: Duration::from_secs(5),
            max_frame_groesse: MAX_FRAME_GROESSE,
            web_verzeichnis: PathBuf::from("web"),
        }
    }
}

/// Gemeinsamer Zustand aller Verbindungen
pub struct RelayState {
    pub hub: Hub,
    pub config: RelayConfig,
    pub metriken: RelayMetrics,
    pub health: HealthState,
    /// Wird beim Herunterfahren ausgeloest
    pub herunterfahren: CancellationToken,
}

impl RelayState {
    /// Erstellt einen frischen Zustand mit leerem Hub
    pub fn neu(config: RelayConfig) -> SignalingResult<Arc<Self>> {
        let metriken =
            RelayMetrics::neu().map_err(|e| SignalingError::Metriken(e.to_string()))?;
        let hub = Hub::mit_postfach_groesse(config.postfach_groesse);

        let health = {
            let hub = hub.clone();
            HealthState::neu(move || Auslastung {
                raeume: hub.room_count(),
                teilnehmer: hub.peer_count(),
            })
        };

        Ok(Arc::new(Self {
            hub,
            config,
            metriken,
            health,
            herunterfahren: CancellationToken::new(),
        }))
    }

    /// Leitet das Herunterfahren ein
    ///
    /// `/health` meldet ab jetzt `draining`, alle offenen Verbindungen werden
    /// abgebaut.
    pub fn herunterfahren(&self) {
        self.health.herunterfahren_melden();
        self.herunterfahren.cancel();
    }

    /// Gleicht die Raum-Gauge mit dem Hub ab
    pub(crate) fn raeume_aktualisieren(&self) {
        self.metriken
            .rooms_active
            .set(self.hub.room_count() as i64);
    }
}

impl std::fmt::Debug for RelayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayState")
            .field("config", &self.config)
            .field("raeume", &self.hub.room_count())
            .finish_non_exhaustive()
    }
}
