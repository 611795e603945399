//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist. Kommandozeilen-Optionen ueberschreiben die Datei.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use teletalkie_core::TeletalkieError;
use teletalkie_observability::{log_format_gueltig, log_level_gueltig};
use teletalkie_signaling::RelayConfig;

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Relay-Einstellungen (Postfach, Keepalive, Limits)
    pub relay: RelayEinstellungen,
    /// Statische Web-Dateien
    pub web: WebEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Listen-Adresse; `:8080` steht fuer alle Interfaces
    pub listen_adresse: String,
    /// HTTPS/WSS mit selbstsigniertem Zertifikat
    pub tls: bool,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            listen_adresse: ":8080".into(),
            tls: false,
        }
    }
}

/// Relay-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayEinstellungen {
    /// Kapazitaet des Postfachs pro Teilnehmer (Frames)
    pub postfach_groesse: usize,
    /// Keepalive-Ping-Intervall in Sekunden
    pub ping_intervall_sek: u64,
    /// Zeitlimit fuer jeden Schreibvorgang in Sekunden
    pub schreib_timeout_sek: u64,
    /// Maximale Groesse einer eingehenden Nachricht in Bytes
    pub max_frame_groesse: usize,
}

impl Default for RelayEinstellungen {
    fn default() -> Self {
        let standard = RelayConfig::default();
        Self {
            postfach_groesse: standard.postfach_groesse,
            ping_intervall_sek: standard.ping_intervall.as_secs(),
            schreib_timeout_sek: standard.schreib_timeout.as_secs(),
            max_frame_groesse: standard.max_frame_groesse,
        }
    }
}

/// Statische Web-Dateien
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebEinstellungen {
    /// Verzeichnis mit index.html, manifest.json, sw.js usw.
    pub verzeichnis: PathBuf,
}

impl Default for WebEinstellungen {
    fn default() -> Self {
        Self {
            verzeichnis: PathBuf::from("web"),
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    ///
    /// Gibt `None` zurueck wenn die Datei nicht existiert; der Aufrufer
    /// entscheidet dann ueber Standardwerte (und meldet es, sobald das
    /// Logging steht).
    pub fn laden(pfad: &Path) -> anyhow::Result<Option<Self>> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt).map_err(|e| {
                    anyhow::anyhow!("Konfigurationsfehler in '{}': {e}", pfad.display())
                })?;
                Ok(Some(config))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{}' nicht lesbar: {e}",
                pfad.display()
            )),
        }
    }

    /// Uebernimmt Kommandozeilen-Optionen
    ///
    /// `--tls` kann TLS nur einschalten, nicht abschalten.
    pub fn cli_uebernehmen(&mut self, addr: Option<String>, tls: bool) {
        if let Some(addr) = addr {
            self.netzwerk.listen_adresse = addr;
        }
        if tls {
            self.netzwerk.tls = true;
        }
    }

    /// Prueft die Werte auf Plausibilitaet
    pub fn validieren(&self) -> Result<(), TeletalkieError> {
        self.listen_adresse()?;

        let relay = &self.relay;
        if relay.postfach_groesse == 0 {
            return Err(TeletalkieError::Konfiguration(
                "relay.postfach_groesse muss groesser als 0 sein".into(),
            ));
        }
        if relay.ping_intervall_sek == 0 || relay.schreib_timeout_sek == 0 {
            return Err(TeletalkieError::Konfiguration(
                "relay.ping_intervall_sek und relay.schreib_timeout_sek muessen groesser als 0 sein"
                    .into(),
            ));
        }
        if relay.max_frame_groesse < 2 {
            return Err(TeletalkieError::Konfiguration(
                "relay.max_frame_groesse ist zu klein".into(),
            ));
        }

        if !log_level_gueltig(&self.logging.level) {
            return Err(TeletalkieError::Konfiguration(format!(
                "Ungueltiges logging.level '{}' (erlaubt: trace, debug, info, warn, error)",
                self.logging.level
            )));
        }
        if !log_format_gueltig(&self.logging.format) {
            return Err(TeletalkieError::Konfiguration(format!(
                "Ungueltiges logging.format '{}' (erlaubt: text, json)",
                self.logging.format
            )));
        }
        Ok(())
    }

    /// Gibt die Listen-Adresse als `SocketAddr` zurueck
    ///
    /// Eine Adresse ohne Host (`:8080`) bindet auf alle IPv4-Interfaces.
    pub fn listen_adresse(&self) -> Result<SocketAddr, TeletalkieError> {
        let roh = self.netzwerk.listen_adresse.trim();
        let adresse = if roh.starts_with(':') {
            format!("0.0.0.0{roh}")
        } else {
            roh.to_string()
        };
        adresse.parse().map_err(|e| {
            TeletalkieError::Konfiguration(format!("Ungueltige Listen-Adresse '{roh}': {e}"))
        })
    }

    /// Prueft ob das Web-Verzeichnis einen Client enthaelt
    ///
    /// Der Server startet auch ohne; `/` antwortet dann mit 404.
    pub fn web_client_vorhanden(&self) -> bool {
        self.web.verzeichnis.join("index.html").is_file()
    }

    /// Baut die Laufzeit-Konfiguration des Relays
    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            postfach_groesse: self.relay.postfach_groesse,
            ping_intervall: Duration::from_secs(self.relay.ping_intervall_sek),
            schreib_timeout: Duration::from_secs(self.relay.schreib_timeout_sek),
            max_frame_groesse: self.relay.max_frame_groesse,
            web_verzeichnis: self.web.verzeichnis.clone(),
        }
    }
}
