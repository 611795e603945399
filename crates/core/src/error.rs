//! Fehlertypen fuer TeleTalkie
//!
//! Zentraler Fehler-Enum fuer Zustaende, die crate-uebergreifend auftreten.
//! Untermodule definieren eigene Fehler und konvertieren via `#[from]`.

use thiserror::Error;

/// Globaler Result-Alias fuer TeleTalkie
pub type Result<T> = std::result::Result<T, TeletalkieError>;

/// Crate-uebergreifende Fehler im TeleTalkie-System
#[derive(Debug, Error)]
pub enum TeletalkieError {
    // --- Verbindung & Netzwerk ---
    #[error("Verbindung getrennt: {0}")]
    Getrennt(String),

    #[error("Zeitlimit ueberschritten: {0}")]
    Zeitlimit(String),

    // --- Protokoll ---
    #[error("Ungueltige Nachricht: {0}")]
    UngueltigeNachricht(String),

    #[error("Fehlender Verbindungsparameter: {0}")]
    FehlenderParameter(&'static str),

    // --- Konfiguration ---
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),
}
