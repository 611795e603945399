//! Fehlertypen fuer das Wire-Protokoll

use thiserror::Error;

/// Fehler beim Dekodieren oder Kodieren von Frames
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame ohne Typ-Byte
    #[error("Leerer Frame")]
    LeererFrame,

    /// Unbekanntes Typ-Byte (vorwaertskompatibel ignorierbar)
    #[error("Unbekannter Nachrichtentyp 0x{0:02x}")]
    UnbekannterTyp(u8),

    /// Roster konnte nicht serialisiert werden
    #[error("Roster-Serialisierung fehlgeschlagen: {0}")]
    Roster(String),
}

/// Result-Typ fuer das Wire-Protokoll
pub type ProtocolResult<T> = Result<T, ProtocolError>;
