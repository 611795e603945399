//! Fehlertypen fuer den Relay-Service

use thiserror::Error;

/// Fehlertyp fuer den Relay-Service
#[derive(Debug, Error)]
pub enum SignalingError {
    /// IO-Fehler (TCP, Socket)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    /// Metriken konnten nicht registriert werden
    #[error("Metriken-Fehler: {0}")]
    Metriken(String),
}

/// Result-Typ fuer den Relay-Service
pub type SignalingResult<T> = Result<T, SignalingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_fehler_wird_konvertiert() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "belegt");
        let e: SignalingError = io.into();
        assert!(matches!(e, SignalingError::Io(_)));
        assert_eq!(e.to_string(), "IO-Fehler: belegt");
    }

    #[test]
    fn metriken_fehler_anzeige() {
        let e = SignalingError::Metriken("doppelt registriert".into());
        assert_eq!(e.to_string(), "Metriken-Fehler: doppelt registriert");
    }
}
