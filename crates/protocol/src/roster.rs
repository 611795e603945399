//! Roster-Nutzlast (Teilnehmerliste + aktueller Sprecher)
//!
//! Wird bei jeder Aenderung der Mitgliedschaft oder des Sprechrechts an alle
//! Teilnehmer eines Raums gesendet, auch an den Ausloeser.
//!
//! ```json
//! {"peers": ["alice", "bob"], "talker": "alice"}
//! ```
//!
//! `talker` ist ein leerer String wenn das Sprechrecht frei ist.

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};

/// Teilnehmerliste eines Raums zu einem Zeitpunkt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterPayload {
    /// Anzeigenamen aller Teilnehmer (Reihenfolge = Snapshot-Reihenfolge)
    pub peers: Vec<String>,
    /// Anzeigename des Sprechers, leer wenn frei
    pub talker: String,
}

impl RosterPayload {
    /// Erstellt eine neue Teilnehmerliste
    pub fn neu(peers: Vec<String>, talker: Option<String>) -> Self {
        Self {
            peers,
            talker: talker.unwrap_or_default(),
        }
    }

    /// Serialisiert die Liste als JSON
    pub fn to_json(&self) -> ProtocolResult<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Roster(e.to_string()))
    }
}
