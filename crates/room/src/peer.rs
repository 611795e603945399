//! Peer – ein verbundener Teilnehmer
//!
//! Haelt Anzeigename, Raum-Referenz und die Sende-Seite des Postfachs. Die
//! Empfangs-Seite gehoert der Ausgangs-Schleife der Verbindung.
//!
//! Das Postfach wird genau einmal geschlossen (durch `Hub::leave`). Die
//! Sende-Seite existiert nur hier, daher endet `recv()` auf der
//! Empfangs-Seite nach dem Schliessen mit `None`.

use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use teletalkie_core::PeerId;
use tokio::sync::mpsc;

use crate::room::Room;

/// Standard-Kapazitaet eines Postfachs (Frames)
pub const POSTFACH_GROESSE: usize = 64;

/// Empfangs-Seite eines Postfachs
pub type Postfach = mpsc::Receiver<Bytes>;

/// Ergebnis einer nicht-blockierenden Zustellung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zustellung {
    /// Frame liegt im Postfach
    Zugestellt,
    /// Postfach voll, Frame verworfen
    Verworfen,
    /// Postfach bereits geschlossen (Teilnehmer hat den Raum verlassen)
    Geschlossen,
}

/// Ein Teilnehmer in einem Raum
pub struct Peer {
    id: PeerId,
    name: String,
    raum: Arc<Room>,
    /// `None` sobald das Postfach geschlossen wurde
    postfach_tx: Mutex<Option<mpsc::Sender<Bytes>>>,
    verlassen: AtomicBool,
}

impl Peer {
    /// Erstellt einen Teilnehmer mit frischem Postfach
    ///
    /// Nur der Hub legt Teilnehmer an, die Registrierung im Raum erfolgt dort.
    pub(crate) fn neu(name: &str, raum: Arc<Room>, kapazitaet: usize) -> (Arc<Self>, Postfach) {
        let (tx, rx) = mpsc::channel(kapazitaet.max(1));
        let peer = Arc::new(Self {
            id: PeerId::new(),
            name: name.to_string(),
            raum,
            postfach_tx: Mutex::new(Some(tx)),
            verlassen: AtomicBool::new(false),
        });
        (peer, rx)
    }

    /// Interne, eindeutige ID
    pub fn id(&self) -> PeerId {
        self.id
    }

    /// Anzeigename (innerhalb eines Raums nicht eindeutig)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raum dieses Teilnehmers
    pub fn room(&self) -> &Arc<Room> {
        &self.raum
    }

    /// Legt einen Frame nicht-blockierend ins Postfach
    pub fn zustellen(&self, frame: Bytes) -> Zustellung {
        let tx = self.postfach_tx.lock();
        let Some(tx) = tx.as_ref() else {
            return Zustellung::Geschlossen;
        };
        match tx.try_send(frame) {
            Ok(()) => Zustellung::Zugestellt,
            Err(mpsc::error::TrySendError::Full(_)) => Zustellung::Verworfen,
            Err(mpsc::error::TrySendError::Closed(_)) => Zustellung::Geschlossen,
        }
    }

    /// Prueft ob das Postfach noch offen ist
    pub fn ist_offen(&self) -> bool {
        self.postfach_tx.lock().is_some()
    }

    /// Schliesst das Postfach
    ///
    /// Gibt `false` zurueck wenn es bereits geschlossen war.
    pub(crate) fn postfach_schliessen(&self) -> bool {
        self.postfach_tx.lock().take().is_some()
    }

    /// Markiert den Teilnehmer als ausgetreten
    ///
    /// Gibt `true` nur beim ersten Aufruf zurueck.
    pub(crate) fn austritt_markieren(&self) -> bool {
        !self.verlassen.swap(true, Ordering::AcqRel)
    }
}

impl std::fmt::Debug for Peer {
    // Raum nur per Name, sonst Zyklus Peer -> Room -> Peer
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peer")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("raum", &self.raum.name())
            .finish()
    }
}
