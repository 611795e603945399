//! Room – Mitgliedschaft und Sprechrecht eines benannten Raums
//!
//! Alle Methoden nehmen denselben Raum-Mutex, und zwar nur fuer die Dauer
//! der Feld-Mutation. Zugestellt wird nach dem Freigeben des Locks, sodass
//! ein langsamer Empfaenger nie den ganzen Raum serialisiert.
//!
//! ## Invarianten
//! - Der Sprecher ist, falls gesetzt, immer Mitglied.
//! - Hoechstens ein Sprecher pro Raum.
//! - Entfernen des Sprechers loescht das Sprechrecht im selben kritischen
//!   Abschnitt.

use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use teletalkie_protocol::RosterPayload;

use crate::peer::{Peer, Zustellung};

// ---------------------------------------------------------------------------
// Zustellbericht
// ---------------------------------------------------------------------------

/// Ergebnis eines Broadcasts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Zustellbericht {
    /// Anzahl der Empfaenger, in deren Postfach der Frame liegt
    pub zugestellt: usize,
    /// Anzahl der Empfaenger mit vollem Postfach
    pub verworfen: usize,
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

struct RaumZustand {
    /// Mitglieder in Beitrittsreihenfolge, eindeutig nach PeerId
    mitglieder: Vec<Arc<Peer>>,
    sprecher: Option<Arc<Peer>>,
}

/// Ein benannter Raum mit Teilnehmern und PTT-Zustand
pub struct Room {
    name: String,
    zustand: Mutex<RaumZustand>,
    /// Gesetzt sobald der letzte Teilnehmer gegangen ist. Ein stillgelegter
    /// Raum nimmt keine Mitglieder mehr auf, der Hub legt dann einen neuen an.
    stillgelegt: AtomicBool,
}

impl Room {
    /// Erstellt einen leeren Raum
    pub(crate) fn neu(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            zustand: Mutex::new(RaumZustand {
                mitglieder: Vec::new(),
                sprecher: None,
            }),
            stillgelegt: AtomicBool::new(false),
        })
    }

    /// Raumname
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Momentaufnahme der Mitglieder
    ///
    /// Aufrufer muessen damit rechnen, dass die Liste beim Verwenden bereits
    /// veraltet ist.
    pub fn peers(&self) -> Vec<Arc<Peer>> {
        self.zustand.lock().mitglieder.clone()
    }

    /// Anzahl der Mitglieder
    pub fn peer_count(&self) -> usize {
        self.zustand.lock().mitglieder.len()
    }

    /// Aktueller Sprecher
    pub fn talker(&self) -> Option<Arc<Peer>> {
        self.zustand.lock().sprecher.clone()
    }

    /// Prueft ob `peer` gerade das Sprechrecht haelt
    pub fn is_talker(&self, peer: &Peer) -> bool {
        self.zustand
            .lock()
            .sprecher
            .as_ref()
            .is_some_and(|s| s.id() == peer.id())
    }

    /// Versucht das Sprechrecht fuer `peer` zu erwerben
    ///
    /// Erfolgreich nur wenn niemand spricht und `peer` Mitglied ist. Keine
    /// Warteschlange: abgewiesene Teilnehmer koennen es spaeter erneut
    /// versuchen.
    pub fn try_acquire(&self, peer: &Arc<Peer>) -> bool {
        let mut zustand = self.zustand.lock();

        if zustand.sprecher.is_some() {
            return false;
        }
        if !zustand.mitglieder.iter().any(|m| m.id() == peer.id()) {
            return false;
        }

        zustand.sprecher = Some(Arc::clone(peer));
        tracing::info!(room = %self.name, peer = %peer.name(), "Sprechrecht erworben");
        true
    }

    /// Gibt das Sprechrecht frei, falls `peer` es haelt
    ///
    /// Gibt `true` zurueck wenn tatsaechlich freigegeben wurde.
    pub fn release(&self, peer: &Peer) -> bool {
        let mut zustand = self.zustand.lock();

        match &zustand.sprecher {
            Some(sprecher) if sprecher.id() == peer.id() => {
                zustand.sprecher = None;
                tracing::info!(room = %self.name, peer = %peer.name(), "Sprechrecht freigegeben");
                true
            }
            _ => false,
        }
    }

    /// Stellt einen Frame allen Mitgliedern ausser `absender` zu
    ///
    /// `None` als Absender erreicht alle Mitglieder (Roster-Updates).
    /// Zustellung ist nicht-blockierend: ein volles Postfach verliert den
    /// Frame, ohne dass der Absender davon erfaehrt.
    pub fn broadcast(&self, absender: Option<&Peer>, frame: Bytes) -> Zustellbericht {
        let empfaenger = self.peers();
        let mut bericht = Zustellbericht::default();

        for peer in empfaenger
            .iter()
            .filter(|p| absender.map_or(true, |a| a.id() != p.id()))
        {
            match peer.zustellen(frame.clone()) {
                Zustellung::Zugestellt => bericht.zugestellt += 1,
                Zustellung::Verworfen => {
                    bericht.verworfen += 1;
                    tracing::warn!(
                        room = %self.name,
                        peer = %peer.name(),
                        "Postfach voll – Frame verworfen"
                    );
                }
                Zustellung::Geschlossen => {
                    tracing::debug!(
                        room = %self.name,
                        peer = %peer.name(),
                        "Postfach geschlossen (Teilnehmer getrennt)"
                    );
                }
            }
        }

        bericht
    }

    /// Teilnehmerliste und Sprecher, in einem kritischen Abschnitt gelesen
    pub fn roster(&self) -> RosterPayload {
        let zustand = self.zustand.lock();
        RosterPayload::neu(
            zustand.mitglieder.iter().map(|p| p.name().to_string()).collect(),
            zustand.sprecher.as_ref().map(|s| s.name().to_string()),
        )
    }

    /// Prueft ob der Raum stillgelegt ist
    pub fn ist_stillgelegt(&self) -> bool {
        self.stillgelegt.load(Ordering::Acquire)
    }

    /// Fuegt ein Mitglied hinzu
    ///
    /// Gibt `false` zurueck wenn der Raum bereits stillgelegt ist.
    pub(crate) fn add_peer(&self, peer: Arc<Peer>) -> bool {
        let mut zustand = self.zustand.lock();

        if self.ist_stillgelegt() {
            return false;
        }
        if !zustand.mitglieder.iter().any(|m| m.id() == peer.id()) {
            zustand.mitglieder.push(peer);
        }
        true
    }

    /// Entfernt ein Mitglied und loescht ggf. das Sprechrecht
    ///
    /// Gibt `true` zurueck wenn der Raum danach leer ist. Ein leerer Raum
    /// wird im selben kritischen Abschnitt stillgelegt.
    pub(crate) fn remove_peer(&self, peer: &Peer) -> bool {
        let mut zustand = self.zustand.lock();

        zustand.mitglieder.retain(|m| m.id() != peer.id());
        if zustand.sprecher.as_ref().is_some_and(|s| s.id() == peer.id()) {
            zustand.sprecher = None;
            tracing::info!(room = %self.name, peer = %peer.name(), "Sprecher hat den Raum verlassen");
        }

        let leer = zustand.mitglieder.is_empty();
        if leer {
            self.stillgelegt.store(true, Ordering::Release);
        }
        leer
    }
}

impl std::fmt::Debug for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Room")
            .field("name", &self.name)
            .field("stillgelegt", &self.ist_stillgelegt())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
