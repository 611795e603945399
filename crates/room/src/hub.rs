//! Hub – Registry aller Raeume
//!
//! Raeume entstehen beim ersten Beitritt und verschwinden nach dem letzten
//! Austritt. Der Registry-Mutex schuetzt nur die Map; Raum-interne
//! Operationen laufen ausserhalb davon, es gibt also keine Lock-Reihenfolge
//! zwischen Hub und Raum.
//!
//! ## Wettlauf Austritt/Beitritt
//! `Room::remove_peer` legt einen leer gewordenen Raum im selben kritischen
//! Abschnitt still. Ein Beitritt, der den Raum noch vor dem Entfernen aus der
//! Map gefunden hat, scheitert an `add_peer` und versucht es erneut – dann
//! mit einem frischen Raum. `leave` entfernt den Map-Eintrag nur, wenn er
//! noch auf genau den geleerten Raum zeigt.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::peer::{Peer, Postfach, POSTFACH_GROESSE};
use crate::room::Room;

/// Zentrale Raum-Registry
///
/// Thread-safe und `Clone`-faehig (innerer Arc).
#[derive(Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

struct HubInner {
    raeume: Mutex<HashMap<String, Arc<Room>>>,
    postfach_groesse: usize,
}

impl Hub {
    /// Erstellt einen leeren Hub mit Standard-Postfachgroesse
    pub fn neu() -> Self {
        Self::mit_postfach_groesse(POSTFACH_GROESSE)
    }

    /// Erstellt einen leeren Hub mit eigener Postfachgroesse
    pub fn mit_postfach_groesse(postfach_groesse: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                raeume: Mutex::new(HashMap::new()),
                postfach_groesse,
            }),
        }
    }

    /// Tritt einem Raum bei (legt ihn bei Bedarf an)
    ///
    /// Erstellt immer einen neuen Teilnehmer mit frischem Postfach und gibt
    /// ihn zusammen mit der Empfangs-Seite des Postfachs zurueck.
    pub fn join(&self, raum_name: &str, peer_name: &str) -> (Arc<Peer>, Postfach) {
        loop {
            let raum = self.raum_holen_oder_anlegen(raum_name);
            let (peer, postfach) = Peer::neu(peer_name, Arc::clone(&raum), self.inner.postfach_groesse);

            if raum.add_peer(Arc::clone(&peer)) {
                tracing::info!(
                    room = %raum_name,
                    peer = %peer_name,
                    teilnehmer = raum.peer_count(),
                    "Teilnehmer beigetreten"
                );
                return (peer, postfach);
            }

            // Raum wurde zwischen Lookup und Beitritt stillgelegt
            tracing::debug!(room = %raum_name, "Raum stillgelegt – neuer Versuch");
        }
    }

    /// Verlaesst den Raum
    ///
    /// Entfernt die Mitgliedschaft, gibt ein gehaltenes Sprechrecht frei,
    /// schliesst das Postfach und loescht den Raum, falls er leer ist.
    /// Gibt `false` zurueck wenn der Teilnehmer bereits ausgetreten war.
    pub fn leave(&self, peer: &Peer) -> bool {
        if !peer.austritt_markieren() {
            tracing::warn!(peer = %peer.name(), "Teilnehmer hat den Raum bereits verlassen");
            return false;
        }

        let raum = peer.room();
        let leer = raum.remove_peer(peer);
        peer.postfach_schliessen();

        tracing::info!(
            room = %raum.name(),
            peer = %peer.name(),
            teilnehmer = raum.peer_count(),
            "Teilnehmer ausgetreten"
        );

        if leer {
            let mut raeume = self.inner.raeume.lock();
            // Nur loeschen wenn der Eintrag noch dieser Raum ist
            if raeume.get(raum.name()).is_some_and(|r| Arc::ptr_eq(r, raum)) {
                raeume.remove(raum.name());
                tracing::info!(room = %raum.name(), "Leerer Raum geloescht");
            }
        }

        true
    }

    /// Sucht einen Raum nach Namen
    pub fn room(&self, name: &str) -> Option<Arc<Room>> {
        self.inner.raeume.lock().get(name).cloned()
    }

    /// Anzahl der Raeume
    pub fn room_count(&self) -> usize {
        self.inner.raeume.lock().len()
    }

    /// Anzahl der Teilnehmer ueber alle Raeume
    pub fn peer_count(&self) -> usize {
        let raeume: Vec<Arc<Room>> = self.inner.raeume.lock().values().cloned().collect();
        raeume.iter().map(|r| r.peer_count()).sum()
    }

    fn raum_holen_oder_anlegen(&self, name: &str) -> Arc<Room> {
        let mut raeume = self.inner.raeume.lock();

        if let Some(raum) = raeume.get(name) {
            if !raum.ist_stillgelegt() {
                return Arc::clone(raum);
            }
        }

        let raum = Room::neu(name);
        raeume.insert(name.to_string(), Arc::clone(&raum));
        tracing::info!(room = %name, "Raum angelegt");
        raum
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
