//! Relay-Logik – Client-Frames in Raum-Operationen uebersetzen
//!
//! Unabhaengig vom Transport: Broadcasts laufen ueber die Postfaecher der
//! Teilnehmer, Direktantworten (erteilt/verweigert) gibt `frame_ausfuehren`
//! an den Aufrufer zurueck, der sie auf den eigenen Socket schreibt.
//!
//! Nach einer Erteilung verschickt der Aufrufer den Roster erst, wenn `0x10`
//! geschrieben ist, damit der Anfragende die Erteilung vor dem Roster sieht.

use std::sync::Arc;

use teletalkie_observability::RelayMetrics;
use teletalkie_protocol::{ClientFrame, ServerFrame};
use teletalkie_room::{Peer, Room, Zustellbericht};

/// Fuehrt einen Client-Frame aus
///
/// Gibt die Direktantwort fuer den Absender zurueck, falls es eine gibt.
pub fn frame_ausfuehren(
    frame: ClientFrame,
    peer: &Arc<Peer>,
    metriken: &RelayMetrics,
) -> Option<ServerFrame> {
    let raum = peer.room();

    match frame {
        ClientFrame::RequestFloor => {
            if raum.try_acquire(peer) {
                metriken.floor_grants_total.inc();
                Some(ServerFrame::Granted)
            } else {
                metriken.floor_denials_total.inc();
                tracing::debug!(room = %raum.name(), peer = %peer.name(), "Sprechrecht verweigert");
                Some(ServerFrame::Denied)
            }
        }

        ClientFrame::ReleaseFloor => {
            raum.release(peer);
            // Wird immer gesendet, auch ohne gehaltenes Sprechrecht
            senden(raum, Some(peer), &ServerFrame::Released, metriken);
            roster_senden(raum, metriken);
            None
        }

        ClientFrame::MediaChunk(nutzlast) => {
            if !raum.is_talker(peer) {
                tracing::trace!(peer = %peer.name(), "Medien-Chunk ohne Sprechrecht verworfen");
                return None;
            }
            let bericht = senden(raum, Some(peer), &ServerFrame::RelayChunk(nutzlast), metriken);
            metriken.frames_relayed_total.inc_by(bericht.zugestellt as u64);
            None
        }
    }
}

/// Sendet die aktuelle Teilnehmerliste an alle Mitglieder
pub fn roster_senden(raum: &Room, metriken: &RelayMetrics) -> Zustellbericht {
    senden(raum, None, &ServerFrame::Roster(raum.roster()), metriken)
}

fn senden(
    raum: &Room,
    absender: Option<&Peer>,
    frame: &ServerFrame,
    metriken: &RelayMetrics,
) -> Zustellbericht {
    let bytes = match frame.encode() {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(room = %raum.name(), fehler = %e, "Frame-Kodierung fehlgeschlagen");
            return Zustellbericht::default();
        }
    };

    let bericht = raum.broadcast(absender, bytes);
    metriken.frames_dropped_total.inc_by(bericht.verworfen as u64);
    bericht
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
