//! Client-Verbindung – Verwaltet eine einzelne WebSocket-Verbindung
//!
//! Jede Verbindung besitzt genau einen Teilnehmer. Die Eingangs-Schleife
//! laeuft im Upgrade-Task, die Ausgangs-Schleife in einem eigenen Task.
//!
//! ## State Machine
//! ```text
//! Verbinden -> Aktiv -> Abbau -> Geschlossen
//! ```
//!
//! - Verbinden: `Hub::join`, Roster an alle
//! - Aktiv: beide Schleifen laufen; die zuerst beendete bricht die andere ab
//! - Abbau: `Hub::leave` (genau einmal), Socket schliessen, Roster an die
//!   verbleibenden Teilnehmer
//!
//! ## Keepalive
//! Die Ausgangs-Schleife sendet alle `ping_intervall` einen WebSocket-Ping.
//! Die Eingangs-Schleife meldet jeden Pong ueber einen `watch`-Kanal zurueck.
//! Kommt innerhalb von `schreib_timeout` nach dem Ping kein Pong, gilt die
//! Gegenseite als verschwunden. Jeder Schreibvorgang ist ebenfalls durch
//! `schreib_timeout` begrenzt; ein Fehler oder Timeout beendet die Verbindung.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use teletalkie_core::{Result, TeletalkieError};
use teletalkie_protocol::{ClientFrame, ProtocolError, ServerFrame};
use teletalkie_room::{Peer, Postfach};
use tokio::sync::{watch, Mutex};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::relay;
use crate::state::RelayState;

// ---------------------------------------------------------------------------
// Schreiber
// ---------------------------------------------------------------------------

/// Schreib-Seite des Sockets, geteilt zwischen beiden Schleifen
///
/// Der async Mutex serialisiert ganze Nachrichten: Direktantworten der
/// Eingangs-Schleife und Frames der Ausgangs-Schleife werden nie verschraenkt.
#[derive(Clone)]
struct Schreiber {
    sink: Arc<Mutex<SplitSink<WebSocket, Message>>>,
    timeout: Duration,
}

impl Schreiber {
    fn neu(sink: SplitSink<WebSocket, Message>, timeout: Duration) -> Self {
        Self {
            sink: Arc::new(Mutex::new(sink)),
            timeout,
        }
    }

    /// Sendet eine Nachricht, begrenzt durch das Schreib-Timeout
    ///
    /// Das Warten auf den Mutex zaehlt mit zum Timeout.
    async fn senden(&self, nachricht: Message) -> Result<()> {
        let schreiben = async {
            let mut sink = self.sink.lock().await;
            sink.send(nachricht).await
        };

        match tokio::time::timeout(self.timeout, schreiben).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(TeletalkieError::Getrennt(e.to_string())),
            Err(_) => Err(TeletalkieError::Zeitlimit(format!(
                "Schreiben nach {:?} abgebrochen",
                self.timeout
            ))),
        }
    }

    async fn frame_senden(&self, frame: Bytes) -> Result<()> {
        self.senden(Message::Binary(frame.to_vec())).await
    }

    async fn ping(&self) -> Result<()> {
        self.senden(Message::Ping(Vec::new())).await
    }

    /// Schliesst den Socket; Fehler sind hier ohne Bedeutung
    async fn schliessen(&self, grund: Option<CloseFrame<'static>>) {
        let schliessen = async {
            let mut sink = self.sink.lock().await;
            if let Some(grund) = grund {
                let _ = sink.send(Message::Close(Some(grund))).await;
            }
            let _ = sink.close().await;
        };
        let _ = tokio::time::timeout(self.timeout, schliessen).await;
    }
}

// ---------------------------------------------------------------------------
// Verbindungsende
// ---------------------------------------------------------------------------

/// Grund, aus dem die Eingangs-Schleife endet
#[derive(Debug)]
enum Ende {
    /// Close-Frame vom Client (mit Status-Code, falls vorhanden)
    Geschlossen(Option<u16>),
    /// Stream ohne Close-Frame beendet
    StreamEnde,
    /// Lesefehler auf dem Socket
    Lesefehler(String),
    /// Direktantwort konnte nicht geschrieben werden
    Schreibfehler(String),
    /// Ausgangs-Schleife beendet oder Server faehrt herunter
    Abgebrochen,
}

impl Ende {
    fn protokollieren(&self, peer: &Peer) {
        let raum = peer.room().name();
        match self {
            Self::Geschlossen(code)
                if code.map_or(true, |c| {
                    matches!(c, close_code::NORMAL | close_code::AWAY | close_code::STATUS)
                }) =>
            {
                tracing::info!(room = %raum, peer = %peer.name(), code = ?code, "Client sauber getrennt");
            }
            Self::Geschlossen(code) => {
                tracing::warn!(room = %raum, peer = %peer.name(), code = ?code, "Client mit Fehlercode getrennt");
            }
            Self::StreamEnde => {
                tracing::info!(room = %raum, peer = %peer.name(), "Verbindung ohne Close-Frame beendet");
            }
            Self::Lesefehler(fehler) => {
                tracing::warn!(room = %raum, peer = %peer.name(), %fehler, "Lesefehler");
            }
            Self::Schreibfehler(fehler) => {
                tracing::warn!(room = %raum, peer = %peer.name(), %fehler, "Direktantwort fehlgeschlagen");
            }
            Self::Abgebrochen => {
                tracing::debug!(room = %raum, peer = %peer.name(), "Eingangs-Schleife abgebrochen");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ClientVerbindung
// ---------------------------------------------------------------------------

/// Verarbeitet eine einzelne WebSocket-Verbindung
pub struct ClientVerbindung {
    state: Arc<RelayState>,
    remote: Option<SocketAddr>,
}

impl ClientVerbindung {
    /// Erstellt eine neue ClientVerbindung
    pub fn neu(state: Arc<RelayState>, remote: Option<SocketAddr>) -> Self {
        Self { state, remote }
    }

    /// Bedient die Verbindung bis zu ihrem Ende
    ///
    /// Tritt dem Raum bei, startet die Ausgangs-Schleife und fuehrt die
    /// Eingangs-Schleife im aktuellen Task aus. Danach wird der Teilnehmer
    /// genau einmal abgemeldet.
    pub async fn verarbeiten(self, socket: WebSocket, raum_name: String, peer_name: String) {
        let state = self.state;

        // --- Verbinden ---
        let (peer, postfach) = state.hub.join(&raum_name, &peer_name);
        state.metriken.connections_active.inc();
        state.raeume_aktualisieren();
        tracing::info!(
            room = %raum_name,
            peer = %peer_name,
            remote = ?self.remote,
            "WebSocket verbunden"
        );

        let (sink, stream) = socket.split();
        let schreiber = Schreiber::neu(sink, state.config.schreib_timeout);
        let abbruch = state.herunterfahren.child_token();
        let (pong_tx, pong_rx) = watch::channel(Instant::now());

        let ausgang = tokio::spawn(ausgangs_schleife(
            schreiber.clone(),
            postfach,
            Keepalive {
                intervall: state.config.ping_intervall,
                pong_timeout: state.config.schreib_timeout,
                pong_rx,
            },
            abbruch.clone(),
            peer_name.clone(),
        ));

        relay::roster_senden(peer.room(), &state.metriken);

        // --- Aktiv ---
        let ende = eingangs_schleife(stream, &peer, &schreiber, &state, &abbruch, &pong_tx).await;
        ende.protokollieren(&peer);

        // --- Abbau ---
        abbruch.cancel();
        state.hub.leave(&peer);
        if let Err(e) = ausgang.await {
            tracing::error!(peer = %peer_name, fehler = %e, "Ausgangs-Task abgestuerzt");
        }

        let grund = state.herunterfahren.is_cancelled().then(|| CloseFrame {
            code: close_code::AWAY,
            reason: "Server wird heruntergefahren".into(),
        });
        schreiber.schliessen(grund).await;

        relay::roster_senden(peer.room(), &state.metriken);
        state.metriken.connections_active.dec();
        state.raeume_aktualisieren();

        tracing::info!(room = %raum_name, peer = %peer_name, "Verbindung beendet");
    }
}

// ---------------------------------------------------------------------------
// Schleifen
// ---------------------------------------------------------------------------

/// Liest Nachrichten bis Close, Fehler, Stream-Ende oder Abbruch
async fn eingangs_schleife(
    mut stream: SplitStream<WebSocket>,
    peer: &Arc<Peer>,
    schreiber: &Schreiber,
    state: &RelayState,
    abbruch: &CancellationToken,
    pong_tx: &watch::Sender<Instant>,
) -> Ende {
    loop {
        let nachricht = tokio::select! {
            _ = abbruch.cancelled() => return Ende::Abgebrochen,
            nachricht = stream.next() => nachricht,
        };

        match nachricht {
            None => return Ende::StreamEnde,
            Some(Err(e)) => return Ende::Lesefehler(e.to_string()),
            Some(Ok(Message::Close(frame))) => {
                return Ende::Geschlossen(frame.map(|f| f.code));
            }
            Some(Ok(Message::Binary(daten))) => {
                if daten.is_empty() {
                    continue;
                }
                if let Err(e) = binaer_verarbeiten(Bytes::from(daten), peer, schreiber, state).await {
                    return Ende::Schreibfehler(e.to_string());
                }
            }
            Some(Ok(Message::Text(_))) => {
                tracing::debug!(peer = %peer.name(), "Text-Nachricht ignoriert");
            }
            Some(Ok(Message::Pong(_))) => {
                pong_tx.send_replace(Instant::now());
            }
            // Pings beantwortet die WebSocket-Schicht
            Some(Ok(Message::Ping(_))) => {}
        }
    }
}

/// Dekodiert eine binaere Nachricht und schreibt ggf. die Direktantwort
async fn binaer_verarbeiten(
    daten: Bytes,
    peer: &Arc<Peer>,
    schreiber: &Schreiber,
    state: &RelayState,
) -> Result<()> {
    let frame = match ClientFrame::decode(daten) {
        Ok(frame) => frame,
        Err(ProtocolError::UnbekannterTyp(typ)) => {
            tracing::warn!(peer = %peer.name(), typ = format_args!("0x{typ:02x}"), "Unbekannter Nachrichtentyp");
            return Ok(());
        }
        Err(e) => {
            tracing::debug!(peer = %peer.name(), fehler = %e, "Frame ignoriert");
            return Ok(());
        }
    };

    let Some(antwort) = relay::frame_ausfuehren(frame, peer, &state.metriken) else {
        return Ok(());
    };

    let bytes = antwort
        .encode()
        .map_err(|e| TeletalkieError::UngueltigeNachricht(e.to_string()))?;
    schreiber.frame_senden(bytes).await?;

    if antwort == ServerFrame::Granted {
        relay::roster_senden(peer.room(), &state.metriken);
    }
    Ok(())
}

/// Keepalive-Parameter der Ausgangs-Schleife
struct Keepalive {
    intervall: Duration,
    pong_timeout: Duration,
    /// Zeitpunkt des letzten Pongs, gesetzt von der Eingangs-Schleife
    pong_rx: watch::Receiver<Instant>,
}

/// Leert das Postfach auf den Socket und sendet Keepalive-Pings
///
/// Endet bei Abbruch, Schreib-/Ping-Fehler, ausbleibendem Pong oder
/// geschlossenem Postfach und bricht in jedem Fall das gemeinsame Token ab.
async fn ausgangs_schleife(
    schreiber: Schreiber,
    mut postfach: Postfach,
    keepalive: Keepalive,
    abbruch: CancellationToken,
    peer_name: String,
) {
    let _guard = abbruch.clone().drop_guard();

    let Keepalive {
        intervall,
        pong_timeout,
        mut pong_rx,
    } = keepalive;

    let mut ticker = tokio::time::interval_at(Instant::now() + intervall, intervall);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Sendezeitpunkt des noch unbeantworteten Pings
    let mut offener_ping: Option<Instant> = None;

    loop {
        let pong_frist = offener_ping.map(|gesendet| gesendet + pong_timeout);

        tokio::select! {
            _ = abbruch.cancelled() => break,

            _ = tokio::time::sleep_until(pong_frist.unwrap_or_else(Instant::now)), if pong_frist.is_some() => {
                let fehler = TeletalkieError::Zeitlimit(format!("kein Pong nach {pong_timeout:?}"));
                tracing::warn!(peer = %peer_name, %fehler, "Gegenseite antwortet nicht");
                break;
            }

            Ok(()) = pong_rx.changed() => {
                let letzter_pong = *pong_rx.borrow_and_update();
                if offener_ping.is_some_and(|gesendet| letzter_pong >= gesendet) {
                    offener_ping = None;
                }
            }

            _ = ticker.tick() => {
                if offener_ping.is_none() {
                    offener_ping = Some(Instant::now());
                    if let Err(e) = schreiber.ping().await {
                        tracing::warn!(peer = %peer_name, fehler = %e, "Ping fehlgeschlagen");
                        break;
                    }
                }
            }

            frame = postfach.recv() => match frame {
                Some(frame) => {
                    if let Err(e) = schreiber.frame_senden(frame).await {
                        tracing::warn!(peer = %peer_name, fehler = %e, "Senden fehlgeschlagen");
                        break;
                    }
                }
                None => {
                    tracing::debug!(peer = %peer_name, "Postfach geschlossen");
                    break;
                }
            },
        }
    }
}
