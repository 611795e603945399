//! Integration-Tests: echter Router auf 127.0.0.1:0, Clients via tokio-tungstenite

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use teletalkie_protocol::RosterPayload;
use teletalkie_signaling::{klartext_bedienen, router, RelayConfig, RelayState};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

type Client = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

const WARTEZEIT: Duration = Duration::from_secs(3);

// ---------------------------------------------------------------------------
// Hilfsfunktionen
// ---------------------------------------------------------------------------

async fn server_starten() -> (SocketAddr, Arc<RelayState>) {
    server_starten_mit(RelayConfig::default()).await
}

async fn server_starten_mit(config: RelayConfig) -> (SocketAddr, Arc<RelayState>) {
    let state = RelayState::neu(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(klartext_bedienen(
        listener,
        router(Arc::clone(&state)),
        state.herunterfahren.clone(),
    ));
    (addr, state)
}

async fn verbinden(addr: SocketAddr, raum: &str, name: &str) -> Client {
    let url = format!("ws://{addr}/ws?room={raum}&name={name}");
    let (ws, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    ws
}

async fn senden(ws: &mut Client, daten: &[u8]) {
    ws.send(Message::Binary(daten.to_vec())).await.unwrap();
}

/// Kurzes Keepalive, damit ausbleibende Pongs schnell auffallen
fn schnelles_keepalive() -> RelayConfig {
    RelayConfig {
        ping_intervall: Duration::from_millis(100),
        schreib_timeout: Duration::from_millis(200),
        ..RelayConfig::default()
    }
}

/// Naechste binaere Nachricht (Pings/Pongs werden uebersprungen)
async fn naechster_frame(ws: &mut Client) -> Vec<u8> {
    tokio::time::timeout(WARTEZEIT, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Binary(daten))) => return daten,
                Some(Ok(_)) => continue,
                andere => panic!("Unerwartet: {andere:?}"),
            }
        }
    })
    .await
    .expect("Zeitlimit beim Warten auf Frame")
}

/// Naechster Frame, der kein Roster ist
async fn naechster_nicht_roster(ws: &mut Client) -> Vec<u8> {
    loop {
        let frame = naechster_frame(ws).await;
        if frame.first() != Some(&0x14) {
            return frame;
        }
    }
}

/// Liest Roster-Frames bis einer die Bedingung erfuellt
async fn roster_abwarten(ws: &mut Client, bedingung: impl Fn(&RosterPayload) -> bool) -> RosterPayload {
    loop {
        let frame = naechster_frame(ws).await;
        if frame.first() != Some(&0x14) {
            continue;
        }
        let roster: RosterPayload = serde_json::from_slice(&frame[1..]).unwrap();
        if bedingung(&roster) {
            return roster;
        }
    }
}

/// Stellt sicher, dass innerhalb kurzer Zeit kein Nicht-Roster-Frame ankommt
async fn keine_nutzdaten(ws: &mut Client) {
    let ergebnis = tokio::time::timeout(Duration::from_millis(300), naechster_nicht_roster(ws)).await;
    assert!(ergebnis.is_err(), "Unerwarteter Frame: {ergebnis:?}");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sprechrecht_erteilen_und_verweigern() {
    let (addr, _state) = server_starten().await;
    let mut alice = verbinden(addr, "r1", "alice").await;
    let mut bob = verbinden(addr, "r1", "bob").await;
    roster_abwarten(&mut alice, |r| r.peers.len() == 2).await;

    senden(&mut alice, &[0x01]).await;
    assert_eq!(naechster_nicht_roster(&mut alice).await, vec![0x10]);
    roster_abwarten(&mut bob, |r| r.talker == "alice").await;

    senden(&mut bob, &[0x01]).await;
    assert_eq!(naechster_nicht_roster(&mut bob).await, vec![0x11]);
}

#[tokio::test]
async fn erteilung_kommt_vor_dem_roster() {
    let (addr, _state) = server_starten().await;
    let mut alice = verbinden(addr, "r1", "alice").await;
    roster_abwarten(&mut alice, |_| true).await;

    senden(&mut alice, &[0x01]).await;
    assert_eq!(naechster_frame(&mut alice).await, vec![0x10]);

    let frame = naechster_frame(&mut alice).await;
    assert_eq!(frame[0], 0x14);
    let roster: RosterPayload = serde_json::from_slice(&frame[1..]).unwrap();
    assert_eq!(roster.talker, "alice");
}

#[tokio::test]
async fn abgabe_benachrichtigt_andere() {
    let (addr, _state) = server_starten().await;
    let mut alice = verbinden(addr, "r1", "alice").await;
    let mut bob = verbinden(addr, "r1", "bob").await;
    roster_abwarten(&mut alice, |r| r.peers.len() == 2).await;

    senden(&mut alice, &[0x01]).await;
    assert_eq!(naechster_nicht_roster(&mut alice).await, vec![0x10]);

    senden(&mut alice, &[0x02]).await;
    assert_eq!(naechster_nicht_roster(&mut bob).await, vec![0x12]);
    roster_abwarten(&mut bob, |r| r.talker.is_empty()).await;
    keine_nutzdaten(&mut alice).await;
}

#[tokio::test]
async fn medien_gehen_an_alle_anderen() {
    let (addr, _state) = server_starten().await;
    let mut alice = verbinden(addr, "r1", "alice").await;
    let mut bob = verbinden(addr, "r1", "bob").await;
    let mut carol = verbinden(addr, "r1", "carol").await;
    roster_abwarten(&mut alice, |r| r.peers.len() == 3).await;

    senden(&mut alice, &[0x01]).await;
    assert_eq!(naechster_nicht_roster(&mut alice).await, vec![0x10]);

    senden(&mut alice, &[0x03, 0xDE, 0xAD, 0xBE, 0xEF]).await;
    let erwartet = vec![0x13, 0xDE, 0xAD, 0xBE, 0xEF];
    assert_eq!(naechster_nicht_roster(&mut bob).await, erwartet);
    assert_eq!(naechster_nicht_roster(&mut carol).await, erwartet);
    keine_nutzdaten(&mut alice).await;
}

#[tokio::test]
async fn medien_ohne_sprechrecht_werden_ignoriert() {
    let (addr, _state) = server_starten().await;
    let mut alice = verbinden(addr, "r1", "alice").await;
    let mut bob = verbinden(addr, "r1", "bob").await;
    roster_abwarten(&mut alice, |r| r.peers.len() == 2).await;

    senden(&mut bob, &[0x03, 0x01, 0x02]).await;
    keine_nutzdaten(&mut alice).await;
}

#[tokio::test]
async fn neues_sprechrecht_nach_abgabe() {
    let (addr, _state) = server_starten().await;
    let mut alice = verbinden(addr, "r1", "alice").await;
    let mut bob = verbinden(addr, "r1", "bob").await;
    roster_abwarten(&mut alice, |r| r.peers.len() == 2).await;

    senden(&mut alice, &[0x01]).await;
    assert_eq!(naechster_nicht_roster(&mut alice).await, vec![0x10]);
    senden(&mut alice, &[0x02]).await;
    assert_eq!(naechster_nicht_roster(&mut bob).await, vec![0x12]);

    senden(&mut bob, &[0x01]).await;
    assert_eq!(naechster_nicht_roster(&mut bob).await, vec![0x10]);
    senden(&mut bob, &[0x03, 0xFF]).await;
    assert_eq!(naechster_nicht_roster(&mut alice).await, vec![0x13, 0xFF]);
}

#[tokio::test]
async fn roster_bei_beitritt_und_austritt() {
    let (addr, state) = server_starten().await;
    let mut alice = verbinden(addr, "r1", "alice").await;
    let roster = roster_abwarten(&mut alice, |_| true).await;
    assert_eq!(roster.peers, vec!["alice"]);
    assert_eq!(roster.talker, "");

    let mut bob = verbinden(addr, "r1", "bob").await;
    let roster = roster_abwarten(&mut alice, |r| r.peers.len() == 2).await;
    assert_eq!(roster.peers, vec!["alice", "bob"]);
    assert_eq!(state.hub.peer_count(), 2);

    bob.close(None).await.unwrap();
    let roster = roster_abwarten(&mut alice, |r| r.peers.len() == 1).await;
    assert_eq!(roster.peers, vec!["alice"]);
}

#[tokio::test]
async fn sprecher_trennt_sich_und_gibt_frei() {
    let (addr, _state) = server_starten().await;
    let mut alice = verbinden(addr, "r1", "alice").await;
    let mut bob = verbinden(addr, "r1", "bob").await;
    roster_abwarten(&mut bob, |r| r.peers.len() == 2).await;

    senden(&mut alice, &[0x01]).await;
    assert_eq!(naechster_nicht_roster(&mut alice).await, vec![0x10]);
    roster_abwarten(&mut bob, |r| r.talker == "alice").await;

    drop(alice);
    let roster = roster_abwarten(&mut bob, |r| r.peers.len() == 1).await;
    assert_eq!(roster.talker, "");

    senden(&mut bob, &[0x01]).await;
    assert_eq!(naechster_nicht_roster(&mut bob).await, vec![0x10]);
}

#[tokio::test]
async fn raeume_sind_getrennt() {
    let (addr, _state) = server_starten().await;
    let mut alice = verbinden(addr, "r1", "alice").await;
    let mut dora = verbinden(addr, "r2", "dora").await;
    roster_abwarten(&mut dora, |_| true).await;

    senden(&mut alice, &[0x01]).await;
    assert_eq!(naechster_nicht_roster(&mut alice).await, vec![0x10]);
    senden(&mut alice, &[0x03, 0x42]).await;

    // Eigener Raum, eigenes Sprechrecht
    senden(&mut dora, &[0x01]).await;
    assert_eq!(naechster_nicht_roster(&mut dora).await, vec![0x10]);
    keine_nutzdaten(&mut dora).await;
}

#[tokio::test]
async fn unbekannte_und_leere_frames_werden_ignoriert() {
    let (addr, _state) = server_starten().await;
    let mut alice = verbinden(addr, "r1", "alice").await;
    roster_abwarten(&mut alice, |_| true).await;

    senden(&mut alice, &[]).await;
    senden(&mut alice, &[0x7F, 0x00]).await;
    alice.send(Message::Text("hallo".into())).await.unwrap();

    // Verbindung lebt weiter
    senden(&mut alice, &[0x01]).await;
    assert_eq!(naechster_nicht_roster(&mut alice).await, vec![0x10]);
}

#[tokio::test]
async fn fehlende_parameter_ergeben_400() {
    let (addr, _state) = server_starten().await;

    for url in [
        format!("ws://{addr}/ws?name=alice"),
        format!("ws://{addr}/ws?room=r1"),
        format!("ws://{addr}/ws?room=&name=alice"),
    ] {
        match tokio_tungstenite::connect_async(url.as_str()).await {
            Err(tokio_tungstenite::tungstenite::Error::Http(antwort)) => {
                assert_eq!(antwort.status(), 400, "{url}");
            }
            Err(e) => panic!("400 erwartet fuer {url}, erhalten: {e}"),
            Ok(_) => panic!("400 erwartet fuer {url}, Upgrade war erfolgreich"),
        }
    }
}

#[tokio::test]
async fn letzter_austritt_loescht_raum() {
    let (addr, state) = server_starten().await;
    let mut alice = verbinden(addr, "r1", "alice").await;
    roster_abwarten(&mut alice, |_| true).await;
    assert!(state.hub.room("r1").is_some());
    assert_eq!(state.metriken.connections_active.get(), 1);

    alice.close(None).await.unwrap();

    tokio::time::timeout(WARTEZEIT, async {
        while state.hub.room("r1").is_some() || state.metriken.connections_active.get() != 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("Raum wurde nicht geloescht");
    assert_eq!(state.metriken.rooms_active.get(), 0);
}

#[tokio::test]
async fn herunterfahren_trennt_clients() {
    let (addr, state) = server_starten().await;
    let mut alice = verbinden(addr, "r1", "alice").await;
    roster_abwarten(&mut alice, |_| true).await;

    state.herunterfahren();

    let ende = tokio::time::timeout(WARTEZEIT, async {
        loop {
            match alice.next().await {
                Some(Ok(Message::Close(frame))) => return frame.map(|f| u16::from(f.code)),
                Some(Ok(_)) => continue,
                _ => return None,
            }
        }
    })
    .await
    .expect("Verbindung wurde nicht getrennt");
    assert_eq!(ende, Some(1001));
}

#[tokio::test]
async fn stummer_sprecher_verliert_sprechrecht() {
    let (addr, state) = server_starten_mit(schnelles_keepalive()).await;
    let mut alice = verbinden(addr, "r1", "alice").await;
    let mut bob = verbinden(addr, "r1", "bob").await;
    roster_abwarten(&mut bob, |r| r.peers.len() == 2).await;

    senden(&mut alice, &[0x01]).await;
    assert_eq!(naechster_nicht_roster(&mut alice).await, vec![0x10]);

    // Alice liest ab hier nicht mehr und beantwortet keine Pings
    roster_abwarten(&mut bob, |r| r.talker == "alice").await;
    let roster = roster_abwarten(&mut bob, |r| r.peers.len() == 1).await;
    assert_eq!(roster.peers, vec!["bob"]);
    assert_eq!(roster.talker, "");

    let raum = state.hub.room("r1").expect("Raum von bob existiert noch");
    assert!(raum.talker().is_none());
    assert_eq!(state.hub.peer_count(), 1);

    senden(&mut bob, &[0x01]).await;
    assert_eq!(naechster_nicht_roster(&mut bob).await, vec![0x10]);
    drop(alice);
}

#[tokio::test]
async fn antwortender_client_bleibt_verbunden() {
    let (addr, state) = server_starten_mit(schnelles_keepalive()).await;
    let mut alice = verbinden(addr, "r1", "alice").await;
    roster_abwarten(&mut alice, |_| true).await;

    // Lesen beantwortet die Pings; ueber viele Intervalle darf nichts passieren
    let ergebnis = tokio::time::timeout(Duration::from_secs(1), naechster_nicht_roster(&mut alice)).await;
    assert!(ergebnis.is_err(), "Unerwarteter Frame: {ergebnis:?}");
    assert_eq!(state.hub.peer_count(), 1);

    senden(&mut alice, &[0x01]).await;
    assert_eq!(naechster_nicht_roster(&mut alice).await, vec![0x10]);
}
