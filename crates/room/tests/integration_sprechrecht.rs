//! Integration-Tests fuer Sprechrecht und Raum-Lebenszyklus unter Nebenlaeufigkeit

use std::sync::{Arc, Barrier};
use std::thread;

use bytes::Bytes;
use teletalkie_room::Hub;

#[test]
fn gleichzeitiges_acquire_hat_genau_einen_gewinner() {
    for _ in 0..200 {
        let hub = Hub::neu();
        let (alice, _rx1) = hub.join("r1", "alice");
        let (bob, _rx2) = hub.join("r1", "bob");
        let start = Arc::new(Barrier::new(2));

        let handles: Vec<_> = [Arc::clone(&alice), Arc::clone(&bob)]
            .into_iter()
            .map(|peer| {
                let start = Arc::clone(&start);
                thread::spawn(move || {
                    start.wait();
                    peer.room().try_acquire(&peer)
                })
            })
            .collect();

        let ergebnisse: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(ergebnisse.iter().filter(|&&ok| ok).count(), 1);

        let gewinner = if ergebnisse[0] { &alice } else { &bob };
        let verlierer = if ergebnisse[0] { &bob } else { &alice };
        let sprecher = verlierer.room().talker().expect("Sprecher muss gesetzt sein");
        assert_eq!(sprecher.id(), gewinner.id());
    }
}

#[test]
fn viele_teilnehmer_wetteifern_um_das_sprechrecht() {
    let hub = Hub::neu();
    let peers: Vec<_> = (0..16)
        .map(|i| hub.join("r1", &format!("peer-{i}")))
        .collect();
    let start = Arc::new(Barrier::new(peers.len()));

    let handles: Vec<_> = peers
        .iter()
        .map(|(peer, _)| {
            let peer = Arc::clone(peer);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                peer.room().try_acquire(&peer)
            })
        })
        .collect();

    let gewinner = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|&ok| ok)
        .count();
    assert_eq!(gewinner, 1);
}

#[test]
fn paralleles_joinen_und_verlassen_hinterlaesst_keine_leichen() {
    let hub = Hub::neu();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let hub = hub.clone();
            thread::spawn(move || {
                for runde in 0..250 {
                    let (peer, _rx) = hub.join("flur", &format!("t{i}-{runde}"));
                    assert!(!peer.room().ist_stillgelegt());
                    peer.room().try_acquire(&peer);
                    hub.leave(&peer);
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(hub.room_count(), 0, "Letzter Austritt muss den Raum loeschen");
    assert_eq!(hub.peer_count(), 0);
}

#[test]
fn beitritt_landet_nie_in_einem_verwaisten_raum() {
    let hub = Hub::neu();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let hub = hub.clone();
            thread::spawn(move || {
                for runde in 0..250 {
                    let (peer, _rx) = hub.join("flur", &format!("t{i}-{runde}"));
                    // Solange wir Mitglied sind, muss die Registry unseren Raum kennen
                    let registriert = hub.room("flur").expect("Raum muss registriert sein");
                    assert!(Arc::ptr_eq(&registriert, peer.room()));
                    hub.leave(&peer);
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}

#[tokio::test]
async fn broadcast_reihenfolge_pro_empfaenger_ist_fifo() {
    let hub = Hub::neu();
    let (alice, _rx1) = hub.join("r1", "alice");
    let (_bob, mut rx2) = hub.join("r1", "bob");

    for i in 0u8..10 {
        alice.room().broadcast(Some(&alice), Bytes::from(vec![i]));
    }

    for i in 0u8..10 {
        assert_eq!(rx2.recv().await.unwrap().as_ref(), &[i]);
    }
}
