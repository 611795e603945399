//! teletalkie-room – Raeume, Teilnehmer und Sprechrecht
//!
//! ## Architektur
//!
//! ```text
//! Hub (Raum-Registry, ein Mutex fuer die Map)
//!  |
//!  +-- Room "r1" (ein Mutex fuer Mitglieder + Sprecher)
//!  |     +-- Peer alice  -> Postfach (mpsc, begrenzt)
//!  |     +-- Peer bob    -> Postfach
//!  |
//!  +-- Room "r2"
//! ```
//!
//! Kein Lock wird waehrend Netzwerk-I/O gehalten. Zustellung in ein Postfach
//! blockiert nie: ist es voll, wird der Frame fuer diesen Empfaenger verworfen.

pub mod hub;
pub mod peer;
pub mod room;

pub use hub::Hub;
pub use peer::{Peer, Postfach, Zustellung, POSTFACH_GROESSE};
pub use room::{Room, Zustellbericht};
