//! Frame-Typen und Byte-Kodierung
//!
//! Direkte Byte-Kodierung, kein serde (Medien-Chunks sind performance-
//! kritisch). Medien-Nutzlasten werden als `Bytes` gehalten, damit der
//! Fan-out an N Empfaenger nur Referenzzaehler klont.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{ProtocolError, ProtocolResult};
use crate::roster::RosterPayload;

/// Maximale Groesse einer eingehenden Nachricht (2 MiB)
///
/// Typische Video-Chunks liegen bei 50–500 KB.
pub const MAX_FRAME_GROESSE: usize = 2 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Typ-Bytes
// ---------------------------------------------------------------------------

/// Typ-Bytes des Protokolls
pub mod typ {
    // Client -> Server
    /// Sprechrecht anfordern
    pub const PTT_AN: u8 = 0x01;
    /// Sprechrecht abgeben
    pub const PTT_AUS: u8 = 0x02;
    /// Medien-Chunk vom Sprecher
    pub const MEDIEN_CHUNK: u8 = 0x03;

    // Server -> Client
    /// Sprechrecht erteilt
    pub const PTT_ERTEILT: u8 = 0x10;
    /// Sprechrecht verweigert (Kanal belegt)
    pub const PTT_VERWEIGERT: u8 = 0x11;
    /// Sprechrecht wieder frei
    pub const PTT_FREI: u8 = 0x12;
    /// Weitergeleiteter Medien-Chunk
    pub const RELAY_CHUNK: u8 = 0x13;
    /// Teilnehmerliste (JSON)
    pub const ROSTER: u8 = 0x14;
}

// ---------------------------------------------------------------------------
// ClientFrame
// ---------------------------------------------------------------------------

/// Vom Client gesendeter Frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFrame {
    /// Sprechrecht anfordern (0x01)
    RequestFloor,
    /// Sprechrecht abgeben (0x02)
    ReleaseFloor,
    /// Medien-Chunk (0x03), Nutzlast ohne Typ-Byte
    MediaChunk(Bytes),
}

impl ClientFrame {
    /// Dekodiert eine binaere Nachricht
    ///
    /// Die Nutzlast eines Medien-Chunks ist ein Slice auf `daten`, es wird
    /// nicht kopiert.
    ///
    /// # Fehler
    /// - `LeererFrame` bei einer Nachricht ohne Typ-Byte
    /// - `UnbekannterTyp` bei einem nicht unterstuetzten Typ-Byte
    pub fn decode(daten: Bytes) -> ProtocolResult<Self> {
        let typ_byte = *daten.first().ok_or(ProtocolError::LeererFrame)?;
        match typ_byte {
            typ::PTT_AN => Ok(Self::RequestFloor),
            typ::PTT_AUS => Ok(Self::ReleaseFloor),
            typ::MEDIEN_CHUNK => Ok(Self::MediaChunk(daten.slice(1..))),
            unbekannt => Err(ProtocolError::UnbekannterTyp(unbekannt)),
        }
    }

    /// Kodiert den Frame (Gegenstueck fuer Clients und Tests)
    pub fn encode(&self) -> Bytes {
        match self {
            Self::RequestFloor => Bytes::from_static(&[typ::PTT_AN]),
            Self::ReleaseFloor => Bytes::from_static(&[typ::PTT_AUS]),
            Self::MediaChunk(nutzlast) => mit_typ(typ::MEDIEN_CHUNK, nutzlast),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerFrame
// ---------------------------------------------------------------------------

/// Vom Server gesendeter Frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFrame {
    /// Sprechrecht erteilt (0x10)
    Granted,
    /// Sprechrecht verweigert (0x11)
    Denied,
    /// Sprechrecht wieder frei (0x12)
    Released,
    /// Weitergeleiteter Medien-Chunk (0x13)
    RelayChunk(Bytes),
    /// Teilnehmerliste (0x14)
    Roster(RosterPayload),
}

impl ServerFrame {
    /// Gibt das Typ-Byte des Frames zurueck
    pub fn typ(&self) -> u8 {
        match self {
            Self::Granted => typ::PTT_ERTEILT,
            Self::Denied => typ::PTT_VERWEIGERT,
            Self::Released => typ::PTT_FREI,
            Self::RelayChunk(_) => typ::RELAY_CHUNK,
            Self::Roster(_) => typ::ROSTER,
        }
    }

    /// Kodiert den Frame in eine binaere Nachricht
    ///
    /// # Fehler
    /// - `Roster` wenn die Teilnehmerliste nicht serialisiert werden kann
    pub fn encode(&self) -> ProtocolResult<Bytes> {
        match self {
            Self::Granted | Self::Denied | Self::Released => Ok(Bytes::from(vec![self.typ()])),
            Self::RelayChunk(nutzlast) => Ok(mit_typ(typ::RELAY_CHUNK, nutzlast)),
            Self::Roster(roster) => {
                let json = roster.to_json()?;
                Ok(mit_typ(typ::ROSTER, json.as_bytes()))
            }
        }
    }
}

/// Stellt einer Nutzlast ein Typ-Byte voran
fn mit_typ(typ_byte: u8, nutzlast: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(1 + nutzlast.len());
    buf.put_u8(typ_byte);
    buf.put_slice(nutzlast);
    buf.freeze()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
