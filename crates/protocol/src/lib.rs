//! teletalkie-protocol – Binaeres Wire-Protokoll
//!
//! Ein Frame entspricht genau einer binaeren WebSocket-Nachricht. Das erste
//! Byte ist der Nachrichtentyp, der Rest die (opake) Nutzlast.
//!
//! ```text
//! Richtung  Byte 0  Nutzlast        Bedeutung
//! C -> S    0x01    -               Sprechrecht anfordern
//! C -> S    0x02    -               Sprechrecht abgeben
//! C -> S    0x03    Medien-Bytes    Medien-Chunk (nur vom Sprecher)
//! S -> C    0x10    -               Sprechrecht erteilt
//! S -> C    0x11    -               Sprechrecht verweigert
//! S -> C    0x12    -               Sprechrecht wieder frei
//! S -> C    0x13    Medien-Bytes    Weitergeleiteter Medien-Chunk
//! S -> C    0x14    UTF-8 JSON      Teilnehmerliste (Roster)
//! ```

pub mod error;
pub mod frame;
pub mod roster;

pub use error::{ProtocolError, ProtocolResult};
pub use frame::{ClientFrame, ServerFrame, MAX_FRAME_GROESSE};
pub use roster::RosterPayload;
