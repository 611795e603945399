//! # teletalkie-crypto
//!
//! Transport-Verschluesselung fuer den Relay-Server.
//!
//! Browser geben Mikrofon-Zugriff nur in einem sicheren Kontext frei. Im LAN
//! gibt es kein CA-Zertifikat, daher erzeugt der Server beim Start ein
//! selbstsigniertes Zertifikat und baut daraus eine rustls-Konfiguration.
//!
//! ## Module
//! - `zertifikat` - Selbstsigniertes Zertifikat via rcgen
//! - `tls` - rustls `ServerConfig` und `TlsAcceptor`
//! - `error` - Fehlertypen

pub mod error;
pub mod tls;
pub mod zertifikat;

pub use error::{CryptoError, CryptoResult};
pub use tls::{acceptor_erstellen, server_config_erstellen};
pub use zertifikat::{fingerprint_berechnen, selbstsigniert, Zertifikat};
