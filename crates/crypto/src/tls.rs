//! rustls-Konfiguration fuer den HTTPS/WSS-Listener

use std::sync::Arc;

use rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;

use crate::error::CryptoResult;
use crate::zertifikat::Zertifikat;

/// Baut eine rustls `ServerConfig` aus einem Zertifikat
///
/// Der Crypto-Provider (ring) wird explizit gesetzt, damit kein
/// prozessweiter Default installiert sein muss. ALPN bietet HTTP/2 und
/// HTTP/1.1 an; WebSocket-Upgrades laufen ueber HTTP/1.1.
pub fn server_config_erstellen(zertifikat: &Zertifikat) -> CryptoResult<ServerConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    let mut config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(
            vec![zertifikat.zertifikat.clone()],
            zertifikat.schluessel.clone_key(),
        )?;

    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
    Ok(config)
}

/// Erzeugt einen `TlsAcceptor` fuer eingehende Verbindungen
pub fn acceptor_erstellen(zertifikat: &Zertifikat) -> CryptoResult<TlsAcceptor> {
    let config = server_config_erstellen(zertifikat)?;
    Ok(TlsAcceptor::from(Arc::new(config)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zertifikat::selbstsigniert;

    #[test]
    fn server_config_mit_alpn() {
        let z = selbstsigniert(&[]).unwrap();
        let config = server_config_erstellen(&z).unwrap();
        assert_eq!(
            config.alpn_protocols,
            vec![b"h2".to_vec(), b"http/1.1".to_vec()]
        );
    }

    #[tokio::test]
    async fn acceptor_erstellen_funktioniert() {
        let z = selbstsigniert(&[]).unwrap();
        assert!(acceptor_erstellen(&z).is_ok());
    }
}
