//! Selbstsigniertes Zertifikat fuer den LAN-Betrieb
//!
//! Das Zertifikat lebt nur im Speicher und wird bei jedem Start neu erzeugt.
//! Subject Alternative Names: `localhost`, `127.0.0.1`, `::1` und alle
//! zusaetzlich uebergebenen Adressen (typisch die Adressen aller LAN-Interfaces).

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair, SanType};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};

use crate::error::{CryptoError, CryptoResult};

const COMMON_NAME: &str = "TeleTalkie Dev";

/// Zertifikat und privater Schluessel im DER-Format
#[derive(Debug)]
pub struct Zertifikat {
    pub zertifikat: CertificateDer<'static>,
    pub schluessel: PrivateKeyDer<'static>,
    /// SHA-256 Fingerprint (Hex, durch `:` getrennt)
    pub fingerprint: String,
    /// Alle eingetragenen Subject Alternative Names
    pub namen: Vec<String>,
}

/// Erzeugt ein selbstsigniertes Zertifikat
///
/// `zusatz_ips` werden zusaetzlich zu den Loopback-Adressen als IP-SAN
/// eingetragen. Doppelte Adressen werden ignoriert.
pub fn selbstsigniert(zusatz_ips: &[IpAddr]) -> CryptoResult<Zertifikat> {
    let mut params = CertificateParams::new(vec!["localhost".to_string()])
        .map_err(|e| CryptoError::ZertifikatGenerierung(e.to_string()))?;

    let mut ips = vec![IpAddr::V4(Ipv4Addr::LOCALHOST), IpAddr::V6(Ipv6Addr::LOCALHOST)];
    for ip in zusatz_ips {
        if !ips.contains(ip) {
            ips.push(*ip);
        }
    }
    params
        .subject_alt_names
        .extend(ips.iter().copied().map(SanType::IpAddress));

    let mut distinguished_name = DistinguishedName::new();
    distinguished_name.push(DnType::CommonName, COMMON_NAME);
    distinguished_name.push(DnType::OrganizationName, COMMON_NAME);
    params.distinguished_name = distinguished_name;

    let key_pair =
        KeyPair::generate().map_err(|e| CryptoError::SchluesselGenerierung(e.to_string()))?;

    let cert = params
        .self_signed(&key_pair)
        .map_err(|e| CryptoError::ZertifikatGenerierung(e.to_string()))?;

    let fingerprint = fingerprint_berechnen(cert.der());
    let namen = std::iter::once("localhost".to_string())
        .chain(ips.iter().map(|ip| ip.to_string()))
        .collect();

    tracing::debug!(%fingerprint, "Selbstsigniertes Zertifikat erzeugt");

    Ok(Zertifikat {
        zertifikat: cert.der().clone(),
        schluessel: PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der())),
        fingerprint,
        namen,
    })
}

/// Berechnet den SHA-256 Fingerprint eines DER-kodierten Zertifikats
pub fn fingerprint_berechnen(der_bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let hash = Sha256::digest(der_bytes);
    hash.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zertifikat_enthaelt_loopback_namen() {
        let z = selbstsigniert(&[]).unwrap();
        assert!(!z.zertifikat.is_empty());
        assert_eq!(z.namen, vec!["localhost", "127.0.0.1", "::1"]);
    }

    #[test]
    fn lan_ip_wird_eingetragen() {
        let lan: IpAddr = "192.168.1.23".parse().unwrap();
        let z = selbstsigniert(&[lan, IpAddr::V4(Ipv4Addr::LOCALHOST)]).unwrap();
        assert_eq!(z.namen, vec!["localhost", "127.0.0.1", "::1", "192.168.1.23"]);
    }

    #[test]
    fn alle_interface_adressen_werden_eingetragen() {
        let lan: Vec<IpAddr> = ["192.168.1.23", "10.8.0.1", "fe80::1"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        let z = selbstsigniert(&lan).unwrap();
        assert_eq!(
            z.namen,
            vec!["localhost", "127.0.0.1", "::1", "192.168.1.23", "10.8.0.1", "fe80::1"]
        );
    }

    #[test]
    fn fingerprint_format() {
        let z = selbstsigniert(&[]).unwrap();
        // 32 Bytes SHA-256 -> 32 Hex-Paare
        let teile: Vec<&str> = z.fingerprint.split(':').collect();
        assert_eq!(teile.len(), 32);
        assert!(teile.iter().all(|t| t.len() == 2));
        assert_eq!(z.fingerprint, fingerprint_berechnen(&z.zertifikat));
    }

    #[test]
    fn jeder_start_erzeugt_neues_zertifikat() {
        let a = selbstsigniert(&[]).unwrap();
        let b = selbstsigniert(&[]).unwrap();
        assert_ne!(a.fingerprint, b.fingerprint);
    }
}
