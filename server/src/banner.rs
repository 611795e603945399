//! Startausgabe mit den Adressen, unter denen der Server erreichbar ist

use std::net::IpAddr;

const BREITE: usize = 40;

/// Ermittelt alle LAN-Adressen des Hosts ueber die Netzwerk-Interfaces
///
/// Ohne Internet-Route funktioniert das genauso; ein Fehler beim Auslesen
/// ergibt eine leere Liste.
pub fn lan_adressen() -> Vec<IpAddr> {
    match if_addrs::get_if_addrs() {
        Ok(interfaces) => lan_filtern(interfaces.iter().map(|interface| interface.ip())),
        Err(e) => {
            tracing::warn!(fehler = %e, "Netzwerk-Interfaces konnten nicht gelesen werden");
            Vec::new()
        }
    }
}

/// Verwirft Loopback, unspezifizierte Adressen und Duplikate
pub fn lan_filtern(ips: impl IntoIterator<Item = IpAddr>) -> Vec<IpAddr> {
    let mut adressen = Vec::new();
    for ip in ips {
        if ip.is_loopback() || ip.is_unspecified() || adressen.contains(&ip) {
            continue;
        }
        adressen.push(ip);
    }
    adressen
}

/// Baut die Zeilen des Start-Banners
///
/// Pro IPv4-Adresse eine LAN-Zeile; IPv6-Adressen landen nur im Zertifikat.
pub fn banner_zeilen(tls: bool, port: u16, lan: &[IpAddr]) -> Vec<String> {
    let schema = if tls { "https" } else { "http" };
    let rahmen = "═".repeat(BREITE);

    let mut zeilen = vec![
        format!("╔{rahmen}╗"),
        format!("║{:<BREITE$}║", "  TeleTalkie"),
        format!("╠{rahmen}╣"),
        format!("║{:<BREITE$}║", format!("  Lokal: {schema}://localhost:{port}")),
    ];
    for ip in lan.iter().filter(|ip| ip.is_ipv4()) {
        zeilen.push(format!("║{:<BREITE$}║", format!("  LAN:   {schema}://{ip}:{port}")));
    }
    zeilen.push(format!("╚{rahmen}╝"));
    zeilen
}

/// Gibt das Banner auf stdout aus
pub fn ausgeben(tls: bool, port: u16, lan: &[IpAddr]) {
    println!();
    for zeile in banner_zeilen(tls, port, lan) {
        println!("  {zeile}");
    }
    println!();
}
