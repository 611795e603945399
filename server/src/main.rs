//! TeleTalkie Server – Einstiegspunkt
//!
//! Liest Kommandozeile und Konfiguration, initialisiert das Logging und
//! startet den Relay.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use teletalkie_observability::logging_initialisieren;
use teletalkie_server::{config::ServerConfig, Server};

#[derive(Parser, Debug)]
#[command(author, version, about = "Push-to-Talk Relay fuer Browser im lokalen Netz")]
struct Args {
    /// Listen-Adresse, z.B. ":8080" oder "127.0.0.1:8443"
    #[arg(long)]
    addr: Option<String>,

    /// HTTPS mit selbstsigniertem Zertifikat (noetig fuer Mikrofon/Kamera auf Mobilgeraeten)
    #[arg(long)]
    tls: bool,

    /// Pfad zur Konfigurationsdatei
    #[arg(long, env = "TELETALKIE_CONFIG", default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Konfiguration laden (Standardwerte falls Datei fehlt)
    let geladen = ServerConfig::laden(&args.config)?;
    let datei_gefunden = geladen.is_some();
    let mut config = geladen.unwrap_or_default();
    config.cli_uebernehmen(args.addr, args.tls);
    config.validieren()?;

    logging_initialisieren(&config.logging.level, &config.logging.format);

    if !datei_gefunden {
        tracing::warn!(
            pfad = %args.config.display(),
            "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
        );
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        "TeleTalkie wird initialisiert"
    );

    Server::neu(config).starten().await
}
