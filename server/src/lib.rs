//! teletalkie-server – Bibliotheks-Root
//!
//! Deklariert alle Server-Module und stellt den oeffentlichen Einstiegspunkt
//! bereit.

pub mod banner;
pub mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use config::ServerConfig;
use teletalkie_signaling::{klartext_bedienen, router, tls_bedienen, RelayState};
use tokio::net::TcpListener;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet den Relay und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Relay-Zustand und Router aufbauen
    /// 2. Listener binden, Banner ausgeben
    /// 3. Optional: selbstsigniertes Zertifikat erzeugen
    /// 4. Verbindungen bedienen bis Ctrl-C
    pub async fn starten(self) -> Result<()> {
        let adresse = self.config.listen_adresse()?;
        let tls = self.config.netzwerk.tls;

        let state = RelayState::neu(self.config.relay_config())?;
        let app = router(Arc::clone(&state));

        let listener = TcpListener::bind(adresse)
            .await
            .with_context(|| format!("Listener auf {adresse} konnte nicht gebunden werden"))?;
        let port = listener.local_addr()?.port();

        let lan = banner::lan_adressen();
        banner::ausgeben(tls, port, &lan);

        tracing::info!(
            adresse = %adresse,
            tls,
            web = %self.config.web.verzeichnis.display(),
            "Server startet"
        );

        if !self.config.web_client_vorhanden() {
            tracing::warn!(
                web = %self.config.web.verzeichnis.display(),
                "Kein index.html im Web-Verzeichnis, der Browser-Client fehlt ([web] verzeichnis pruefen)"
            );
        }

        let shutdown_state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(fehler = %e, "Ctrl-C-Handler konnte nicht installiert werden");
                return;
            }
            tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
            shutdown_state.herunterfahren();
        });

        let shutdown = state.herunterfahren.clone();
        if tls {
            let zertifikat = teletalkie_crypto::selbstsigniert(&lan)
                .context("TLS-Zertifikat konnte nicht erzeugt werden")?;
            tracing::info!(
                fingerprint = %zertifikat.fingerprint,
                namen = ?zertifikat.namen,
                "Selbstsigniertes TLS-Zertifikat erzeugt"
            );
            tracing::warn!("Die Sicherheitswarnung im Browser muss einmalig akzeptiert werden");

            let acceptor = teletalkie_crypto::acceptor_erstellen(&zertifikat)?;
            tls_bedienen(listener, acceptor, app, shutdown).await?;
        } else {
            tracing::warn!(
                "Ohne TLS geben mobile Browser Mikrofon und Kamera nicht frei. Fuer HTTPS mit --tls starten."
            );
            klartext_bedienen(listener, app, shutdown).await?;
        }

        tracing::info!("Server beendet");
        Ok(())
    }
}
