//! Listener – akzeptiert Verbindungen im Klartext oder per TLS
//!
//! Beide Varianten laufen bis das Shutdown-Token ausgeloest wird.
//! Offene WebSocket-Verbindungen haengen am selben Token (siehe
//! `RelayState::herunterfahren`) und bauen sich dann selbst ab.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};
use axum::Router;
use hyper::body::Incoming;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use crate::error::SignalingResult;

/// Bedient HTTP und WebSocket ohne TLS
pub async fn klartext_bedienen(
    listener: TcpListener,
    app: Router,
    shutdown: CancellationToken,
) -> SignalingResult<()> {
    let adresse = listener.local_addr()?;
    tracing::info!(adresse = %adresse, "HTTP-Server gestartet");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await?;

    tracing::info!("HTTP-Server gestoppt");
    Ok(())
}

/// Bedient HTTPS und WSS mit dem uebergebenen `TlsAcceptor`
///
/// Pro Verbindung ein Task: TLS-Handshake, dann HTTP/1.1 oder HTTP/2 (per
/// ALPN) mit Upgrade-Unterstuetzung fuer WebSockets.
pub async fn tls_bedienen(
    listener: TcpListener,
    acceptor: TlsAcceptor,
    app: Router,
    shutdown: CancellationToken,
) -> SignalingResult<()> {
    let adresse = listener.local_addr()?;
    tracing::info!(adresse = %adresse, "HTTPS-Server gestartet");

    loop {
        let (stream, remote) = tokio::select! {
            _ = shutdown.cancelled() => break,
            ergebnis = listener.accept() => match ergebnis {
                Ok(verbindung) => verbindung,
                Err(e) => {
                    tracing::error!(fehler = %e, "TCP-Accept-Fehler");
                    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                    continue;
                }
            },
        };

        let acceptor = acceptor.clone();
        let app = app.clone();

        tokio::spawn(async move {
            let tls = match acceptor.accept(stream).await {
                Ok(tls) => tls,
                Err(e) => {
                    // Typisch: Browser verwirft das selbstsignierte Zertifikat
                    tracing::debug!(remote = %remote, fehler = %e, "TLS-Handshake fehlgeschlagen");
                    return;
                }
            };

            let dienst = hyper::service::service_fn(move |mut req: Request<Incoming>| {
                req.extensions_mut().insert(ConnectInfo(remote));
                app.clone().oneshot(req)
            });

            if let Err(e) = auto::Builder::new(TokioExecutor::new())
                .serve_connection_with_upgrades(TokioIo::new(tls), dienst)
                .await
            {
                tracing::debug!(remote = %remote, fehler = %e, "HTTPS-Verbindung beendet");
            }
        });
    }

    tracing::info!("HTTPS-Server gestoppt");
    Ok(())
}
