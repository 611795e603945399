//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable (hat Vorrang vor der Konfigdatei):
//! - `TT_LOG_LEVEL`: Log-Level oder EnvFilter-Direktive, Standard: info
//! - `TT_LOG_FORMAT`: Format (text/json), Standard: text

use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LOG_LEVEL: &str = "TT_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "TT_LOG_FORMAT";

/// Initialisiert das Logging-System.
///
/// `level` und `format` stammen aus der Konfiguration und werden von
/// `TT_LOG_LEVEL` / `TT_LOG_FORMAT` ueberschrieben. Ein bereits
/// installierter Subscriber bleibt bestehen.
pub fn logging_initialisieren(level: &str, format: &str) {
    let filter = EnvFilter::try_from_env(ENV_LOG_LEVEL)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let format = wert_aufloesen(format, std::env::var(ENV_LOG_FORMAT).ok());

    let ergebnis = match format.as_str() {
        "json" => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_current_span(true)
            .try_init(),
        _ => fmt().with_env_filter(filter).with_target(true).try_init(),
    };

    if let Err(e) = ergebnis {
        tracing::debug!("Logging bereits initialisiert: {e}");
    }
}

/// Waehlt den Umgebungswert, falls gesetzt und nicht leer, sonst den Standard
pub fn wert_aufloesen(standard: &str, env_wert: Option<String>) -> String {
    env_wert
        .filter(|w| !w.trim().is_empty())
        .unwrap_or_else(|| standard.to_string())
}

/// Validiert ob ein Log-Level-String gueltig ist.
pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

/// Validiert ob ein Log-Format-String gueltig ist.
pub fn log_format_gueltig(format: &str) -> bool {
    matches!(format, "text" | "json")
}
