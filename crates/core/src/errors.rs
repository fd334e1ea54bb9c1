use thiserror::Error;

/// Unified error type for the entire dividend-tracker-core library.
/// Every public function returns `Result<T, CoreError>`.
///
/// Only `Schema`, `InvalidRow` and `EmptyPortfolio` abort a report run.
/// `SourceFetch` and `Conversion` are degraded to empty data / identity
/// rates by the services and surface as report warnings instead.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Portfolio input ─────────────────────────────────────────────
    #[error("Portfolio file is missing required columns: {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Invalid portfolio row at line {line}: {message}")]
    InvalidRow { line: usize, message: String },

    #[error("Portfolio contains no holdings")]
    EmptyPortfolio,

    #[error("CSV error: {0}")]
    Csv(String),

    // ── Sources / FX ────────────────────────────────────────────────
    #[error("Dividend fetch failed ({source_name}) for {ticker}: {message}")]
    SourceFetch {
        source_name: String,
        ticker: String,
        message: String,
    },

    #[error("Currency conversion {from} → {to} failed: {message}")]
    Conversion {
        from: String,
        to: String,
        message: String,
    },

    // ── API / Network ───────────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    // ── Configuration / Deserialization ─────────────────────────────
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── File I/O (native only) ──────────────────────────────────────
    #[error("File I/O error: {0}")]
    FileIO(String),
}

impl CoreError {
    /// Whether this error must abort the whole report run.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            CoreError::SourceFetch { .. }
                | CoreError::Conversion { .. }
                | CoreError::Api { .. }
                | CoreError::Network(_)
        )
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<csv::Error> for CoreError {
    fn from(e: csv::Error) -> Self {
        CoreError::Csv(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors carry the full URL, including `apikey=` query params.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
