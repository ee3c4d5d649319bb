use thiserror::Error;

/// Failures raised by a `Page` implementation.
///
/// Per-field fill problems (element missing, option not found, timeouts) are
/// not errors; they are reported as `FillFailure` values. A `PageError` means
/// the page itself could not be talked to.
#[derive(Debug, Error)]
pub enum PageError {
    /// Selector uses syntax outside the supported subset
    #[error("Unsupported selector: {0}")]
    UnsupportedSelector(String),

    /// Node handle no longer refers to a live element
    #[error("Stale node handle {0}")]
    StaleNode(usize),

    /// Bridge subprocess failed to spawn
    #[error("Failed to spawn {script} (is Node.js installed?): {source}")]
    SubprocessSpawn {
        script: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing the bridge pipes failed
    #[error("Session I/O error: {0}")]
    SessionIo(String),

    /// Bridge answered with ok=false or an unexpected payload
    #[error("Bridge command '{command}' failed: {error}")]
    SessionProtocol { command: String, error: String },

    #[error("JSON parse error ({context}): {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON serialize error ({context}): {source}")]
    JsonSerialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Store file {path} is not valid JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Store format version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}

/// Problems with a command payload. These are the only failures surfaced to
/// the caller as a top-level error response.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Action '{0}' requires a data payload")]
    MissingData(String),

    #[error("Malformed command: {0}")]
    Malformed(String),
}
