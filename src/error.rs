use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for Spark.
///
/// Each subsystem defines its own error enum. Library callers match on these
/// to decide whether an action is skipped or surfaced; the CLI and daemon edges
/// use `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum SparkError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Decision oracle ─────────────────────────────────────────────────
    #[error("oracle: {0}")]
    Oracle(#[from] OracleError),

    // ── Knowledge store access ──────────────────────────────────────────
    #[error("access: {0}")]
    Access(#[from] AccessError),

    // ── Durable storage ─────────────────────────────────────────────────
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    // ── Transport / Channel ─────────────────────────────────────────────
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Oracle errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("provider {provider} request failed: {message}")]
    Request { provider: String, message: String },

    #[error("provider {provider} timed out after {secs}s")]
    Timeout { provider: String, secs: u64 },

    #[error("tool loop stopped after {iterations} iterations without a final answer")]
    Exhausted { iterations: u32 },

    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}

// ─── Knowledge-store access errors ──────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("{mode} access denied: {path}")]
    Denied { path: String, mode: &'static str },

    #[error("path blocked: {0}")]
    Blocked(String),

    #[error("path is managed by Spark and cannot be written directly: {0}")]
    Reserved(String),

    #[error("path escapes the knowledge root: {0}")]
    Traversal(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid access rule pattern {pattern}: {message}")]
    Pattern { pattern: String, message: String },
}

// ─── Storage errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("read {path} failed: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("write {path} failed: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("state encoding failed: {0}")]
    Encode(String),
}

// ─── Transport errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("send via {channel} failed: {message}")]
    Send { channel: String, message: String },

    #[error("channel {0} is not configured")]
    NotConfigured(String),
}

pub type Result<T> = std::result::Result<T, SparkError>;
