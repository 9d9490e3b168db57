/// Core error type for the bot.
///
/// Adapter crates map their specific errors into this type so the core can
/// handle failures consistently (retryable provider faults vs terminal
/// delivery faults vs fatal configuration problems).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A single provider call failed (network, quota, timeout). Retryable.
    #[error("provider error: {0}")]
    Provider(String),

    /// All retries for one generation were exhausted. Terminal for the call.
    #[error("generation failed for {label} after {attempts} attempts")]
    Generation { label: String, attempts: u32 },

    /// Message delivery failed. Not retried at the publishing layer.
    #[error("transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, Error>;
