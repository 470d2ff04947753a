use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::core::generation::{GenerationConfig, REPETITION_PENALTY};

pub mod client;

#[derive(Serialize, Clone, Debug)]
pub struct PredictionInput {
    pub prompt: String,
    pub temperature: f64,
    pub top_p: f64,
    pub max_length: u32,
    pub repetition_penalty: f64,
}

#[derive(Serialize, Debug)]
pub struct PredictionRequest {
    pub version: String,
    pub input: PredictionInput,
    pub stream: bool,
}

#[derive(Deserialize, Debug)]
pub struct Prediction {
    pub id: String,
    #[serde(default)]
    pub urls: PredictionUrls,
}

#[derive(Deserialize, Debug, Default)]
pub struct PredictionUrls {
    pub stream: Option<String>,
    pub get: Option<String>,
    pub cancel: Option<String>,
}

/// Everything one generation call needs, read-only for its duration.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
    pub model_version: String,
    pub prompt: String,
    pub temperature: f64,
    pub top_p: f64,
    pub max_length: u32,
    pub repetition_penalty: f64,
    pub cancel: CancellationToken,
}

impl GenerationRequest {
    pub fn new(config: &GenerationConfig, prompt: String) -> Self {
        Self {
            model_version: config.model.version_id().to_string(),
            prompt,
            temperature: config.temperature,
            top_p: config.top_p,
            max_length: config.max_length,
            repetition_penalty: REPETITION_PENALTY,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Failure surfaced from the remote generation call, unmodified, to the
/// caller. Terminal for the current attempt; there is no retry.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerateError {
    /// Missing or rejected credential (HTTP 401/403).
    Auth(String),
    /// Quota exhausted (HTTP 429).
    RateLimited(String),
    /// Any other error reported by the service.
    Api(String),
    /// Network-level failure before or during the stream.
    Transport(String),
}

impl std::fmt::Display for GenerateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerateError::Auth(msg) => write!(f, "authentication failed: {msg}"),
            GenerateError::RateLimited(msg) => write!(f, "rate limited: {msg}"),
            GenerateError::Api(msg) => write!(f, "{msg}"),
            GenerateError::Transport(msg) => write!(f, "transport error: {msg}"),
        }
    }
}

impl std::error::Error for GenerateError {}

impl From<reqwest::Error> for GenerateError {
    fn from(err: reqwest::Error) -> Self {
        GenerateError::Transport(err.to_string())
    }
}

/// Lazy, finite, non-restartable sequence of response fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, GenerateError>> + Send>>;

/// The remote text-generation boundary. Implementations yield response text
/// incrementally; the orchestrator folds the fragments into one reply.
#[async_trait]
pub trait StreamingGenerator: Send + Sync {
    async fn stream_generate(&self, request: GenerationRequest)
        -> Result<FragmentStream, GenerateError>;
}
