use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::api::{GenerateError, GenerationRequest, StreamingGenerator};
use crate::core::generation::{GenerationConfig, InvalidConfig};
use crate::core::message::{Role, Transcript, Turn};
use crate::core::prompt::build_prompt;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Parameters were rejected before any remote call was attempted.
    Config(InvalidConfig),
    /// The remote call failed; nothing was committed.
    Generate(GenerateError),
    /// `respond` was called while the last turn was not a pending user turn.
    NothingPending,
    /// The stream was cancelled mid-flight; the partial output is discarded.
    Cancelled,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Config(err) => write!(f, "invalid generation config: {err}"),
            SessionError::Generate(err) => write!(f, "{err}"),
            SessionError::NothingPending => {
                write!(f, "no pending user turn to respond to")
            }
            SessionError::Cancelled => write!(f, "generation cancelled"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Config(err) => Some(err),
            SessionError::Generate(err) => Some(err),
            _ => None,
        }
    }
}

impl From<InvalidConfig> for SessionError {
    fn from(err: InvalidConfig) -> Self {
        SessionError::Config(err)
    }
}

impl From<GenerateError> for SessionError {
    fn from(err: GenerateError) -> Self {
        SessionError::Generate(err)
    }
}

/// Turns a transcript, a config, and one pending user input into the complete
/// response text.
///
/// Validates the config, assembles the prompt, invokes the generator, and
/// folds the fragment stream into an accumulator, calling `on_partial` with
/// the full text so far after every fragment. The caller commits the result
/// to the transcript; this function never mutates it.
pub async fn generate_response<F>(
    transcript: &Transcript,
    config: &GenerationConfig,
    new_user_input: &str,
    generator: &dyn StreamingGenerator,
    cancel: CancellationToken,
    mut on_partial: F,
) -> Result<String, SessionError>
where
    F: FnMut(&str),
{
    config.validate()?;

    let prompt = build_prompt(transcript.all(), new_user_input);
    let request = GenerationRequest::new(config, prompt).with_cancel(cancel.clone());

    let mut fragments = generator.stream_generate(request).await?;
    let mut full_response = String::new();
    while let Some(fragment) = fragments.next().await {
        full_response.push_str(&fragment?);
        on_partial(&full_response);
    }

    // A cancelled stream ends early and must not pass off its partial
    // accumulator as a complete reply.
    if cancel.is_cancelled() {
        return Err(SessionError::Cancelled);
    }

    Ok(full_response)
}

/// One interactive conversation: the transcript plus its generation config.
///
/// Input handling is two-phase. `submit` commits the user turn; `respond`
/// generates and commits the assistant turn. Generation is gated on the last
/// turn being an unanswered user turn, which prevents duplicate or
/// unsolicited calls.
pub struct ChatSession {
    transcript: Transcript,
    config: GenerationConfig,
}

impl ChatSession {
    pub fn new(config: GenerationConfig) -> Self {
        Self {
            transcript: Transcript::new(),
            config,
        }
    }

    pub fn with_transcript(config: GenerationConfig, transcript: Transcript) -> Self {
        Self { transcript, config }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut GenerationConfig {
        &mut self.config
    }

    /// Clear-session trigger: drops the history back to the seed greeting.
    pub fn clear(&mut self) {
        self.transcript.reset();
    }

    /// Commits a user turn. Empty or whitespace-only input is a no-op and
    /// returns `false`; upstream leaves the double-submit case unspecified,
    /// and this client resolves it by ignoring blank submissions.
    pub fn submit(&mut self, input: &str) -> bool {
        if input.trim().is_empty() {
            return false;
        }
        self.transcript.append(Role::User, input);
        true
    }

    pub fn needs_response(&self) -> bool {
        self.transcript.needs_response()
    }

    /// Generates and commits the assistant reply to the pending user turn.
    ///
    /// On failure nothing is committed and the user may simply resubmit; no
    /// retry happens here.
    pub async fn respond<F>(
        &mut self,
        generator: &dyn StreamingGenerator,
        cancel: CancellationToken,
        on_partial: F,
    ) -> Result<&Turn, SessionError>
    where
        F: FnMut(&str),
    {
        let pending = match self.transcript.all().last() {
            Some(turn) if turn.role.is_user() => turn.content.clone(),
            _ => return Err(SessionError::NothingPending),
        };

        let response = generate_response(
            &self.transcript,
            &self.config,
            &pending,
            generator,
            cancel,
            on_partial,
        )
        .await?;

        self.transcript.append(Role::Assistant, response);
        Ok(self
            .transcript
            .all()
            .last()
            .expect("transcript is never empty after append"))
    }
}
