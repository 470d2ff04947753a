use async_trait::async_trait;
use futures_util::StreamExt;
use memchr::memchr;
use reqwest::StatusCode;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::api::{
    FragmentStream, GenerateError, GenerationRequest, Prediction, PredictionInput,
    PredictionRequest, StreamingGenerator,
};
use crate::utils::url::construct_api_url;

pub const REPLICATE_API_BASE: &str = "https://api.replicate.com/v1";

/// Client for a Replicate-style prediction API: create a prediction with
/// `stream: true`, then consume the server-sent event stream it points at.
pub struct ReplicateClient {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl ReplicateClient {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self::with_base_url(api_token, REPLICATE_API_BASE)
    }

    pub fn with_base_url(api_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_token: api_token.into(),
        }
    }

    async fn create_prediction(
        &self,
        request: &GenerationRequest,
    ) -> Result<Prediction, GenerateError> {
        let url = construct_api_url(&self.base_url, "predictions");
        let body = PredictionRequest {
            version: request.model_version.clone(),
            input: PredictionInput {
                prompt: request.prompt.clone(),
                temperature: request.temperature,
                top_p: request.top_p,
                max_length: request.max_length,
                repetition_penalty: request.repetition_penalty,
            },
            stream: true,
        };

        tracing::debug!(model = %request.model_version, "creating prediction");
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(classify_http_error(status, &error_text));
        }

        Ok(response.json::<Prediction>().await?)
    }
}

#[async_trait]
impl StreamingGenerator for ReplicateClient {
    async fn stream_generate(
        &self,
        request: GenerationRequest,
    ) -> Result<FragmentStream, GenerateError> {
        let prediction = self.create_prediction(&request).await?;
        let stream_url = prediction.urls.stream.ok_or_else(|| {
            GenerateError::Api(format!(
                "prediction {} did not include a stream URL",
                prediction.id
            ))
        })?;

        tracing::debug!(prediction = %prediction.id, "opening event stream");
        let response = self
            .client
            .get(&stream_url)
            .bearer_auth(&self.api_token)
            .header("Accept", "text/event-stream")
            .header("Cache-Control", "no-store")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(classify_http_error(status, &error_text));
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = request.cancel.clone();
        tokio::spawn(async move {
            consume_event_stream(response, tx, cancel).await;
        });

        Ok(Box::pin(futures_util::stream::poll_fn(move |cx| {
            rx.poll_recv(cx)
        })))
    }
}

async fn consume_event_stream(
    response: reqwest::Response,
    tx: mpsc::UnboundedSender<Result<String, GenerateError>>,
    cancel: CancellationToken,
) {
    let mut stream = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::new();
    let mut event = SseEvent::default();

    loop {
        let chunk = tokio::select! {
            chunk = stream.next() => chunk,
            _ = cancel.cancelled() => return,
        };

        let Some(chunk) = chunk else {
            // Stream ended without a done event; whatever was dispatched
            // stands, the channel closing marks exhaustion.
            return;
        };

        let chunk_bytes = match chunk {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = tx.send(Err(GenerateError::Transport(e.to_string())));
                return;
            }
        };

        buffer.extend_from_slice(&chunk_bytes);
        while let Some(newline_pos) = memchr(b'\n', &buffer) {
            let line = match std::str::from_utf8(&buffer[..newline_pos]) {
                Ok(s) => s.trim_end_matches('\r').to_string(),
                Err(e) => {
                    tracing::warn!("invalid UTF-8 in event stream: {e}");
                    buffer.drain(..=newline_pos);
                    continue;
                }
            };
            buffer.drain(..=newline_pos);

            if let Some(outcome) = event.feed(&line) {
                match outcome {
                    EventOutcome::Fragment(text) => {
                        if tx.send(Ok(text)).is_err() {
                            return;
                        }
                    }
                    EventOutcome::Error(text) => {
                        let _ = tx.send(Err(GenerateError::Api(format_api_error(&text))));
                        return;
                    }
                    EventOutcome::Done => return,
                }
            }
        }
    }
}

/// Accumulates one server-sent event across its `event:`/`data:` lines and
/// dispatches on the blank separator line.
#[derive(Default)]
struct SseEvent {
    name: String,
    data: Vec<String>,
}

enum EventOutcome {
    Fragment(String),
    Error(String),
    Done,
}

impl SseEvent {
    fn feed(&mut self, line: &str) -> Option<EventOutcome> {
        if line.is_empty() {
            return self.dispatch();
        }
        if let Some(name) = field_value(line, "event") {
            self.name = name.to_string();
        } else if let Some(data) = field_value(line, "data") {
            self.data.push(data.to_string());
        }
        // Comment and id lines are ignored.
        None
    }

    fn dispatch(&mut self) -> Option<EventOutcome> {
        let name = std::mem::take(&mut self.name);
        let data = std::mem::take(&mut self.data).join("\n");
        match name.as_str() {
            "output" => Some(EventOutcome::Fragment(data)),
            "error" => Some(EventOutcome::Error(data)),
            "done" => Some(EventOutcome::Done),
            _ => None,
        }
    }
}

/// Splits an SSE field line, stripping the single optional space after the
/// colon but preserving any further leading whitespace in the value. Output
/// fragments routinely start with meaningful spaces.
fn field_value<'a>(line: &'a str, field: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(field)?;
    let rest = rest.strip_prefix(':')?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

fn classify_http_error(status: StatusCode, body: &str) -> GenerateError {
    let formatted = format_api_error(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GenerateError::Auth(formatted),
        StatusCode::TOO_MANY_REQUESTS => GenerateError::RateLimited(formatted),
        _ => GenerateError::Api(formatted),
    }
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .get("detail")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value
                .pointer("/error/message")
                .and_then(|v| v.as_str())
                .map(str::to_owned)
        })
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.to_string()),
                _ => None,
            })
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        collapsed.trim().to_string()
    })
}

fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();

    if trimmed.is_empty() {
        return "API error: <empty>".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(summary) = extract_error_summary(&json_value) {
            if !summary.is_empty() {
                return format!("API error: {summary}");
            }
        }
        if let Ok(pretty_json) = serde_json::to_string_pretty(&json_value) {
            return format!("API error: {pretty_json}");
        }
    }

    format!("API error: {trimmed}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_lines(lines: &[&str]) -> Vec<String> {
        let mut event = SseEvent::default();
        let mut fragments = Vec::new();
        for line in lines {
            match event.feed(line) {
                Some(EventOutcome::Fragment(text)) => fragments.push(text),
                Some(EventOutcome::Done) => break,
                Some(EventOutcome::Error(text)) => panic!("unexpected error event: {text}"),
                None => {}
            }
        }
        fragments
    }

    #[test]
    fn output_events_become_fragments_in_order() {
        let fragments = feed_lines(&[
            "event: output",
            "id: 1",
            "data: Hel",
            "",
            "event: output",
            "data: lo",
            "",
            "event: done",
            "data: {}",
            "",
        ]);
        assert_eq!(fragments, vec!["Hel".to_string(), "lo".to_string()]);
    }

    #[test]
    fn a_single_leading_space_is_stripped_and_the_rest_kept() {
        assert_eq!(field_value("data: hello", "data"), Some("hello"));
        assert_eq!(field_value("data:hello", "data"), Some("hello"));
        assert_eq!(field_value("data:  indented", "data"), Some(" indented"));
        assert_eq!(field_value("event: output", "data"), None);
    }

    #[test]
    fn multi_line_data_joins_with_newlines() {
        let fragments = feed_lines(&["event: output", "data: line one", "data: line two", ""]);
        assert_eq!(fragments, vec!["line one\nline two".to_string()]);
    }

    #[test]
    fn error_events_are_routed_as_api_errors() {
        let mut event = SseEvent::default();
        assert!(event.feed("event: error").is_none());
        assert!(event.feed("data: model overloaded").is_none());
        match event.feed("") {
            Some(EventOutcome::Error(text)) => assert_eq!(text, "model overloaded"),
            other => panic!("expected error outcome, got {:?}", other.is_some()),
        }
    }

    #[test]
    fn unknown_events_are_ignored() {
        let fragments = feed_lines(&["event: ping", "data: {}", "", "event: output", "data: ok", ""]);
        assert_eq!(fragments, vec!["ok".to_string()]);
    }

    #[test]
    fn http_statuses_map_onto_the_error_taxonomy() {
        assert!(matches!(
            classify_http_error(StatusCode::UNAUTHORIZED, "{}"),
            GenerateError::Auth(_)
        ));
        assert!(matches!(
            classify_http_error(StatusCode::TOO_MANY_REQUESTS, "{}"),
            GenerateError::RateLimited(_)
        ));
        assert!(matches!(
            classify_http_error(StatusCode::INTERNAL_SERVER_ERROR, "{}"),
            GenerateError::Api(_)
        ));
    }

    #[test]
    fn format_api_error_prefers_the_detail_field() {
        let raw = r#"{"detail":"Invalid   token"}"#;
        assert_eq!(format_api_error(raw), "API error: Invalid token");
    }

    #[test]
    fn format_api_error_falls_back_to_nested_message() {
        let raw = r#"{"error":{"message":"model overloaded","type":"server_error"}}"#;
        assert_eq!(format_api_error(raw), "API error: model overloaded");
    }

    #[test]
    fn format_api_error_handles_plaintext_and_empty_bodies() {
        assert_eq!(format_api_error("boom"), "API error: boom");
        assert_eq!(format_api_error("   "), "API error: <empty>");
    }
}
