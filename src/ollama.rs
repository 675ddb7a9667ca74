//! HTTP client for the Ollama inference endpoint

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum OllamaError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Inference server not reachable at {0}")]
    ServerNotRunning(String),
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// One generation fragment; the final line of a stream carries `done = true`
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

/// Thin wrapper around the inference server's HTTP API
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: reqwest::Client::new(),
            base_url,
            model: model.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate a response for the prompt in a single round trip.
    pub async fn generate(&self, prompt: &str) -> Result<String, OllamaError> {
        debug!(model = %self.model, "Sending generate request");
        let response = self.post_generate(prompt, false).await?;
        let text = response.text().await?;
        let body: GenerateResponse = serde_json::from_str(&text)?;
        Ok(body.response)
    }

    /// Generate with streaming enabled: the chunked body is read as
    /// newline-delimited JSON fragments until the first `done = true` line,
    /// or until the stream ends or is cancelled. Whatever text accumulated
    /// is returned; `on_text` observes each appended fragment.
    pub async fn generate_streamed(
        &self,
        prompt: &str,
        token: &CancellationToken,
        mut on_text: impl FnMut(&str),
    ) -> Result<String, OllamaError> {
        debug!(model = %self.model, "Sending streamed generate request");
        let response = self.post_generate(prompt, true).await?;

        let mut accumulated = String::new();
        let mut buf: Vec<u8> = Vec::new();
        let mut stream = response.bytes_stream();

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(chars = accumulated.len(), "Stream cancelled");
                    return Ok(accumulated);
                }
                chunk = stream.next() => {
                    match chunk {
                        Some(Ok(data)) => {
                            buf.extend_from_slice(&data);
                            for line in drain_lines(&mut buf) {
                                match apply_stream_line(&mut accumulated, &line, &mut on_text) {
                                    Ok(true) => return Ok(accumulated),
                                    Ok(false) => {}
                                    Err(e) => {
                                        warn!(error = %e, "Skipping malformed stream line");
                                    }
                                }
                            }
                        }
                        Some(Err(e)) => return Err(OllamaError::Http(e)),
                        None => break,
                    }
                }
            }
        }

        // Stream closed without a done line; a trailing unterminated
        // fragment still counts.
        let leftover = String::from_utf8_lossy(&buf).trim().to_string();
        if !leftover.is_empty() {
            if let Err(e) = apply_stream_line(&mut accumulated, &leftover, &mut on_text) {
                warn!(error = %e, "Skipping malformed trailing line");
            }
        }
        Ok(accumulated)
    }

    /// Names of the models available on the endpoint.
    pub async fn list_models(&self) -> Result<Vec<String>, OllamaError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_connect() {
                OllamaError::ServerNotRunning(self.base_url.clone())
            } else {
                OllamaError::Http(e)
            }
        })?;
        if !response.status().is_success() {
            return Err(OllamaError::Api(format!("HTTP {}", response.status())));
        }
        let tags: TagsResponse = response.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Health probe: true when the endpoint answers the root path with 200.
    pub async fn status(&self) -> bool {
        let url = format!("{}/", self.base_url);
        match self
            .client
            .get(&url)
            .timeout(std::time::Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn post_generate(
        &self,
        prompt: &str,
        stream: bool,
    ) -> Result<reqwest::Response, OllamaError> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream,
        };
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    OllamaError::ServerNotRunning(self.base_url.clone())
                } else {
                    OllamaError::Http(e)
                }
            })?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(OllamaError::Api(format!("{}: {}", status, text)));
        }
        Ok(response)
    }
}

/// Split complete newline-terminated lines out of the buffer.
/// Bytes after the last newline stay behind for the next chunk.
fn drain_lines(buf: &mut Vec<u8>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
        let line: Vec<u8> = buf.drain(..=pos).collect();
        let line = String::from_utf8_lossy(&line).trim().to_string();
        if !line.is_empty() {
            lines.push(line);
        }
    }
    lines
}

/// Parse one stream line, append its text, and report the done flag.
fn apply_stream_line(
    accumulated: &mut String,
    line: &str,
    on_text: &mut impl FnMut(&str),
) -> Result<bool, serde_json::Error> {
    let fragment: GenerateResponse = serde_json::from_str(line)?;
    if !fragment.response.is_empty() {
        accumulated.push_str(&fragment.response);
        on_text(&fragment.response);
    }
    Ok(fragment.done)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = OllamaClient::new("http://127.0.0.1:11434/", "llama3:8b");
        assert_eq!(client.base_url(), "http://127.0.0.1:11434");
        assert_eq!(client.model(), "llama3:8b");
    }

    #[test]
    fn generate_request_serializes_wire_format() {
        let request = GenerateRequest {
            model: "llama3:8b",
            prompt: "oi",
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"model": "llama3:8b", "prompt": "oi", "stream": false})
        );
    }

    #[test]
    fn drain_lines_handles_partial_chunks() {
        let mut buf = b"{\"response\":\"a\"}\n{\"resp".to_vec();
        let lines = drain_lines(&mut buf);
        assert_eq!(lines, vec![r#"{"response":"a"}"#]);
        assert_eq!(buf, b"{\"resp".to_vec());

        buf.extend_from_slice(b"onse\":\"b\"}\n\n");
        let lines = drain_lines(&mut buf);
        assert_eq!(lines, vec![r#"{"response":"b"}"#]);
        assert!(buf.is_empty());
    }

    #[test]
    fn stream_lines_accumulate_until_done() {
        let mut acc = String::new();
        let mut seen = Vec::new();
        let mut on_text = |t: &str| seen.push(t.to_string());

        let done = apply_stream_line(&mut acc, r#"{"response":"Bom ","done":false}"#, &mut on_text)
            .unwrap();
        assert!(!done);
        let done =
            apply_stream_line(&mut acc, r#"{"response":"dia!","done":false}"#, &mut on_text)
                .unwrap();
        assert!(!done);
        let done = apply_stream_line(&mut acc, r#"{"response":"","done":true}"#, &mut on_text)
            .unwrap();
        assert!(done);

        assert_eq!(acc, "Bom dia!");
        assert_eq!(seen, vec!["Bom ", "dia!"]);
    }

    #[test]
    fn stream_line_with_missing_fields_defaults() {
        let mut acc = String::new();
        let done = apply_stream_line(&mut acc, r#"{"model":"llama3:8b"}"#, &mut |_| {}).unwrap();
        assert!(!done);
        assert!(acc.is_empty());
    }

    #[test]
    fn malformed_stream_line_is_an_error() {
        let mut acc = String::new();
        assert!(apply_stream_line(&mut acc, "not json", &mut |_| {}).is_err());
    }

    #[test]
    fn tags_response_extracts_names() {
        let tags: TagsResponse = serde_json::from_str(
            r#"{"models":[{"name":"llama3:8b","size":1},{"name":"mistral:7b"}]}"#,
        )
        .unwrap();
        let names: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["llama3:8b", "mistral:7b"]);
    }
}
