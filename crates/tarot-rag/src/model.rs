use async_trait::async_trait;
use futures::Stream;
use futures::StreamExt;
use std::pin::Pin;
use std::time::Duration;
use tarot_core::Dimensions;
use tarot_core::TarotError;
use tarot_core::Temperature;

/// A chat completion request. `json_mode` asks the provider to constrain
/// output to valid JSON; callers that get an `LlmCall` error back for a
/// `json_mode` request should retry once with it turned off, since some
/// providers 400 on `response_format` for certain models (spec §4.3).
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: Temperature,
    pub json_mode: bool,
}

/// A chunk of an in-progress chat completion. Chunks are opaque substrings
/// that concatenate in order to the full output; no semantic parsing of a
/// partial chunk is attempted (spec §4.3, §9 design notes).
pub type ChatChunk = Result<String, TarotError>;
/// A boxed, ordered stream of [`ChatChunk`]s for one `chatStream` call.
pub type ChatStream = Pin<Box<dyn Stream<Item = ChatChunk> + Send>>;

/// A provider-agnostic chat/embedding client (spec §4.3 ModelClient,
/// §C supplement for reasoning-model output cleanup).
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn chat(&self, stage: &'static str, request: ChatRequest) -> Result<String, TarotError>;
    /// Streamed chat completion: tokens arrive as they are generated rather
    /// than once the whole reply is ready (spec §4.3 `chatStream`).
    async fn chat_stream(&self, stage: &'static str, request: ChatRequest) -> Result<ChatStream, TarotError>;
    async fn embed(&self, stage: &'static str, text: &str) -> Result<Vec<f32>, TarotError>;
    fn embedding_dimensions(&self) -> Dimensions;
}

/// Strips a leading `<think>...</think>` block some reasoning models emit
/// ahead of their actual answer.
pub fn strip_reasoning(raw: &str) -> &str {
    let trimmed = raw.trim_start();
    if let Some(rest) = trimmed.strip_prefix("<think>") {
        if let Some(end) = rest.find("</think>") {
            return rest[end + "</think>".len()..].trim_start();
        }
    }
    trimmed
}

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// OpenAI-compatible chat/embeddings client. Works against OpenAI directly
/// or, with `base_url` pointed at OpenRouter, against any model it proxies
/// (spec §C supplement, mirroring `USE_OPENROUTER`/`MODEL_PRESET` from the
/// original configuration surface).
pub struct HttpModelClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    chat_model: String,
    embedding_model: String,
    embedding_dimensions: Dimensions,
}

impl HttpModelClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        chat_model: impl Into<String>,
        embedding_model: impl Into<String>,
        embedding_dimensions: Dimensions,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("failed to build reqwest client");
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            chat_model: chat_model.into(),
            embedding_model: embedding_model.into(),
            embedding_dimensions,
        }
    }

    fn chat_body(&self, request: &ChatRequest, json_mode: bool, stream: bool) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.chat_model,
            "temperature": request.temperature,
            "stream": stream,
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": request.user},
            ],
        });
        if json_mode {
            body["response_format"] = serde_json::json!({"type": "json_object"});
        }
        body
    }

    async fn post_chat(&self, stage: &'static str, request: &ChatRequest, json_mode: bool) -> Result<String, TarotError> {
        let body = self.chat_body(request, json_mode, false);

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TarotError::LlmCall {
                stage: stage.to_string(),
                detail: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(TarotError::LlmCall {
                stage: stage.to_string(),
                detail: format!("HTTP {status}: {}", truncate(&body, 300)),
            });
        }

        let payload: serde_json::Value = resp.json().await.map_err(|e| TarotError::LlmParse {
            stage: stage.to_string(),
            detail: e.to_string(),
        })?;
        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| TarotError::LlmParse {
                stage: stage.to_string(),
                detail: "response had no message content".to_string(),
            })?;
        Ok(strip_reasoning(content).to_string())
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn chat(&self, stage: &'static str, request: ChatRequest) -> Result<String, TarotError> {
        if request.json_mode {
            match self.post_chat(stage, &request, true).await {
                Ok(text) => return Ok(text),
                Err(_) => {
                    log::warn!("{stage}: json_mode chat call failed, retrying without response_format");
                    return self.post_chat(stage, &request, false).await;
                }
            }
        }
        self.post_chat(stage, &request, false).await
    }

    async fn chat_stream(&self, stage: &'static str, request: ChatRequest) -> Result<ChatStream, TarotError> {
        let body = self.chat_body(&request, request.json_mode, true);
        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TarotError::LlmCall {
                stage: stage.to_string(),
                detail: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(TarotError::LlmCall {
                stage: stage.to_string(),
                detail: format!("HTTP {status}: {}", truncate(&body, 300)),
            });
        }

        let byte_stream = resp.bytes_stream();
        let stage = stage.to_string();
        let stream = futures::stream::unfold(
            (byte_stream, Vec::<u8>::new(), false, stage),
            move |(mut bytes, mut buf, done, stage)| async move {
                if done {
                    return None;
                }
                loop {
                    if let Some(pos) = buf.iter().position(|b| *b == b'\n') {
                        let line = buf.drain(..=pos).collect::<Vec<u8>>();
                        let line = String::from_utf8_lossy(&line);
                        let line = line.trim();
                        let Some(payload) = line.strip_prefix("data:") else {
                            continue;
                        };
                        let payload = payload.trim();
                        if payload == "[DONE]" {
                            return Some((Ok(String::new()), (bytes, buf, true, stage)));
                        }
                        if payload.is_empty() {
                            continue;
                        }
                        let parsed: serde_json::Value = match serde_json::from_str(payload) {
                            Ok(v) => v,
                            Err(e) => {
                                return Some((
                                    Err(TarotError::LlmParse {
                                        stage: stage.clone(),
                                        detail: e.to_string(),
                                    }),
                                    (bytes, buf, true, stage),
                                ))
                            }
                        };
                        let delta = parsed["choices"][0]["delta"]["content"].as_str().unwrap_or("");
                        if delta.is_empty() {
                            continue;
                        }
                        return Some((Ok(delta.to_string()), (bytes, buf, false, stage)));
                    }
                    match bytes.next().await {
                        Some(Ok(chunk)) => buf.extend_from_slice(&chunk),
                        Some(Err(e)) => {
                            return Some((
                                Err(TarotError::LlmCall {
                                    stage: stage.clone(),
                                    detail: e.to_string(),
                                }),
                                (bytes, buf, true, stage),
                            ))
                        }
                        None => return None,
                    }
                }
            },
        )
        .filter(|chunk| futures::future::ready(!matches!(chunk, Ok(s) if s.is_empty())));

        Ok(Box::pin(stream))
    }

    async fn embed(&self, stage: &'static str, text: &str) -> Result<Vec<f32>, TarotError> {
        let body = serde_json::json!({
            "model": self.embedding_model,
            "input": text,
        });
        let resp = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TarotError::LlmCall {
                stage: stage.to_string(),
                detail: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(TarotError::LlmCall {
                stage: stage.to_string(),
                detail: format!("HTTP {status}: {}", truncate(&body, 300)),
            });
        }

        let payload: serde_json::Value = resp.json().await.map_err(|e| TarotError::LlmParse {
            stage: stage.to_string(),
            detail: e.to_string(),
        })?;
        let values = payload["data"][0]["embedding"]
            .as_array()
            .ok_or_else(|| TarotError::LlmParse {
                stage: stage.to_string(),
                detail: "embedding response had no data[0].embedding".to_string(),
            })?;
        values
            .iter()
            .map(|v| {
                v.as_f64().map(|f| f as f32).ok_or_else(|| TarotError::LlmParse {
                    stage: stage.to_string(),
                    detail: "embedding vector contained a non-numeric element".to_string(),
                })
            })
            .collect()
    }

    fn embedding_dimensions(&self) -> Dimensions {
        self.embedding_dimensions
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_reasoning_removes_think_block() {
        let raw = "<think>musing about tarot</think>\n\nThe answer is 42.";
        assert_eq!(strip_reasoning(raw), "The answer is 42.");
    }

    #[test]
    fn strip_reasoning_passes_through_plain_text() {
        let raw = "The answer is 42.";
        assert_eq!(strip_reasoning(raw), "The answer is 42.");
    }

    #[test]
    fn strip_reasoning_handles_unterminated_think_block() {
        let raw = "<think>never closes";
        assert_eq!(strip_reasoning(raw), "<think>never closes");
    }
}
