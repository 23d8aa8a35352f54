//! Anthropic Messages API 流式实现

use async_stream::try_stream;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tracing::{debug, error};

use super::format::{build_anthropic_endpoint, truncate_for_log, SseBuffer};
use super::types::{ChatChunk, ChatMessage, ChatOptions, LlmError};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic 请求载荷
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    stream: bool,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

/// Anthropic SSE 事件
#[derive(Deserialize, Debug)]
struct AnthropicEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    delta: Option<AnthropicDelta>,
}

#[derive(Deserialize, Debug)]
struct AnthropicDelta {
    #[serde(rename = "type")]
    delta_type: Option<String>,
    text: Option<String>,
    stop_reason: Option<String>,
}

/// 将一个 SSE 事件转换为响应块
fn event_to_chunk(event: AnthropicEvent) -> Option<ChatChunk> {
    match event.event_type.as_str() {
        "content_block_delta" => {
            let delta = event.delta?;
            if delta.delta_type.as_deref() != Some("text_delta") {
                return None;
            }
            delta.text.map(|text| ChatChunk {
                content: Some(text),
                finish_reason: None,
            })
        }
        "message_delta" => event.delta.and_then(|d| d.stop_reason).map(|reason| ChatChunk {
            content: None,
            finish_reason: Some(reason),
        }),
        "message_stop" => Some(ChatChunk {
            content: None,
            finish_reason: Some("stop".to_string()),
        }),
        _ => None,
    }
}

/// 流式调用 Anthropic API
pub fn stream_anthropic(
    client: &Client,
    api_key: &str,
    base_url: &str,
    messages: Vec<ChatMessage>,
    model: &str,
    options: &ChatOptions,
) -> Pin<Box<dyn Stream<Item = Result<ChatChunk, LlmError>> + Send>> {
    let endpoint = build_anthropic_endpoint(base_url);
    let api_key = api_key.to_string();
    let model = model.to_string();
    let options = options.clone();
    let client = client.clone();

    Box::pin(try_stream! {
        let payload = AnthropicRequest {
            model: model.clone(),
            messages: messages
                .into_iter()
                .map(|msg| AnthropicMessage {
                    role: msg.role,
                    content: msg.content,
                })
                .collect(),
            stream: true,
            max_tokens: options.max_tokens.unwrap_or(4096),
            temperature: options.temperature,
        };

        debug!("Anthropic API request: endpoint={}, model={}", endpoint, model);

        let response = client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .header("x-api-key", &api_key)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let error_text = response.text().await.unwrap_or_default();
            error!("Anthropic API error: status={}, body={}", status_code, truncate_for_log(&error_text, 500));
            Err::<(), LlmError>(LlmError::ApiError {
                status: status_code,
                message: error_text,
            })?;
            unreachable!();
        }

        let mut sse = SseBuffer::new();
        let mut stream = response.bytes_stream();

        'read: while let Some(chunk_result) = stream.next().await {
            let bytes = chunk_result?;

            for data in sse.push(&bytes) {
                if data == "[DONE]" {
                    break 'read;
                }

                match serde_json::from_str::<AnthropicEvent>(&data) {
                    Ok(event) => {
                        let is_stop = event.event_type == "message_stop";
                        if let Some(chunk) = event_to_chunk(event) {
                            yield chunk;
                        }
                        if is_stop {
                            break 'read;
                        }
                    }
                    Err(e) => {
                        debug!("Failed to parse Anthropic response: {}, data: {}", e, data);
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(data: &str) -> AnthropicEvent {
        serde_json::from_str(data).unwrap()
    }

    #[test]
    fn test_text_delta_becomes_content() {
        let event = parse(r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"hi"}}"#);
        let chunk = event_to_chunk(event).unwrap();
        assert_eq!(chunk.content.as_deref(), Some("hi"));
    }

    #[test]
    fn test_stop_reason_and_ignored_events() {
        let event = parse(r#"{"type":"message_delta","delta":{"stop_reason":"end_turn"}}"#);
        assert_eq!(event_to_chunk(event).unwrap().finish_reason.as_deref(), Some("end_turn"));

        let ping = parse(r#"{"type":"ping"}"#);
        assert!(event_to_chunk(ping).is_none());
    }
}
