//! Google Gemini streamGenerateContent 流式实现

use async_stream::try_stream;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tracing::{debug, error};

use super::format::{build_gemini_endpoint, truncate_for_log, SseBuffer};
use super::types::{ChatChunk, ChatMessage, ChatOptions, LlmError};

/// Gemini 请求载荷
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize, Debug, Default)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize, Debug)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

/// Gemini SSE 响应块
#[derive(Deserialize, Debug)]
struct GeminiStreamChunk {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

/// 将用户消息转换为 Gemini 请求
fn build_request(messages: Vec<ChatMessage>, options: &ChatOptions) -> GeminiRequest {
    let contents = messages
        .into_iter()
        .map(|msg| GeminiContent {
            role: Some(msg.role),
            parts: vec![GeminiPart { text: Some(msg.content) }],
        })
        .collect();

    GeminiRequest {
        contents,
        generation_config: GenerationConfig {
            temperature: options.temperature,
            max_output_tokens: options.max_tokens,
        },
    }
}

/// 将一个 SSE 块转换为响应块
fn chunk_from_candidates(chunk: GeminiStreamChunk) -> Option<ChatChunk> {
    let candidate = chunk.candidates.into_iter().next()?;
    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    Some(ChatChunk {
        content: if text.is_empty() { None } else { Some(text) },
        finish_reason: candidate.finish_reason,
    })
}

/// 流式调用 Gemini API
pub fn stream_gemini(
    client: &Client,
    api_key: &str,
    base_url: &str,
    messages: Vec<ChatMessage>,
    model: &str,
    options: &ChatOptions,
) -> Pin<Box<dyn Stream<Item = Result<ChatChunk, LlmError>> + Send>> {
    let endpoint = build_gemini_endpoint(base_url, model);
    let api_key = api_key.to_string();
    let model = model.to_string();
    let payload = build_request(messages, options);
    let client = client.clone();

    Box::pin(try_stream! {
        debug!("Gemini API request: endpoint={}, model={}", endpoint, model);

        let response = client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let error_text = response.text().await.unwrap_or_default();
            error!("Gemini API error: status={}, body={}", status_code, truncate_for_log(&error_text, 500));
            Err::<(), LlmError>(LlmError::ApiError {
                status: status_code,
                message: error_text,
            })?;
            unreachable!();
        }

        let mut sse = SseBuffer::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk_result) = stream.next().await {
            let bytes = chunk_result?;

            for data in sse.push(&bytes) {
                match serde_json::from_str::<GeminiStreamChunk>(&data) {
                    Ok(chunk) => {
                        if let Some(chat_chunk) = chunk_from_candidates(chunk) {
                            yield chat_chunk;
                        }
                    }
                    Err(e) => {
                        debug!("Failed to parse Gemini response: {}, data: {}", e, data);
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_shape() {
        let request = build_request(
            vec![ChatMessage::user("hello")],
            &ChatOptions {
                temperature: Some(0.2),
                max_tokens: Some(4096),
            },
        );
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 4096);
    }

    #[test]
    fn test_chunk_from_candidates() {
        let chunk: GeminiStreamChunk = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"a"},{"text":"b"}]},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        let chat_chunk = chunk_from_candidates(chunk).unwrap();
        assert_eq!(chat_chunk.content.as_deref(), Some("ab"));
        assert_eq!(chat_chunk.finish_reason.as_deref(), Some("STOP"));
    }
}
