//! OpenAI Chat Completions API 流式实现

use async_stream::try_stream;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tracing::{debug, error};

use super::format::{build_openai_endpoint, truncate_for_log, SseBuffer};
use super::types::{ChatChunk, ChatMessage, ChatOptions, LlmError};

/// OpenAI 请求载荷
#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// OpenAI SSE 响应块
#[derive(Deserialize, Debug)]
struct OpenAiStreamChunk {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize, Debug)]
struct OpenAiChoice {
    delta: OpenAiDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct OpenAiDelta {
    content: Option<String>,
}

/// 流式调用 OpenAI API
pub fn stream_openai(
    client: &Client,
    api_key: &str,
    base_url: &str,
    messages: Vec<ChatMessage>,
    model: &str,
    options: &ChatOptions,
) -> Pin<Box<dyn Stream<Item = Result<ChatChunk, LlmError>> + Send>> {
    let endpoint = build_openai_endpoint(base_url);
    let api_key = api_key.to_string();
    let model = model.to_string();
    let options = options.clone();
    let client = client.clone();

    Box::pin(try_stream! {
        let payload = OpenAiRequest {
            model: model.clone(),
            messages,
            stream: true,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        debug!("OpenAI API request: endpoint={}, model={}", endpoint, model);

        let response = client
            .post(&endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let error_text = response.text().await.unwrap_or_default();
            error!("OpenAI API error: status={}, body={}", status_code, truncate_for_log(&error_text, 500));
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

                match serde_json::from_str::<OpenAiStreamChunk>(&data) {
                    Ok(chunk) => {
                        if let Some(choice) = chunk.choices.first() {
                            yield ChatChunk {
                                content: choice.delta.content.clone(),
                                finish_reason: choice.finish_reason.clone(),
                            };
                        }
                    }
                    Err(e) => {
                        // 个别无法解析的事件不中断流
                        debug!("Failed to parse OpenAI response: {}, data: {}", e, data);
                    }
                }
            }
        }
    })
}
