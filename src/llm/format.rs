//! API 格式检测、URL 构建和 SSE 行缓冲

use serde::{Deserialize, Serialize};

/// API 格式枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiFormat {
    /// OpenAI Chat Completions API
    OpenAi,
    /// Anthropic Messages API
    Anthropic,
    /// Google Gemini generateContent API
    Gemini,
}

impl ApiFormat {
    /// 未显式配置 base_url 时使用的默认地址
    pub fn default_base_url(self) -> &'static str {
        match self {
            ApiFormat::OpenAi => "https://api.openai.com",
            ApiFormat::Anthropic => "https://api.anthropic.com",
            ApiFormat::Gemini => "https://generativelanguage.googleapis.com",
        }
    }
}

/// 根据模型名称检测 API 格式
///
/// 规则：模型名包含 "claude" 使用 Anthropic 格式，包含 "gemini" 使用 Gemini 格式，
/// 否则使用 OpenAI 格式
pub fn detect_api_format(model: &str) -> ApiFormat {
    let lower = model.to_lowercase();
    if lower.contains("claude") {
        ApiFormat::Anthropic
    } else if lower.contains("gemini") {
        ApiFormat::Gemini
    } else {
        ApiFormat::OpenAi
    }
}

/// 修复 base_url
///
/// - 移除末尾斜杠
/// - 修复双斜杠（保留协议部分）
pub fn fix_base_url(base_url: &str) -> String {
    let mut url = base_url.trim_end_matches('/').to_string();

    if let Some(pos) = url.find("://") {
        let (protocol, rest) = url.split_at(pos + 3);
        let fixed_rest = rest.replace("//", "/");
        url = format!("{}{}", protocol, fixed_rest);
    }

    url
}

/// 构建 OpenAI Chat Completions 端点
pub fn build_openai_endpoint(base_url: &str) -> String {
    let url = fix_base_url(base_url);

    if url.ends_with("/chat/completions") {
        url
    } else if url.ends_with("/v1") {
        format!("{}/chat/completions", url)
    } else {
        format!("{}/v1/chat/completions", url)
    }
}

/// 构建 Anthropic Messages 端点
pub fn build_anthropic_endpoint(base_url: &str) -> String {
    let url = fix_base_url(base_url);

    if url.ends_with("/messages") {
        url
    } else if url.ends_with("/v1") {
        format!("{}/messages", url)
    } else {
        format!("{}/v1/messages", url)
    }
}

/// 构建 Gemini 流式生成端点
///
/// 例如: https://generativelanguage.googleapis.com
///   -> https://generativelanguage.googleapis.com/v1beta/models/{model}:streamGenerateContent?alt=sse
pub fn build_gemini_endpoint(base_url: &str, model: &str) -> String {
    let url = fix_base_url(base_url);

    let prefix = if url.ends_with("/v1beta") || url.ends_with("/v1") {
        url
    } else {
        format!("{}/v1beta", url)
    };
    format!("{}/models/{}:streamGenerateContent?alt=sse", prefix, model)
}

/// SSE 行缓冲
///
/// 网络分片可能在任意字节处截断，这里按 `\n` 切分出完整行，
/// 只返回 `data: ` 行的负载部分。
#[derive(Debug, Default)]
pub struct SseBuffer {
    buffer: Vec<u8>,
}

impl SseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一段字节，返回其中已完整的 data 负载
    ///
    /// 按字节缓冲，多字节字符被分片截断时等整行到齐再解码。
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        while let Some(newline_pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(data) = line.trim().strip_prefix("data:") {
                payloads.push(data.trim_start().to_string());
            }
        }
        payloads
    }
}

/// 截断错误响应体，按字符边界
pub fn truncate_for_log(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
