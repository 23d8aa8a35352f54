//! LLM 模块
//!
//! 提供统一的 LLM 客户端，支持 OpenAI、Anthropic 和 Gemini API 格式。

mod anthropic;
mod client;
mod format;
mod gemini;
mod openai;
mod types;

pub use client::LlmClient;
pub use format::{detect_api_format, truncate_for_log, ApiFormat};
pub use types::*;
