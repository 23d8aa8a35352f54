//! 应用配置管理
//!
//! 启动时从环境变量（以及可选的 `.env` 文件）读取一次，构造成 [`AppConfig`]，
//! 之后以引用形式传给需要它的组件，运行期间不再变更。

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::AppError;
use crate::llm::{detect_api_format, ApiFormat};
use crate::services::doc_generator::types::{DocGenConfig, RankOrder};

/// LLM API 密钥
const ENV_API_KEY: &str = "SPECGEN_API_KEY";
/// 兼容旧部署的 Gemini 密钥变量
const ENV_GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
const ENV_BASE_URL: &str = "SPECGEN_BASE_URL";
const ENV_MODEL: &str = "SPECGEN_MODEL";
const ENV_TEMPERATURE: &str = "SPECGEN_TEMPERATURE";
const ENV_MAX_TOKENS: &str = "SPECGEN_MAX_TOKENS";
const ENV_CHUNK_SIZE: &str = "SPECGEN_CHUNK_SIZE";
const ENV_CHUNK_OVERLAP: &str = "SPECGEN_CHUNK_OVERLAP";
const ENV_RANK_ORDER: &str = "SPECGEN_RANK_ORDER";

const ENV_LANGSMITH_API_KEY: &str = "LANGSMITH_API_KEY";
const ENV_LANGSMITH_PROJECT: &str = "LANGSMITH_PROJECT";
const ENV_LANGSMITH_ENDPOINT: &str = "LANGSMITH_ENDPOINT";
const ENV_LANGSMITH_TRACING: &str = "LANGSMITH_TRACING";

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// LLM API 密钥
    #[serde(default)]
    pub api_key: String,

    /// LLM API 基础 URL（为空时按 API 格式选择默认值）
    #[serde(default)]
    pub base_url: Option<String>,

    /// 模型名称
    #[serde(default = "default_model")]
    pub model: String,

    /// 温度参数
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// 最大输出 token 数
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// 文档生成配置
    #[serde(default)]
    pub doc_gen: DocGenConfig,

    /// 调用追踪配置（未配置密钥时为 None）
    #[serde(default)]
    pub tracing: Option<TraceConfig>,
}

/// LangSmith 追踪配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceConfig {
    /// 追踪服务密钥
    pub api_key: String,
    /// 项目名称
    #[serde(default = "default_trace_project")]
    pub project: String,
    /// 服务端点
    #[serde(default = "default_trace_endpoint")]
    pub endpoint: String,
}

fn default_model() -> String {
    "gemini-2.0-flash-exp".to_string()
}

fn default_temperature() -> f64 {
    0.2
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_trace_project() -> String {
    "default".to_string()
}

fn default_trace_endpoint() -> String {
    "https://api.smith.langchain.com".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            doc_gen: DocGenConfig::default(),
            tracing: None,
        }
    }
}

impl AppConfig {
    /// 从进程环境变量读取配置
    ///
    /// 先尝试加载当前目录的 `.env`，不存在时忽略。
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取配置
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut config = Self::default();

        if let Some(key) = get(ENV_API_KEY).or_else(|| get(ENV_GOOGLE_API_KEY)) {
            config.api_key = key;
        }
        config.base_url = get(ENV_BASE_URL);
        if let Some(model) = get(ENV_MODEL) {
            config.model = model;
        }
        if let Some(raw) = get(ENV_TEMPERATURE) {
            config.temperature = parse_value(ENV_TEMPERATURE, &raw)?;
        }
        if let Some(raw) = get(ENV_MAX_TOKENS) {
            config.max_tokens = parse_value(ENV_MAX_TOKENS, &raw)?;
        }
        if let Some(raw) = get(ENV_CHUNK_SIZE) {
            config.doc_gen.chunk_size = parse_value(ENV_CHUNK_SIZE, &raw)?;
        }
        if let Some(raw) = get(ENV_CHUNK_OVERLAP) {
            config.doc_gen.chunk_overlap = parse_value(ENV_CHUNK_OVERLAP, &raw)?;
        }
        if let Some(raw) = get(ENV_RANK_ORDER) {
            config.doc_gen.rank_order = parse_value::<RankOrder>(ENV_RANK_ORDER, &raw)?;
        }

        if config.doc_gen.chunk_size == 0 {
            return Err(AppError::Config(format!("{} 必须大于 0", ENV_CHUNK_SIZE)));
        }
        if config.doc_gen.chunk_overlap >= config.doc_gen.chunk_size {
            return Err(AppError::Config(format!(
                "{} ({}) 必须小于 {} ({})",
                ENV_CHUNK_OVERLAP, config.doc_gen.chunk_overlap, ENV_CHUNK_SIZE, config.doc_gen.chunk_size
            )));
        }

        if let Some(api_key) = get(ENV_LANGSMITH_API_KEY) {
            let enabled = match get(ENV_LANGSMITH_TRACING) {
                Some(flag) => parse_flag(ENV_LANGSMITH_TRACING, &flag)?,
                None => true,
            };
            if enabled {
                config.tracing = Some(TraceConfig {
                    api_key,
                    project: get(ENV_LANGSMITH_PROJECT).unwrap_or_else(default_trace_project),
                    endpoint: get(ENV_LANGSMITH_ENDPOINT).unwrap_or_else(default_trace_endpoint),
                });
            }
        }

        Ok(config)
    }

    /// 当前模型对应的 API 格式
    pub fn api_format(&self) -> ApiFormat {
        detect_api_format(&self.model)
    }

    /// 实际使用的基础 URL
    pub fn effective_base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| self.api_format().default_base_url().to_string())
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| AppError::Config(format!("{} 的值 '{}' 无效: {}", key, raw, e)))
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, AppError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::Config(format!("{} 的值 '{}' 不是布尔值", key, raw))),
    }
}
