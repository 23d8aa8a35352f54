//! 统一错误处理模块
//!
//! 定义应用级错误类型。只有配置错误、LLM 调用错误和产物写入错误会终止运行，
//! 扫描、Git 历史和响应解析的错误在各自的模块内降级处理。

use std::path::PathBuf;
use thiserror::Error;

use crate::llm::LlmError;
use crate::services::code_analyzer::ScanError;

/// 应用错误枚举
#[derive(Error, Debug)]
pub enum AppError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(String),

    /// LLM 调用错误
    #[error("LLM 错误: {0}")]
    Llm(#[from] LlmError),

    /// 源码扫描错误
    #[error("分析错误: {0}")]
    Analyzer(#[from] ScanError),

    /// 文件读写错误
    #[error("IO错误 ({0}): {1}")]
    Io(PathBuf, #[source] std::io::Error),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON 序列化失败: {}", e))
    }
}

/// 便捷类型别名
pub type AppResult<T> = Result<T, AppError>;
