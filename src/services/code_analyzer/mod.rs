//! 代码分析器主模块
//!
//! 扫描源码目录，构建文档流水线所需的聚合分析对象：
//! 文件清单、目录树、语言分布、Git 历史和关键组件。

mod git_history;
mod key_components;
pub mod language;
mod scanner;
pub mod types;

use std::path::PathBuf;
use tracing::{info, warn};

pub use key_components::identify_key_components;
pub use scanner::{ScanError, SourceInventory, SourceScanner};
use types::{CodeAnalysis, ScanConfig};

use crate::error::AppResult;

/// 代码分析器
pub struct CodeAnalyzer {
    source_dir: PathBuf,
    config: ScanConfig,
}

impl CodeAnalyzer {
    /// 创建新的代码分析器
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self::with_config(source_dir, ScanConfig::default())
    }

    /// 使用自定义扫描配置创建
    pub fn with_config(source_dir: impl Into<PathBuf>, config: ScanConfig) -> Self {
        Self {
            source_dir: source_dir.into(),
            config,
        }
    }

    /// 分析源码并返回聚合结果
    ///
    /// 根目录不存在或不可读时记录警告并返回空结果，不中断运行。
    pub fn analyze(&self) -> CodeAnalysis {
        self.try_analyze().unwrap_or_else(|e| {
            warn!("Source scan skipped: {}", e);
            CodeAnalysis::default()
        })
    }

    /// 分析源码，根目录无效时返回错误
    pub fn try_analyze(&self) -> AppResult<CodeAnalysis> {
        let inventory = SourceScanner::new(self.config.clone()).scan(&self.source_dir)?;
        let git_info = git_history::collect_git_info(&self.source_dir);
        let key_components = identify_key_components(&inventory.files);

        info!(
            "Code analysis finished: {} files, {} key components, git history {}",
            inventory.files.len(),
            key_components.len(),
            if git_info.is_some() { "available" } else { "unavailable" }
        );

        Ok(CodeAnalysis {
            files: inventory.files,
            project_structure: inventory.tree,
            languages: inventory.languages,
            git_info,
            key_components,
        })
    }
}
