//! 代码分析类型定义
//!
//! 清单阶段产出的聚合分析对象及其组成部分。文档流水线只读取这些类型。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 关键组件的固定类型标签
pub const KEY_COMPONENT_TYPE: &str = "Core Component";

/// 文件名中出现这些片段即视为关键组件
pub const KEY_COMPONENT_PATTERNS: &[&str] = &["main", "app", "index", "core", "service"];

/// 最多读取的提交数
pub const MAX_RECENT_COMMITS: usize = 10;

/// 单个源文件记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// 相对于源码根目录的路径（使用 `/` 分隔）
    pub path: String,
    /// 语言标签
    pub language: String,
    /// 去除首尾空白后的文本内容
    pub content: String,
    /// 原始文件字节数
    pub size: u64,
}

/// 目录树节点
///
/// 子目录按名称有序保存，与扫描顺序一致。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryNode {
    /// 子目录
    pub directories: BTreeMap<String, DirectoryNode>,
    /// 本层文件名
    pub files: Vec<String>,
}

impl DirectoryNode {
    /// 按路径片段取得（必要时创建）子目录节点
    pub fn ensure_path<'a, I>(&mut self, components: I) -> &mut DirectoryNode
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut node = self;
        for part in components {
            node = node.directories.entry(part.to_string()).or_default();
        }
        node
    }

    /// 递归统计文件数量
    pub fn file_count(&self) -> usize {
        self.files.len()
            + self
                .directories
                .values()
                .map(DirectoryNode::file_count)
                .sum::<usize>()
    }
}

/// 语言 → 文件数
pub type LanguageHistogram = BTreeMap<String, usize>;

/// 关键组件引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyComponentRef {
    pub path: String,
    #[serde(rename = "type")]
    pub component_type: String,
    pub language: String,
}

/// 单个提交摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub hash: String,
    pub author: String,
    /// ISO-8601 提交时间
    pub date: String,
    pub message: String,
}

/// 版本控制信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitInfo {
    pub active_branch: String,
    pub recent_commits: Vec<CommitSummary>,
}

/// 聚合分析对象
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeAnalysis {
    /// 文件记录（扫描顺序）
    pub files: Vec<FileRecord>,
    /// 目录树
    pub project_structure: DirectoryNode,
    /// 语言分布
    pub languages: LanguageHistogram,
    /// 版本控制信息（非 Git 工作区时为 None）
    pub git_info: Option<GitInfo>,
    /// 关键组件
    pub key_components: Vec<KeyComponentRef>,
}

impl CodeAnalysis {
    /// 按路径查找文件记录
    pub fn find_file(&self, path: &str) -> Option<&FileRecord> {
        self.files.iter().find(|f| f.path == path)
    }
}

/// 扫描配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// 忽略的路径片段（glob 模式，逐个路径片段匹配）
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,

    /// 支持的文件扩展名（不含点，小写）
    #[serde(default = "default_supported_extensions")]
    pub supported_extensions: Vec<String>,
}

fn default_ignore_patterns() -> Vec<String> {
    ["node_modules", "__pycache__", "build", "dist"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_supported_extensions() -> Vec<String> {
    [
        "py", "js", "ts", "java", "cpp", "c", "cs", "go", "rb", "php", "html", "css", "json",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ignore_patterns: default_ignore_patterns(),
            supported_extensions: default_supported_extensions(),
        }
    }
}
