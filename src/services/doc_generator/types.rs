//! 文档生成器类型定义
//!
//! 模型返回的 JSON 形状只是约定，这里为每种形状定义带默认值的宽松类型：
//! 缺失字段取默认值，类型不符的字段做强制转换，未知字段原样保留。

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::services::code_analyzer::types::{DirectoryNode, GitInfo, LanguageHistogram};

/// 规格文档格式版本
pub const SOURCE_CODE_ANALYSIS_VERSION: &str = "1.0";

/// 集成分析完全无法解析时使用的占位说明
pub const INTEGRATION_ERROR_PLACEHOLDER: &str = "Error parsing integration analysis";

/// 文件重要性排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankOrder {
    /// 分数从低到高（沿用既有行为）
    #[default]
    Ascending,
    /// 分数从高到低
    Descending,
}

impl FromStr for RankOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ascending" | "asc" => Ok(Self::Ascending),
            "descending" | "desc" => Ok(Self::Descending),
            other => Err(format!("unknown rank order '{}', expected ascending or descending", other)),
        }
    }
}

impl fmt::Display for RankOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "ascending"),
            Self::Descending => write!(f, "descending"),
        }
    }
}

/// 文档生成配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocGenConfig {
    /// 分块大小（字符数）
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// 分块重叠（字符数）
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// 最多分析的分块数，超出部分直接丢弃
    #[serde(default = "default_max_chunks")]
    pub max_chunks: usize,

    /// 概览中最多引用的关键文件数
    #[serde(default = "default_overview_sample_limit")]
    pub overview_sample_limit: usize,

    /// 每个概览样例的最大字符数
    #[serde(default = "default_overview_sample_chars")]
    pub overview_sample_chars: usize,

    /// 重要性排序方向
    #[serde(default)]
    pub rank_order: RankOrder,
}

fn default_chunk_size() -> usize {
    4000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_max_chunks() -> usize {
    10
}

fn default_overview_sample_limit() -> usize {
    3
}

fn default_overview_sample_chars() -> usize {
    2000
}

impl Default for DocGenConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            max_chunks: default_max_chunks(),
            overview_sample_limit: default_overview_sample_limit(),
            overview_sample_chars: default_overview_sample_chars(),
            rank_order: RankOrder::default(),
        }
    }
}

/// 发送给模型的一个内容单元
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocChunk {
    pub path: String,
    pub language: String,
    pub content: String,
}

/// 模型回复中的说明性字段
///
/// 通常是一段文字，但模型也会返回对象或数组。字符串和结构化内容原样保留，
/// 数字和布尔值转为文本，null 或缺失视为空串。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TextField(pub Value);

impl TextField {
    /// 可读文本：字符串原样，结构化内容序列化
    pub fn to_text(&self) -> String {
        value_to_text(&self.0)
    }

    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }
}

impl Default for TextField {
    fn default() -> Self {
        Self(Value::String(String::new()))
    }
}

impl From<&str> for TextField {
    fn from(text: &str) -> Self {
        Self(Value::String(text.to_string()))
    }
}

impl PartialEq<&str> for TextField {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_str() == Some(*other)
    }
}

impl<'de> Deserialize<'de> for TextField {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => Self::default(),
            scalar @ (Value::Bool(_) | Value::Number(_)) => Self(Value::String(scalar.to_string())),
            other => Self(other),
        })
    }
}

/// 单个分块的组件分析
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentAnalysis {
    #[serde(default)]
    pub component_name: TextField,
    #[serde(default)]
    pub component_type: TextField,
    #[serde(default)]
    pub primary_functionality: TextField,
    #[serde(default, deserialize_with = "lenient_list")]
    pub public_interface: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub dependencies: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub data_structures: Vec<Value>,
    #[serde(default)]
    pub error_handling: TextField,
    #[serde(default)]
    pub notes: TextField,
    /// 模型额外返回的字段
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 跨组件集成分析
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationAnalysis {
    #[serde(default)]
    pub system_architecture: TextField,
    #[serde(default)]
    pub component_interactions: TextField,
    #[serde(default)]
    pub data_flow: TextField,
    #[serde(default, deserialize_with = "lenient_list")]
    pub integration_points: Vec<Value>,
    #[serde(default)]
    pub dependency_management: TextField,
    #[serde(default, deserialize_with = "lenient_list")]
    pub api_contracts: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub system_requirements: Vec<Value>,
    #[serde(default)]
    pub deployment_architecture: TextField,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IntegrationAnalysis {
    /// 解析失败时的占位结果
    pub fn placeholder() -> Self {
        Self {
            system_architecture: TextField::from(INTEGRATION_ERROR_PLACEHOLDER),
            ..Default::default()
        }
    }
}

/// 概览文档
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewDocument {
    #[serde(default)]
    pub introduction: TextField,
    #[serde(default)]
    pub architecture: TextField,
    #[serde(default, deserialize_with = "lenient_list")]
    pub technologies: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub key_components: Vec<Value>,
    #[serde(default)]
    pub data_flow: TextField,
    #[serde(default, deserialize_with = "lenient_list")]
    pub integration_points: Vec<Value>,
    #[serde(default)]
    pub development_considerations: TextField,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 规格文档元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub generated_at: String,
    pub source_code_analysis_version: String,
}

/// 规格文档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecificationDocument {
    pub components: Vec<ComponentAnalysis>,
    pub integration: IntegrationAnalysis,
    pub project_structure: DirectoryNode,
    pub technologies: LanguageHistogram,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_control: Option<GitInfo>,
    pub metadata: DocumentMetadata,
}

/// 将模型返回的 JSON 对象转换为宽松类型
///
/// 字段均有默认值和强制转换，实际上只有在输入不是对象时才会失败。
pub fn from_object<T: DeserializeOwned>(object: Map<String, Value>) -> Option<T> {
    serde_json::from_value(Value::Object(object)).ok()
}

/// 任意 JSON 值转为文本：null 为空串，字符串原样，其余序列化
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        other => vec![other],
    })
}
