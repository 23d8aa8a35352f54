//! 模型输出的结构化数据恢复
//!
//! 模型经常把 JSON 包在 Markdown 代码块里，或在前后加上说明文字。
//! 这里按固定顺序尝试提取，每个候选都要重新解析为 JSON 对象才算成功：
//!
//! 1. ```` ```json ```` 代码块的内容
//! 2. 任意代码块的内容（跳过可选的语言标记）
//! 3. 从第一个后接 `"key":` 的 `{` 到最后一个 `}` 之间的文本

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

static JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("valid json fence regex"));

static ANY_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_+-]*[ \t]*\r?\n?(.*?)\s*```").expect("valid fence regex")
});

static OBJECT_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)\{\s*"[^"]+"\s*:.*\}"#).expect("valid object span regex"));

/// 解析成功的模型输出
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOutput {
    /// 解析得到的 JSON 对象
    pub object: Map<String, Value>,
    /// 对应的原始文本：严格解析成功时为整段回复，否则为提取出的片段
    pub raw: String,
}

/// 解析模型回复：先整段严格解析，失败再走恢复流程
pub fn parse_model_output(text: &str) -> Option<ParsedOutput> {
    if let Some(object) = parse_object(text) {
        return Some(ParsedOutput {
            object,
            raw: text.to_string(),
        });
    }

    try_extract_json(text).map(|(object, raw)| ParsedOutput { object, raw })
}

/// 从文本中提取 JSON 对象，同时返回被解析的片段；全部失败时返回 None
pub fn try_extract_json(text: &str) -> Option<(Map<String, Value>, String)> {
    let fenced_json = JSON_FENCE
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()));
    let fenced_any = ANY_FENCE
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()));
    let span = OBJECT_SPAN.find(text).map(|m| m.as_str());

    let found = fenced_json
        .chain(fenced_any)
        .chain(span)
        .find_map(|candidate| parse_object(candidate).map(|object| (object, candidate.to_string())));

    if found.is_none() {
        debug!("No JSON object recovered from model output");
    }
    found
}

/// 从文本中提取 JSON 对象，全部失败时返回空对象
pub fn extract_json_from_text(text: &str) -> Map<String, Value> {
    try_extract_json(text)
        .map(|(object, _)| object)
        .unwrap_or_default()
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}
