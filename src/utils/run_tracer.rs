//! LLM 调用追踪
//!
//! 每次模型调用结束后向 LangSmith 上报一条 run 记录，便于调试和分析。
//! 未配置密钥时所有操作都是空操作；上报失败只记录警告，不影响生成流程。

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::TraceConfig;
use crate::llm::truncate_for_log;

/// 单次调用的追踪记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    /// run ID
    pub id: String,
    /// run 名称
    pub name: String,
    /// 固定为 `llm`
    pub run_type: String,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// 输入 Prompt
    pub prompt: String,
    /// 模型输出
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// 错误信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunRecord {
    /// 上报请求体
    fn to_payload(&self, project: &str) -> serde_json::Value {
        json!({
            "id": self.id,
            "name": self.name,
            "run_type": self.run_type,
            "inputs": { "prompt": self.prompt },
            "outputs": { "text": self.output.clone().unwrap_or_default() },
            "start_time": self.start_time.to_rfc3339(),
            "end_time": self.end_time.map(|t| t.to_rfc3339()),
            "session_name": project,
            "error": self.error,
        })
    }
}

/// 调用追踪器
pub struct RunTracer {
    client: Client,
    config: Option<TraceConfig>,
}

impl RunTracer {
    /// 创建追踪器，`config` 为 None 时不上报
    pub fn new(config: Option<TraceConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// 空追踪器
    pub fn disabled() -> Self {
        Self::new(None)
    }

    /// API 密钥脱敏
    pub fn mask_api_key(api_key: &str) -> String {
        let chars: Vec<char> = api_key.chars().collect();
        if chars.len() <= 8 {
            "*".repeat(chars.len())
        } else {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{}...{}", head, tail)
        }
    }

    /// 记录调用开始
    pub fn start_run(&self, name: &str, prompt: &str) -> RunRecord {
        RunRecord {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            run_type: "llm".to_string(),
            start_time: Utc::now(),
            end_time: None,
            prompt: prompt.to_string(),
            output: None,
            error: None,
        }
    }

    /// 记录成功并上报
    pub async fn finish_success(&self, mut record: RunRecord, output: &str) {
        record.end_time = Some(Utc::now());
        record.output = Some(output.to_string());
        self.export(&record).await;
    }

    /// 记录失败并上报
    pub async fn finish_error(&self, mut record: RunRecord, error: &str) {
        record.end_time = Some(Utc::now());
        record.error = Some(truncate_for_log(error, 500));
        self.export(&record).await;
    }

    /// 上报记录
    async fn export(&self, record: &RunRecord) {
        let Some(config) = &self.config else {
            return;
        };

        let url = format!("{}/runs", config.endpoint.trim_end_matches('/'));
        debug!(
            "Exporting run {} ({}) to {} with key {}",
            record.name,
            record.id,
            url,
            Self::mask_api_key(&config.api_key)
        );

        let result = self
            .client
            .post(&url)
            .header("x-api-key", &config.api_key)
            .json(&record.to_payload(&config.project))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                warn!("Run export for {} rejected: HTTP {}", record.name, response.status());
            }
            Err(e) => {
                warn!("Run export for {} failed: {}", record.name, e);
            }
        }
    }
}
