//! LLM 服务封装
//!
//! 封装 LlmClient，与配置和调用追踪集成。文档生成器只依赖 [`TextGenerator`]，
//! 测试中可以换成确定性的实现。

use std::future::Future;
use std::pin::Pin;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::llm::{truncate_for_log, ChatMessage, ChatOptions, LlmClient, LlmError};
use crate::utils::RunTracer;

/// 文本生成的返回 future（装箱以保持 trait 可作为 dyn 使用）
pub type GenerationFuture<'a> = Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>>;

/// 文本生成接口：一个 Prompt 进，一段完整文本出
pub trait TextGenerator: Send + Sync {
    /// 生成文本，`run_name` 用于日志和调用追踪
    fn generate<'a>(&'a self, prompt: &'a str, run_name: &'a str) -> GenerationFuture<'a>;
}

/// LLM 服务
pub struct LlmService {
    client: LlmClient,
    model: String,
    options: ChatOptions,
    tracer: RunTracer,
}

impl LlmService {
    /// 根据配置创建 LLM 服务
    pub fn new(config: &AppConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::ConfigError(
                "API Key not configured. Set SPECGEN_API_KEY or GOOGLE_API_KEY.".to_string(),
            ));
        }

        let client = LlmClient::new(&config.api_key, config.effective_base_url())?;

        Ok(Self {
            client,
            model: config.model.clone(),
            options: ChatOptions {
                temperature: Some(config.temperature),
                max_tokens: Some(config.max_tokens),
            },
            tracer: RunTracer::new(config.tracing.clone()),
        })
    }

    /// 当前模型
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, run_name: &str) -> Result<String, LlmError> {
        let record = self.tracer.start_run(run_name, prompt);
        let start_time = Instant::now();

        let result = self
            .client
            .stream_and_collect(vec![ChatMessage::user(prompt)], &self.model, self.options.clone())
            .await;

        match result {
            Ok(collected) => {
                info!(
                    "LLM call {} finished in {}ms: {} chunks, {} chars, finish_reason={:?}",
                    run_name,
                    start_time.elapsed().as_millis(),
                    collected.chunk_count,
                    collected.content.chars().count(),
                    collected.finish_reason
                );
                debug!("LLM call {} preview: {}", run_name, truncate_for_log(&collected.content, 300));
                self.tracer.finish_success(record, &collected.content).await;
                Ok(collected.content)
            }
            Err(e) => {
                self.tracer.finish_error(record, &e.to_string()).await;
                Err(e)
            }
        }
    }
}

impl TextGenerator for LlmService {
    fn generate<'a>(&'a self, prompt: &'a str, run_name: &'a str) -> GenerationFuture<'a> {
        Box::pin(self.complete(prompt, run_name))
    }
}
