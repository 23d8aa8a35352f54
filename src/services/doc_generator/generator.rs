//! 文档生成器
//!
//! 两个阶段：
//!
//! 1. 概览：直方图、关键组件和少量代码样例，一次 LLM 调用
//! 2. 规格：按重要性排序 → 分块 → 逐块组件分析 → 集成分析 → 组装
//!
//! 所有调用依次等待，调用失败直接向上传播；响应格式问题只会降级，不会中断。

use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::prompts;
use super::ranking::rank_files;
use super::recovery::parse_model_output;
use super::splitter::RecursiveTextSplitter;
use super::types::{
    from_object, ComponentAnalysis, DocChunk, DocGenConfig, DocumentMetadata, IntegrationAnalysis,
    OverviewDocument, SpecificationDocument, SOURCE_CODE_ANALYSIS_VERSION,
};
use super::writer::ArtifactWriter;
use crate::error::AppResult;
use crate::services::code_analyzer::types::CodeAnalysis;
use crate::services::llm_service::TextGenerator;
use crate::utils::Clock;

const OVERVIEW_RUN_NAME: &str = "overview_document_generation";
const INTEGRATION_RUN_NAME: &str = "integration_analysis";
const GENERATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// 组件分析阶段的结果
#[derive(Debug, Default)]
struct ComponentPass {
    /// 解析成功的组件分析
    analyses: Vec<ComponentAnalysis>,
    /// 对应的原始文本，用于集成分析 Prompt
    raw_texts: Vec<String>,
}

/// 文档生成器
pub struct DocumentGenerator<'a> {
    analysis: &'a CodeAnalysis,
    llm: &'a dyn TextGenerator,
    config: &'a DocGenConfig,
    clock: &'a dyn Clock,
    writer: &'a ArtifactWriter,
}

impl<'a> DocumentGenerator<'a> {
    /// 创建新的文档生成器
    pub fn new(
        analysis: &'a CodeAnalysis,
        llm: &'a dyn TextGenerator,
        config: &'a DocGenConfig,
        clock: &'a dyn Clock,
        writer: &'a ArtifactWriter,
    ) -> Self {
        Self {
            analysis,
            llm,
            config,
            clock,
            writer,
        }
    }

    /// 生成概览文档并立即写入
    pub async fn generate_overview_document(&self) -> AppResult<PathBuf> {
        let document = self.build_overview().await?;
        self.writer.write_overview(&document).await
    }

    /// 生成规格文档并写入
    pub async fn generate_specification_document(&self) -> AppResult<PathBuf> {
        let document = self.build_specification().await?;
        self.writer.write_specification(&document).await
    }

    /// 构建概览文档（一次 LLM 调用）
    pub async fn build_overview(&self) -> AppResult<OverviewDocument> {
        let languages = serde_json::to_string_pretty(&self.analysis.languages)?;
        let components = serde_json::to_string_pretty(&self.analysis.key_components)?;
        let code_samples = self.build_code_samples();

        let prompt = prompts::format_overview_prompt(&languages, &components, &code_samples);
        let reply = self.llm.generate(&prompt, OVERVIEW_RUN_NAME).await?;

        match parse_model_output(&reply) {
            Some(parsed) => Ok(from_object(parsed.object).unwrap_or_default()),
            None => {
                warn!("Overview reply contained no JSON object, writing an empty overview");
                Ok(OverviewDocument::default())
            }
        }
    }

    /// 关键文件的代码样例
    ///
    /// 最多取前 `overview_sample_limit` 个关键组件，每个截断到
    /// `overview_sample_chars` 个字符，截断时追加 `...`。
    pub fn build_code_samples(&self) -> String {
        let limit = self.config.overview_sample_limit;
        let max_chars = self.config.overview_sample_chars;

        self.analysis
            .key_components
            .iter()
            .take(limit)
            .filter_map(|component| self.analysis.find_file(&component.path))
            .map(|file| {
                let content = if file.content.chars().count() > max_chars {
                    let head: String = file.content.chars().take(max_chars).collect();
                    format!("{}...", head)
                } else {
                    file.content.clone()
                };
                format!(
                    "File: {}\n```{}\n{}\n```",
                    file.path,
                    file.language.to_lowercase(),
                    content
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// 构建规格文档
    pub async fn build_specification(&self) -> AppResult<SpecificationDocument> {
        let chunks = self.prepare_chunks();
        let pass = self.analyze_components(&chunks).await?;
        let integration = self.analyze_integration(&pass.raw_texts).await?;

        Ok(SpecificationDocument {
            components: pass.analyses,
            integration,
            project_structure: self.analysis.project_structure.clone(),
            technologies: self.analysis.languages.clone(),
            version_control: self.analysis.git_info.clone(),
            metadata: DocumentMetadata {
                generated_at: self.clock.now().format(GENERATED_AT_FORMAT).to_string(),
                source_code_analysis_version: SOURCE_CODE_ANALYSIS_VERSION.to_string(),
            },
        })
    }

    /// 按重要性排序文件并切分为分块
    ///
    /// 所有内容的总字符数超过分块大小时才切分，否则每个文件就是一个分块。
    pub fn prepare_chunks(&self) -> Vec<DocChunk> {
        let units: Vec<DocChunk> = rank_files(&self.analysis.files, self.config.rank_order)
            .into_iter()
            .filter(|file| !file.content.is_empty())
            .map(|file| DocChunk {
                path: file.path.clone(),
                language: file.language.clone(),
                content: file.content.clone(),
            })
            .collect();

        let total_chars: usize = units.iter().map(|u| u.content.chars().count()).sum();
        if total_chars > self.config.chunk_size {
            let splitter = RecursiveTextSplitter::new(self.config.chunk_size, self.config.chunk_overlap);
            let chunks = splitter.split_chunks(&units);
            debug!(
                "Split {} files ({} chars) into {} chunks",
                units.len(),
                total_chars,
                chunks.len()
            );
            chunks
        } else {
            units
        }
    }

    async fn analyze_components(&self, chunks: &[DocChunk]) -> AppResult<ComponentPass> {
        let selected = &chunks[..chunks.len().min(self.config.max_chunks)];
        if chunks.len() > selected.len() {
            info!(
                "Analysing the first {} of {} chunks",
                selected.len(),
                chunks.len()
            );
        }

        let mut pass = ComponentPass::default();
        for (index, chunk) in selected.iter().enumerate() {
            info!(
                "[{}/{}] Analysing component: {}",
                index + 1,
                selected.len(),
                chunk.path
            );

            let prompt = prompts::format_component_prompt(&chunk.path, &chunk.language, &chunk.content);
            let run_name = format!("component_analysis_{}", chunk.path);
            let reply = self.llm.generate(&prompt, &run_name).await?;

            match parse_model_output(&reply) {
                Some(parsed) => {
                    pass.analyses.push(from_object(parsed.object).unwrap_or_default());
                    pass.raw_texts.push(parsed.raw);
                }
                None => {
                    warn!("Could not parse JSON for component {}, skipping", chunk.path);
                }
            }
        }

        Ok(pass)
    }

    async fn analyze_integration(&self, raw_texts: &[String]) -> AppResult<IntegrationAnalysis> {
        let components = raw_texts.join("\n\n");
        let structure = serde_json::to_string_pretty(&self.analysis.project_structure)?;

        let prompt = prompts::format_integration_prompt(&components, &structure);
        let reply = self.llm.generate(&prompt, INTEGRATION_RUN_NAME).await?;

        let integration = parse_model_output(&reply)
            .and_then(|parsed| from_object::<IntegrationAnalysis>(parsed.object));

        Ok(integration.unwrap_or_else(|| {
            warn!("Could not parse JSON for integration analysis");
            IntegrationAnalysis::placeholder()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use crate::services::code_analyzer::identify_key_components;
    use crate::services::doc_generator::ArtifactFormat;
    use crate::services::code_analyzer::types::{CodeAnalysis, FileRecord};
    use crate::services::llm_service::GenerationFuture;
    use crate::utils::FixedClock;
    use chrono::NaiveDate;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// 按 run 名称返回固定回复，并记录调用顺序
    struct StubGenerator {
        calls: Mutex<Vec<String>>,
        reply: fn(&str) -> Result<String, LlmError>,
    }

    impl StubGenerator {
        fn new(reply: fn(&str) -> Result<String, LlmError>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                reply,
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl TextGenerator for StubGenerator {
        fn generate<'a>(&'a self, _prompt: &'a str, run_name: &'a str) -> GenerationFuture<'a> {
            self.calls.lock().unwrap().push(run_name.to_string());
            let result = (self.reply)(run_name);
            Box::pin(async move { result })
        }
    }

    fn well_formed(run_name: &str) -> Result<String, LlmError> {
        Ok(match run_name {
            "overview_document_generation" => "{\"introduction\": \"demo\"}".to_string(),
            "integration_analysis" => "```json\n{\"systemArchitecture\": \"layered\"}\n```".to_string(),
            other => format!(
                "```json\n{{\"componentName\": \"{}\"}}\n```",
                other.trim_start_matches("component_analysis_")
            ),
        })
    }

    fn analysis_with(files: Vec<(&str, &str)>) -> CodeAnalysis {
        let files: Vec<FileRecord> = files
            .into_iter()
            .map(|(path, content)| FileRecord {
                path: path.to_string(),
                language: "Python".to_string(),
                content: content.to_string(),
                size: content.len() as u64,
            })
            .collect();
        let key_components = identify_key_components(&files);
        CodeAnalysis {
            files,
            key_components,
            ..Default::default()
        }
    }

    fn fixed_clock() -> FixedClock {
        FixedClock(
            NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_micro_opt(3, 4, 5, 6)
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_at_most_ten_component_calls() {
        let names: Vec<String> = (0..12).map(|i| format!("mod_{:02}.py", i)).collect();
        let analysis = analysis_with(names.iter().map(|n| (n.as_str(), "x = 1")).collect());
        let stub = StubGenerator::new(well_formed);
        let config = DocGenConfig::default();
        let clock = fixed_clock();
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(dir.path());

        let generator = DocumentGenerator::new(&analysis, &stub, &config, &clock, &writer);
        let spec = generator.build_specification().await.unwrap();

        let calls = stub.calls();
        let component_calls = calls
            .iter()
            .filter(|c| c.starts_with("component_analysis_"))
            .count();
        assert_eq!(component_calls, 10);
        assert_eq!(calls.len(), 11);
        assert_eq!(calls.last().map(String::as_str), Some("integration_analysis"));
        assert_eq!(spec.components.len(), 10);
        assert_eq!(spec.integration.system_architecture, "layered");
        assert_eq!(spec.metadata.generated_at, "2024-01-02 03:04:05.000006");
        assert_eq!(spec.metadata.source_code_analysis_version, "1.0");
    }

    #[tokio::test]
    async fn test_ranking_orders_component_calls() {
        let analysis = analysis_with(vec![("main.py", "print(1)"), ("test_x.py", "pass")]);
        let stub = StubGenerator::new(well_formed);
        let config = DocGenConfig::default();
        let clock = fixed_clock();
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(dir.path());

        let generator = DocumentGenerator::new(&analysis, &stub, &config, &clock, &writer);
        generator.build_specification().await.unwrap();

        assert_eq!(
            stub.calls(),
            vec![
                "component_analysis_test_x.py",
                "component_analysis_main.py",
                "integration_analysis"
            ]
        );
    }

    #[tokio::test]
    async fn test_unparseable_chunk_dropped_and_integration_placeholder() {
        fn replies(run_name: &str) -> Result<String, LlmError> {
            Ok(match run_name {
                "component_analysis_a.py" => "I could not analyse this file.".to_string(),
                "integration_analysis" => "no structure here".to_string(),
                _ => "{\"componentName\": \"b\"}".to_string(),
            })
        }

        let analysis = analysis_with(vec![("a.py", "a = 1"), ("b.py", "b = 2")]);
        let stub = StubGenerator::new(replies);
        let config = DocGenConfig::default();
        let clock = fixed_clock();
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(dir.path());

        let generator = DocumentGenerator::new(&analysis, &stub, &config, &clock, &writer);
        let spec = generator.build_specification().await.unwrap();

        assert_eq!(spec.components.len(), 1);
        assert_eq!(spec.components[0].component_name, "b");
        assert_eq!(spec.integration, IntegrationAnalysis::placeholder());
    }

    #[tokio::test]
    async fn test_overview_without_json_is_empty() {
        fn replies(_: &str) -> Result<String, LlmError> {
            Ok("Here is a lovely overview in prose.".to_string())
        }

        let analysis = analysis_with(vec![("main.py", "print(1)")]);
        let stub = StubGenerator::new(replies);
        let config = DocGenConfig::default();
        let clock = fixed_clock();
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::with_format(dir.path(), ArtifactFormat::Json);

        let generator = DocumentGenerator::new(&analysis, &stub, &config, &clock, &writer);
        let overview = generator.build_overview().await.unwrap();
        assert_eq!(overview, OverviewDocument::default());

        // 落盘的是默认值填充的对象，而不是字面量 {}
        let path = generator.generate_overview_document().await.unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written["introduction"], "");
        assert_eq!(written["technologies"], serde_json::json!([]));
        assert_eq!(
            stub.calls(),
            vec!["overview_document_generation", "overview_document_generation"]
        );
    }

    #[tokio::test]
    async fn test_llm_failure_propagates() {
        fn replies(_: &str) -> Result<String, LlmError> {
            Err(LlmError::ApiError {
                status: 500,
                message: "upstream down".to_string(),
            })
        }

        let analysis = analysis_with(vec![("main.py", "print(1)")]);
        let stub = StubGenerator::new(replies);
        let config = DocGenConfig::default();
        let clock = fixed_clock();
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(dir.path());

        let generator = DocumentGenerator::new(&analysis, &stub, &config, &clock, &writer);
        assert!(generator.generate_specification_document().await.is_err());
        assert!(!writer.specification_path().exists());
    }

    #[test]
    fn test_code_samples_truncated() {
        let long = "a".repeat(2500);
        let analysis = analysis_with(vec![
            ("app.py", long.as_str()),
            ("core.py", "x"),
            ("index.py", "y"),
            ("main.py", "z"),
        ]);
        let stub = StubGenerator::new(well_formed);
        let config = DocGenConfig::default();
        let clock = fixed_clock();
        let writer = ArtifactWriter::new("unused");

        let generator = DocumentGenerator::new(&analysis, &stub, &config, &clock, &writer);
        let samples = generator.build_code_samples();

        assert!(samples.starts_with(&format!("File: app.py\n```python\n{}...\n```", "a".repeat(2000))));
        assert!(samples.contains("File: core.py"));
        assert!(samples.contains("File: index.py"));
        assert!(!samples.contains("File: main.py"));
    }

    #[test]
    fn test_prepare_chunks_splits_large_inputs() {
        let body = (0..400)
            .map(|i| format!("value_{} = {}", i, i))
            .collect::<Vec<_>>()
            .join("\n");
        let analysis = analysis_with(vec![("big.py", body.as_str()), ("empty.py", "")]);
        let stub = StubGenerator::new(well_formed);
        let config = DocGenConfig::default();
        let clock = fixed_clock();
        let writer = ArtifactWriter::new("unused");

        let generator = DocumentGenerator::new(&analysis, &stub, &config, &clock, &writer);
        let chunks = generator.prepare_chunks();

        assert!(body.chars().count() > config.chunk_size);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.path == "big.py"));
        assert!(chunks.iter().all(|c| c.content.chars().count() <= config.chunk_size));
    }
}
