//! specgen：从源码目录生成概览文档和规格文档
//!
//! 流程：扫描源码 → 构建聚合分析对象 → 调用 LLM 生成文档 → 写出产物。

pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod services;
pub mod utils;

use std::path::{Path, PathBuf};
use tracing::info;

use cli::Cli;
use config::AppConfig;
use error::AppResult;
use services::doc_generator::{ArtifactWriter, DocGenConfig, DocumentGenerator};
use services::{CodeAnalyzer, LlmService, TextGenerator};
use utils::{Clock, SystemClock};

/// 一次运行写出的产物路径
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifacts {
    pub overview: PathBuf,
    pub specification: PathBuf,
}

/// 使用真实 LLM 服务和系统时钟执行一次完整运行
pub async fn run(cli: &Cli, config: &AppConfig) -> AppResult<GeneratedArtifacts> {
    let llm = LlmService::new(config)?;
    info!("Using model {} ({:?})", config.model, config.api_format());

    generate_documents(&cli.source, &cli.output, &config.doc_gen, &llm, &SystemClock).await
}

/// 分析源码目录并生成两份文档
///
/// 概览文档写出后才开始规格阶段；规格阶段失败时概览文档保留。
pub async fn generate_documents(
    source: &Path,
    output: &Path,
    doc_gen: &DocGenConfig,
    llm: &dyn TextGenerator,
    clock: &dyn Clock,
) -> AppResult<GeneratedArtifacts> {
    let writer = ArtifactWriter::new(output);
    writer.ensure_output_dir().await?;

    let analysis = CodeAnalyzer::new(source).analyze();

    let generator = DocumentGenerator::new(&analysis, llm, doc_gen, clock, &writer);
    let overview = generator.generate_overview_document().await?;
    let specification = generator.generate_specification_document().await?;

    Ok(GeneratedArtifacts {
        overview,
        specification,
    })
}
