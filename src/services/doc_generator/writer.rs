//! 文档产物写入
//!
//! 默认输出格式化的 JSON；启用 `markdown-output` 特性时改为输出可读的 Markdown。
//! 写入是整文件覆盖，不做原子替换。

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use super::types::{value_to_text, OverviewDocument, SpecificationDocument, TextField};
use crate::error::{AppError, AppResult};

const OVERVIEW_STEM: &str = "overview_doc";
const SPEC_STEM: &str = "spec_doc";

/// 产物格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Json,
    Markdown,
}

impl ArtifactFormat {
    /// 构建期选择的格式
    pub fn from_build() -> Self {
        if cfg!(feature = "markdown-output") {
            Self::Markdown
        } else {
            Self::Json
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

/// 产物写入器
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    output_dir: PathBuf,
    format: ArtifactFormat,
}

impl ArtifactWriter {
    /// 使用构建期格式创建写入器
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self::with_format(output_dir, ArtifactFormat::from_build())
    }

    pub fn with_format(output_dir: impl Into<PathBuf>, format: ArtifactFormat) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
        }
    }

    /// 概览文档路径
    pub fn overview_path(&self) -> PathBuf {
        self.artifact_path(OVERVIEW_STEM)
    }

    /// 规格文档路径
    pub fn specification_path(&self) -> PathBuf {
        self.artifact_path(SPEC_STEM)
    }

    fn artifact_path(&self, stem: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", stem, self.format.extension()))
    }

    /// 确保输出目录存在
    pub async fn ensure_output_dir(&self) -> AppResult<()> {
        fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| AppError::Io(self.output_dir.clone(), e))
    }

    /// 写入概览文档
    pub async fn write_overview(&self, doc: &OverviewDocument) -> AppResult<PathBuf> {
        let contents = match self.format {
            ArtifactFormat::Json => to_pretty_json(doc)?,
            ArtifactFormat::Markdown => render_overview_markdown(doc),
        };
        let path = self.overview_path();
        self.write(&path, contents).await?;
        Ok(path)
    }

    /// 写入规格文档
    pub async fn write_specification(&self, doc: &SpecificationDocument) -> AppResult<PathBuf> {
        let contents = match self.format {
            ArtifactFormat::Json => to_pretty_json(doc)?,
            ArtifactFormat::Markdown => render_specification_markdown(doc)?,
        };
        let path = self.specification_path();
        self.write(&path, contents).await?;
        Ok(path)
    }

    async fn write(&self, path: &Path, contents: String) -> AppResult<()> {
        self.ensure_output_dir().await?;
        fs::write(path, contents)
            .await
            .map_err(|e| AppError::Io(path.to_path_buf(), e))?;
        info!("Artifact written: {}", path.display());
        Ok(())
    }
}

fn to_pretty_json<T: Serialize>(value: &T) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// 渲染概览文档为 Markdown
pub fn render_overview_markdown(doc: &OverviewDocument) -> String {
    let mut out = String::from("# Software Overview\n");

    push_text_section(&mut out, "Introduction and Purpose", &doc.introduction);
    push_text_section(&mut out, "System Architecture", &doc.architecture);
    push_list_section(&mut out, "Technologies Used", &doc.technologies);
    push_list_section(&mut out, "Key Components", &doc.key_components);
    push_text_section(&mut out, "Data Flow", &doc.data_flow);
    push_list_section(&mut out, "Integration Points", &doc.integration_points);
    push_text_section(
        &mut out,
        "Development and Deployment Considerations",
        &doc.development_considerations,
    );
    push_extra_sections(&mut out, "##", &doc.extra);

    out
}

/// 渲染规格文档为 Markdown
pub fn render_specification_markdown(doc: &SpecificationDocument) -> AppResult<String> {
    let mut out = String::from("# Software Specification\n");
    let _ = writeln!(
        out,
        "\n_Generated at {} (analysis version {})_",
        doc.metadata.generated_at, doc.metadata.source_code_analysis_version
    );

    out.push_str("\n## Technologies\n\n");
    if doc.technologies.is_empty() {
        out.push_str("_None detected._\n");
    }
    for (language, count) in &doc.technologies {
        let _ = writeln!(out, "- {}: {} file(s)", language, count);
    }

    out.push_str("\n## Components\n");
    if doc.components.is_empty() {
        out.push_str("\n_No components analysed._\n");
    }
    for (index, component) in doc.components.iter().enumerate() {
        let title = if component.component_name.is_empty() {
            format!("Component {}", index + 1)
        } else {
            component.component_name.to_text()
        };
        let _ = writeln!(out, "\n### {}", title);
        if !component.component_type.is_empty() {
            let _ = writeln!(out, "\n**Type:** {}", component.component_type.to_text());
        }
        push_text_block(&mut out, "Primary Functionality", &component.primary_functionality);
        push_list_block(&mut out, "Public Interface", &component.public_interface);
        push_list_block(&mut out, "Dependencies", &component.dependencies);
        push_list_block(&mut out, "Data Structures", &component.data_structures);
        push_text_block(&mut out, "Error Handling", &component.error_handling);
        push_text_block(&mut out, "Notes", &component.notes);
        push_extra_sections(&mut out, "####", &component.extra);
    }

    let integration = &doc.integration;
    out.push_str("\n## Integration\n");
    push_text_block(&mut out, "System Architecture", &integration.system_architecture);
    push_text_block(&mut out, "Component Interactions", &integration.component_interactions);
    push_text_block(&mut out, "Data Flow", &integration.data_flow);
    push_list_block(&mut out, "Integration Points", &integration.integration_points);
    push_text_block(&mut out, "Dependency Management", &integration.dependency_management);
    push_list_block(&mut out, "API Contracts", &integration.api_contracts);
    push_list_block(&mut out, "System Requirements", &integration.system_requirements);
    push_text_block(&mut out, "Deployment Architecture", &integration.deployment_architecture);
    push_extra_sections(&mut out, "###", &integration.extra);

    out.push_str("\n## Project Structure\n\n```json\n");
    out.push_str(&serde_json::to_string_pretty(&doc.project_structure)?);
    out.push_str("\n```\n");

    if let Some(git) = &doc.version_control {
        let _ = writeln!(out, "\n## Version Control\n\n**Branch:** {}\n", git.active_branch);
        for commit in &git.recent_commits {
            let short: String = commit.hash.chars().take(8).collect();
            let _ = writeln!(
                out,
                "- `{}` {} ({}, {})",
                short, commit.message, commit.author, commit.date
            );
        }
    }

    Ok(out)
}

fn push_text_section(out: &mut String, title: &str, text: &TextField) {
    if !text.is_empty() {
        let _ = writeln!(out, "\n## {}\n\n{}", title, text.to_text());
    }
}

fn push_list_section(out: &mut String, title: &str, items: &[Value]) {
    if !items.is_empty() {
        let _ = writeln!(out, "\n## {}\n", title);
        push_items(out, items);
    }
}

fn push_text_block(out: &mut String, label: &str, text: &TextField) {
    if !text.is_empty() {
        let _ = writeln!(out, "\n**{}:** {}", label, text.to_text());
    }
}

fn push_list_block(out: &mut String, label: &str, items: &[Value]) {
    if !items.is_empty() {
        let _ = writeln!(out, "\n**{}:**\n", label);
        push_items(out, items);
    }
}

fn push_items(out: &mut String, items: &[Value]) {
    for item in items {
        let _ = writeln!(out, "- {}", value_to_text(item));
    }
}

fn push_extra_sections(out: &mut String, heading: &str, extra: &Map<String, Value>) {
    for (key, value) in extra {
        let _ = writeln!(out, "\n{} {}\n\n{}", heading, key, value_to_text(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::code_analyzer::types::DirectoryNode;
    use crate::services::doc_generator::types::{
        ComponentAnalysis, DocumentMetadata, IntegrationAnalysis,
    };
    use serde_json::json;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn sample_spec() -> SpecificationDocument {
        SpecificationDocument {
            components: vec![ComponentAnalysis {
                component_name: TextField::from("parser"),
                error_handling: TextField(json!({"strategy": "retry"})),
                dependencies: vec![json!("serde")],
                ..Default::default()
            }],
            integration: IntegrationAnalysis::placeholder(),
            project_structure: DirectoryNode::default(),
            technologies: BTreeMap::from([("Python".to_string(), 2)]),
            version_control: None,
            metadata: DocumentMetadata {
                generated_at: "2024-01-02 03:04:05.000006".to_string(),
                source_code_analysis_version: "1.0".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_json_artifacts_created_in_new_dir() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::with_format(dir.path().join("out/docs"), ArtifactFormat::Json);

        let overview = writer.write_overview(&OverviewDocument::default()).await.unwrap();
        let spec = writer.write_specification(&sample_spec()).await.unwrap();

        assert!(overview.ends_with("overview_doc.json"));
        assert!(spec.ends_with("spec_doc.json"));

        let value: Value = serde_json::from_str(&std::fs::read_to_string(&spec).unwrap()).unwrap();
        assert_eq!(value["metadata"]["sourceCodeAnalysisVersion"], "1.0");
        assert_eq!(value["technologies"]["Python"], 2);
        assert_eq!(value["integration"]["systemArchitecture"], "Error parsing integration analysis");
        assert!(value.get("versionControl").is_none());
    }

    #[tokio::test]
    async fn test_existing_artifact_overwritten() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::with_format(dir.path(), ArtifactFormat::Json);
        std::fs::write(writer.overview_path(), "stale").unwrap();

        writer.write_overview(&OverviewDocument::default()).await.unwrap();

        let text = std::fs::read_to_string(writer.overview_path()).unwrap();
        assert!(text.starts_with('{'));
        assert!(text.contains("\"introduction\": \"\""));
    }

    #[tokio::test]
    async fn test_markdown_artifacts() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::with_format(dir.path(), ArtifactFormat::Markdown);

        let spec = writer.write_specification(&sample_spec()).await.unwrap();
        assert!(spec.ends_with("spec_doc.md"));

        let text = std::fs::read_to_string(spec).unwrap();
        assert!(text.starts_with("# Software Specification"));
        assert!(text.contains("### parser"));
        assert!(text.contains("- serde"));
        assert!(text.contains(r#"**Error Handling:** {"strategy":"retry"}"#));
        assert!(text.contains("- Python: 2 file(s)"));
    }

    #[test]
    fn test_overview_markdown_keeps_extra_fields() {
        let mut doc = OverviewDocument {
            introduction: TextField::from("A tool."),
            ..Default::default()
        };
        doc.extra.insert("license".to_string(), json!("MIT"));

        let text = render_overview_markdown(&doc);
        assert!(text.contains("## Introduction and Purpose\n\nA tool."));
        assert!(text.contains("## license\n\nMIT"));
        assert!(!text.contains("## System Architecture"));
    }

    #[test]
    fn test_build_format() {
        let expected = if cfg!(feature = "markdown-output") { "md" } else { "json" };
        assert_eq!(ArtifactFormat::from_build().extension(), expected);
    }
}
