//! 文档生成器模块
//!
//! 基于代码分析结果调用 LLM 生成概览文档和规格文档。
//!
//! # 功能
//!
//! - 按重要性排序源文件，大输入按窗口切分
//! - 逐块组件分析与整体集成分析
//! - 从模型的自由文本回复中恢复 JSON 对象
//! - 以 JSON（或 Markdown）写出产物
//!
//! # 使用示例
//!
//! ```ignore
//! use specgen::services::doc_generator::{ArtifactWriter, DocumentGenerator};
//! use specgen::utils::SystemClock;
//!
//! let writer = ArtifactWriter::new("generated_docs");
//! let generator = DocumentGenerator::new(&analysis, &llm, &config.doc_gen, &SystemClock, &writer);
//!
//! generator.generate_overview_document().await?;
//! generator.generate_specification_document().await?;
//! ```

mod generator;
pub mod prompts;
mod ranking;
pub mod recovery;
mod splitter;
pub mod types;
mod writer;

pub use generator::DocumentGenerator;
pub use ranking::{calculate_file_importance, rank_files};
pub use recovery::{extract_json_from_text, parse_model_output, try_extract_json};
pub use splitter::RecursiveTextSplitter;
pub use types::{DocGenConfig, OverviewDocument, RankOrder, SpecificationDocument, TextField};
pub use writer::{ArtifactFormat, ArtifactWriter};
