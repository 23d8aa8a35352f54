//! 服务层模块

pub mod code_analyzer;
pub mod doc_generator;
pub mod llm_service;

pub use code_analyzer::CodeAnalyzer;
pub use doc_generator::DocumentGenerator;
pub use llm_service::{LlmService, TextGenerator};
