//! 命令行参数定义

use clap::Parser;
use std::path::PathBuf;

/// `specgen` 命令行参数
#[derive(Debug, Clone, Parser)]
#[command(
    name = "specgen",
    version,
    about = "Generate overview and specification documents from source code"
)]
pub struct Cli {
    /// 源码目录
    #[arg(short, long, default_value = "source_code")]
    pub source: PathBuf,

    /// 文档输出目录
    #[arg(short, long, default_value = "generated_docs")]
    pub output: PathBuf,
}
