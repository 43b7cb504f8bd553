//! # analyze 子命令 CLI 定义
//!
//! 解析单个 pw.x 输出文件，打印摘要表格，可选导出 JSON 报告。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/analyze.rs`

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 解析引擎
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum ParseEngine {
    /// Regex pattern table (full quantity extraction)
    #[default]
    Regex,
    /// Line scanner (legacy block-based extraction)
    Lines,
}

impl std::fmt::Display for ParseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseEngine::Regex => write!(f, "regex"),
            ParseEngine::Lines => write!(f, "lines"),
        }
    }
}

/// analyze 子命令参数
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Path to the pw.x output file
    pub input: PathBuf,

    /// Parse engine to use
    #[arg(long, value_enum, default_value_t = ParseEngine::Regex)]
    pub engine: ParseEngine,

    /// Write the full extraction report as JSON (regex engine only)
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Print every intermediate structure, not just initial/final
    #[arg(long, default_value_t = false)]
    pub structures: bool,
}
