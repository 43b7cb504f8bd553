//! # collect 子命令 CLI 定义
//!
//! 批量收集 pw.x 输出并按最终能量排序。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/collect.rs`

use clap::Args;
use std::path::PathBuf;

/// collect 子命令参数
#[derive(Args, Debug)]
pub struct CollectArgs {
    /// Path to the directory containing pw.x output files
    pub dir: PathBuf,

    /// Glob pattern for output files (comma separated, e.g., "*.out,pw.*.log")
    #[arg(long, default_value = "*.out")]
    pub pattern: String,

    /// Recurse into subdirectories
    #[arg(long, default_value_t = false)]
    pub recursive: bool,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Number of top runs to print in the ranking table
    #[arg(long, default_value_t = 10)]
    pub top_n: usize,

    /// Filename for the full CSV summary
    #[arg(long, default_value = "pw_summary.csv")]
    pub output_csv: PathBuf,

    /// Directory for per-run JSON reports (skipped if not given)
    #[arg(long)]
    pub json_dir: Option<PathBuf>,
}
