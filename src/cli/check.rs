//! # check 子命令 CLI 定义
//!
//! 逐个检查 pw.x 运行是否成功结束，供脚本通过退出码判断。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/check.rs`

use clap::Args;
use std::path::PathBuf;

/// check 子命令参数
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// pw.x output files to check
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Only print failed runs
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,
}
