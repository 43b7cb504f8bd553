//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `analyze`: 解析单个 pw.x 输出文件并打印报告
//! - `collect`: 批量收集并按最终能量排序
//! - `check`: 快速成败检查（供脚本使用退出码）
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: analyze, check, collect

pub mod analyze;
pub mod check;
pub mod collect;

use clap::{Parser, Subcommand};

/// DFTman - Quantum ESPRESSO pw.x 输出解析工具箱
#[derive(Parser)]
#[command(name = "dftman")]
#[command(version)]
#[command(about = "A Quantum ESPRESSO pw.x output parsing toolkit", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a single pw.x output file and print a report
    Analyze(analyze::AnalyzeArgs),

    /// Collect pw.x outputs from a directory and rank by final energy
    Collect(collect::CollectArgs),

    /// Check whether pw.x runs finished successfully (exit code 1 on failure)
    Check(check::CheckArgs),
}
