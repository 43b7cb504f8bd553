//! # DFTman - Quantum ESPRESSO pw.x 输出解析工具箱
//!
//! 将 pw.x 标准输出解析为结构化数据：能量、应力、结构序列与
//! 成败判定，统一成单一可执行文件。
//!
//! ## 子命令
//! - `analyze` - 解析单个输出文件并打印报告（可导出 JSON）
//! - `collect` - 批量收集输出并按最终能量排序（CSV 汇总）
//! - `check`   - 快速成败检查（退出码供脚本使用）
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── parsers/   (pw.x 输出解析器)
//!   │     ├── models/    (结构与报告数据模型)
//!   │     └── batch/     (批量收集与并行解析)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod error;
mod models;
mod parsers;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
