//! # check 子命令实现
//!
//! 快速检查若干 pw.x 运行是否成功结束。
//!
//! ## 功能
//! - 逐文件打印 OK/FAILED 与失败原因
//! - 任一运行失败时返回错误，使进程以非零码退出
//!
//! ## 依赖关系
//! - 使用 `cli/check.rs` 定义的参数
//! - 使用 `parsers/pwout.rs`, `utils/output.rs`

use crate::cli::check::CheckArgs;
use crate::error::{DftmanError, Result};
use crate::parsers::PwOutput;
use crate::utils::output;

/// 执行 check 命令
pub fn execute(args: CheckArgs) -> Result<()> {
    let mut failed = 0usize;

    for input in &args.inputs {
        if !input.is_file() {
            return Err(DftmanError::FileNotFound {
                path: input.display().to_string(),
            });
        }

        let pw = PwOutput::from_file(input)?;
        let (succeeded, reasons) = pw.succeeded();

        if succeeded {
            if !args.quiet {
                output::print_success(&format!("{}", input.display()));
            }
        } else {
            failed += 1;
            output::print_error(&format!("{}", input.display()));
            for reason in &reasons {
                output::print_error(&format!("  - {}", reason));
            }
        }
    }

    if failed > 0 {
        return Err(DftmanError::Other(format!(
            "{} of {} run(s) failed",
            failed,
            args.inputs.len()
        )));
    }

    if !args.quiet {
        output::print_done(&format!("All {} run(s) finished successfully", args.inputs.len()));
    }

    Ok(())
}
