//! # 解析器模块
//!
//! pw.x 标准输出的两套解析引擎：
//! - `patterns` / `pwout`：正则模式表 + 单遍提取 + 派生量访问器
//! - `scanner`：逐行状态机（历史行为兼容，包括空行截断的块约定）
//!
//! ## 依赖关系
//! - 被 `commands/`、`batch/`、`models/report.rs` 使用

pub mod patterns;
pub mod pwout;
pub mod scanner;

pub use pwout::PwOutput;
pub use scanner::LineScanner;
