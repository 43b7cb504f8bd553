//! # 数据模型模块
//!
//! 定义晶体结构和解析报告数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/` 和 `commands/` 使用
//! - 子模块: structure, report

pub mod report;
pub mod structure;

pub use report::{PwReport, RunSummary};
pub use structure::{Atom, Lattice, Structure};
