//! # 解析报告与汇总行
//!
//! `PwReport` 是 `PwOutput` 的持久化形态：只保留来源路径与提取序列，
//! 不保留原始文本，所有派生量都能从序列重建。`RunSummary` 是表格
//! 与 CSV 导出用的扁平行。
//!
//! ## 依赖关系
//! - 被 `commands/analyze.rs`、`commands/collect.rs` 使用
//! - 使用 `parsers/pwout.rs`

use crate::parsers::pwout::{ExtractionResult, PwOutput};

use serde::{Deserialize, Serialize};

/// 一次运行的完整解析结果，JSON 可序列化
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PwReport {
    pub path: Option<String>,
    pub quantities: ExtractionResult,
}

impl PwReport {
    pub fn from_output(output: &PwOutput) -> Self {
        PwReport {
            path: output.path.clone(),
            quantities: output.quantities.clone(),
        }
    }

    /// 重建访问器视图
    pub fn into_output(self) -> PwOutput {
        PwOutput::from_quantities(self.path, self.quantities)
    }
}

/// 批量汇总的一行（原始数值，表格渲染前再格式化）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub file: String,
    pub succeeded: bool,
    pub failure_reasons: Vec<String>,
    pub final_energy_ev: Option<f64>,
    pub fermi_energy_ev: Option<f64>,
    pub pressure_gpa: Option<f64>,
    pub total_force: Option<f64>,
    pub n_atoms: Option<i64>,
    pub formula: String,
    pub volume_a3: Option<f64>,
    pub walltime_s: Option<f64>,
    pub n_structures: usize,
}

impl RunSummary {
    pub fn from_output(output: &PwOutput) -> Self {
        let (succeeded, failure_reasons) = output.succeeded();
        let structures = output.structures();
        let formula = output
            .initial_structure()
            .map_or_else(|| "-".to_string(), |s| s.formula());
        RunSummary {
            file: output.path.clone().unwrap_or_else(|| "<stdin>".to_string()),
            succeeded,
            failure_reasons,
            final_energy_ev: output.final_energy_ev().map(|(e, _)| e),
            fermi_energy_ev: output.fermi_energy_ev(),
            pressure_gpa: output.final_pressure_gpa(),
            total_force: output.total_force(),
            n_atoms: output.n_atoms(),
            formula,
            volume_a3: output.final_structure().map(|s| s.lattice.volume()),
            walltime_s: output.walltime_seconds(),
            n_structures: structures.len(),
        }
    }
}
