//! # pw.x 输出提取引擎与派生量访问器
//!
//! 将整段标准输出按模式表做单遍正则扫描，累积出按物理量名称索引、
//! 保持文档出现顺序的值序列；再由纯函数访问器派生出调用方真正
//! 需要的量（最终能量、结构序列、成败判定等）。
//!
//! ## 依赖关系
//! - 被 `commands/` 与 `models/report.rs` 使用
//! - 使用 `parsers/patterns.rs` 的模式表
//! - 使用 `models/structure.rs`

use crate::error::{DftmanError, Result};
use crate::models::{Lattice, Structure};
use crate::parsers::patterns::{pattern_table, ForceRecord, StressTensor, Value};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// 1 Ry = 13.6056917253 eV
pub const EV_PER_RY: f64 = 13.6056917253;
/// 1 bohr = 0.52917720859 Å
pub const A_PER_BOHR: f64 = 0.52917720859;
/// 1 bohr³ (Å³)
pub const A3_PER_BOHR3: f64 = A_PER_BOHR * A_PER_BOHR * A_PER_BOHR;
/// 10 kbar = 1 GPa
pub const GPA_PER_KBAR: f64 = 0.1;

// ─────────────────────────────────────────────────────────────
// 提取结果
// ─────────────────────────────────────────────────────────────

/// 每个声明过的物理量名称到其值序列的映射。
/// 零次匹配对应空序列而不是缺失键；解析完成后不再变更。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    quantities: BTreeMap<String, Vec<Value>>,
}

impl ExtractionResult {
    /// 某个物理量的全部出现（文档顺序）
    pub fn sequence(&self, name: &str) -> &[Value] {
        self.quantities.get(name).map_or(&[], |v| v.as_slice())
    }

    /// 首次出现
    pub fn first(&self, name: &str) -> Option<&Value> {
        self.sequence(name).first()
    }

    /// 最后一次出现
    pub fn last(&self, name: &str) -> Option<&Value> {
        self.sequence(name).last()
    }

    /// 该物理量是否至少出现一次
    pub fn has(&self, name: &str) -> bool {
        !self.sequence(name).is_empty()
    }
}

/// 对整段文本应用模式表。
/// 每个模式做一次全文非重叠扫描，后处理失败带物理量名称上抛。
pub fn extract(text: &str) -> Result<ExtractionResult> {
    let mut quantities = BTreeMap::new();
    for spec in pattern_table() {
        let mut values = Vec::new();
        for caps in spec.regex.captures_iter(text) {
            let value = (spec.post)(&caps).map_err(|reason| DftmanError::MalformedCapture {
                quantity: spec.name,
                raw: caps.get(0).map_or(String::new(), |m| m.as_str().to_string()),
                reason,
            })?;
            values.push(value);
        }
        quantities.insert(spec.name.to_string(), values);
    }
    Ok(ExtractionResult { quantities })
}

// ─────────────────────────────────────────────────────────────
// 派生量访问器
// ─────────────────────────────────────────────────────────────

/// final_energy 取值来源标记：两个不同的输出行都可能给出最终能量，
/// 暴露实际使用的来源以便排查数值差异
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnergySource {
    /// "Final energy              =  ... Ry" 行
    FinalEnergyLine,
    /// "!    total energy         =  ... Ry" 行
    TotalEnergyLine,
}

impl std::fmt::Display for EnergySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnergySource::FinalEnergyLine => write!(f, "Final energy line"),
            EnergySource::TotalEnergyLine => write!(f, "total energy line"),
        }
    }
}

/// 一次 pw.x 运行的解析结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PwOutput {
    /// 来源文件路径（仅作记录，不再回读）
    pub path: Option<String>,
    /// 原始提取序列
    pub quantities: ExtractionResult,
}

impl PwOutput {
    /// 解析一段已经读入内存的输出文本
    pub fn from_text(text: &str) -> Result<Self> {
        Ok(PwOutput {
            path: None,
            quantities: extract(text)?,
        })
    }

    /// 读取并解析输出文件
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| DftmanError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(PwOutput {
            path: Some(path.display().to_string()),
            quantities: extract(&text)?,
        })
    }

    /// 从持久化的提取序列重建（不需要原始文本）
    pub fn from_quantities(path: Option<String>, quantities: ExtractionResult) -> Self {
        PwOutput { path, quantities }
    }

    fn last_f64(&self, name: &str) -> Option<f64> {
        self.quantities.last(name).and_then(Value::as_f64)
    }

    fn first_f64(&self, name: &str) -> Option<f64> {
        self.quantities.first(name).and_then(Value::as_f64)
    }

    // ── 能量（eV）────────────────────────────────────────────

    /// 全部 SCF 能量（eV，文档顺序）
    pub fn energies_ev(&self) -> Vec<f64> {
        self.quantities
            .sequence("energy")
            .iter()
            .filter_map(Value::as_f64)
            .map(|ry| ry * EV_PER_RY)
            .collect()
    }

    /// 最终能量（eV）及其来源行。
    /// "Final energy" 行优先，否则回退到最后一个 "!– total energy" 行。
    pub fn final_energy_ev(&self) -> Option<(f64, EnergySource)> {
        if let Some(ry) = self.last_f64("final_energy_marker") {
            return Some((ry * EV_PER_RY, EnergySource::FinalEnergyLine));
        }
        self.last_f64("final_energy")
            .map(|ry| (ry * EV_PER_RY, EnergySource::TotalEnergyLine))
    }

    /// 最后一个 "!    total energy" 行（eV）
    pub fn final_total_energy_ev(&self) -> Option<f64> {
        self.last_f64("final_energy").map(|ry| ry * EV_PER_RY)
    }

    /// 第一个 "!    total energy" 行（eV）
    pub fn initial_total_energy_ev(&self) -> Option<f64> {
        self.first_f64("final_energy").map(|ry| ry * EV_PER_RY)
    }

    /// 最终焓（eV）："Final enthalpy" 行优先，否则取最后一个 "enthalpy new"
    pub fn final_enthalpy_ev(&self) -> Option<f64> {
        self.last_f64("final_enthalpy")
            .or_else(|| self.last_f64("enthalpy"))
            .map(|ry| ry * EV_PER_RY)
    }

    /// 费米能（输出本身即 eV）
    pub fn fermi_energy_ev(&self) -> Option<f64> {
        self.last_f64("fermi_energy")
    }

    // ── 磁化 / 受力 ──────────────────────────────────────────

    pub fn total_magnetization(&self) -> Option<f64> {
        self.last_f64("total_magnetization")
    }

    pub fn absolute_magnetization(&self) -> Option<f64> {
        self.last_f64("absolute_magnetization")
    }

    /// 总受力（Ry/au，原始单位）
    pub fn total_force(&self) -> Option<f64> {
        self.last_f64("total_force")
    }

    /// 逐原子受力记录（Ry/au，文档顺序）
    pub fn forces(&self) -> Vec<&ForceRecord> {
        self.quantities
            .sequence("force")
            .iter()
            .filter_map(|v| match v {
                Value::Force(record) => Some(record),
                _ => None,
            })
            .collect()
    }

    // ── 压力 / 应力 ──────────────────────────────────────────

    /// 初始压力（GPa）
    pub fn initial_pressure_gpa(&self) -> Option<f64> {
        self.first_f64("total_stress").map(|kbar| kbar * GPA_PER_KBAR)
    }

    /// 最终压力（GPa）
    pub fn final_pressure_gpa(&self) -> Option<f64> {
        self.last_f64("total_stress").map(|kbar| kbar * GPA_PER_KBAR)
    }

    fn last_stress(&self) -> Option<&StressTensor> {
        self.quantities.last("stress").and_then(Value::as_stress)
    }

    /// 最终应力张量（GPa，kbar 列 ÷ 10）
    pub fn final_stress_gpa(&self) -> Option<Vec<Vec<f64>>> {
        self.last_stress().map(|t| {
            t.kbar
                .iter()
                .map(|row| row.iter().map(|x| x * GPA_PER_KBAR).collect())
                .collect()
        })
    }

    /// 最终应力张量（eV/Å³，Ry/bohr³ 列换算）
    pub fn final_stress_ev_a3(&self) -> Option<Vec<Vec<f64>>> {
        self.last_stress().map(|t| {
            t.ry_bohr3
                .iter()
                .map(|row| row.iter().map(|x| x * EV_PER_RY / A3_PER_BOHR3).collect())
                .collect()
        })
    }

    // ── 模拟参数 ────────────────────────────────────────────

    pub fn n_atoms(&self) -> Option<i64> {
        self.quantities.first("nat").and_then(Value::as_i64)
    }

    pub fn n_species(&self) -> Option<i64> {
        self.quantities.first("ntype").and_then(Value::as_i64)
    }

    pub fn n_kpoints(&self) -> Option<i64> {
        self.quantities.first("nkpts").and_then(Value::as_i64)
    }

    /// 晶格常数 alat（bohr）
    pub fn alat_bohr(&self) -> Option<f64> {
        self.first_f64("lattice_parameter")
    }

    /// 初始晶胞体积（Å³，bohr³ 换算）
    pub fn initial_volume_a3(&self) -> Option<f64> {
        self.first_f64("unit_cell_volume").map(|v| v * A3_PER_BOHR3)
    }

    /// 终行统计的墙钟时间（秒）
    pub fn walltime_seconds(&self) -> Option<f64> {
        self.last_f64("walltime")
    }

    // ── 结构序列 ────────────────────────────────────────────

    /// 按时间顺序重建全部结构：
    /// 先是 SCF 阶段（a(1..3) × alat 的固定晶格 + 初始分数坐标），
    /// 再是弛豫阶段（逐个 CELL_PARAMETERS 块与 ATOMIC_POSITIONS 块配对）。
    /// 某一步缺少配对一侧时跳过该步，不报错也不补零。
    pub fn structures(&self) -> Vec<Structure> {
        let mut structures = self.scf_structures();
        structures.extend(self.relax_structures());
        structures
    }

    fn scf_structures(&self) -> Vec<Structure> {
        let a1 = self.quantities.sequence("a1");
        let a2 = self.quantities.sequence("a2");
        let a3 = self.quantities.sequence("a3");
        let positions = self.quantities.sequence("initial_atomic_positions_frac");
        let alats = self.quantities.sequence("lattice_parameter");

        let steps = a1.len().min(a2.len()).min(a3.len()).min(positions.len());
        let mut structures = Vec::new();
        for i in 0..steps {
            // alat 一般只打印一次；后续步骤沿用最近的值
            let alat = alats
                .get(i)
                .or_else(|| alats.last())
                .and_then(Value::as_f64);
            let rows = [
                a1[i].as_vector(),
                a2[i].as_vector(),
                a3[i].as_vector(),
            ];
            let (Some(alat), [Some(r1), Some(r2), Some(r3)]) = (alat, rows) else {
                continue;
            };
            let scale = alat * A_PER_BOHR;
            let rows: Vec<Vec<f64>> = [r1, r2, r3]
                .iter()
                .map(|r| r.iter().map(|x| x * scale).collect())
                .collect();
            let Some(lattice) = Lattice::from_rows(&rows) else {
                continue;
            };
            let Some(sites) = positions[i].as_sites() else {
                continue;
            };
            let sites: Vec<(String, [f64; 3])> = sites
                .iter()
                .map(|s| (s.species.clone(), s.coords))
                .collect();
            structures.push(Structure::new(lattice, &sites));
        }
        structures
    }

    fn relax_structures(&self) -> Vec<Structure> {
        let cells = self.quantities.sequence("cell_parameters");
        let positions = self.quantities.sequence("atomic_positions");

        let steps = cells.len().min(positions.len());
        let mut structures = Vec::new();
        for i in 0..steps {
            let (Some(rows), Some(sites)) = (cells[i].as_matrix(), positions[i].as_sites())
            else {
                continue;
            };
            let Some(lattice) = Lattice::from_rows(rows) else {
                continue;
            };
            let sites: Vec<(String, [f64; 3])> = sites
                .iter()
                .map(|s| (s.species.clone(), s.coords))
                .collect();
            structures.push(Structure::new(lattice, &sites));
        }
        structures
    }

    /// 初始结构（结构序列首项）
    pub fn initial_structure(&self) -> Option<Structure> {
        self.structures().into_iter().next()
    }

    /// 最终结构（结构序列末项）
    pub fn final_structure(&self) -> Option<Structure> {
        self.structures().into_iter().last()
    }

    // ── 成败判定 ────────────────────────────────────────────

    /// 运行是否成功，以及全部失败原因（独立判定，全部上报）。
    /// 模拟自身的失败是解析出的信号，不是解析错误。
    pub fn succeeded(&self) -> (bool, Vec<String>) {
        let q = &self.quantities;
        let mut reasons = Vec::new();
        if q.has("cpu_time_exceeded") {
            reasons.push("Maximum CPU time exceeded".to_string());
        }
        if q.has("max_steps_reached") {
            reasons.push(
                "The maximum number of ionic/electronic relaxation steps has been reached"
                    .to_string(),
            );
        }
        if q.has("wentzcovitch_max_reached") {
            reasons.push(
                "The maximum number of iterations was reached in Wentzcovitch Damped Dynamics"
                    .to_string(),
            );
        }
        if q.has("not_electronically_converged") {
            reasons.push("SCF convergence NOT achieved".to_string());
        }
        if q.has("eigenvalues_not_converged") {
            reasons.push("Some eigenvalues are not converged".to_string());
        }
        if q.has("general_error") {
            reasons.push("An error block was printed".to_string());
        }
        if !q.has("job_done") {
            reasons.push("Not marked JOB DONE".to_string());
        }
        (reasons.is_empty(), reasons)
    }

    /// 不影响成败判定的次要警告
    pub fn minor_warnings(&self) -> Vec<String> {
        let q = &self.quantities;
        let mut warnings = Vec::new();
        if q.has("deprecated_feature_used") {
            warnings.push("A deprecated feature was used".to_string());
        }
        if q.has("scf_correction_too_large") {
            warnings.push("SCF correction compared to forces is too large".to_string());
        }
        for value in q.sequence("warning") {
            if let Some(text) = value.as_str() {
                warnings.push(format!("Warning: {}", text));
            }
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 带两个 SCF 步和一个弛豫结构块的最小输出样例
    const RELAX_OUTPUT: &str = "\
     Program PWSCF v.6.4.1 starts on 21Aug2019 at 10:32:15

     bravais-lattice index     =            2
     lattice parameter (alat)  =       7.3075  a.u.
     unit-cell volume          =      97.5477 (a.u.)^3
     number of atoms/cell      =            2
     number of atomic types    =            1

     crystal axes: (cart. coord. in units of alat)
               a(1) = (   1.000000   0.000000   0.000000 )
               a(2) = (   0.000000   1.000000   0.000000 )
               a(3) = (   0.000000   0.000000   1.000000 )

     Crystallographic axes

     site n.     atom                  positions (cryst. coord.)
         1           Si  tau(   1) = (  0.0000000  0.0000000  0.0000000  )
         2           Si  tau(   2) = (  0.2500000  0.2500000  0.2500000  )

     number of k points=     8

     total energy              =     -10.50000000 Ry
!    total energy              =     -10.50000000 Ry

          total   stress  (Ry/bohr**3)                   (kbar)     P=  -17.35
  -0.00011796  -0.00000000  -0.00000000        -17.35     -0.00     -0.00
  -0.00000000  -0.00011796  -0.00000000         -0.00    -17.35     -0.00
  -0.00000000  -0.00000000  -0.00011796         -0.00     -0.00    -17.35

CELL_PARAMETERS (angstrom)
   3.866975   0.000000   0.000000
   0.000000   3.866975   0.000000
   0.000000   0.000000   3.866975

ATOMIC_POSITIONS (crystal)
Si       0.000000000   0.000000000   0.000000000
Si       0.250000000   0.250000000   0.250000000

     total energy              =     -11.25000000 Ry
!    total energy              =     -11.25000000 Ry

     the Fermi energy is     6.6416 ev

     PWSCF        :     49.43s CPU         50.89s WALL

   JOB DONE.
";

    #[test]
    fn test_parse_is_idempotent() {
        let first = extract(RELAX_OUTPUT).unwrap();
        let second = extract(RELAX_OUTPUT).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_order_preservation_and_scenario_energies() {
        let output = PwOutput::from_text(RELAX_OUTPUT).unwrap();
        let energies = output.energies_ev();
        assert_eq!(energies.len(), 4); // 两行普通 + 两行 '!' 前缀均含 "total energy ="
        // 最终能量取最后一次出现，单位 eV
        let (energy, source) = output.final_energy_ev().unwrap();
        assert!((energy - (-11.25 * EV_PER_RY)).abs() < 1e-9);
        assert_eq!(source, EnergySource::TotalEnergyLine);
        assert!((energy - (-153.06403190962498)).abs() < 1e-6);
    }

    #[test]
    fn test_scenario_two_bang_lines_last_wins() {
        let text = "\
!    total energy              =     -10.5000000 Ry
!    total energy              =     -11.2500000 Ry
";
        let output = PwOutput::from_text(text).unwrap();
        let (energy, _) = output.final_energy_ev().unwrap();
        assert!((energy - (-11.25 * 13.6056917253)).abs() < 1e-9);
        assert_eq!(output.quantities.sequence("final_energy").len(), 2);
    }

    #[test]
    fn test_final_energy_marker_takes_precedence() {
        let text = "\
!    total energy              =     -10.5000000 Ry
     Final energy              =     -10.4000000 Ry
";
        let output = PwOutput::from_text(text).unwrap();
        let (energy, source) = output.final_energy_ev().unwrap();
        assert_eq!(source, EnergySource::FinalEnergyLine);
        assert!((energy - (-10.4 * EV_PER_RY)).abs() < 1e-9);
    }

    #[test]
    fn test_absent_is_safe() {
        let output = PwOutput::from_text("nothing recognizable in here\n").unwrap();
        // 每个声明过的名称都有键，且为空序列
        for name in crate::parsers::patterns::quantity_names() {
            assert!(output.quantities.sequence(name).is_empty(), "{}", name);
        }
        assert!(output.final_energy_ev().is_none());
        assert!(output.fermi_energy_ev().is_none());
        assert!(output.final_stress_gpa().is_none());
        assert!(output.structures().is_empty());
        assert!(output.initial_structure().is_none());
    }

    #[test]
    fn test_succeeded_job_done_only() {
        let output = PwOutput::from_text("   JOB DONE.\n").unwrap();
        assert_eq!(output.succeeded(), (true, vec![]));
    }

    #[test]
    fn test_cpu_time_exceeded_fails_despite_job_done() {
        let output = PwOutput::from_text("   Maximum CPU time exceeded\n   JOB DONE.\n").unwrap();
        let (ok, reasons) = output.succeeded();
        assert!(!ok);
        assert!(reasons.contains(&"Maximum CPU time exceeded".to_string()));
    }

    #[test]
    fn test_all_failure_reasons_reported_independently() {
        let text = "\
     Maximum CPU time exceeded
     SCF convergence NOT achieved
";
        let output = PwOutput::from_text(text).unwrap();
        let (ok, reasons) = output.succeeded();
        assert!(!ok);
        // CPU 超时、SCF 未收敛、缺少 JOB DONE 三条独立上报
        assert_eq!(reasons.len(), 3);
    }

    #[test]
    fn test_step_limit_and_error_block_reasons_in_both_engines() {
        let bar = "%".repeat(78);
        let text = format!(
            "\
     The maximum number of steps has been reached.

     iterations completed, stopping
{}
     Error in routine electrons (1):
     charge is wrong
{}
",
            bar, bar
        );
        let output = PwOutput::from_text(&text).unwrap();
        let (ok, reasons) = output.succeeded();
        assert!(!ok);
        assert!(reasons.contains(
            &"The maximum number of ionic/electronic relaxation steps has been reached"
                .to_string()
        ));
        assert!(reasons.contains(
            &"The maximum number of iterations was reached in Wentzcovitch Damped Dynamics"
                .to_string()
        ));
        assert!(reasons.contains(&"An error block was printed".to_string()));
        assert!(reasons.contains(&"Not marked JOB DONE".to_string()));

        // 逐行引擎给出相同的判定与原因
        let scanner = crate::parsers::LineScanner::new(&text);
        assert_eq!(scanner.succeeded(), (ok, reasons));
    }

    #[test]
    fn test_unit_conversion_exactness() {
        let text = "!    total energy              =      -2.0000000 Ry\n";
        let output = PwOutput::from_text(text).unwrap();
        assert_eq!(output.final_total_energy_ev(), Some(-2.0 * 13.6056917253));

        let text = "\
          total   stress  (Ry/bohr**3)                   (kbar)     P=   25.00
   0.00017000   0.00000000   0.00000000         25.00      0.00      0.00
   0.00000000   0.00017000   0.00000000          0.00     25.00      0.00
   0.00000000   0.00000000   0.00017000          0.00      0.00     25.00
";
        let output = PwOutput::from_text(text).unwrap();
        assert_eq!(output.final_pressure_gpa(), Some(2.5));
        let gpa = output.final_stress_gpa().unwrap();
        assert_eq!(gpa[0][0], 2.5);
        let ev_a3 = output.final_stress_ev_a3().unwrap();
        let expected = 0.00017 * EV_PER_RY / A3_PER_BOHR3;
        assert!((ev_a3[2][2] - expected).abs() < 1e-15);
    }

    #[test]
    fn test_structures_scf_then_relax() {
        let output = PwOutput::from_text(RELAX_OUTPUT).unwrap();
        let structures = output.structures();
        // 一个 SCF 初始结构 + 一个弛豫结构
        assert_eq!(structures.len(), 2);

        // SCF 结构：晶格 = a(i) × alat × bohr→Å
        let initial = &structures[0];
        let expected = 7.3075 * A_PER_BOHR;
        assert!((initial.lattice.matrix[0][0] - expected).abs() < 1e-9);
        assert_eq!(initial.species(), vec!["Si", "Si"]);

        // 弛豫结构：CELL_PARAMETERS 已是 Å
        let fin = &structures[1];
        assert!((fin.lattice.matrix[1][1] - 3.866975).abs() < 1e-9);
        assert_eq!(fin.n_atoms(), 2);

        assert!((output.final_structure().unwrap().lattice.matrix[2][2] - 3.866975).abs() < 1e-9);
    }

    #[test]
    fn test_structure_pairing_skips_unmatched_steps() {
        // 两个晶格块、一个坐标块 => 只配出一个结构
        let text = "\
CELL_PARAMETERS (angstrom)
   3.0   0.0   0.0
   0.0   3.0   0.0
   0.0   0.0   3.0

CELL_PARAMETERS (angstrom)
   3.1   0.0   0.0
   0.0   3.1   0.0
   0.0   0.0   3.1

ATOMIC_POSITIONS (crystal)
Si       0.0   0.0   0.0

";
        let output = PwOutput::from_text(text).unwrap();
        let structures = output.structures();
        assert_eq!(structures.len(), 1);
        assert!((structures[0].lattice.matrix[0][0] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_walltime_and_simulation_parameters() {
        let output = PwOutput::from_text(RELAX_OUTPUT).unwrap();
        assert_eq!(output.n_atoms(), Some(2));
        assert_eq!(output.n_species(), Some(1));
        assert_eq!(output.n_kpoints(), Some(8));
        assert_eq!(output.alat_bohr(), Some(7.3075));
        assert_eq!(output.walltime_seconds(), Some(50.89));
        let volume = output.initial_volume_a3().unwrap();
        assert!((volume - 97.5477 * A3_PER_BOHR3).abs() < 1e-9);
    }

    #[test]
    fn test_malformed_capture_carries_quantity_and_raw_text() {
        // conv_thr 可以匹配但无法转换成浮点数
        let text = "     convergence threshold     =     1.0E-0E6\n";
        let err = extract(text).unwrap_err();
        match err {
            DftmanError::MalformedCapture { quantity, raw, .. } => {
                assert_eq!(quantity, "conv_thr");
                assert!(raw.contains("1.0E-0E6"));
            }
            other => panic!("expected MalformedCapture, got {:?}", other),
        }
    }

    #[test]
    fn test_forces_accessor() {
        let text = "\
     Forces acting on atoms (cartesian axes, Ry/au):

     atom    1 type  1   force =     0.00100000    0.00000000    0.00000000

     Total force =     0.001000     Total SCF correction =     0.000001
";
        let output = PwOutput::from_text(text).unwrap();
        let forces = output.forces();
        assert_eq!(forces.len(), 1);
        assert_eq!(forces[0].atom, 1);
        assert!((forces[0].force[0] - 0.001).abs() < 1e-12);
        assert_eq!(output.total_force(), Some(0.001));
    }
}
