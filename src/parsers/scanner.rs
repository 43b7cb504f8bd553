//! # 逐行扫描引擎
//!
//! 正则模式表之外的第二套解析路径：对输出逐行做子串匹配与
//! 定界块收集。保留历史行为：所有块都在第一个空白行处截断，
//! 即使 pw.x 偶尔在块内打印空行也不会越过。
//!
//! ## 依赖关系
//! - 被 `commands/analyze.rs` 在 `--engine lines` 下使用
//! - 使用 `models/structure.rs`

use crate::models::{Lattice, Structure};
use crate::parsers::pwout::{A_PER_BOHR, EV_PER_RY, GPA_PER_KBAR};

/// 判定为运行失败的关键警告子串，与上报的原因文案配对。
/// 原因文案与正则引擎一致，两套引擎给出相同的判定结果。
const CRITICAL_WARNINGS: [(&str, &str); 4] = [
    ("Maximum CPU time exceeded", "Maximum CPU time exceeded"),
    (
        "The maximum number of steps has been reached",
        "The maximum number of ionic/electronic relaxation steps has been reached",
    ),
    (
        "iterations completed, stopping",
        "The maximum number of iterations was reached in Wentzcovitch Damped Dynamics",
    ),
    ("convergence NOT achieved", "SCF convergence NOT achieved"),
];

/// 一段输出文本上的逐行视图
pub struct LineScanner<'a> {
    lines: Vec<&'a str>,
}

impl<'a> LineScanner<'a> {
    pub fn new(text: &'a str) -> Self {
        LineScanner {
            lines: text.lines().collect(),
        }
    }

    // ── 定界块 ──────────────────────────────────────────────

    /// 首个满足条件的行之后直到第一个空白行的块
    fn block_after<F>(&self, pred: F) -> &[&'a str]
    where
        F: Fn(&str) -> bool,
    {
        let Some(start) = self.lines.iter().position(|l| pred(l)) else {
            return &[];
        };
        Self::until_blank(&self.lines[start + 1..])
    }

    /// 截断到第一个空白行
    fn until_blank<'b>(lines: &'b [&'a str]) -> &'b [&'a str] {
        let end = lines
            .iter()
            .position(|l| l.trim().is_empty())
            .unwrap_or(lines.len());
        &lines[..end]
    }

    /// "Begin final coordinates" 与 "End final coordinates" 之间的区段。
    /// 从文件尾向前找 End 标记再回溯 Begin 标记，弛豫未完成时为 None。
    fn final_coordinates_section(&self) -> Option<&[&'a str]> {
        let end = self
            .lines
            .iter()
            .rposition(|l| l.contains("End final coordinates"))?;
        let begin = self.lines[..end]
            .iter()
            .rposition(|l| l.contains("Begin final coordinates"))?;
        Some(&self.lines[begin + 1..end])
    }

    /// 给定区段内（或退化为整个文件的最后一次出现）标题行之后的块
    fn last_block_after(lines: &[&'a str], marker: &str) -> Option<Vec<&'a str>> {
        let start = lines.iter().rposition(|l| l.starts_with(marker))?;
        Some(Self::until_blank(&lines[start + 1..]).to_vec())
    }

    // ── 能量 ────────────────────────────────────────────────

    fn value_after_eq(line: &str) -> Option<f64> {
        let (_, rhs) = line.split_once('=')?;
        rhs.split_whitespace().next()?.parse().ok()
    }

    /// 最后一个 '!' 总能量行（eV）
    pub fn final_total_energy_ev(&self) -> Option<f64> {
        self.lines
            .iter()
            .rev()
            .find(|l| l.starts_with('!') && l.contains("total energy"))
            .and_then(|l| Self::value_after_eq(l))
            .map(|ry| ry * EV_PER_RY)
    }

    /// "Final energy" 行优先，否则回退到 '!' 行（eV）
    pub fn final_energy_ev(&self) -> Option<f64> {
        self.lines
            .iter()
            .rev()
            .find(|l| l.contains("Final energy"))
            .and_then(|l| Self::value_after_eq(l))
            .map(|ry| ry * EV_PER_RY)
            .or_else(|| self.final_total_energy_ev())
    }

    /// 费米能（eV）
    pub fn fermi_energy_ev(&self) -> Option<f64> {
        let line = self
            .lines
            .iter()
            .rev()
            .find(|l| l.contains("the Fermi energy is"))?;
        line.split_whitespace().rev().nth(1)?.parse().ok()
    }

    // ── 压力与应力 ──────────────────────────────────────────

    /// 最后一个 "P=" 行给出的压力（GPa）
    pub fn final_pressure_gpa(&self) -> Option<f64> {
        let line = self.lines.iter().rev().find(|l| l.contains("P="))?;
        let (_, rhs) = line.split_once("P=")?;
        let kbar: f64 = rhs.trim().parse().ok()?;
        Some(kbar * GPA_PER_KBAR)
    }

    /// 最后一个应力张量块（kbar 三列，即每行的后三个数）
    pub fn final_stress_kbar(&self) -> Option<Vec<[f64; 3]>> {
        let start = self
            .lines
            .iter()
            .rposition(|l| l.contains("total   stress") && l.contains("P="))?;
        let block = Self::until_blank(&self.lines[start + 1..]);
        let mut rows = Vec::new();
        for line in block {
            let cols: Vec<f64> = line
                .split_whitespace()
                .filter_map(|t| t.parse().ok())
                .collect();
            if cols.len() == 6 {
                rows.push([cols[3], cols[4], cols[5]]);
            }
        }
        if rows.is_empty() {
            None
        } else {
            Some(rows)
        }
    }

    // ── 结构 ────────────────────────────────────────────────

    fn parse_cell_rows(block: &[&str]) -> Option<Lattice> {
        let rows: Vec<Vec<f64>> = block
            .iter()
            .map(|l| {
                l.split_whitespace()
                    .filter_map(|t| t.parse().ok())
                    .collect()
            })
            .filter(|r: &Vec<f64>| !r.is_empty())
            .collect();
        Lattice::from_rows(&rows)
    }

    fn parse_position_rows(block: &[&str]) -> Vec<(String, [f64; 3])> {
        let mut sites = Vec::new();
        for line in block {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() != 4 {
                continue;
            }
            let coords: Vec<f64> = tokens[1..4]
                .iter()
                .filter_map(|t| t.parse().ok())
                .collect();
            if coords.len() == 3 {
                sites.push((tokens[0].to_string(), [coords[0], coords[1], coords[2]]));
            }
        }
        sites
    }

    /// 最终结构：优先取 final coordinates 区段内的
    /// CELL_PARAMETERS / ATOMIC_POSITIONS 块；区段缺失时退化为
    /// 整个文件中各自的最后一次出现。
    pub fn final_structure(&self) -> Option<Structure> {
        let (cell, positions) = match self.final_coordinates_section() {
            Some(section) => (
                Self::last_block_after(section, "CELL_PARAMETERS")
                    .or_else(|| Self::last_block_after(&self.lines, "CELL_PARAMETERS"))?,
                Self::last_block_after(section, "ATOMIC_POSITIONS")?,
            ),
            None => (
                Self::last_block_after(&self.lines, "CELL_PARAMETERS")?,
                Self::last_block_after(&self.lines, "ATOMIC_POSITIONS")?,
            ),
        };
        let lattice = Self::parse_cell_rows(&cell)?;
        let sites = Self::parse_position_rows(&positions);
        if sites.is_empty() {
            return None;
        }
        Some(Structure::new(lattice, &sites))
    }

    /// 初始结构：开头的 crystal axes 块（alat 单位）与
    /// site n. 位置块（晶体坐标）
    pub fn initial_structure(&self) -> Option<Structure> {
        let alat = self
            .lines
            .iter()
            .find(|l| l.contains("lattice parameter (alat)"))
            .and_then(|l| Self::value_after_eq(l))?;
        let axes = self.block_after(|l| l.contains("crystal axes:"));
        let rows: Vec<Vec<f64>> = axes
            .iter()
            .filter_map(|l| {
                let inner = l.split_once('(')?.1.rsplit_once(')')?.0;
                // a(1) = ( x y z ) 行里第一个 '(' 属于 a(i)，再向里取一层
                let inner = inner.split_once('(').map_or(inner, |(_, i)| i);
                let row: Vec<f64> = inner
                    .split_whitespace()
                    .filter_map(|t| t.parse().ok())
                    .collect();
                if row.len() == 3 {
                    Some(row)
                } else {
                    None
                }
            })
            .map(|r| {
                r.into_iter()
                    .map(|x| x * alat * A_PER_BOHR)
                    .collect()
            })
            .collect();
        let lattice = Lattice::from_rows(&rows)?;

        let block = self.block_after(|l| {
            l.contains("site n.") && l.contains("positions (cryst. coord.)")
        });
        let mut sites = Vec::new();
        for line in block {
            // "    1    Si  tau(   1) = (  x  y  z  )"
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 2 {
                continue;
            }
            let species = tokens[1];
            let Some(inner) = line.rsplit_once('(').and_then(|(_, i)| i.split(')').next())
            else {
                continue;
            };
            let coords: Vec<f64> = inner
                .split_whitespace()
                .filter_map(|t| t.parse().ok())
                .collect();
            if coords.len() == 3 {
                sites.push((species.to_string(), [coords[0], coords[1], coords[2]]));
            }
        }
        if sites.is_empty() {
            return None;
        }
        Some(Structure::new(lattice, &sites))
    }

    // ── 时间与成败 ──────────────────────────────────────────

    /// PWSCF 终行的墙钟时间（秒），支持 "1h23m" 与 "49.43s" 两种写法
    pub fn walltime_seconds(&self) -> Option<f64> {
        let line = self
            .lines
            .iter()
            .rev()
            .find(|l| l.trim_start().starts_with("PWSCF") && l.contains("WALL"))?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let wall_at = tokens.iter().position(|t| *t == "WALL")?;
        parse_clock(tokens.get(wall_at.checked_sub(1)?)?)
    }

    /// 成败判定：任一关键警告、特征值未收敛、错误块出现，
    /// 或缺少 JOB DONE. 即为失败，全部原因独立上报
    pub fn succeeded(&self) -> (bool, Vec<String>) {
        let mut reasons = Vec::new();
        for (marker, reason) in CRITICAL_WARNINGS {
            if self.lines.iter().any(|l| l.contains(marker)) {
                reasons.push(reason.to_string());
            }
        }
        // c_bands 行要求两个子串同时出现在同一行
        if self
            .lines
            .iter()
            .any(|l| l.contains("c_bands") && l.contains("eigenvalues not converged"))
        {
            reasons.push("Some eigenvalues are not converged".to_string());
        }
        if self.lines.iter().any(|l| Self::is_error_bar(l)) {
            reasons.push("An error block was printed".to_string());
        }
        if !self.lines.iter().any(|l| l.contains("JOB DONE.")) {
            reasons.push("Not marked JOB DONE".to_string());
        }
        (reasons.is_empty(), reasons)
    }

    /// 错误块的定界行：整行由至少 78 个 '%' 组成
    fn is_error_bar(line: &str) -> bool {
        let trimmed = line.trim();
        trimmed.len() >= 78 && trimmed.chars().all(|c| c == '%')
    }
}

/// "1h23m"、"49.43s"、"2h"、"15m30.5s" 形式的时间串（秒）
fn parse_clock(token: &str) -> Option<f64> {
    let mut seconds = 0.0;
    let mut number = String::new();
    let mut seen = false;
    for ch in token.chars() {
        match ch {
            'h' => {
                seconds += number.parse::<f64>().ok()? * 3600.0;
                number.clear();
                seen = true;
            }
            'm' => {
                seconds += number.parse::<f64>().ok()? * 60.0;
                number.clear();
                seen = true;
            }
            's' => {
                seconds += number.parse::<f64>().ok()?;
                number.clear();
                seen = true;
            }
            _ => number.push(ch),
        }
    }
    if !seen {
        return None;
    }
    Some(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FINAL_COORDS: &str = "\
     lattice parameter (alat)  =       7.3075  a.u.

     crystal axes: (cart. coord. in units of alat)
               a(1) = (   1.000000   0.000000   0.000000 )
               a(2) = (   0.000000   1.000000   0.000000 )
               a(3) = (   0.000000   0.000000   1.000000 )

     site n.     atom                  positions (cryst. coord.)
         1           Si  tau(   1) = (  0.0000000  0.0000000  0.0000000  )
         2           Si  tau(   2) = (  0.2500000  0.2500000  0.2500000  )

!    total energy              =     -11.25000000 Ry

Begin final coordinates
     new unit-cell volume =    110.00000 a.u.^3

CELL_PARAMETERS (angstrom)
   3.900000   0.000000   0.000000
   0.000000   3.900000   0.000000
   0.000000   0.000000   3.900000

ATOMIC_POSITIONS (crystal)
Si       0.000000000   0.000000000   0.000000000
Si       0.250000000   0.250000000   0.250000000
End final coordinates

     the Fermi energy is     6.6416 ev

     PWSCF        :      1h23m CPU      1h25m WALL

   JOB DONE.
";

    #[test]
    fn test_final_structure_from_final_coordinates() {
        let scanner = LineScanner::new(FINAL_COORDS);
        let structure = scanner.final_structure().unwrap();
        assert_eq!(structure.n_atoms(), 2);
        assert!((structure.lattice.matrix[0][0] - 3.9).abs() < 1e-12);
        assert_eq!(structure.species(), vec!["Si", "Si"]);
    }

    #[test]
    fn test_final_structure_fallback_to_last_occurrence() {
        let text = "\
CELL_PARAMETERS (angstrom)
   3.000000   0.000000   0.000000
   0.000000   3.000000   0.000000
   0.000000   0.000000   3.000000

CELL_PARAMETERS (angstrom)
   3.100000   0.000000   0.000000
   0.000000   3.100000   0.000000
   0.000000   0.000000   3.100000

ATOMIC_POSITIONS (crystal)
Si       0.000000000   0.000000000   0.000000000

";
        let scanner = LineScanner::new(text);
        let structure = scanner.final_structure().unwrap();
        assert!((structure.lattice.matrix[0][0] - 3.1).abs() < 1e-12);
    }

    #[test]
    fn test_blocks_truncate_at_blank_line() {
        // 块内部出现空行时提前截断，只取到空行之前的内容
        let text = "\
ATOMIC_POSITIONS (crystal)
Si       0.000000000   0.000000000   0.000000000

Si       0.250000000   0.250000000   0.250000000

CELL_PARAMETERS (angstrom)
   3.000000   0.000000   0.000000
   0.000000   3.000000   0.000000
   0.000000   0.000000   3.000000

";
        let scanner = LineScanner::new(text);
        let structure = scanner.final_structure().unwrap();
        assert_eq!(structure.n_atoms(), 1);
    }

    #[test]
    fn test_initial_structure_scales_alat_to_angstrom() {
        let scanner = LineScanner::new(FINAL_COORDS);
        let structure = scanner.initial_structure().unwrap();
        let expected = 7.3075 * A_PER_BOHR;
        assert!((structure.lattice.matrix[0][0] - expected).abs() < 1e-9);
        assert_eq!(structure.n_atoms(), 2);
        assert!((structure.atoms[1].position[0] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_energies_and_fermi() {
        let scanner = LineScanner::new(FINAL_COORDS);
        let energy = scanner.final_total_energy_ev().unwrap();
        assert!((energy - (-11.25 * EV_PER_RY)).abs() < 1e-9);
        // "Final energy" 行缺失时回退到 '!' 行
        assert_eq!(scanner.final_energy_ev(), Some(energy));
        assert_eq!(scanner.fermi_energy_ev(), Some(6.6416));
    }

    #[test]
    fn test_final_energy_line_preferred() {
        let text = "\
!    total energy              =     -10.5000000 Ry
     Final energy              =     -10.4000000 Ry
";
        let scanner = LineScanner::new(text);
        let energy = scanner.final_energy_ev().unwrap();
        assert!((energy - (-10.4 * EV_PER_RY)).abs() < 1e-9);
    }

    #[test]
    fn test_pressure_and_stress_block() {
        let text = "\
          total   stress  (Ry/bohr**3)                   (kbar)     P=   25.00
   0.00017000   0.00000000   0.00000000         25.00      0.00      0.00
   0.00000000   0.00017000   0.00000000          0.00     25.00      0.00
   0.00000000   0.00000000   0.00017000          0.00      0.00     25.00

";
        let scanner = LineScanner::new(text);
        assert_eq!(scanner.final_pressure_gpa(), Some(2.5));
        let stress = scanner.final_stress_kbar().unwrap();
        assert_eq!(stress.len(), 3);
        assert_eq!(stress[1][1], 25.0);
    }

    #[test]
    fn test_walltime_composite_clock() {
        let scanner = LineScanner::new(FINAL_COORDS);
        assert_eq!(scanner.walltime_seconds(), Some(3600.0 + 25.0 * 60.0));
        assert_eq!(parse_clock("49.43s"), Some(49.43));
        assert_eq!(parse_clock("15m30.5s"), Some(930.5));
        assert_eq!(parse_clock("CPU"), None);
    }

    #[test]
    fn test_succeeded_reports_all_reasons() {
        let scanner = LineScanner::new(FINAL_COORDS);
        assert_eq!(scanner.succeeded(), (true, vec![]));

        let text = "\
     Maximum CPU time exceeded
     SCF convergence NOT achieved
";
        let scanner = LineScanner::new(text);
        let (ok, reasons) = scanner.succeeded();
        assert!(!ok);
        assert_eq!(
            reasons,
            vec![
                "Maximum CPU time exceeded".to_string(),
                "SCF convergence NOT achieved".to_string(),
                "Not marked JOB DONE".to_string(),
            ]
        );
    }

    #[test]
    fn test_eigenvalue_and_error_block_fail_despite_job_done() {
        let bar = "%".repeat(78);
        let text = format!(
            "\
     c_bands:  3 eigenvalues not converged
{}
     Error in routine cdiaghg (154):
     problems computing cholesky
{}

   JOB DONE.
",
            bar, bar
        );
        let scanner = LineScanner::new(&text);
        let (ok, reasons) = scanner.succeeded();
        assert!(!ok);
        assert_eq!(
            reasons,
            vec![
                "Some eigenvalues are not converged".to_string(),
                "An error block was printed".to_string(),
            ]
        );

        // 两套引擎的判定结果一致
        let output = crate::parsers::pwout::PwOutput::from_text(&text).unwrap();
        assert_eq!(output.succeeded(), (ok, reasons));
    }

    #[test]
    fn test_eigenvalue_marker_requires_both_substrings_on_one_line() {
        // "c_bands" 与 "eigenvalues not converged" 分散在不同行时不算失败
        let text = "\
     c_bands:  all fine here
     note: some eigenvalues not converged earlier

   JOB DONE.
";
        assert_eq!(LineScanner::new(text).succeeded(), (true, vec![]));
        // 同一行同时含两个子串时才上报
        let text = "     c_bands:  3 eigenvalues not converged\n   JOB DONE.\n";
        let (ok, reasons) = LineScanner::new(text).succeeded();
        assert!(!ok);
        assert_eq!(reasons, vec!["Some eigenvalues are not converged".to_string()]);
    }
}
