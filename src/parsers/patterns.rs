//! # pw.x 输出物理量模式表
//!
//! 声明每个可提取物理量的正则模式与后处理函数。
//! 模式表在进程启动后构建一次，全局只读；内置模式非法属于
//! 构建期致命错误，而不是针对单个文档的错误。
//!
//! ## 依赖关系
//! - 被 `parsers/pwout.rs` 的提取引擎使用
//! - 使用 `regex` crate

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

// ─────────────────────────────────────────────────────────────
// 提取值类型
// ─────────────────────────────────────────────────────────────

/// 单个原子位点（物种标签 + 坐标）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub species: String,
    pub coords: [f64; 3],
}

/// 应力张量，同时保留 Ry/bohr³ 列和 kbar 列，
/// 以便分别换算到 eV/Å³ 和 GPa
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressTensor {
    pub ry_bohr3: Vec<Vec<f64>>,
    pub kbar: Vec<Vec<f64>>,
}

/// 单个原子受力记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceRecord {
    pub atom: i64,
    pub species_index: i64,
    pub force: Vec<f64>,
}

/// k 点记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpoint {
    pub index: i64,
    pub coords: [f64; 3],
    pub weight: f64,
}

/// 能带与占据数块
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandsBlock {
    pub kpoints: Vec<Vec<f64>>,
    pub bands: Vec<Vec<f64>>,
    pub occupations: Vec<Vec<f64>>,
}

/// 后处理产生的类型化值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Float(f64),
    Int(i64),
    Str(String),
    Vector(Vec<f64>),
    Matrix(Vec<Vec<f64>>),
    Sites(Vec<Site>),
    Stress(StressTensor),
    Force(ForceRecord),
    Kpoints(Vec<Kpoint>),
    Bands(BandsBlock),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[f64]> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&Vec<Vec<f64>>> {
        match self {
            Value::Matrix(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sites(&self) -> Option<&[Site]> {
        match self {
            Value::Sites(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_stress(&self) -> Option<&StressTensor> {
        match self {
            Value::Stress(s) => Some(s),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────
// 模式表类型
// ─────────────────────────────────────────────────────────────

/// 后处理结果；错误为人类可读原因，由提取引擎附加物理量名称和原始文本
pub type PostResult = std::result::Result<Value, String>;

/// 后处理函数：纯函数，对匹配到的捕获组做类型转换
pub type PostFn = fn(&Captures) -> PostResult;

/// 单个物理量的提取规则
pub struct QuantitySpec {
    /// 物理量名称（稳定字符串标识符）
    pub name: &'static str,
    /// 提取用正则（标志以内联 (?m)/(?s) 表达）
    pub regex: Regex,
    /// 后处理函数
    pub post: PostFn,
}

static PATTERNS: OnceLock<Vec<QuantitySpec>> = OnceLock::new();

/// 全局只读模式表
pub fn pattern_table() -> &'static [QuantitySpec] {
    PATTERNS.get_or_init(build_table).as_slice()
}

/// 全部物理量名称
pub fn quantity_names() -> Vec<&'static str> {
    pattern_table().iter().map(|s| s.name).collect()
}

// ─────────────────────────────────────────────────────────────
// 后处理辅助函数
// ─────────────────────────────────────────────────────────────

fn group<'t>(caps: &Captures<'t>, i: usize) -> std::result::Result<&'t str, String> {
    caps.get(i)
        .map(|m| m.as_str())
        .ok_or_else(|| format!("capture group {} did not participate in match", i))
}

fn parse_f64(s: &str) -> std::result::Result<f64, String> {
    s.trim()
        .parse::<f64>()
        .map_err(|_| format!("expected a float, got '{}'", s.trim()))
}

fn parse_i64(s: &str) -> std::result::Result<i64, String> {
    s.trim()
        .parse::<i64>()
        .map_err(|_| format!("expected an integer, got '{}'", s.trim()))
}

fn post_float(caps: &Captures) -> PostResult {
    Ok(Value::Float(parse_f64(group(caps, 1)?)?))
}

fn post_int(caps: &Captures) -> PostResult {
    Ok(Value::Int(parse_i64(group(caps, 1)?)?))
}

fn post_str(caps: &Captures) -> PostResult {
    Ok(Value::Str(group(caps, 1)?.trim().to_string()))
}

/// 哨兵模式：无捕获组，保留整个匹配文本
fn post_flag(caps: &Captures) -> PostResult {
    Ok(Value::Str(caps.get(0).map_or("", |m| m.as_str()).trim().to_string()))
}

fn post_vector(caps: &Captures) -> PostResult {
    let floats = group(caps, 1)?
        .split_whitespace()
        .map(parse_f64)
        .collect::<std::result::Result<Vec<f64>, String>>()?;
    Ok(Value::Vector(floats))
}

/// 逐行解析数值矩阵（CELL_PARAMETERS 等块）
fn post_matrix(caps: &Captures) -> PostResult {
    let rows = group(caps, 1)?
        .trim()
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            line.split_whitespace()
                .map(parse_f64)
                .collect::<std::result::Result<Vec<f64>, String>>()
        })
        .collect::<std::result::Result<Vec<Vec<f64>>, String>>()?;
    Ok(Value::Matrix(rows))
}

/// ATOMIC_POSITIONS 块：只接受恰好 4 列的行（物种 + 三个分数坐标），
/// 其余行（例如被贪婪匹配带入的 "End final coordinates"）被忽略
fn post_positions(caps: &Captures) -> PostResult {
    let mut sites = Vec::new();
    for line in group(caps, 1)?.trim().lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 4 {
            continue;
        }
        sites.push(Site {
            species: tokens[0].to_string(),
            coords: [
                parse_f64(tokens[1])?,
                parse_f64(tokens[2])?,
                parse_f64(tokens[3])?,
            ],
        });
    }
    Ok(Value::Sites(sites))
}

/// 初始位置块："  1  Si  tau(  1) = (  x  y  z  )" 行
fn post_tau_positions(caps: &Captures) -> PostResult {
    let mut sites = Vec::new();
    for line in group(caps, 1)?.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        if tokens.len() < 9 {
            return Err(format!("malformed site line '{}'", line.trim()));
        }
        sites.push(Site {
            species: tokens[1].to_string(),
            coords: [
                parse_f64(tokens[6])?,
                parse_f64(tokens[7])?,
                parse_f64(tokens[8])?,
            ],
        });
    }
    Ok(Value::Sites(sites))
}

/// 应力块：每行 6 列，前 3 列 Ry/bohr³，后 3 列 kbar
fn post_stress(caps: &Captures) -> PostResult {
    let mut ry_bohr3 = Vec::new();
    let mut kbar = Vec::new();
    for line in group(caps, 1)?.trim().lines() {
        let row = line
            .split_whitespace()
            .map(parse_f64)
            .collect::<std::result::Result<Vec<f64>, String>>()?;
        if row.len() != 6 {
            return Err(format!(
                "expected 6 stress columns, got {} in '{}'",
                row.len(),
                line.trim()
            ));
        }
        ry_bohr3.push(row[0..3].to_vec());
        kbar.push(row[3..6].to_vec());
    }
    Ok(Value::Stress(StressTensor { ry_bohr3, kbar }))
}

/// 受力记录：三个捕获组（原子序号、物种序号、力向量）
fn post_force(caps: &Captures) -> PostResult {
    let atom = parse_i64(group(caps, 1)?)?;
    let species_index = parse_i64(group(caps, 2)?)?;
    let force = group(caps, 3)?
        .split_whitespace()
        .map(parse_f64)
        .collect::<std::result::Result<Vec<f64>, String>>()?;
    Ok(Value::Force(ForceRecord {
        atom,
        species_index,
        force,
    }))
}

/// k 点行："  k(  1) = (  x  y  z), wk =  w"
fn post_kpoints(caps: &Captures) -> PostResult {
    let mut kpoints = Vec::new();
    for line in group(caps, 1)?.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        if tokens.len() < 8 {
            return Err(format!("malformed k-point line '{}'", line.trim()));
        }
        let index = parse_i64(tokens[1].trim_end_matches(')'))?;
        let trim = |t: &str| t.trim_matches(|c| c == ')' || c == ',').to_string();
        let coords = [
            parse_f64(&trim(tokens[4]))?,
            parse_f64(&trim(tokens[5]))?,
            parse_f64(&trim(tokens[6]))?,
        ];
        let weight = parse_f64(tokens[tokens.len() - 1])?;
        kpoints.push(Kpoint {
            index,
            coords,
            weight,
        });
    }
    Ok(Value::Kpoints(kpoints))
}

/// 能带块：在捕获文本内部再做 k 点 / 能带 / 占据数的二次提取
fn post_bands(caps: &Captures) -> PostResult {
    static K_RE: OnceLock<Regex> = OnceLock::new();
    static BANDS_RE: OnceLock<Regex> = OnceLock::new();
    static OCC_RE: OnceLock<Regex> = OnceLock::new();

    let k_re = K_RE.get_or_init(|| Regex::new(r"k\s+=\s+([\s\d.\-]+)").unwrap());
    let bands_re =
        BANDS_RE.get_or_init(|| Regex::new(r"(?m)bands\s+\(ev\):\n+([\s\d\-.]+)").unwrap());
    let occ_re =
        OCC_RE.get_or_init(|| Regex::new(r"occupation numbers\s+([\d.][\s\d.]*)").unwrap());

    let text = group(caps, 1)?;

    // k 坐标可能粘连（如 0.5000-0.5000），先在负号前补空格
    let parse_rows = |raw: &str| -> std::result::Result<Vec<f64>, String> {
        raw.replace('-', " -")
            .split_whitespace()
            .map(parse_f64)
            .collect()
    };

    let kpoints = k_re
        .captures_iter(text)
        .map(|c| parse_rows(c.get(1).map_or("", |m| m.as_str())))
        .collect::<std::result::Result<Vec<Vec<f64>>, String>>()?;
    let bands = bands_re
        .captures_iter(text)
        .map(|c| parse_rows(c.get(1).map_or("", |m| m.as_str())))
        .collect::<std::result::Result<Vec<Vec<f64>>, String>>()?;
    let occupations = occ_re
        .captures_iter(text)
        .map(|c| parse_rows(c.get(1).map_or("", |m| m.as_str())))
        .collect::<std::result::Result<Vec<Vec<f64>>, String>>()?;

    Ok(Value::Bands(BandsBlock {
        kpoints,
        bands,
        occupations,
    }))
}

/// 程序版本号可能是 "6.4.1" 这样的多段形式，保留为字符串
fn post_version(caps: &Captures) -> PostResult {
    Ok(Value::Str(
        group(caps, 1)?.trim().trim_end_matches('.').to_string(),
    ))
}

/// 终行 walltime："1h23m" / "12m 6.16s" / "50.89s" 合成秒数
fn post_walltime(caps: &Captures) -> PostResult {
    let mut rest = group(caps, 1)?.trim();
    let mut seconds = 0.0;
    if let Some(pos) = rest.find('h') {
        seconds += parse_f64(&rest[..pos])? * 3600.0;
        rest = &rest[pos + 1..];
    }
    if let Some(pos) = rest.find('m') {
        seconds += parse_f64(&rest[..pos])? * 60.0;
        rest = &rest[pos + 1..];
    }
    if let Some(pos) = rest.find('s') {
        seconds += parse_f64(&rest[..pos])?;
    }
    Ok(Value::Float(seconds))
}

// ─────────────────────────────────────────────────────────────
// 模式表
// ─────────────────────────────────────────────────────────────

fn spec(name: &'static str, pattern: &str, post: PostFn) -> QuantitySpec {
    QuantitySpec {
        name,
        regex: Regex::new(pattern)
            .unwrap_or_else(|e| panic!("invalid built-in pattern '{}': {}", name, e)),
        post,
    }
}

fn build_table() -> Vec<QuantitySpec> {
    vec![
        // ── 能量 / 焓（Ry，换算到 eV 由访问器负责）──────────────
        spec("energy", r"total energy\s+=\s+([-\d.]+)\s+Ry", post_float),
        spec(
            "final_energy",
            r"!\s+total energy\s+=\s+([-\d.]+)\s+Ry",
            post_float,
        ),
        spec(
            "final_energy_marker",
            r"Final energy\s+=\s+([-\d.]+)\s+Ry",
            post_float,
        ),
        spec("enthalpy", r"enthalpy new\s+=\s+([-\d.]+)\s+Ry", post_float),
        spec(
            "final_enthalpy",
            r"Final enthalpy\s+=\s+([-\d.]+)\s+Ry",
            post_float,
        ),
        spec("density", r"density\s+=\s+([\d.]+)\s+g/cm\^3", post_float),
        // ── 磁化 ─────────────────────────────────────────────
        spec(
            "total_magnetization",
            r"total magnetization\s+=\s+([-\d.]+)",
            post_float,
        ),
        spec(
            "absolute_magnetization",
            r"absolute magnetization\s+=\s+([-\d.]+)",
            post_float,
        ),
        // ── 应力 / 受力 ───────────────────────────────────────
        spec(
            "total_stress",
            r"total\s+stress\s+\(Ry/bohr\*\*3\)\s+\(kbar\)\s+P=\s+([-\d.]+)",
            post_float,
        ),
        spec(
            "stress",
            r"total\s+stress\s+\(Ry/bohr\*\*3\)\s+\(kbar\)\s+P=\s+[-\d.]+\n([\s\d.\-]+)\n",
            post_stress,
        ),
        spec("total_force", r"Total force\s+=\s+([-\d.]+)", post_float),
        spec(
            "force",
            r"Forces acting on atoms \(cartesian axes, Ry/au\):\n\n\s+atom\s+(\d+)\s+type\s+(\d+)\s+force\s+=\s+([\s\d.\-]+)",
            post_force,
        ),
        // ── 能带 / 费米能 ─────────────────────────────────────
        spec(
            "bands_data",
            r"(?s)End of self-consistent calculation\n\n(.*?)the Fermi energy is",
            post_bands,
        ),
        spec(
            "fermi_energy",
            r"the Fermi energy is\s+([-\d.]+) ev",
            post_float,
        ),
        // ── 迭代 / 收敛 ───────────────────────────────────────
        spec(
            "conv_iters",
            r"convergence has been achieved in\s+(\d+) iterations",
            post_int,
        ),
        spec(
            "conv_thr",
            r"convergence threshold\s+=\s+([-\d.E]+)",
            post_float,
        ),
        spec("mixing_beta", r"mixing beta\s+=\s+([\d.]+)", post_float),
        spec(
            "niter",
            r"(?m)number of iterations used\s+=\s+([\w\s]+)$",
            post_str,
        ),
        // ── 弛豫步结构块 ──────────────────────────────────────
        spec(
            "cell_parameters",
            r"(?m)CELL_PARAMETERS\s+\(angstrom\)\s+([\s\d.\-]+)^$",
            post_matrix,
        ),
        spec(
            "atomic_positions",
            r"(?m)ATOMIC_POSITIONS\s+\(crystal\)\s+([\w\s.\-]+)^$",
            post_positions,
        ),
        // ── 程序信息 ─────────────────────────────────────────
        spec("version", r"Program PWSCF v\.([\d.]+)", post_version),
        spec(
            "date",
            r"Program PWSCF v\.[\d.]+ starts on\s+(\S+)",
            post_str,
        ),
        spec(
            "time",
            r"(?m)Program PWSCF v\.[\d.]+ starts on\s+\S+\s+at\s+([\d:\s]+)$",
            post_str,
        ),
        // ── 初始晶格与模拟参数 ────────────────────────────────
        spec(
            "lattice_type",
            r"bravais-lattice index\s+=\s+(\d+)",
            post_int,
        ),
        spec(
            "lattice_parameter",
            r"lattice parameter \(alat\)\s+=\s+([\d.]+)",
            post_float,
        ),
        spec(
            "unit_cell_volume",
            r"unit-cell volume\s+=\s+([\d.]+)",
            post_float,
        ),
        spec("nat", r"number of atoms/cell\s+=\s+(\d+)", post_int),
        spec("ntype", r"number of atomic types\s+=\s+(\d+)", post_int),
        spec(
            "nelectrons",
            r"number of electrons\s+=\s+([\d.]+)",
            post_float,
        ),
        spec(
            "nks_states",
            r"number of Kohn-Sham states=\s+(\d+)",
            post_int,
        ),
        spec(
            "ecutwfc",
            r"kinetic-energy cutoff\s+=\s+([-\d.]+)\s+Ry",
            post_float,
        ),
        spec(
            "ecutrho",
            r"charge density cutoff\s+=\s+([-\d.]+)\s+Ry",
            post_float,
        ),
        spec(
            "exc",
            r"(?m)Exchange-correlation\s+=\s+([\w\s()]+)$",
            post_str,
        ),
        spec("celldm1", r"celldm\(1\)=\s+([-\d.]+)\s", post_float),
        spec("celldm2", r"celldm\(2\)=\s+([-\d.]+)\s", post_float),
        spec("celldm3", r"celldm\(3\)=\s+([-\d.]+)\s", post_float),
        spec("celldm4", r"celldm\(4\)=\s+([-\d.]+)\s", post_float),
        spec("celldm5", r"celldm\(5\)=\s+([-\d.]+)\s", post_float),
        spec("celldm6", r"celldm\(6\)=\s+([-\d.]+)\s", post_float),
        spec("a1", r"a\(1\)\s+=\s+\(\s+([\d\s.\-]+)\s+\)", post_vector),
        spec("a2", r"a\(2\)\s+=\s+\(\s+([\d\s.\-]+)\s+\)", post_vector),
        spec("a3", r"a\(3\)\s+=\s+\(\s+([\d\s.\-]+)\s+\)", post_vector),
        spec("b1", r"b\(1\)\s+=\s+\(\s+([\d\s.\-]+)\s+\)", post_vector),
        spec("b2", r"b\(2\)\s+=\s+\(\s+([\d\s.\-]+)\s+\)", post_vector),
        spec("b3", r"b\(3\)\s+=\s+\(\s+([\d\s.\-]+)\s+\)", post_vector),
        spec("nsymop", r"(?m)^\s+(\d+)\s+Sym\. Ops\.", post_int),
        spec(
            "initial_atomic_positions_cart",
            r"(?s)Cartesian axes[\s\n]+site n\.\s+atom\s+positions \(alat units\)\n(.*?)Crystallographic",
            post_tau_positions,
        ),
        spec(
            "initial_atomic_positions_frac",
            r"(?s)Crystallographic axes[\s\n]+site n\.\s+atom\s+positions \(cryst\. coord\.\)\n(.*?)number",
            post_tau_positions,
        ),
        // ── k 点 ─────────────────────────────────────────────
        spec("nkpts", r"number of k points=\s+(\d+)", post_int),
        spec(
            "smearing",
            r"number of k points=\s+\d+\s+(\S+) smearing",
            post_str,
        ),
        spec(
            "degauss",
            r"number of k points=\s+\d+\s+\S+ smearing, width\s+\(Ry\)=\s+([\d.]+)",
            post_float,
        ),
        spec(
            "kpoints_cart",
            r"(?s)cart\. coord\. in units 2pi/alat(.*?)cryst\. coord\.",
            post_kpoints,
        ),
        spec(
            "kpoints_frac",
            r"(?s)k\( .*?cryst\.\s+coord\.(.*?)Dense\s+grid",
            post_kpoints,
        ),
        // ── 哨兵 / 警告 ───────────────────────────────────────
        spec(
            "vdw_correction",
            r"(?m)Carrying out vdW-DF run using the following parameters: ([\w\s]+)$",
            post_str,
        ),
        spec("warning", r"(?m)Warning:\s+([\w\s/&]+)$", post_str),
        spec("job_done", r"JOB DONE\.", post_flag),
        spec(
            "not_electronically_converged",
            r"SCF convergence NOT achieved",
            post_flag,
        ),
        spec("cpu_time_exceeded", r"Maximum CPU time exceeded", post_flag),
        spec(
            "max_steps_reached",
            r"The maximum number of steps has been reached",
            post_flag,
        ),
        spec(
            "wentzcovitch_max_reached",
            r"iterations completed, stopping",
            post_flag,
        ),
        spec(
            "eigenvalues_not_converged",
            r"c_bands.*eigenvalues not converged",
            post_flag,
        ),
        spec("general_error", r"(?s)%{78}(.*?)%{78}", post_str),
        spec("deprecated_feature_used", r"DEPRECATED", post_flag),
        spec(
            "scf_correction_too_large",
            r"SCF correction compared to forces is too large, reduce conv_thr",
            post_flag,
        ),
        // ── 运行统计 ─────────────────────────────────────────
        spec("walltime", r"PWSCF\s+:.*?([\dhms.]+)\s+WALL", post_walltime),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(name: &str) -> &'static QuantitySpec {
        pattern_table()
            .iter()
            .find(|s| s.name == name)
            .expect("quantity not in table")
    }

    fn apply(name: &str, text: &str) -> Vec<Value> {
        let spec = find(name);
        spec.regex
            .captures_iter(text)
            .map(|c| (spec.post)(&c).unwrap())
            .collect()
    }

    #[test]
    fn test_table_builds_and_names_unique() {
        let names = quantity_names();
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(names.len(), sorted.len());
        assert!(names.len() >= 50);
    }

    #[test]
    fn test_energy_pattern_matches_all_occurrences_in_order() {
        let text = "\
     total energy              =     -10.50000000 Ry
     estimated scf accuracy    <       0.00000001 Ry
     total energy              =     -11.25000000 Ry
";
        let values = apply("energy", text);
        assert_eq!(
            values,
            vec![Value::Float(-10.5), Value::Float(-11.25)]
        );
    }

    #[test]
    fn test_final_energy_requires_bang_marker() {
        let text = "\
     total energy              =     -10.50000000 Ry
!    total energy              =     -11.25000000 Ry
";
        assert_eq!(apply("final_energy", text), vec![Value::Float(-11.25)]);
        // 普通 energy 模式两行都命中
        assert_eq!(apply("energy", text).len(), 2);
    }

    #[test]
    fn test_stress_block_splits_ry_and_kbar_columns() {
        let text = "\
          total   stress  (Ry/bohr**3)                   (kbar)     P=  -17.35
  -0.00011796  -0.00000000  -0.00000000        -17.35     -0.00     -0.00
  -0.00000000  -0.00011796  -0.00000000         -0.00    -17.35     -0.00
  -0.00000000  -0.00000000  -0.00011796         -0.00     -0.00    -17.35
";
        assert_eq!(apply("total_stress", text), vec![Value::Float(-17.35)]);

        let values = apply("stress", text);
        assert_eq!(values.len(), 1);
        let tensor = values[0].as_stress().unwrap();
        assert_eq!(tensor.ry_bohr3.len(), 3);
        assert_eq!(tensor.kbar.len(), 3);
        assert!((tensor.kbar[0][0] - (-17.35)).abs() < 1e-12);
        assert!((tensor.ry_bohr3[2][2] - (-0.00011796)).abs() < 1e-12);
    }

    #[test]
    fn test_cell_parameters_block_ends_at_blank_line() {
        let text = "\
CELL_PARAMETERS (angstrom)
   3.866975   0.000000   0.000000
   0.000000   3.866975   0.000000
   0.000000   0.000000   3.866975

";
        let values = apply("cell_parameters", text);
        assert_eq!(values.len(), 1);
        let matrix = values[0].as_matrix().unwrap();
        assert_eq!(matrix.len(), 3);
        assert!((matrix[1][1] - 3.866975).abs() < 1e-12);
    }

    #[test]
    fn test_atomic_positions_keeps_only_site_lines() {
        let text = "\
ATOMIC_POSITIONS (crystal)
Si       0.000000000   0.000000000   0.000000000
Si       0.250000000   0.250000000   0.250000000
End final coordinates

";
        let values = apply("atomic_positions", text);
        assert_eq!(values.len(), 1);
        let sites = values[0].as_sites().unwrap();
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].species, "Si");
        assert!((sites[1].coords[0] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_force_record() {
        let text = "\
     Forces acting on atoms (cartesian axes, Ry/au):

     atom    1 type  2   force =     0.00012500   -0.00033000    0.00000000
";
        let values = apply("force", text);
        assert_eq!(values.len(), 1);
        match &values[0] {
            Value::Force(record) => {
                assert_eq!(record.atom, 1);
                assert_eq!(record.species_index, 2);
                assert_eq!(record.force.len(), 3);
                assert!((record.force[1] - (-0.00033)).abs() < 1e-12);
            }
            other => panic!("expected force record, got {:?}", other),
        }
    }

    #[test]
    fn test_kpoints_cart_block() {
        let text = "\
     cart. coord. in units 2pi/alat
        k(    1) = (   0.0000000   0.0000000   0.0000000), wk =   0.2500000
        k(    2) = (   0.0000000   0.0000000   0.5000000), wk =   0.7500000
                     cryst. coord.
";
        let values = apply("kpoints_cart", text);
        assert_eq!(values.len(), 1);
        match &values[0] {
            Value::Kpoints(kpoints) => {
                assert_eq!(kpoints.len(), 2);
                assert_eq!(kpoints[1].index, 2);
                assert!((kpoints[1].coords[2] - 0.5).abs() < 1e-12);
                assert!((kpoints[1].weight - 0.75).abs() < 1e-12);
            }
            other => panic!("expected k-points, got {:?}", other),
        }
    }

    #[test]
    fn test_bands_block() {
        let text = "\
     End of self-consistent calculation

          k = 0.0000 0.0000 0.0000 (  8440 PWs)   bands (ev):

    -5.6039   6.2735   6.2735   6.2735

     occupation numbers
     1.0000   1.0000   1.0000   0.0000

     the Fermi energy is     6.6416 ev
";
        let values = apply("bands_data", text);
        assert_eq!(values.len(), 1);
        match &values[0] {
            Value::Bands(block) => {
                assert_eq!(block.kpoints.len(), 1);
                assert_eq!(block.bands[0].len(), 4);
                assert!((block.bands[0][0] - (-5.6039)).abs() < 1e-12);
                assert!((block.occupations[0][3] - 0.0).abs() < 1e-12);
            }
            other => panic!("expected bands block, got {:?}", other),
        }
        assert_eq!(apply("fermi_energy", text), vec![Value::Float(6.6416)]);
    }

    #[test]
    fn test_initial_positions_tau_lines() {
        let text = "\
     Crystallographic axes

     site n.     atom                  positions (cryst. coord.)
         1           Si  tau(   1) = (  0.0000000  0.0000000  0.0000000  )
         2           Si  tau(   2) = (  0.2500000  0.2500000  0.2500000  )

     number of k points=     8
";
        let values = apply("initial_atomic_positions_frac", text);
        assert_eq!(values.len(), 1);
        let sites = values[0].as_sites().unwrap();
        assert_eq!(sites.len(), 2);
        assert!((sites[1].coords[1] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_lattice_vectors_and_alat() {
        let text = "\
     lattice parameter (alat)  =       7.3075  a.u.
     a(1) = (   1.000000   0.000000   0.000000 )
     a(2) = (   0.000000   1.000000   0.000000 )
     a(3) = (   0.000000   0.000000   1.000000 )
";
        assert_eq!(apply("lattice_parameter", text), vec![Value::Float(7.3075)]);
        let a1 = apply("a1", text);
        assert_eq!(a1, vec![Value::Vector(vec![1.0, 0.0, 0.0])]);
    }

    #[test]
    fn test_sentinels() {
        let text = "\
     convergence has been achieved in   7 iterations

     JOB DONE.
";
        assert_eq!(apply("conv_iters", text), vec![Value::Int(7)]);
        assert_eq!(apply("job_done", text).len(), 1);
        assert!(apply("cpu_time_exceeded", text).is_empty());
    }

    #[test]
    fn test_general_error_block() {
        let bar = "%".repeat(78);
        let text = format!(
            "{}\n     Error in routine cdiaghg (154):\n     problems computing cholesky\n{}\n",
            bar, bar
        );
        let values = apply("general_error", &text);
        assert_eq!(values.len(), 1);
        assert!(values[0]
            .as_str()
            .unwrap()
            .contains("Error in routine cdiaghg"));
    }

    #[test]
    fn test_walltime_composite_units() {
        let text = "     PWSCF        :      1h23m CPU      1h25m WALL\n";
        let values = apply("walltime", text);
        assert_eq!(values, vec![Value::Float(3600.0 + 25.0 * 60.0)]);

        let text = "     PWSCF        :     49.43s CPU         50.89s WALL\n";
        assert_eq!(apply("walltime", text), vec![Value::Float(50.89)]);
    }

    #[test]
    fn test_malformed_capture_is_an_error_not_a_default() {
        // 构造一个能匹配但无法转换的捕获（版本号之外借用 conv_thr 模式）
        let spec = find("conv_thr");
        let caps = spec
            .regex
            .captures("     convergence threshold     =      1.0E-0E6\n")
            .unwrap();
        assert!((spec.post)(&caps).is_err());
    }
}
