//! # 晶体结构数据模型
//!
//! 定义从 pw.x 输出中重建的晶体结构表示。
//!
//! ## 依赖关系
//! - 被 `parsers/` 和 `commands/` 使用
//! - 无外部模块依赖

use serde::{Deserialize, Serialize};

/// 晶格参数表示
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lattice {
    /// 晶格向量矩阵 (3x3, Å)，行向量表示 a, b, c
    pub matrix: [[f64; 3]; 3],
}

impl Lattice {
    /// 从晶格向量矩阵创建
    pub fn from_vectors(matrix: [[f64; 3]; 3]) -> Self {
        Lattice { matrix }
    }

    /// 从行向量列表创建；行数或列数不为 3 时返回 None
    pub fn from_rows(rows: &[Vec<f64>]) -> Option<Self> {
        if rows.len() != 3 {
            return None;
        }
        let mut matrix = [[0.0; 3]; 3];
        for (i, row) in rows.iter().enumerate() {
            if row.len() != 3 {
                return None;
            }
            matrix[i].copy_from_slice(row);
        }
        Some(Lattice { matrix })
    }

    /// 获取晶格参数 (a, b, c, alpha, beta, gamma)，角度单位为度
    pub fn parameters(&self) -> (f64, f64, f64, f64, f64, f64) {
        let norm = |v: [f64; 3]| (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
        let dot = |u: [f64; 3], v: [f64; 3]| u[0] * v[0] + u[1] * v[1] + u[2] * v[2];

        let [a_vec, b_vec, c_vec] = self.matrix;
        let (a, b, c) = (norm(a_vec), norm(b_vec), norm(c_vec));

        let alpha = (dot(b_vec, c_vec) / (b * c)).acos().to_degrees();
        let beta = (dot(a_vec, c_vec) / (a * c)).acos().to_degrees();
        let gamma = (dot(a_vec, b_vec) / (a * b)).acos().to_degrees();

        (a, b, c, alpha, beta, gamma)
    }

    /// 计算晶格体积 (Å³)
    pub fn volume(&self) -> f64 {
        let [a, b, c] = self.matrix;
        // 行列式计算
        a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
            + a[2] * (b[0] * c[1] - b[1] * c[0])
    }
}

/// 原子信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Atom {
    /// 元素符号（已去除数字标签，如 Fe1 -> Fe）
    pub species: String,

    /// 分数坐标 [x, y, z]
    pub position: [f64; 3],
}

impl Atom {
    pub fn new(species: impl Into<String>, position: [f64; 3]) -> Self {
        Atom {
            species: species.into(),
            position,
        }
    }
}

/// pw.x 输出的某一步重建出的晶体结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Structure {
    /// 晶格 (Å)
    pub lattice: Lattice,

    /// 原子列表（顺序与输出一致）
    pub atoms: Vec<Atom>,
}

impl Structure {
    /// 由晶格和 (物种, 分数坐标) 序列构建；物种标签中的数字会被剥离
    pub fn new(lattice: Lattice, sites: &[(String, [f64; 3])]) -> Self {
        let atoms = sites
            .iter()
            .map(|(label, pos)| {
                let species: String = label.chars().filter(|c| !c.is_ascii_digit()).collect();
                Atom::new(species, *pos)
            })
            .collect();
        Structure { lattice, atoms }
    }

    /// 元素符号序列
    pub fn species(&self) -> Vec<&str> {
        self.atoms.iter().map(|a| a.species.as_str()).collect()
    }

    /// 计算化学式
    pub fn formula(&self) -> String {
        use std::collections::BTreeMap;
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

        for atom in &self.atoms {
            *counts.entry(atom.species.as_str()).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .map(|(el, count)| {
                if count == 1 {
                    el.to_string()
                } else {
                    format!("{}{}", el, count)
                }
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// 原子数
    pub fn n_atoms(&self) -> usize {
        self.atoms.len()
    }
}
