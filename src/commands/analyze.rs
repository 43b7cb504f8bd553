//! # analyze 子命令实现
//!
//! 解析单个 pw.x 输出文件并打印报告。
//!
//! ## 功能
//! - 正则模式表或逐行扫描两种引擎
//! - 终端摘要表格、结构序列、成败与警告
//! - 完整提取报告的 JSON 导出
//!
//! ## 依赖关系
//! - 使用 `cli/analyze.rs` 定义的参数
//! - 使用 `parsers/pwout.rs`, `parsers/scanner.rs`
//! - 使用 `models/report.rs`, `utils/output.rs`

use crate::cli::analyze::{AnalyzeArgs, ParseEngine};
use crate::error::{DftmanError, Result};
use crate::models::{PwReport, Structure};
use crate::parsers::{LineScanner, PwOutput};
use crate::utils::output;

use std::fs;
use std::path::Path;
use tabled::{Table, Tabled};

/// 摘要表格的一行
#[derive(Debug, Clone, Tabled)]
struct QuantityRow {
    #[tabled(rename = "Quantity")]
    quantity: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn row(quantity: &str, value: Option<String>) -> Option<QuantityRow> {
    value.map(|value| QuantityRow {
        quantity: quantity.to_string(),
        value,
    })
}

/// 执行 analyze 命令
pub fn execute(args: AnalyzeArgs) -> Result<()> {
    if !args.input.is_file() {
        return Err(DftmanError::FileNotFound {
            path: args.input.display().to_string(),
        });
    }

    output::print_header(&format!("Analyzing '{}'", args.input.display()));
    output::print_info(&format!("Parse engine: {}", args.engine));

    match args.engine {
        ParseEngine::Regex => analyze_regex(&args),
        ParseEngine::Lines => {
            if args.json.is_some() {
                return Err(DftmanError::InvalidArgument(
                    "--json requires the regex engine".to_string(),
                ));
            }
            analyze_lines(&args.input)
        }
    }
}

fn analyze_regex(args: &AnalyzeArgs) -> Result<()> {
    let pw = PwOutput::from_file(&args.input)?;

    let (succeeded, reasons) = pw.succeeded();
    print_status(succeeded, &reasons);
    for warning in pw.minor_warnings() {
        output::print_warning(&warning);
    }

    let structures = pw.structures();
    let rows: Vec<QuantityRow> = [
        row(
            "Final energy (eV)",
            pw.final_energy_ev()
                .map(|(e, source)| format!("{:.6}  [{}]", e, source)),
        ),
        row(
            "Final enthalpy (eV)",
            pw.final_enthalpy_ev().map(|v| format!("{:.6}", v)),
        ),
        row(
            "First SCF energy (eV)",
            pw.initial_total_energy_ev().map(|v| format!("{:.6}", v)),
        ),
        row(
            "Fermi energy (eV)",
            pw.fermi_energy_ev().map(|v| format!("{:.4}", v)),
        ),
        row(
            "Initial pressure (GPa)",
            pw.initial_pressure_gpa()
                .filter(|_| pw.quantities.sequence("total_stress").len() > 1)
                .map(|v| format!("{:.4}", v)),
        ),
        row(
            "Pressure (GPa)",
            pw.final_pressure_gpa().map(|v| format!("{:.4}", v)),
        ),
        row(
            "Stress diag (GPa)",
            pw.final_stress_gpa()
                .map(|m| format!("{:.4} {:.4} {:.4}", m[0][0], m[1][1], m[2][2])),
        ),
        row(
            "Stress diag (eV/Å³)",
            pw.final_stress_ev_a3()
                .map(|m| format!("{:.6} {:.6} {:.6}", m[0][0], m[1][1], m[2][2])),
        ),
        row(
            "Total force (Ry/au)",
            pw.total_force().map(|v| format!("{:.6}", v)),
        ),
        row("Max force component (Ry/au)", {
            let max = pw
                .forces()
                .iter()
                .flat_map(|r| r.force.iter())
                .fold(0.0f64, |m, x| m.max(x.abs()));
            (!pw.forces().is_empty()).then(|| format!("{:.6}", max))
        }),
        row(
            "Total magnetization (Bohr mag/cell)",
            pw.total_magnetization().map(|v| format!("{:.4}", v)),
        ),
        row(
            "Absolute magnetization (Bohr mag/cell)",
            pw.absolute_magnetization().map(|v| format!("{:.4}", v)),
        ),
        row("Atoms", pw.n_atoms().map(|v| v.to_string())),
        row("Atomic species", pw.n_species().map(|v| v.to_string())),
        row("K-points", pw.n_kpoints().map(|v| v.to_string())),
        row("alat (bohr)", pw.alat_bohr().map(|v| format!("{:.4}", v))),
        row(
            "Initial volume (Å³)",
            pw.initial_volume_a3().map(|v| format!("{:.4}", v)),
        ),
        row(
            "SCF steps",
            Some(pw.energies_ev().len()).filter(|n| *n > 0).map(|n| n.to_string()),
        ),
        row("Structures", Some(structures.len().to_string())),
        row(
            "Walltime (s)",
            pw.walltime_seconds().map(|v| format!("{:.2}", v)),
        ),
    ]
    .into_iter()
    .flatten()
    .collect();

    if rows.is_empty() {
        return Err(DftmanError::InvalidOutput(format!(
            "no recognizable pw.x content in '{}'",
            args.input.display()
        )));
    }

    println!("{}", Table::new(&rows));

    if args.structures {
        for (i, structure) in structures.iter().enumerate() {
            print_structure(&format!("Structure {}", i + 1), structure);
        }
    } else {
        if let Some(initial) = structures.first() {
            print_structure("Initial structure", initial);
        }
        if structures.len() > 1 {
            if let Some(fin) = structures.last() {
                print_structure("Final structure", fin);
            }
        }
    }

    if let Some(ref json_path) = args.json {
        write_json_report(&pw, json_path)?;
        output::print_success(&format!("Report saved to '{}'", json_path.display()));
    }

    Ok(())
}

fn analyze_lines(input: &Path) -> Result<()> {
    let text = fs::read_to_string(input).map_err(|e| DftmanError::FileReadError {
        path: input.display().to_string(),
        source: e,
    })?;
    let scanner = LineScanner::new(&text);

    let (succeeded, reasons) = scanner.succeeded();
    print_status(succeeded, &reasons);

    let rows: Vec<QuantityRow> = [
        row(
            "Final energy (eV)",
            scanner.final_energy_ev().map(|v| format!("{:.6}", v)),
        ),
        row(
            "Fermi energy (eV)",
            scanner.fermi_energy_ev().map(|v| format!("{:.4}", v)),
        ),
        row(
            "Pressure (GPa)",
            scanner.final_pressure_gpa().map(|v| format!("{:.4}", v)),
        ),
        row(
            "Walltime (s)",
            scanner.walltime_seconds().map(|v| format!("{:.2}", v)),
        ),
    ]
    .into_iter()
    .flatten()
    .collect();

    if rows.is_empty() {
        return Err(DftmanError::InvalidOutput(format!(
            "no recognizable pw.x content in '{}'",
            input.display()
        )));
    }

    println!("{}", Table::new(&rows));

    if let Some(initial) = scanner.initial_structure() {
        print_structure("Initial structure", &initial);
    }
    if let Some(fin) = scanner.final_structure() {
        print_structure("Final structure", &fin);
    }

    Ok(())
}

fn print_status(succeeded: bool, reasons: &[String]) {
    if succeeded {
        output::print_success("Run finished successfully");
    } else {
        output::print_error("Run FAILED");
        for reason in reasons {
            output::print_error(&format!("  - {}", reason));
        }
    }
}

fn print_structure(title: &str, structure: &Structure) {
    let (a, b, c, alpha, beta, gamma) = structure.lattice.parameters();
    output::print_info(&format!(
        "{}: {} | a={:.4} b={:.4} c={:.4} Å | α={:.2} β={:.2} γ={:.2}° | V={:.4} Å³",
        title,
        structure.formula(),
        a,
        b,
        c,
        alpha,
        beta,
        gamma,
        structure.lattice.volume()
    ));
}

/// 写出完整提取报告
fn write_json_report(pw: &PwOutput, path: &Path) -> Result<()> {
    let report = PwReport::from_output(pw);
    let json = serde_json::to_string_pretty(&report)?;
    fs::write(path, json).map_err(|e| DftmanError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(())
}
