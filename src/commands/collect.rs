//! # collect 子命令实现
//!
//! 批量收集 pw.x 输出文件，按最终能量排序并导出汇总。
//!
//! ## 功能
//! - 扫描目录并按 glob 模式收集输出文件
//! - rayon 并行解析
//! - 终端排名表格与完整 CSV 汇总
//! - 可选的逐运行 JSON 报告
//!
//! ## 依赖关系
//! - 使用 `cli/collect.rs` 定义的参数
//! - 使用 `batch/collector.rs`, `batch/runner.rs`
//! - 使用 `parsers/pwout.rs`, `models/report.rs`
//! - 使用 `utils/output.rs`

use crate::batch::{BatchRunner, FileCollector};
use crate::cli::collect::CollectArgs;
use crate::error::{DftmanError, Result};
use crate::models::{PwReport, RunSummary};
use crate::parsers::PwOutput;
use crate::utils::{output, progress};

use std::fs;
use std::path::Path;
use tabled::{Table, Tabled};

/// 排名表格的一行
#[derive(Debug, Clone, Tabled)]
struct RankRow {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "E_final (eV)")]
    energy: String,
    #[tabled(rename = "ΔE (eV)")]
    delta_e: String,
    #[tabled(rename = "Formula")]
    formula: String,
    #[tabled(rename = "Atoms")]
    atoms: String,
    #[tabled(rename = "Wall (s)")]
    walltime: String,
}

/// 执行 collect 命令
pub fn execute(args: CollectArgs) -> Result<()> {
    output::print_header("Collecting pw.x Outputs");

    if !args.dir.exists() {
        return Err(DftmanError::DirectoryNotFound {
            path: args.dir.display().to_string(),
        });
    }

    let spinner = progress::create_spinner(&format!(
        "Scanning '{}' for '{}'...",
        args.dir.display(),
        args.pattern
    ));
    let files = FileCollector::new(args.dir.clone())
        .with_pattern(&args.pattern)?
        .recursive(args.recursive)
        .collect();
    spinner.finish_and_clear();

    if files.is_empty() {
        return Err(DftmanError::NoFilesFound {
            pattern: args.pattern.clone(),
        });
    }

    output::print_info(&format!("Found {} output file(s)", files.len()));

    let runner = BatchRunner::new(args.jobs);
    let results = runner.run(files, "Parsing", |path| PwOutput::from_file(path));

    let mut outputs = Vec::new();
    let mut parse_failures = 0usize;
    for (path, result) in results {
        match result {
            Ok(pw) => outputs.push(pw),
            Err(e) => {
                parse_failures += 1;
                output::print_error(&format!("{}: {}", path.display(), e));
            }
        }
    }

    if let Some(ref json_dir) = args.json_dir {
        export_json_reports(&outputs, json_dir)?;
        output::print_success(&format!(
            "Per-run reports saved to '{}'",
            json_dir.display()
        ));
    }

    let summaries: Vec<RunSummary> = outputs.iter().map(RunSummary::from_output).collect();

    // 只对成功且有最终能量的运行排名
    let mut ranked: Vec<&RunSummary> = summaries
        .iter()
        .filter(|s| s.succeeded && s.final_energy_ev.is_some())
        .collect();
    ranked.sort_by(|a, b| {
        a.final_energy_ev
            .partial_cmp(&b.final_energy_ev)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    if ranked.is_empty() {
        output::print_warning("No successful runs with a final energy to rank.");
    } else {
        let min_energy = ranked[0].final_energy_ev.unwrap_or(0.0);
        let table_rows: Vec<RankRow> = ranked
            .iter()
            .take(args.top_n)
            .enumerate()
            .map(|(i, s)| {
                let e = s.final_energy_ev.unwrap_or(0.0);
                RankRow {
                    rank: i + 1,
                    file: s.file.clone(),
                    energy: format!("{:.6}", e),
                    delta_e: format!("{:.6}", e - min_energy),
                    formula: s.formula.clone(),
                    atoms: s.n_atoms.map_or_else(|| "-".to_string(), |n| n.to_string()),
                    walltime: s
                        .walltime_s
                        .map_or_else(|| "-".to_string(), |w| format!("{:.1}", w)),
                }
            })
            .collect();

        output::print_header(&format!(
            "Top {} Runs by Final Energy",
            args.top_n.min(ranked.len())
        ));
        println!("{}", Table::new(&table_rows));
    }

    save_summary_csv(&summaries, &args.output_csv)?;
    output::print_success(&format!(
        "Full summary saved to '{}'",
        args.output_csv.display()
    ));

    let failed_runs = summaries.iter().filter(|s| !s.succeeded).count();
    output::print_done(&format!(
        "Collected {} run(s): {} ok, {} failed, {} unreadable",
        summaries.len() + parse_failures,
        summaries.len() - failed_runs,
        failed_runs,
        parse_failures
    ));

    Ok(())
}

/// 逐运行写出完整 JSON 报告
fn export_json_reports(outputs: &[PwOutput], json_dir: &Path) -> Result<()> {
    fs::create_dir_all(json_dir).map_err(|e| DftmanError::FileWriteError {
        path: json_dir.display().to_string(),
        source: e,
    })?;

    for pw in outputs {
        let stem = pw
            .path
            .as_deref()
            .map(Path::new)
            .and_then(|p| p.file_stem())
            .and_then(|s| s.to_str())
            .unwrap_or("run")
            .to_string();
        let json_path = json_dir.join(format!("{}.json", stem));
        let report = PwReport::from_output(pw);
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(&json_path, json).map_err(|e| DftmanError::FileWriteError {
            path: json_path.display().to_string(),
            source: e,
        })?;
    }
    Ok(())
}

/// 保存全部运行（含失败）的 CSV 汇总
fn save_summary_csv(summaries: &[RunSummary], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path).map_err(DftmanError::CsvError)?;

    wtr.write_record([
        "file",
        "succeeded",
        "failure_reasons",
        "final_energy_eV",
        "fermi_energy_eV",
        "pressure_GPa",
        "total_force_Ry_au",
        "n_atoms",
        "formula",
        "volume_A3",
        "walltime_s",
        "n_structures",
    ])
    .map_err(DftmanError::CsvError)?;

    for s in summaries {
        wtr.write_record([
            s.file.clone(),
            s.succeeded.to_string(),
            s.failure_reasons.join("; "),
            s.final_energy_ev
                .map(|v| format!("{:.10}", v))
                .unwrap_or_default(),
            s.fermi_energy_ev
                .map(|v| format!("{:.6}", v))
                .unwrap_or_default(),
            s.pressure_gpa
                .map(|v| format!("{:.6}", v))
                .unwrap_or_default(),
            s.total_force
                .map(|v| format!("{:.6}", v))
                .unwrap_or_default(),
            s.n_atoms.map(|n| n.to_string()).unwrap_or_default(),
            s.formula.clone(),
            s.volume_a3
                .map(|v| format!("{:.6}", v))
                .unwrap_or_default(),
            s.walltime_s
                .map(|v| format!("{:.2}", v))
                .unwrap_or_default(),
            s.n_structures.to_string(),
        ])
        .map_err(DftmanError::CsvError)?;
    }

    wtr.flush().map_err(|e| DftmanError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}
