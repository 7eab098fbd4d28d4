//! Check command - run the registered checks on a dataset header.

use std::path::{Path, PathBuf};

use cc6::{
    AggregateReport, Cc6Checker, CheckerConfig, DatasetHeader, Disposition, GroupReport,
    HostResult, Severity,
};
use colored::Colorize;

use crate::cli::TablesArgs;

/// Returns `Ok(false)` when an error-severity rule failed.
pub fn run(
    file: PathBuf,
    tables: TablesArgs,
    rules: Option<PathBuf>,
    check: Option<String>,
    all: bool,
    json_output: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let config = CheckerConfig::default()
        .with_tables_path_option(tables.tables)
        .with_project(tables.project)
        .with_version(tables.cv_version)
        .with_flat_tables(tables.flat);
    let checker = Cc6Checker::new(config)?.with_rules(super::load_rules(rules.as_deref())?);
    let header = DatasetHeader::load(&file)?;

    if let Some(name) = check {
        let result = checker.run_check(&name, &header)?;
        if json_output {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print_host_result(&result);
        }
        return Ok(result.level < 3 || result.value.0 == result.value.1);
    }

    let report = checker.check_all(&header)?;
    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&file, &report, all);
    }
    Ok(!report.has_errors())
}

fn print_report(file: &Path, report: &AggregateReport, all: bool) {
    println!(
        "{} {}",
        "Compliance report for".cyan().bold(),
        file.display().to_string().white()
    );
    if let Some(cv) = &report.cv {
        println!(
            "CV: {} {} ({})",
            cv.project,
            cv.version,
            &cv.digest[..cv.digest.len().min(12)]
        );
    }
    println!();

    for group in &report.groups {
        print_group(group, all);
    }

    let summary = format!(
        "{}/{} passed, {} skipped",
        report.passed(),
        report.total(),
        report.skipped()
    );
    if report.has_errors() {
        println!("{} {}", "Not compliant:".red().bold(), summary);
    } else if report.passed() < report.total() {
        println!("{} {}", "Compliant with warnings:".yellow().bold(), summary);
    } else {
        println!("{} {}", "Compliant:".green().bold(), summary);
    }
}

fn print_group(group: &GroupReport, all: bool) {
    let score = format!("{}/{}", group.passed, group.total);
    let score = if group.is_clean() {
        score.green()
    } else if group.messages().iter().any(|(s, _)| *s == Severity::Error) {
        score.red()
    } else {
        score.yellow()
    };
    println!("{} {}", group.name.yellow().bold(), score);

    for result in &group.results {
        let marker = match result.disposition() {
            Disposition::Fail => "✗".red(),
            Disposition::Warn => "!".yellow(),
            Disposition::Pass if all => "✓".green(),
            Disposition::Skip if all => "-".dimmed(),
            _ => continue,
        };
        println!("  {} {}", marker, result.message());
    }
    println!();
}

fn print_host_result(result: &HostResult) {
    let label = match result.level {
        3 => "Required",
        2 => "Recommended",
        _ => "Suggested",
    };
    println!(
        "{} [{}] {}/{}",
        result.name.yellow().bold(),
        label,
        result.value.0,
        result.value.1
    );
    for message in &result.msgs {
        println!("  {} {}", "✗".red(), message);
    }
}
