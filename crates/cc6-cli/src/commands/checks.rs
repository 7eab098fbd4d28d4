//! Checks command - list the registered checks.

use std::path::PathBuf;

use cc6::{Cc6Checker, CheckerConfig};
use colored::Colorize;

pub fn run(rules: Option<PathBuf>, json_output: bool) -> Result<bool, Box<dyn std::error::Error>> {
    let checker =
        Cc6Checker::new(CheckerConfig::from_env())?.with_rules(super::load_rules(rules.as_deref())?);
    let checks = checker.checks();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&checks)?);
        return Ok(true);
    }

    println!("{}", "Registered checks:".cyan().bold());
    for check in &checks {
        let rules = checker.rules().in_group(&check.group).count();
        println!(
            "  {:<32} {:<22} level {}  ({} rules)",
            check.name.white(),
            check.group,
            check.level,
            rules
        );
    }
    Ok(true)
}
