//! Rules command - print the built-in rule set.

use cc6::RuleSet;

pub fn run() -> Result<bool, Box<dyn std::error::Error>> {
    let rules = RuleSet::cordex_cmip6()?;
    println!("{}", serde_json::to_string_pretty(&rules)?);
    Ok(true)
}
