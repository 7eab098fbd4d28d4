//! CLI command implementations.

pub mod check;
pub mod checks;
pub mod rules;

use std::path::Path;

use cc6::{Cc6Error, RuleSet};

/// Load a rule set file, or the built-in rules when no path is given.
pub fn load_rules(path: Option<&Path>) -> Result<RuleSet, Cc6Error> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|source| Cc6Error::Io {
                path: path.to_path_buf(),
                source,
            })?;
            RuleSet::from_json_str(&json)
        }
        None => RuleSet::cordex_cmip6(),
    }
}
