//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// cc6: CORDEX-CMIP6 controlled-vocabulary compliance checks
#[derive(Parser)]
#[command(name = "cc6")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Options selecting the CV tables.
#[derive(clap::Args, Clone, Debug)]
pub struct TablesArgs {
    /// Directory with the <project>_<table>.json files
    /// (default: $CORDEXCMIP6TABLESPATH, else ./)
    #[arg(short, long, value_name = "DIR")]
    pub tables: Option<PathBuf>,

    /// CV project
    #[arg(long, default_value = "CORDEX-CMIP6")]
    pub project: String,

    /// CV version; "latest" reads the tables directory itself
    #[arg(long, default_value = "latest")]
    pub cv_version: String,

    /// Read tables from the tables directory whatever the version
    #[arg(long)]
    pub flat: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check a dataset header against the CV
    Check {
        /// Path to the dataset header (xarray to_dict JSON layout)
        #[arg(value_name = "HEADER")]
        file: PathBuf,

        #[command(flatten)]
        tables: TablesArgs,

        /// Rule set JSON replacing the built-in CORDEX-CMIP6 rules
        #[arg(long, value_name = "RULES")]
        rules: Option<PathBuf>,

        /// Run only this check (see `cc6 checks`)
        #[arg(short, long)]
        check: Option<String>,

        /// Show passed and skipped results too
        #[arg(long)]
        all: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the registered checks
    Checks {
        /// Rule set JSON replacing the built-in CORDEX-CMIP6 rules
        #[arg(long, value_name = "RULES")]
        rules: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the built-in rule set as JSON
    Rules,
}
