//! The built-in CORDEX-CMIP6 rule set.
//!
//! Paths assume the merged table layout produced by [`crate::cv::CvTable`]:
//! the CV document is reached as `CV.CV.<key>`, MIP tables by frequency
//! (`day.variable_entry.tas`), axes through `coordinate.axis_entry` and
//! `grids.axis_entry`.

use crate::error::{Cc6Error, Result};
use crate::validation::Severity;

use super::rule::{
    AllowedSource, Check, Consistency, Normalization, Operand, PatternSource, ReferencedBy, Rule,
    RuleSet, Scope, Subject, VariableSelector,
};
use super::template::PathTemplate;

pub const GLOBAL_ATTRIBUTES: &str = "Global Attributes";
pub const CONSISTENCY: &str = "Consistency";
pub const PRESENT_VARIABLES: &str = "Present Variables";
pub const VARIABLE_ATTRIBUTES: &str = "Variable Attributes";
pub const DIMENSIONS: &str = "Dimensions";
pub const COORDINATES: &str = "Coordinates";
pub const FILE_FORMAT: &str = "File Format";

/// Global attributes whose value must be a key (or member) of `CV.CV.<name>`.
const CV_MEMBERSHIP: &[&str] = &[
    "activity_id",
    "domain_id",
    "driving_experiment_id",
    "driving_source_id",
    "frequency",
    "institution_id",
    "mip_era",
    "product",
    "project_id",
    "source_id",
    "source_type",
];

/// Global attributes checked against POSIX patterns stored in the CV.
const CV_PATTERNS: &[&str] = &["driving_variant_label", "version_realization"];

/// Data variable attributes that must equal the MIP table entry.
const VARIABLE_ENTRY_ATTRIBUTES: &[&str] = &["standard_name", "units", "long_name", "cell_methods"];

const CREATION_DATE_PATTERN: &str = r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z";
const TRACKING_ID_PATTERN: &str =
    r"hdl:21\.14103/[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}";

fn path(text: &str) -> Result<PathTemplate> {
    PathTemplate::parse(text).map_err(Cc6Error::Config)
}

fn cv(text: &str) -> Result<AllowedSource> {
    Ok(AllowedSource::Cv { path: path(text)? })
}

fn out_names(map: &str) -> Result<AllowedSource> {
    Ok(AllowedSource::CvField {
        map: path(map)?,
        field: "out_name".to_string(),
    })
}

fn data() -> Scope {
    Scope::Variable(VariableSelector::Data)
}

fn time() -> Scope {
    Scope::Variable(VariableSelector::Named("time".to_string()))
}

impl RuleSet {
    /// The CORDEX-CMIP6 rules, grouped as reported to the host.
    pub fn cordex_cmip6() -> Result<Self> {
        let mut rules = Vec::new();

        // Global Attributes
        rules.push(Rule::new(
            "required_global_attributes",
            GLOBAL_ATTRIBUTES,
            Scope::Global,
            Check::RequiredAttributes {
                list: path("CV.CV.required_global_attributes")?,
            },
        ));
        for attribute in CV_MEMBERSHIP {
            rules.push(
                Rule::new(
                    format!("{}_valid", attribute),
                    GLOBAL_ATTRIBUTES,
                    Scope::Global,
                    Check::Membership {
                        subject: Subject::Attribute(attribute.to_string()),
                        allowed: vec![cv(&format!("CV.CV.{}", attribute))?],
                        normalization: Normalization::default(),
                    },
                )
                .requires_attribute(*attribute),
            );
        }
        for attribute in CV_PATTERNS {
            rules.push(
                Rule::new(
                    format!("{}_format", attribute),
                    GLOBAL_ATTRIBUTES,
                    Scope::Global,
                    Check::Pattern {
                        attribute: attribute.to_string(),
                        pattern: PatternSource::Cv(path(&format!("CV.CV.{}", attribute))?),
                    },
                )
                .requires_attribute(*attribute),
            );
        }
        rules.push(
            Rule::new(
                "creation_date_format",
                GLOBAL_ATTRIBUTES,
                Scope::Global,
                Check::Pattern {
                    attribute: "creation_date".to_string(),
                    pattern: PatternSource::Literal(CREATION_DATE_PATTERN.to_string()),
                },
            )
            .requires_attribute("creation_date"),
        );
        rules.push(
            Rule::new(
                "tracking_id_format",
                GLOBAL_ATTRIBUTES,
                Scope::Global,
                Check::Pattern {
                    attribute: "tracking_id".to_string(),
                    pattern: PatternSource::Literal(TRACKING_ID_PATTERN.to_string()),
                },
            )
            .with_severity(Severity::Warning)
            .requires_attribute("tracking_id"),
        );

        // Consistency
        for (key, value, field) in [
            ("institution_id", "institution", None),
            ("domain_id", "domain", Some("domain")),
            ("driving_experiment_id", "driving_experiment", None),
        ] {
            rules.push(
                Rule::new(
                    format!("{}_matches_{}", value, key),
                    CONSISTENCY,
                    Scope::Global,
                    Check::CrossConsistency(Consistency::Paired {
                        key: key.to_string(),
                        value: value.to_string(),
                        entries: path(&format!("CV.CV.{}", key))?,
                        field: field.map(str::to_string),
                    }),
                )
                .requires_rule(format!("{}_valid", key)),
            );
        }
        rules.push(
            Rule::new(
                "variable_id_matches_data_variable",
                CONSISTENCY,
                Scope::Global,
                Check::CrossConsistency(Consistency::Equals {
                    left: Operand::Global("variable_id".to_string()),
                    right: Operand::DataVariableName,
                }),
            )
            .requires_attribute("variable_id"),
        );
        rules.push(
            Rule::new(
                "frequency_matches_table",
                CONSISTENCY,
                Scope::Global,
                Check::CrossConsistency(Consistency::Equals {
                    left: Operand::Global("frequency".to_string()),
                    right: Operand::Cv(path("{attr:frequency}.variable_entry.{variable}.frequency")?),
                }),
            )
            .requires_rule("frequency_valid"),
        );
        rules.push(
            Rule::new(
                "time_spacing_matches_frequency",
                CONSISTENCY,
                Scope::Global,
                Check::CrossConsistency(Consistency::TimeSpacing {
                    frequency: "frequency".to_string(),
                    time: "time".to_string(),
                }),
            )
            .requires_rule("frequency_valid"),
        );
        rules.push(
            Rule::new(
                "time_chunking",
                CONSISTENCY,
                Scope::Global,
                Check::CrossConsistency(Consistency::TimeChunking {
                    frequency: "frequency".to_string(),
                    time: "time".to_string(),
                    cell_methods: Operand::DataAttribute("cell_methods".to_string()),
                }),
            )
            .with_severity(Severity::Warning)
            .requires_rule("frequency_valid"),
        );

        // Present Variables
        rules.push(Rule::new(
            "data_variable_identified",
            PRESENT_VARIABLES,
            Scope::Global,
            Check::DataVariable,
        ));
        rules.push(Rule::new(
            "variables_known",
            PRESENT_VARIABLES,
            Scope::Variable(VariableSelector::All),
            Check::Membership {
                subject: Subject::Name,
                allowed: vec![
                    out_names("grids.axis_entry")?,
                    out_names("grids.variable_entry")?,
                    out_names("coordinate.axis_entry")?,
                    out_names("formula_terms.formula_entry")?,
                    AllowedSource::Referenced {
                        attribute: "bounds".to_string(),
                        by: ReferencedBy::KnownVariable,
                    },
                    AllowedSource::Referenced {
                        attribute: "grid_mapping".to_string(),
                        by: ReferencedBy::DataVariable,
                    },
                    AllowedSource::DataVariable,
                ],
                normalization: Normalization {
                    trim: false,
                    fold_case: false,
                },
            },
        ));

        // Variable Attributes
        for attribute in VARIABLE_ENTRY_ATTRIBUTES {
            rules.push(
                Rule::new(
                    format!("{}_present", attribute),
                    VARIABLE_ATTRIBUTES,
                    data(),
                    Check::Presence {
                        attribute: attribute.to_string(),
                    },
                )
                .requires_attribute("frequency"),
            );
            rules.push(
                Rule::new(
                    format!("{}_matches_table", attribute),
                    VARIABLE_ATTRIBUTES,
                    data(),
                    Check::Membership {
                        subject: Subject::Attribute(attribute.to_string()),
                        allowed: vec![cv(&format!(
                            "{{attr:frequency}}.variable_entry.{{variable}}.{}",
                            attribute
                        ))?],
                        normalization: Normalization::default(),
                    },
                )
                .requires_rule("frequency_valid"),
            );
        }
        for attribute in ["units", "calendar"] {
            rules.push(
                Rule::new(
                    format!("time_{}_present", attribute),
                    VARIABLE_ATTRIBUTES,
                    time(),
                    Check::Presence {
                        attribute: attribute.to_string(),
                    },
                )
                .requires_attribute("frequency"),
            );
        }

        // Dimensions
        rules.push(
            Rule::new(
                "data_variable_dimensions",
                DIMENSIONS,
                data(),
                Check::Shape {
                    template: path("{attr:frequency}.variable_entry.{variable}.dimensions")?,
                    axes: vec![path("coordinate.axis_entry")?, path("grids.axis_entry")?],
                },
            )
            .requires_rule("frequency_valid"),
        );

        // Coordinates
        rules.push(
            Rule::new(
                "coordinate_variables_present",
                COORDINATES,
                Scope::Dimension,
                Check::CoordinateVariable {
                    exempt: vec!["bnds".to_string(), "vertices".to_string()],
                },
            )
            .with_severity(Severity::Warning),
        );

        // File Format
        rules.push(Rule::new(
            "file_format",
            FILE_FORMAT,
            Scope::Global,
            Check::FileFormat {
                data_model: "NETCDF4_CLASSIC".to_string(),
                disk_format: "HDF5".to_string(),
            },
        ));
        rules.push(
            Rule::new(
                "compression",
                FILE_FORMAT,
                data(),
                Check::Compression {
                    deflate_level: 1,
                    shuffle: true,
                },
            )
            .with_severity(Severity::Warning),
        );

        RuleSet::new(rules)
    }
}
