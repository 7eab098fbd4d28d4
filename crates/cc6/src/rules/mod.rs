//! Declarative rules.
//!
//! A [`Rule`] describes one check as data: its scope, the kind of check, the
//! CV paths it reads and its severity. Rules are grouped into a [`RuleSet`]
//! and interpreted by the [`crate::validation::Evaluator`].

mod cordex;
mod posix;
mod rule;
mod template;

pub use cordex::{
    CONSISTENCY, COORDINATES, DIMENSIONS, FILE_FORMAT, GLOBAL_ATTRIBUTES, PRESENT_VARIABLES,
    VARIABLE_ATTRIBUTES,
};
pub use posix::convert_posix_to_rust;
pub use rule::{
    AllowedSource, Check, Consistency, Normalization, Operand, PatternSource, Prerequisite,
    ReferencedBy, Rule, RuleSet, Scope, Subject, VariableSelector,
};
pub use template::{PathTemplate, Segment, Unbound};
