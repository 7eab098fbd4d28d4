//! Property-based tests for the evaluation engine.
//!
//! These tests use proptest to generate random metadata and verify that
//! evaluation keeps its invariants under all inputs.
//!
//! # Running Property Tests
//!
//! ```bash
//! cargo test -p cc6 --test property_tests
//!
//! # More cases
//! PROPTEST_CASES=10000 cargo test -p cc6 --test property_tests
//! ```

use proptest::prelude::*;
use serde_json::json;

use cc6::metadata::NodeScope;
use cc6::rules::{
    convert_posix_to_rust, AllowedSource, Check, Normalization, PathTemplate, PatternSource, Rule,
    RuleSet, Scope, Subject,
};
use cc6::validation::{first_irregular_step, parse_time_units, spacing_tolerance};
use cc6::{aggregate, CvTable, Disposition, EvaluationContext, Evaluator, MetadataNode, MetadataSnapshot};

// =============================================================================
// Test Strategies
// =============================================================================

/// Attribute values, including whitespace and odd characters.
fn attribute_value() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_\\-\\. ]{0,30}"
}

fn attribute_name() -> impl Strategy<Value = String> {
    "[a-z][a-z_]{0,15}"
}

fn frequencies() -> Vec<&'static str> {
    vec!["1hr", "3hr", "6hr", "day", "mon", "yr", "fx"]
}

fn table() -> CvTable {
    CvTable::from_value(
        "CORDEX-CMIP6",
        "test",
        &json!({"CV": {"CV": {
            "frequency": frequencies(),
            "domain_id": {"EUR-12": {"domain": "Europe"}, "AFR-50": {"domain": "Africa"}},
            "driving_variant_label": "r[[:digit:]]\\{1,\\}i[[:digit:]]\\{1,\\}p[[:digit:]]\\{1,\\}f[[:digit:]]\\{1,\\}$"
        }}}),
    )
    .unwrap()
}

fn membership(attribute: &str) -> Rule {
    Rule::new(
        format!("{}_valid", attribute),
        "Global Attributes",
        Scope::Global,
        Check::Membership {
            subject: Subject::Attribute(attribute.to_string()),
            allowed: vec![AllowedSource::Cv {
                path: PathTemplate::parse(&format!("CV.CV.{}", attribute)).unwrap(),
            }],
            normalization: Normalization::default(),
        },
    )
    .requires_attribute(attribute)
}

fn rules() -> RuleSet {
    RuleSet::new(vec![
        membership("frequency"),
        membership("domain_id"),
        membership("realm"),
        Rule::new(
            "driving_variant_label_format",
            "Global Attributes",
            Scope::Global,
            Check::Pattern {
                attribute: "driving_variant_label".to_string(),
                pattern: PatternSource::Cv(PathTemplate::parse("CV.CV.driving_variant_label").unwrap()),
            },
        )
        .requires_attribute("driving_variant_label"),
    ])
    .unwrap()
}

fn snapshot(attrs: &[(String, String)]) -> MetadataSnapshot {
    let node = attrs
        .iter()
        .fold(MetadataNode::new(NodeScope::Global), |node, (k, v)| node.with_text(k.as_str(), v.as_str()));
    MetadataSnapshot::new(node)
}

fn evaluate(table: &CvTable, rules: &RuleSet, snapshot: &MetadataSnapshot) -> Vec<cc6::RuleResult> {
    Evaluator::new(table, rules, EvaluationContext::new(snapshot)).evaluate_all()
}

// =============================================================================
// Evaluation
// =============================================================================

proptest! {
    /// Identical inputs give identical reports.
    #[test]
    fn evaluation_is_deterministic(
        frequency in attribute_value(),
        domain in attribute_value(),
        label in attribute_value(),
    ) {
        let table = table();
        let rules = rules();
        let snapshot = snapshot(&[
            ("frequency".into(), frequency),
            ("domain_id".into(), domain),
            ("driving_variant_label".into(), label),
        ]);
        let first = aggregate(evaluate(&table, &rules, &snapshot));
        let second = aggregate(evaluate(&table, &rules, &snapshot));
        prop_assert_eq!(first, second);
    }

    /// Every rule yields one result and skipped results are never scored.
    #[test]
    fn counts_are_consistent(
        attrs in prop::collection::vec((attribute_name(), attribute_value()), 0..8),
    ) {
        let table = table();
        let rules = rules();
        let results = evaluate(&table, &rules, &snapshot(&attrs));
        prop_assert_eq!(results.len(), rules.len());

        let report = aggregate(results);
        prop_assert!(report.passed() <= report.total());
        prop_assert_eq!(report.total() + report.skipped(), rules.len());
    }

    /// A key missing from the CV never fails the dataset.
    #[test]
    fn cv_gaps_skip(value in attribute_value()) {
        let table = table();
        let rules = RuleSet::new(vec![membership("realm")]).unwrap();
        let results = evaluate(&table, &rules, &snapshot(&[("realm".into(), value)]));
        prop_assert_eq!(results[0].disposition(), Disposition::Skip);
    }

    /// Allowed values pass, anything else fails.
    #[test]
    fn membership_is_exact(index in 0usize..7, suffix in "[a-zA-Z0-9]{1,5}") {
        let table = table();
        let rules = RuleSet::new(vec![membership("frequency")]).unwrap();
        let allowed = frequencies()[index].to_string();

        let results = evaluate(&table, &rules, &snapshot(&[("frequency".into(), allowed.clone())]));
        prop_assert_eq!(results[0].disposition(), Disposition::Pass);

        let results = evaluate(&table, &rules, &snapshot(&[("frequency".into(), format!("{}{}", allowed, suffix))]));
        prop_assert_eq!(results[0].disposition(), Disposition::Fail);
    }

    /// Generated variant labels always match the CV pattern.
    #[test]
    fn variant_labels_match(r in 1u32..200, i in 1u32..20, p in 1u32..20, f in 1u32..20) {
        let table = table();
        let rules = rules();
        let label = format!("r{}i{}p{}f{}", r, i, p, f);
        let results = evaluate(&table, &rules, &snapshot(&[("driving_variant_label".into(), label)]));
        let format = results
            .iter()
            .find(|r| r.rule_id() == "driving_variant_label_format")
            .unwrap();
        prop_assert_eq!(format.disposition(), Disposition::Pass);
    }
}

// =============================================================================
// Helpers
// =============================================================================

proptest! {
    /// Conversion never panics.
    #[test]
    fn posix_conversion_never_panics(input in "\\PC{0,60}") {
        let _ = convert_posix_to_rust(&input);
    }

    /// Patterns without POSIX syntax are left untouched.
    #[test]
    fn posix_conversion_keeps_plain_text(input in "[a-zA-Z0-9_\\-]{0,40}") {
        prop_assert_eq!(convert_posix_to_rust(&input), input);
    }

    /// Template parsing never panics.
    #[test]
    fn template_parse_never_panics(input in "[a-z{}:._]{0,40}") {
        let _ = PathTemplate::parse(&input);
    }

    /// Evenly spaced daily values are accepted for `day`.
    #[test]
    fn regular_daily_steps_pass(start in -1000.0f64..1000.0, len in 2usize..50) {
        let units = parse_time_units("days since 1949-12-01").unwrap();
        let tolerance = spacing_tolerance("day").unwrap();
        let values: Vec<f64> = (0..len).map(|i| start + i as f64).collect();
        prop_assert_eq!(first_irregular_step(&values, &units, &tolerance), None);
    }
}
