//! Rule evaluation and its results.

mod calendar;
mod evaluator;
mod outcome;
mod shape;
mod time;

pub use calendar::{Calendar, CalendarDateTime};
pub use evaluator::{evaluate, EvaluationContext, Evaluator};
pub use outcome::{Disposition, RuleResult, Severity, Target};
pub use shape::{DimensionSpec, ShapeTemplate};
pub use time::{
    chunk_years, expected_chunk, first_irregular_step, parse_time_units, spacing_tolerance,
    ChunkBounds, SpacingTolerance, TimeSampling, TimeUnits,
};
