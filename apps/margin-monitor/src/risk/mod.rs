//! Risk evaluation.
//!
//! Pure functions over a margin snapshot; the scheduler owns all I/O.

mod evaluator;
mod types;

pub use evaluator::evaluate;
pub use types::{
    DenominatorSource, Evaluation, MarginSnapshot, RatioOutcome, RiskAssessment, RiskThresholds,
    RuleKind,
};
