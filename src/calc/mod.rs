//! Classification and scoring engine. Every function here is pure: inputs
//! are borrowed value objects, outputs are freshly built.

pub mod class;
pub mod competency;
pub mod diagnostic;
pub mod evolution;
pub mod period;
pub mod score;
pub mod tier;
pub mod types;

pub use types::{
    effective_tier, AnswerMark, AssessmentKind, Competency, DiagnosticId, InclusionPolicy,
    MarkValue, Tier, TierCode,
};

/// Half-up rounding to one decimal: `floor(10*x + 0.5) / 10`.
pub fn round_off_1_decimal(x: f64) -> f64 {
    ((10.0 * x) + 0.5).floor() / 10.0
}

/// Half-up rounding to a whole percentage.
pub fn round_half_up(x: f64) -> u32 {
    (x + 0.5).floor().max(0.0) as u32
}

/// Mean of `sum / count`, `None` when nothing was counted.
pub(crate) fn guarded_mean(sum: f64, count: f64) -> Option<f64> {
    if count > 0.0 {
        Some(sum / count)
    } else {
        None
    }
}
