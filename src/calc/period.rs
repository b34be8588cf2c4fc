use serde::{Deserialize, Serialize};

use super::evolution::{compare_tiers, Direction, TierMovement};
use super::score::AssessmentResult;
use super::types::{AssessmentKind, InclusionPolicy, TierCode};
use super::{guarded_mean, round_off_1_decimal};
use crate::config::{EngineConfig, PeriodWeights};
use crate::error::{EngineError, Result};

/// Component averages as percentages (0-100). `None` means nothing graded yet.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentAverages {
    pub evaluations: Option<f64>,
    pub class_work: Option<f64>,
    pub home_work: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedWeights {
    pub evaluations: f64,
    pub class_work: f64,
    pub home_work: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodGrade {
    /// Final grade on the 0-10 scale, `None` when no component is graded.
    pub grade: Option<f64>,
    pub base_grade: Option<f64>,
    pub evolution_factor: f64,
    /// Weights after renormalisation; excluded components get 0.
    pub applied_weights: AppliedWeights,
    pub no_data: bool,
}

fn check_percent(field: &str, v: Option<f64>) -> Result<()> {
    match v {
        Some(p) if !p.is_finite() || !(0.0..=100.0).contains(&p) => Err(EngineError::invalid(
            field,
            format!("{} is outside [0, 100]", p),
        )),
        _ => Ok(()),
    }
}

pub fn compute_grade(
    components: &ComponentAverages,
    evolution_factor: f64,
    weights: &PeriodWeights,
) -> Result<PeriodGrade> {
    check_percent("evaluations", components.evaluations)?;
    check_percent("classWork", components.class_work)?;
    check_percent("homeWork", components.home_work)?;
    if !evolution_factor.is_finite() || evolution_factor < 0.0 {
        return Err(EngineError::invalid(
            "evolutionFactor",
            format!("{} must be a finite non-negative number", evolution_factor),
        ));
    }

    let parts = [
        (components.evaluations, weights.evaluations),
        (components.class_work, weights.class_work),
        (components.home_work, weights.home_work),
    ];
    let mut sum = 0.0_f64;
    let mut denom = 0.0_f64;
    for (avg, weight) in parts {
        let Some(avg) = avg else {
            continue;
        };
        if weight <= 0.0 {
            continue;
        }
        sum += (avg / 10.0) * weight;
        denom += weight;
    }

    let Some(base) = guarded_mean(sum, denom) else {
        return Ok(PeriodGrade {
            grade: None,
            base_grade: None,
            evolution_factor,
            applied_weights: AppliedWeights::default(),
            no_data: true,
        });
    };

    let applied = |avg: Option<f64>, weight: f64| {
        if avg.is_some() && weight > 0.0 {
            weight / denom
        } else {
            0.0
        }
    };
    let applied_weights = AppliedWeights {
        evaluations: applied(components.evaluations, weights.evaluations),
        class_work: applied(components.class_work, weights.class_work),
        home_work: applied(components.home_work, weights.home_work),
    };

    let grade = (base * evolution_factor).clamp(0.0, 10.0);
    Ok(PeriodGrade {
        grade: Some(round_off_1_decimal(grade)),
        base_grade: Some(round_off_1_decimal(base)),
        evolution_factor,
        applied_weights,
        no_data: false,
    })
}

pub fn evolution_factor_for(direction: Direction, config: &EngineConfig) -> f64 {
    config.evolution_multipliers.factor(direction)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedResult {
    pub kind: AssessmentKind,
    pub result: AssessmentResult,
}

fn kind_average(results: &[GradedResult], kind: AssessmentKind, policy: InclusionPolicy) -> Option<f64> {
    let mut sum = 0.0_f64;
    let mut count = 0.0_f64;
    for r in results.iter().filter(|r| r.kind == kind) {
        match (r.result.scored_percentage(), policy) {
            (Some(p), _) => {
                sum += p;
                count += 1.0;
            }
            (None, InclusionPolicy::Enrolled) => count += 1.0,
            (None, InclusionPolicy::Evaluated) => {}
        }
    }
    guarded_mean(sum, count).map(round_off_1_decimal)
}

/// Averages graded results per component. Diagnostics do not feed the
/// bimester grade and are skipped.
pub fn component_averages(results: &[GradedResult], policy: InclusionPolicy) -> ComponentAverages {
    ComponentAverages {
        evaluations: kind_average(results, AssessmentKind::Evaluation, policy),
        class_work: kind_average(results, AssessmentKind::ClassActivity, policy),
        home_work: kind_average(results, AssessmentKind::HomeActivity, policy),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodReport {
    pub components: ComponentAverages,
    pub movement: TierMovement,
    pub grade: PeriodGrade,
}

pub fn grade_from_results(
    results: &[GradedResult],
    previous_tier: Option<TierCode>,
    current_tier: Option<TierCode>,
    policy: InclusionPolicy,
    config: &EngineConfig,
) -> Result<PeriodReport> {
    let components = component_averages(results, policy);
    let movement = compare_tiers(previous_tier, current_tier);
    let factor = evolution_factor_for(movement.direction, config);
    let grade = compute_grade(&components, factor, &config.period_weights)?;
    Ok(PeriodReport {
        components,
        movement,
        grade,
    })
}
