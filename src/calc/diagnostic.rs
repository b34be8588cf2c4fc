use serde::{Deserialize, Serialize};

use super::score::{compute_sheet, AnswerSheet, AssessmentResult};
use super::tier::classify;
use super::types::{DiagnosticId, Tier, TierCode};
use crate::config::EngineConfig;
use crate::error::Result;

/// One optional value per diagnostic, keyed by id rather than position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerDiagnostic<T> {
    pub d1: Option<T>,
    pub d2: Option<T>,
    pub d3: Option<T>,
}

impl<T> Default for PerDiagnostic<T> {
    fn default() -> Self {
        Self {
            d1: None,
            d2: None,
            d3: None,
        }
    }
}

impl<T> PerDiagnostic<T> {
    pub fn get(&self, id: DiagnosticId) -> Option<&T> {
        match id {
            DiagnosticId::D1 => self.d1.as_ref(),
            DiagnosticId::D2 => self.d2.as_ref(),
            DiagnosticId::D3 => self.d3.as_ref(),
        }
    }

    pub fn set(&mut self, id: DiagnosticId, value: Option<T>) {
        match id {
            DiagnosticId::D1 => self.d1 = value,
            DiagnosticId::D2 => self.d2 = value,
            DiagnosticId::D3 => self.d3 = value,
        }
    }
}

pub type DiagnosticTiers = PerDiagnostic<TierCode>;
pub type DiagnosticSet = PerDiagnostic<AnswerSheet>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticAggregate {
    pub final_tier: Option<Tier>,
    pub weighted_mean: Option<f64>,
    pub considered_count: usize,
    pub missing: Vec<DiagnosticId>,
}

impl DiagnosticAggregate {
    pub fn is_classified(&self) -> bool {
        self.final_tier.is_some()
    }
}

/// Weighted tier of a diagnostic set. Absent (`F`) and missing diagnostics
/// drop their weight from both sides of the mean; a diagnostic whose
/// configured weight is zero is ignored.
pub fn aggregate(tiers: &DiagnosticTiers, config: &EngineConfig) -> Result<DiagnosticAggregate> {
    let mut sum = 0.0_f64;
    let mut denom = 0.0_f64;
    let mut considered_count = 0_usize;
    let mut missing = Vec::new();

    for id in DiagnosticId::ALL {
        let Some(tier) = tiers.get(id).copied().and_then(TierCode::tier) else {
            missing.push(id);
            continue;
        };
        let weight = config.diagnostic_weights.weight(id);
        if weight <= 0.0 {
            continue;
        }
        sum += config.tier_points.points(tier) * weight;
        denom += weight;
        considered_count += 1;
    }

    let Some(mean) = super::guarded_mean(sum, denom) else {
        return Ok(DiagnosticAggregate {
            final_tier: None,
            weighted_mean: None,
            considered_count: 0,
            missing,
        });
    };

    // A mean of tier points cannot leave [a, c]; drop float drift.
    let tp = &config.tier_points;
    let mean = mean.max(tp.a).min(tp.c);
    let final_tier = classify(mean, &config.weighted_scale)?;
    Ok(DiagnosticAggregate {
        final_tier: Some(final_tier),
        weighted_mean: Some(mean),
        considered_count,
        missing,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticSetOutcome {
    pub results: PerDiagnostic<AssessmentResult>,
    pub tiers: DiagnosticTiers,
    pub aggregate: DiagnosticAggregate,
}

/// Scores each present diagnostic, classifies it on the percentage scale
/// (absent sheets become `F`) and aggregates the three tiers.
pub fn classify_set(set: &DiagnosticSet, config: &EngineConfig) -> Result<DiagnosticSetOutcome> {
    let mut results = PerDiagnostic::default();
    let mut tiers = DiagnosticTiers::default();

    for id in DiagnosticId::ALL {
        let Some(sheet) = set.get(id) else {
            continue;
        };
        let result = compute_sheet(sheet)?;
        let code = match result.scored_percentage() {
            Some(p) => TierCode::from(classify(p, &config.percentage_scale)?),
            None => TierCode::F,
        };
        tiers.set(id, Some(code));
        results.set(id, Some(result));
    }

    let aggregate = aggregate(&tiers, config)?;
    Ok(DiagnosticSetOutcome {
        results,
        tiers,
        aggregate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::types::{AnswerMark, MarkValue};

    fn tiers(d1: Option<TierCode>, d2: Option<TierCode>, d3: Option<TierCode>) -> DiagnosticTiers {
        DiagnosticTiers { d1, d2, d3 }
    }

    #[test]
    fn mixed_tiers_weighted_mean() {
        let cfg = EngineConfig::default();
        let agg = aggregate(
            &tiers(Some(TierCode::B), Some(TierCode::A), Some(TierCode::C)),
            &cfg,
        )
        .expect("aggregate");
        let mean = agg.weighted_mean.expect("mean");
        assert!((mean - 11.0 / 6.0).abs() < 1e-12);
        assert_eq!(agg.final_tier, Some(Tier::B));
        assert_eq!(agg.considered_count, 3);
        assert!(agg.missing.is_empty());
    }

    #[test]
    fn uniform_sets_hit_the_extremes() {
        let cfg = EngineConfig::default();
        let c = aggregate(&tiers(Some(TierCode::C), Some(TierCode::C), Some(TierCode::C)), &cfg)
            .unwrap();
        assert_eq!(c.weighted_mean, Some(3.0));
        assert_eq!(c.final_tier, Some(Tier::C));
        let a = aggregate(&tiers(Some(TierCode::A), Some(TierCode::A), Some(TierCode::A)), &cfg)
            .unwrap();
        assert_eq!(a.weighted_mean, Some(1.0));
        assert_eq!(a.final_tier, Some(Tier::A));
    }

    #[test]
    fn all_absent_is_unclassified() {
        let cfg = EngineConfig::default();
        let agg = aggregate(&tiers(Some(TierCode::F), None, Some(TierCode::F)), &cfg).unwrap();
        assert!(!agg.is_classified());
        assert_eq!(agg.weighted_mean, None);
        assert_eq!(agg.considered_count, 0);
        assert_eq!(
            agg.missing,
            vec![DiagnosticId::D1, DiagnosticId::D2, DiagnosticId::D3]
        );
    }

    #[test]
    fn single_present_diagnostic_collapses_to_its_points() {
        let cfg = EngineConfig::default();
        for (id, code, pts) in [
            (DiagnosticId::D1, TierCode::B, 2.0),
            (DiagnosticId::D2, TierCode::C, 3.0),
            (DiagnosticId::D3, TierCode::A, 1.0),
        ] {
            let mut t = DiagnosticTiers::default();
            t.set(id, Some(code));
            let agg = aggregate(&t, &cfg).unwrap();
            assert_eq!(agg.weighted_mean, Some(pts));
            assert_eq!(agg.considered_count, 1);
            assert_eq!(agg.missing.len(), 2);
        }
    }

    #[test]
    fn absent_weight_is_dropped_not_zeroed() {
        let cfg = EngineConfig::default();
        // D1 absent: (3*2 + 1*1) / 3 = 2.333.. -> B, not (0*3 + 6 + 1) / 6.
        let agg = aggregate(&tiers(Some(TierCode::F), Some(TierCode::C), Some(TierCode::A)), &cfg)
            .unwrap();
        assert!((agg.weighted_mean.unwrap() - 7.0 / 3.0).abs() < 1e-12);
        assert_eq!(agg.final_tier, Some(Tier::B));
        assert_eq!(agg.missing, vec![DiagnosticId::D1]);
    }

    #[test]
    fn fractional_weights_stay_inside_the_point_range() {
        let mut cfg = EngineConfig::default();
        for (d1, d2, d3) in [(0.7, 0.2, 0.1), (0.6, 0.3, 0.1)] {
            cfg.diagnostic_weights.d1 = d1;
            cfg.diagnostic_weights.d2 = d2;
            cfg.diagnostic_weights.d3 = d3;
            cfg.validate().expect("valid weights");

            let c = aggregate(&tiers(Some(TierCode::C), Some(TierCode::C), Some(TierCode::C)), &cfg)
                .expect("all C");
            assert_eq!(c.weighted_mean, Some(3.0));
            assert_eq!(c.final_tier, Some(Tier::C));

            let a = aggregate(&tiers(Some(TierCode::A), Some(TierCode::A), Some(TierCode::A)), &cfg)
                .expect("all A");
            assert_eq!(a.weighted_mean, Some(1.0));
            assert_eq!(a.final_tier, Some(Tier::A));
        }
    }

    #[test]
    fn zero_weight_diagnostic_is_ignored() {
        let mut cfg = EngineConfig::default();
        cfg.diagnostic_weights.d3 = 0.0;
        let agg = aggregate(&tiers(Some(TierCode::C), Some(TierCode::C), Some(TierCode::A)), &cfg)
            .unwrap();
        assert_eq!(agg.weighted_mean, Some(3.0));
        assert_eq!(agg.considered_count, 2);
    }

    fn sheet(points: &[f64]) -> AnswerSheet {
        AnswerSheet {
            question_count: points.len(),
            marks: points
                .iter()
                .enumerate()
                .map(|(i, p)| AnswerMark::at(i + 1, MarkValue::from_points(*p).unwrap()))
                .collect(),
            absent: false,
        }
    }

    #[test]
    fn classify_set_scores_then_aggregates() {
        let cfg = EngineConfig::default();
        let mut absent = sheet(&[0.0; 10]);
        absent.absent = true;
        let set = DiagnosticSet {
            d1: Some(sheet(&[1.0, 1.0, 0.5, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0, 1.0])),
            d2: Some(absent),
            d3: Some(sheet(&[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])),
        };
        let out = classify_set(&set, &cfg).expect("classify");
        assert_eq!(out.tiers.d1, Some(TierCode::C));
        assert_eq!(out.tiers.d2, Some(TierCode::F));
        assert_eq!(out.tiers.d3, Some(TierCode::A));
        // (3*3 + 1*1) / 4 = 2.5 -> B
        assert_eq!(out.aggregate.weighted_mean, Some(2.5));
        assert_eq!(out.aggregate.final_tier, Some(Tier::B));
        assert_eq!(out.results.d1.as_ref().map(|r| r.percentage), Some(75.0));
    }

    #[test]
    fn classify_set_propagates_invalid_sheets() {
        let cfg = EngineConfig::default();
        let mut bad = sheet(&[1.0, 1.0]);
        bad.question_count = 10;
        let set = DiagnosticSet {
            d1: Some(bad),
            ..Default::default()
        };
        let err = classify_set(&set, &cfg).expect_err("count mismatch");
        assert_eq!(err.code(), "invalid_input");
    }
}
