//! Policy configuration. All weights, thresholds and multiplier tables live
//! here so every engine component reads the same values.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::calc::evolution::Direction;
use crate::calc::tier::{Scheme, TierScale};
use crate::calc::types::{Competency, DiagnosticId, InclusionPolicy, Tier};
use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiagnosticWeights {
    pub d1: f64,
    pub d2: f64,
    pub d3: f64,
}

impl Default for DiagnosticWeights {
    fn default() -> Self {
        Self {
            d1: 3.0,
            d2: 2.0,
            d3: 1.0,
        }
    }
}

impl DiagnosticWeights {
    pub fn weight(&self, id: DiagnosticId) -> f64 {
        match id {
            DiagnosticId::D1 => self.d1,
            DiagnosticId::D2 => self.d2,
            DiagnosticId::D3 => self.d3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TierPoints {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Default for TierPoints {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 2.0,
            c: 3.0,
        }
    }
}

impl TierPoints {
    pub fn points(&self, tier: Tier) -> f64 {
        match tier {
            Tier::A => self.a,
            Tier::B => self.b,
            Tier::C => self.c,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct PeriodWeights {
    pub evaluations: f64,
    pub class_work: f64,
    pub home_work: f64,
}

impl Default for PeriodWeights {
    fn default() -> Self {
        Self {
            evaluations: 0.5,
            class_work: 0.25,
            home_work: 0.25,
        }
    }
}

/// Grade multiplier per tier movement. Factors are deployment policy; all
/// default to 1.0 until confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvolutionMultipliers {
    pub up: f64,
    pub stable: f64,
    pub down: f64,
    pub unknown: f64,
}

impl Default for EvolutionMultipliers {
    fn default() -> Self {
        Self {
            up: 1.0,
            stable: 1.0,
            down: 1.0,
            unknown: 1.0,
        }
    }
}

impl EvolutionMultipliers {
    pub fn factor(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Up => self.up,
            Direction::Stable => self.stable,
            Direction::Down => self.down,
            Direction::Unknown => self.unknown,
        }
    }
}

fn default_layout() -> Vec<Competency> {
    Competency::ALL
        .iter()
        .flat_map(|c| [*c, *c])
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct EngineConfig {
    pub diagnostic_weights: DiagnosticWeights,
    pub tier_points: TierPoints,
    pub percentage_scale: TierScale,
    pub weighted_scale: TierScale,
    pub period_weights: PeriodWeights,
    pub evolution_multipliers: EvolutionMultipliers,
    pub competency_trend_threshold: f64,
    pub score_stable_band: f64,
    /// Competency of each question position (index 0 is question 1).
    pub competency_layout: Vec<Competency>,
    pub inclusion_policy: InclusionPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            diagnostic_weights: DiagnosticWeights::default(),
            tier_points: TierPoints::default(),
            percentage_scale: TierScale::percentage(),
            weighted_scale: TierScale::weighted(),
            period_weights: PeriodWeights::default(),
            evolution_multipliers: EvolutionMultipliers::default(),
            competency_trend_threshold: 10.0,
            score_stable_band: 0.0,
            competency_layout: default_layout(),
            inclusion_policy: InclusionPolicy::default(),
        }
    }
}

fn check_non_negative(field: &str, values: &[f64]) -> Result<()> {
    if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(EngineError::config(
            field,
            "values must be finite and non-negative",
        ));
    }
    Ok(())
}

impl EngineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let cfg = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::from_toml_str(&content)?
        };
        tracing::info!(path = %path.display(), "loaded engine config");
        Ok(cfg)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let cfg: EngineConfig = toml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let cfg: EngineConfig = serde_json::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn scale(&self, scheme: Scheme) -> &TierScale {
        match scheme {
            Scheme::Percentage => &self.percentage_scale,
            Scheme::Weighted => &self.weighted_scale,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let dw = &self.diagnostic_weights;
        check_non_negative("diagnosticWeights", &[dw.d1, dw.d2, dw.d3])?;
        if dw.d1 + dw.d2 + dw.d3 <= 0.0 {
            return Err(EngineError::config(
                "diagnosticWeights",
                "at least one weight must be positive",
            ));
        }

        let tp = &self.tier_points;
        if ![tp.a, tp.b, tp.c].iter().all(|v| v.is_finite()) || !(tp.a < tp.b && tp.b < tp.c) {
            return Err(EngineError::config(
                "tierPoints",
                "points must be finite and strictly increasing from A to C",
            ));
        }

        self.percentage_scale.validate("percentageScale")?;
        self.weighted_scale.validate("weightedScale")?;
        if self.weighted_scale.min > tp.a || self.weighted_scale.max < tp.c {
            return Err(EngineError::config(
                "weightedScale",
                format!(
                    "domain [{}, {}] must cover tier points [{}, {}]",
                    self.weighted_scale.min, self.weighted_scale.max, tp.a, tp.c
                ),
            ));
        }

        let pw = &self.period_weights;
        check_non_negative("periodWeights", &[pw.evaluations, pw.class_work, pw.home_work])?;
        if pw.evaluations + pw.class_work + pw.home_work <= 0.0 {
            return Err(EngineError::config(
                "periodWeights",
                "at least one weight must be positive",
            ));
        }

        let em = &self.evolution_multipliers;
        check_non_negative("evolutionMultipliers", &[em.up, em.stable, em.down, em.unknown])?;
        if !self.competency_trend_threshold.is_finite() || self.competency_trend_threshold <= 0.0 {
            return Err(EngineError::config(
                "competencyTrendThreshold",
                "threshold must be a finite positive number",
            ));
        }
        check_non_negative("scoreStableBand", &[self.score_stable_band])?;
        Ok(())
    }

    /// Deep-merges a partial JSON object over this config and validates the
    /// result. Keys not named in `patch` keep their current values.
    pub fn with_overrides(&self, patch: &serde_json::Value) -> Result<Self> {
        if !patch.is_object() {
            return Err(EngineError::config("override", "must be a JSON object"));
        }
        let mut merged = serde_json::to_value(self)?;
        merge_json(&mut merged, patch);
        let cfg: EngineConfig = serde_json::from_value(merged)
            .map_err(|e| EngineError::config("override", e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

pub(crate) fn merge_json(base: &mut serde_json::Value, patch: &serde_json::Value) {
    match (base, patch) {
        (serde_json::Value::Object(b), serde_json::Value::Object(p)) => {
            for (k, v) in p {
                if let Some(existing) = b.get_mut(k) {
                    if existing.is_object() && v.is_object() {
                        merge_json(existing, v);
                        continue;
                    }
                }
                b.insert(k.clone(), v.clone());
            }
        }
        (b, p) => *b = p.clone(),
    }
}
