use serde::{Deserialize, Serialize};

use super::types::Tier;
use crate::error::{EngineError, Result};

/// Which side of a cut receives a value exactly equal to the cut point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryOwner {
    Lower,
    Upper,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cut {
    pub at: f64,
    pub owner: BoundaryOwner,
}

impl Cut {
    pub fn new(at: f64, owner: BoundaryOwner) -> Self {
        Self { at, owner }
    }

    fn passes(&self, v: f64) -> bool {
        match self.owner {
            BoundaryOwner::Lower => v > self.at,
            BoundaryOwner::Upper => v >= self.at,
        }
    }
}

/// Two cuts splitting `[min, max]` into A / B / C.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierScale {
    pub min: f64,
    pub max: f64,
    pub low: Cut,
    pub high: Cut,
}

impl TierScale {
    /// `< 40` A, `40..=70` B, `> 70` C over `[0, 100]`.
    pub fn percentage() -> Self {
        Self {
            min: 0.0,
            max: 100.0,
            low: Cut::new(40.0, BoundaryOwner::Upper),
            high: Cut::new(70.0, BoundaryOwner::Lower),
        }
    }

    /// `<= 1.5` A, `(1.5, 2.5]` B, `> 2.5` C over `[1, 3]`.
    pub fn weighted() -> Self {
        Self {
            min: 1.0,
            max: 3.0,
            low: Cut::new(1.5, BoundaryOwner::Lower),
            high: Cut::new(2.5, BoundaryOwner::Lower),
        }
    }

    pub fn validate(&self, field: &str) -> Result<()> {
        let all = [self.min, self.max, self.low.at, self.high.at];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(EngineError::config(field, "bounds must be finite numbers"));
        }
        if !(self.min <= self.low.at && self.low.at < self.high.at && self.high.at <= self.max) {
            return Err(EngineError::config(
                field,
                format!(
                    "expected min <= low < high <= max, got {} / {} / {} / {}",
                    self.min, self.low.at, self.high.at, self.max
                ),
            ));
        }
        Ok(())
    }

    pub fn contains(&self, v: f64) -> bool {
        v.is_finite() && v >= self.min && v <= self.max
    }

    pub fn classify(&self, v: f64) -> Result<Tier> {
        if !self.contains(v) {
            return Err(EngineError::invalid(
                "value",
                format!("{} is outside [{}, {}]", v, self.min, self.max),
            ));
        }
        Ok(if !self.low.passes(v) {
            Tier::A
        } else if !self.high.passes(v) {
            Tier::B
        } else {
            Tier::C
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Scheme {
    Percentage,
    Weighted,
}

pub fn classify(value: f64, scale: &TierScale) -> Result<Tier> {
    scale.classify(value)
}
