use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::EngineError;

/// Support tier. Ordered `A < B < C`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// Needs intensive support.
    A,
    /// Developing.
    B,
    /// Consolidated.
    C,
}

impl Tier {
    pub fn ordinal(self) -> i32 {
        match self {
            Tier::A => 0,
            Tier::B => 1,
            Tier::C => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::A => "A",
            Tier::B => "B",
            Tier::C => "C",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored tier code. `F` marks an absent student and never takes part in
/// any average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TierCode {
    A,
    B,
    C,
    F,
}

impl TierCode {
    pub fn tier(self) -> Option<Tier> {
        match self {
            TierCode::A => Some(Tier::A),
            TierCode::B => Some(Tier::B),
            TierCode::C => Some(Tier::C),
            TierCode::F => None,
        }
    }
}

impl From<Tier> for TierCode {
    fn from(t: Tier) -> Self {
        match t {
            Tier::A => TierCode::A,
            Tier::B => TierCode::B,
            Tier::C => TierCode::C,
        }
    }
}

/// Collapses `None` and `F` to "no tier".
pub fn effective_tier(code: Option<TierCode>) -> Option<Tier> {
    code.and_then(TierCode::tier)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DiagnosticId {
    D1,
    D2,
    D3,
}

impl DiagnosticId {
    pub const ALL: [DiagnosticId; 3] = [DiagnosticId::D1, DiagnosticId::D2, DiagnosticId::D3];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Competency {
    /// Reading.
    L,
    /// Fluency.
    F,
    /// Reasoning.
    R,
    /// Application.
    A,
    /// Justification.
    J,
}

impl Competency {
    pub const ALL: [Competency; 5] = [
        Competency::L,
        Competency::F,
        Competency::R,
        Competency::A,
        Competency::J,
    ];
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawMark {
    Points(f64),
    Label(String),
}

/// Value of one answered slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkValue {
    Correct,
    Partial,
    Wrong,
    Blank,
    /// Student missed this slot; scores zero.
    Absent,
}

impl MarkValue {
    pub fn points(self) -> f64 {
        match self {
            MarkValue::Correct => 1.0,
            MarkValue::Partial => 0.5,
            MarkValue::Wrong | MarkValue::Blank | MarkValue::Absent => 0.0,
        }
    }

    pub fn from_points(v: f64) -> Result<Self, EngineError> {
        if v == 1.0 {
            Ok(MarkValue::Correct)
        } else if v == 0.5 {
            Ok(MarkValue::Partial)
        } else if v == 0.0 {
            Ok(MarkValue::Wrong)
        } else {
            Err(EngineError::invalid(
                "mark",
                format!("{} is not one of 1, 0.5, 0", v),
            ))
        }
    }

    pub fn from_label(s: &str) -> Result<Self, EngineError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "correct" => Ok(MarkValue::Correct),
            "partial" => Ok(MarkValue::Partial),
            "wrong" => Ok(MarkValue::Wrong),
            "blank" => Ok(MarkValue::Blank),
            "absent" => Ok(MarkValue::Absent),
            other => Err(EngineError::invalid(
                "mark",
                format!("unknown mark label '{}'", other),
            )),
        }
    }
}

impl<'de> Deserialize<'de> for MarkValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawMark::deserialize(deserializer)? {
            RawMark::Points(v) => MarkValue::from_points(v),
            RawMark::Label(s) => MarkValue::from_label(&s),
        }
        .map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerMark {
    #[serde(default)]
    pub slot: String,
    #[serde(default)]
    pub competency: Option<Competency>,
    pub value: MarkValue,
}

impl AnswerMark {
    pub fn new(slot: impl Into<String>, competency: Option<Competency>, value: MarkValue) -> Self {
        Self {
            slot: slot.into(),
            competency,
            value,
        }
    }

    /// Untagged mark whose slot is its 1-based position.
    pub fn at(position: usize, value: MarkValue) -> Self {
        Self::new(position.to_string(), None, value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InclusionPolicy {
    /// Every enrolled student (or every result, absent included) counts in
    /// the denominator; missing data contributes zero.
    #[serde(rename = "enrolledOnly")]
    Enrolled,
    /// Only students (or results) with data count.
    #[default]
    #[serde(rename = "evaluatedOnly")]
    Evaluated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssessmentKind {
    Diagnostic,
    Evaluation,
    ClassActivity,
    HomeActivity,
}
