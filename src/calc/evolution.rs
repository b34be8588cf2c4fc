use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::round_off_1_decimal;
use super::types::{effective_tier, TierCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Stable,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierMovement {
    pub direction: Direction,
    /// `ordinal(current) - ordinal(previous)`; 0 when unknown.
    pub magnitude: i32,
}

pub fn compare_tiers(previous: Option<TierCode>, current: Option<TierCode>) -> TierMovement {
    let (Some(prev), Some(cur)) = (effective_tier(previous), effective_tier(current)) else {
        return TierMovement {
            direction: Direction::Unknown,
            magnitude: 0,
        };
    };
    let magnitude = cur.ordinal() - prev.ordinal();
    let direction = match magnitude.signum() {
        1 => Direction::Up,
        -1 => Direction::Down,
        _ => Direction::Stable,
    };
    TierMovement {
        direction,
        magnitude,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreMovement {
    pub direction: Direction,
    pub delta: Option<f64>,
}

/// Deltas within `band` (inclusive) count as stable. The band applies to the
/// exact delta; only the reported delta is rounded.
pub fn compare_scores(previous: Option<f64>, current: Option<f64>, band: f64) -> ScoreMovement {
    let (Some(prev), Some(cur)) = (previous, current) else {
        return ScoreMovement {
            direction: Direction::Unknown,
            delta: None,
        };
    };
    if !prev.is_finite() || !cur.is_finite() {
        return ScoreMovement {
            direction: Direction::Unknown,
            delta: None,
        };
    }
    let delta = cur - prev;
    let direction = if delta > band {
        Direction::Up
    } else if delta < -band {
        Direction::Down
    } else {
        Direction::Stable
    };
    ScoreMovement {
        direction,
        delta: Some(round_off_1_decimal(delta)),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierTransition {
    #[serde(default)]
    pub student_id: String,
    pub previous: Option<TierCode>,
    pub current: Option<TierCode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvolutionTally {
    pub up: usize,
    pub down: usize,
    pub stable: usize,
    pub unknown: usize,
}

impl EvolutionTally {
    pub fn add(&mut self, direction: Direction) {
        match direction {
            Direction::Up => self.up += 1,
            Direction::Down => self.down += 1,
            Direction::Stable => self.stable += 1,
            Direction::Unknown => self.unknown += 1,
        }
    }

    /// Students with a comparable pair of tiers.
    pub fn compared(&self) -> usize {
        self.up + self.down + self.stable
    }
}

pub fn class_tally(transitions: &[TierTransition]) -> EvolutionTally {
    let mut tally = EvolutionTally::default();
    for t in transitions {
        tally.add(compare_tiers(t.previous, t.current).direction);
    }
    tally
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvolutionRecord {
    pub id: Uuid,
    pub student_id: String,
    pub previous: TierCode,
    pub current: TierCode,
    pub movement: TierMovement,
    pub recorded_at: DateTime<Utc>,
}

/// Append-only log of tier transitions. Records are never edited or removed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvolutionHistory {
    records: Vec<EvolutionRecord>,
}

impl EvolutionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record when both tiers are comparable; otherwise nothing is
    /// stored and `None` is returned.
    pub fn record(&mut self, transition: &TierTransition) -> Option<&EvolutionRecord> {
        self.record_at(transition, Utc::now())
    }

    pub fn record_at(
        &mut self,
        transition: &TierTransition,
        at: DateTime<Utc>,
    ) -> Option<&EvolutionRecord> {
        let movement = compare_tiers(transition.previous, transition.current);
        if movement.direction == Direction::Unknown {
            tracing::debug!(student = %transition.student_id, "skipping incomparable transition");
            return None;
        }
        let (previous, current) = (transition.previous?, transition.current?);
        self.records.push(EvolutionRecord {
            id: Uuid::new_v4(),
            student_id: transition.student_id.clone(),
            previous,
            current,
            movement,
            recorded_at: at,
        });
        self.records.last()
    }

    pub fn for_student<'a>(&'a self, student_id: &'a str) -> impl Iterator<Item = &'a EvolutionRecord> + 'a {
        self.records.iter().filter(move |r| r.student_id == student_id)
    }

    pub fn records(&self) -> &[EvolutionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
