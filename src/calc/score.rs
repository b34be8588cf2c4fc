use serde::{Deserialize, Serialize};

use super::round_off_1_decimal;
use super::types::{AnswerMark, Competency, MarkValue};
use crate::error::{EngineError, Result};

/// Marks of one student for one assessment instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSheet {
    pub question_count: usize,
    #[serde(default)]
    pub marks: Vec<AnswerMark>,
    #[serde(default)]
    pub absent: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    pub question_count: usize,
    pub raw_score: f64,
    pub percentage: f64,
    pub absent: bool,
    pub correct_count: usize,
    pub partial_count: usize,
    pub wrong_count: usize,
    pub blank_count: usize,
    pub absent_slot_count: usize,
}

impl AssessmentResult {
    /// Percentage for averaging, `None` when the whole assessment was missed.
    pub fn scored_percentage(&self) -> Option<f64> {
        if self.absent {
            None
        } else {
            Some(self.percentage)
        }
    }
}

/// Scores one answer sheet. An absent sheet scores 0 and its marks, if any,
/// are not checked.
pub fn compute(marks: &[AnswerMark], question_count: usize, absent: bool) -> Result<AssessmentResult> {
    if question_count == 0 {
        return Err(EngineError::invalid(
            "questionCount",
            "assessment must declare at least one question",
        ));
    }
    if !absent && marks.len() != question_count {
        return Err(EngineError::invalid(
            "marks",
            format!(
                "expected {} marks, got {}",
                question_count,
                marks.len()
            ),
        ));
    }

    let mut result = AssessmentResult {
        question_count,
        raw_score: 0.0,
        percentage: 0.0,
        absent,
        correct_count: 0,
        partial_count: 0,
        wrong_count: 0,
        blank_count: 0,
        absent_slot_count: 0,
    };
    if absent {
        return Ok(result);
    }

    let mut sum = 0.0_f64;
    for m in marks {
        match m.value {
            MarkValue::Correct => result.correct_count += 1,
            MarkValue::Partial => result.partial_count += 1,
            MarkValue::Wrong => result.wrong_count += 1,
            MarkValue::Blank => result.blank_count += 1,
            MarkValue::Absent => result.absent_slot_count += 1,
        }
        sum += m.value.points();
    }

    result.raw_score = sum;
    result.percentage = round_off_1_decimal(100.0 * sum / question_count as f64);
    Ok(result)
}

pub fn compute_sheet(sheet: &AnswerSheet) -> Result<AssessmentResult> {
    compute(&sheet.marks, sheet.question_count, sheet.absent)
}

/// Fills in competency tags from a per-position layout. Marks that already
/// carry a tag keep it; positions past the layout stay untagged.
pub fn tag_marks(marks: &[AnswerMark], layout: &[Competency]) -> Vec<AnswerMark> {
    marks
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let mut out = m.clone();
            if out.competency.is_none() {
                out.competency = layout.get(i).copied();
            }
            out
        })
        .collect()
}
