//! Whole-class runs. Each student is computed on its own; one student's bad
//! data is reported on that student and never aborts the class.

use serde::{Deserialize, Serialize};

use super::diagnostic::{classify_set, DiagnosticSet, DiagnosticSetOutcome};
use super::period::{grade_from_results, GradedResult, PeriodReport};
use super::types::{InclusionPolicy, Tier, TierCode};
use super::{guarded_mean, round_off_1_decimal};
use crate::config::EngineConfig;
use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl From<&EngineError> for ErrorInfo {
    fn from(e: &EngineError) -> Self {
        Self {
            code: e.code().to_string(),
            message: e.to_string(),
            field: e.field().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentOutcome<T> {
    pub student_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl<T> StudentOutcome<T> {
    fn from_result(student_id: &str, r: crate::error::Result<T>) -> Self {
        match r {
            Ok(v) => Self {
                student_id: student_id.to_string(),
                result: Some(v),
                error: None,
            },
            Err(e) => {
                tracing::warn!(student = student_id, error = %e, "student computation failed");
                Self {
                    student_id: student_id.to_string(),
                    result: None,
                    error: Some(ErrorInfo::from(&e)),
                }
            }
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierDistribution {
    pub a: usize,
    pub b: usize,
    pub c: usize,
    pub unclassified: usize,
    pub failed: usize,
}

impl TierDistribution {
    pub fn add(&mut self, tier: Option<Tier>) {
        match tier {
            Some(Tier::A) => self.a += 1,
            Some(Tier::B) => self.b += 1,
            Some(Tier::C) => self.c += 1,
            None => self.unclassified += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDiagnostics {
    pub student_id: String,
    #[serde(default)]
    pub diagnostics: DiagnosticSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassClassification {
    pub students: Vec<StudentOutcome<DiagnosticSetOutcome>>,
    pub distribution: TierDistribution,
}

pub fn tier_distribution(outcomes: &[StudentOutcome<DiagnosticSetOutcome>]) -> TierDistribution {
    let mut dist = TierDistribution::default();
    for o in outcomes {
        match &o.result {
            Some(r) => dist.add(r.aggregate.final_tier),
            None => dist.failed += 1,
        }
    }
    dist
}

pub fn classify_class(students: &[StudentDiagnostics], config: &EngineConfig) -> ClassClassification {
    let outcomes: Vec<StudentOutcome<DiagnosticSetOutcome>> = students
        .iter()
        .map(|s| StudentOutcome::from_result(&s.student_id, classify_set(&s.diagnostics, config)))
        .collect();
    let distribution = tier_distribution(&outcomes);
    tracing::debug!(
        students = students.len(),
        failed = distribution.failed,
        "classified class"
    );
    ClassClassification {
        students: outcomes,
        distribution,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentGradeInput {
    pub student_id: String,
    #[serde(default)]
    pub results: Vec<GradedResult>,
    #[serde(default)]
    pub previous_tier: Option<TierCode>,
    #[serde(default)]
    pub current_tier: Option<TierCode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassGrades {
    pub students: Vec<StudentOutcome<PeriodReport>>,
    pub class_average: Option<f64>,
    pub graded_count: usize,
    pub no_data: bool,
}

/// Grades every student. The class average skips failed students; students
/// without any graded component count as 0 only under `Enrolled`.
pub fn grade_class(
    students: &[StudentGradeInput],
    policy: InclusionPolicy,
    config: &EngineConfig,
) -> ClassGrades {
    let outcomes: Vec<StudentOutcome<PeriodReport>> = students
        .iter()
        .map(|s| {
            StudentOutcome::from_result(
                &s.student_id,
                grade_from_results(&s.results, s.previous_tier, s.current_tier, policy, config),
            )
        })
        .collect();

    let mut sum = 0.0_f64;
    let mut count = 0_usize;
    let mut graded_count = 0_usize;
    for o in &outcomes {
        let Some(report) = &o.result else {
            continue;
        };
        match (report.grade.grade, policy) {
            (Some(g), _) => {
                sum += g;
                count += 1;
                graded_count += 1;
            }
            (None, InclusionPolicy::Enrolled) => count += 1,
            (None, InclusionPolicy::Evaluated) => {}
        }
    }
    let class_average = if graded_count > 0 {
        guarded_mean(sum, count as f64).map(round_off_1_decimal)
    } else {
        None
    };

    ClassGrades {
        students: outcomes,
        class_average,
        graded_count,
        no_data: class_average.is_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::score::{compute, AnswerSheet};
    use crate::calc::types::{AnswerMark, AssessmentKind, MarkValue};

    fn sheet(correct: usize, total: usize) -> AnswerSheet {
        AnswerSheet {
            question_count: total,
            marks: (0..total)
                .map(|i| {
                    AnswerMark::at(
                        i + 1,
                        if i < correct {
                            MarkValue::Correct
                        } else {
                            MarkValue::Wrong
                        },
                    )
                })
                .collect(),
            absent: false,
        }
    }

    fn student(id: &str, set: DiagnosticSet) -> StudentDiagnostics {
        StudentDiagnostics {
            student_id: id.to_string(),
            diagnostics: set,
        }
    }

    #[test]
    fn invalid_student_does_not_abort_class() {
        let cfg = EngineConfig::default();
        let mut broken = sheet(5, 10);
        broken.marks.pop();
        let students = vec![
            student(
                "ok",
                DiagnosticSet {
                    d1: Some(sheet(9, 10)),
                    ..Default::default()
                },
            ),
            student(
                "bad",
                DiagnosticSet {
                    d1: Some(broken),
                    ..Default::default()
                },
            ),
            student("none", DiagnosticSet::default()),
        ];
        let out = classify_class(&students, &cfg);
        assert_eq!(out.students.len(), 3);
        assert!(out.students[0].is_ok());
        assert!(!out.students[1].is_ok());
        assert_eq!(
            out.students[1].error.as_ref().map(|e| e.code.as_str()),
            Some("invalid_input")
        );
        assert_eq!(
            out.distribution,
            TierDistribution {
                a: 0,
                b: 0,
                c: 1,
                unclassified: 1,
                failed: 1
            }
        );
    }

    fn graded(kind: AssessmentKind, correct: usize) -> GradedResult {
        let s = sheet(correct, 10);
        GradedResult {
            kind,
            result: compute(&s.marks, 10, false).unwrap(),
        }
    }

    #[test]
    fn grade_class_average_follows_policy() {
        let cfg = EngineConfig::default();
        let students = vec![
            StudentGradeInput {
                student_id: "s1".into(),
                results: vec![graded(AssessmentKind::Evaluation, 8)],
                previous_tier: None,
                current_tier: None,
            },
            StudentGradeInput {
                student_id: "s2".into(),
                results: vec![graded(AssessmentKind::HomeActivity, 6)],
                previous_tier: Some(TierCode::B),
                current_tier: Some(TierCode::C),
            },
            StudentGradeInput {
                student_id: "s3".into(),
                results: vec![],
                previous_tier: None,
                current_tier: None,
            },
        ];
        let evaluated = grade_class(&students, InclusionPolicy::Evaluated, &cfg);
        assert_eq!(evaluated.graded_count, 2);
        assert_eq!(evaluated.class_average, Some(7.0));

        let enrolled = grade_class(&students, InclusionPolicy::Enrolled, &cfg);
        assert!(enrolled.students[2].result.as_ref().unwrap().grade.no_data);
        // (8 + 6 + 0) / 3 = 4.666.. -> 4.7
        assert_eq!(enrolled.class_average, Some(4.7));
    }

    #[test]
    fn empty_class_has_no_average() {
        let cfg = EngineConfig::default();
        let g = grade_class(&[], InclusionPolicy::Enrolled, &cfg);
        assert_eq!(g.class_average, None);
        assert!(g.no_data);
        let c = classify_class(&[], &cfg);
        assert_eq!(c.distribution, TierDistribution::default());
    }
}
