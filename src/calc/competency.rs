use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::score::tag_marks;
use super::tier::classify;
use super::types::{AnswerMark, Competency, InclusionPolicy, MarkValue, Tier};
use super::{guarded_mean, round_half_up, round_off_1_decimal};
use crate::config::EngineConfig;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
    Undetermined,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetencyStat {
    /// Mastery over every diagnostic, whole percent.
    pub percentage: Option<u32>,
    pub per_diagnostic: Vec<Option<u32>>,
    pub trend: Trend,
    pub mark_count: usize,
}

pub type CompetencyProfile = BTreeMap<Competency, CompetencyStat>;

fn counted<'a>(marks: &'a [AnswerMark], tag: Competency) -> impl Iterator<Item = &'a AnswerMark> + 'a {
    marks
        .iter()
        .filter(move |m| m.competency == Some(tag) && m.value != MarkValue::Absent)
}

fn percent_of<'a, I>(marks: I) -> (Option<u32>, usize)
where
    I: IntoIterator<Item = &'a AnswerMark>,
{
    let mut sum = 0.0_f64;
    let mut count = 0_usize;
    for m in marks {
        sum += m.value.points();
        count += 1;
    }
    let pct = guarded_mean(sum, count as f64).map(|avg| round_half_up(100.0 * avg));
    (pct, count)
}

/// Compares the first and last diagnostics that have data.
pub fn trend(per_diagnostic: &[Option<u32>], threshold: f64) -> Trend {
    let mut points = per_diagnostic.iter().flatten();
    let Some(first) = points.next() else {
        return Trend::Undetermined;
    };
    let Some(last) = points.last() else {
        return Trend::Undetermined;
    };
    let delta = *last as f64 - *first as f64;
    if delta >= threshold {
        Trend::Improving
    } else if delta <= -threshold {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

/// Per-competency mastery across an ordered sequence of diagnostics. Marks
/// are grouped by the tag they carry; absent slots and untagged marks are
/// left out.
pub fn aggregate(diagnostics: &[Vec<AnswerMark>], threshold: f64) -> CompetencyProfile {
    let mut profile = CompetencyProfile::new();
    for tag in Competency::ALL {
        let per_diagnostic: Vec<Option<u32>> = diagnostics
            .iter()
            .map(|d| percent_of(counted(d, tag)).0)
            .collect();
        let (percentage, mark_count) =
            percent_of(diagnostics.iter().flat_map(|d| counted(d, tag)));
        let trend = trend(&per_diagnostic, threshold);
        profile.insert(
            tag,
            CompetencyStat {
                percentage,
                per_diagnostic,
                trend,
                mark_count,
            },
        );
    }
    profile
}

/// Tags untagged marks from the configured layout, then aggregates.
pub fn profile(diagnostics: &[Vec<AnswerMark>], config: &EngineConfig) -> CompetencyProfile {
    let tagged: Vec<Vec<AnswerMark>> = diagnostics
        .iter()
        .map(|d| tag_marks(d, &config.competency_layout))
        .collect();
    aggregate(&tagged, config.competency_trend_threshold)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub student_id: String,
    pub profile: CompetencyProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassCompetency {
    pub average: f64,
    pub student_count: usize,
    pub tier: Option<Tier>,
    pub no_data: bool,
}

/// Class mean per competency. With `Enrolled`, students without data for a
/// tag (and enrolled students absent from `profiles`) count as 0.
pub fn class_summary(
    profiles: &[StudentProfile],
    enrolled_count: Option<usize>,
    policy: InclusionPolicy,
    config: &EngineConfig,
) -> Result<BTreeMap<Competency, ClassCompetency>> {
    let mut out = BTreeMap::new();
    for tag in Competency::ALL {
        let values: Vec<f64> = profiles
            .iter()
            .filter_map(|p| p.profile.get(&tag).and_then(|s| s.percentage))
            .map(f64::from)
            .collect();
        let with_data = values.len();
        let denom = match policy {
            InclusionPolicy::Evaluated => with_data,
            InclusionPolicy::Enrolled => enrolled_count.unwrap_or(profiles.len()).max(profiles.len()),
        };
        let sum: f64 = values.iter().sum();
        let entry = match guarded_mean(sum, denom as f64) {
            Some(avg) if with_data > 0 => {
                let average = round_off_1_decimal(avg);
                ClassCompetency {
                    average,
                    student_count: denom,
                    tier: Some(classify(average, &config.percentage_scale)?),
                    no_data: false,
                }
            }
            _ => ClassCompetency {
                average: 0.0,
                student_count: denom,
                tier: None,
                no_data: true,
            },
        };
        out.insert(tag, entry);
    }
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatCell {
    pub percentage: Option<u32>,
    pub tier: Option<Tier>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatMapRow {
    pub student_id: String,
    pub cells: BTreeMap<Competency, HeatCell>,
}

pub fn heat_map(profiles: &[StudentProfile], config: &EngineConfig) -> Result<Vec<HeatMapRow>> {
    let mut rows = Vec::with_capacity(profiles.len());
    for p in profiles {
        let mut cells = BTreeMap::new();
        for tag in Competency::ALL {
            let percentage = p.profile.get(&tag).and_then(|s| s.percentage);
            let tier = match percentage {
                Some(v) => Some(classify(f64::from(v), &config.percentage_scale)?),
                None => None,
            };
            cells.insert(tag, HeatCell { percentage, tier });
        }
        rows.push(HeatMapRow {
            student_id: p.student_id.clone(),
            cells,
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(tag: Competency, points: &[f64]) -> Vec<AnswerMark> {
        points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                AnswerMark::new(
                    format!("{}", i + 1),
                    Some(tag),
                    MarkValue::from_points(*p).expect("mark"),
                )
            })
            .collect()
    }

    #[test]
    fn reading_improves_from_d1_to_d3() {
        let diagnostics = vec![
            tagged(Competency::L, &[1.0, 0.0]),
            vec![],
            tagged(Competency::L, &[1.0, 1.0]),
        ];
        let p = aggregate(&diagnostics, 10.0);
        let l = &p[&Competency::L];
        assert_eq!(l.per_diagnostic, vec![Some(50), None, Some(100)]);
        assert_eq!(l.trend, Trend::Improving);
        assert_eq!(l.percentage, Some(75));
        assert_eq!(l.mark_count, 4);
        assert_eq!(p[&Competency::F].trend, Trend::Undetermined);
        assert_eq!(p[&Competency::F].percentage, None);
    }

    #[test]
    fn trend_thresholds() {
        assert_eq!(trend(&[Some(60), Some(70)], 10.0), Trend::Improving);
        assert_eq!(trend(&[Some(60), Some(69)], 10.0), Trend::Stable);
        assert_eq!(trend(&[Some(60), None, Some(50)], 10.0), Trend::Declining);
        assert_eq!(trend(&[None, Some(50)], 10.0), Trend::Undetermined);
        assert_eq!(trend(&[], 10.0), Trend::Undetermined);
    }

    #[test]
    fn percentage_rounds_to_whole_number() {
        let p = aggregate(&[tagged(Competency::R, &[1.0, 0.5, 0.0])], 10.0);
        assert_eq!(p[&Competency::R].percentage, Some(50));
        let p = aggregate(&[tagged(Competency::R, &[1.0, 0.0, 0.0])], 10.0);
        assert_eq!(p[&Competency::R].percentage, Some(33));
    }

    #[test]
    fn absent_slots_are_not_counted() {
        let mut marks = tagged(Competency::J, &[1.0]);
        marks.push(AnswerMark::new("2", Some(Competency::J), MarkValue::Absent));
        let p = aggregate(&[marks], 10.0);
        assert_eq!(p[&Competency::J].percentage, Some(100));
        assert_eq!(p[&Competency::J].mark_count, 1);
    }

    #[test]
    fn profile_tags_from_layout() {
        let cfg = EngineConfig::default();
        let marks: Vec<AnswerMark> = (0..10)
            .map(|i| AnswerMark::at(i + 1, if i < 2 { MarkValue::Correct } else { MarkValue::Wrong }))
            .collect();
        let p = profile(&[marks], &cfg);
        assert_eq!(p[&Competency::L].percentage, Some(100));
        assert_eq!(p[&Competency::F].percentage, Some(0));
        assert_eq!(p[&Competency::J].mark_count, 2);
    }

    fn student(id: &str, l: Option<u32>) -> StudentProfile {
        let mut profile = CompetencyProfile::new();
        profile.insert(
            Competency::L,
            CompetencyStat {
                percentage: l,
                per_diagnostic: vec![l],
                trend: Trend::Undetermined,
                mark_count: usize::from(l.is_some()),
            },
        );
        StudentProfile {
            student_id: id.to_string(),
            profile,
        }
    }

    #[test]
    fn class_summary_policies_differ_on_partial_classes() {
        let cfg = EngineConfig::default();
        let students = vec![student("s1", Some(80)), student("s2", Some(60)), student("s3", None)];

        let evaluated = class_summary(&students, None, InclusionPolicy::Evaluated, &cfg).unwrap();
        assert_eq!(evaluated[&Competency::L].average, 70.0);
        assert_eq!(evaluated[&Competency::L].student_count, 2);
        assert_eq!(evaluated[&Competency::L].tier, Some(Tier::B));

        let enrolled = class_summary(&students, Some(4), InclusionPolicy::Enrolled, &cfg).unwrap();
        assert_eq!(enrolled[&Competency::L].average, 35.0);
        assert_eq!(enrolled[&Competency::L].student_count, 4);
        assert_eq!(enrolled[&Competency::L].tier, Some(Tier::A));
    }

    #[test]
    fn empty_class_is_no_data() {
        let cfg = EngineConfig::default();
        for policy in [InclusionPolicy::Evaluated, InclusionPolicy::Enrolled] {
            let s = class_summary(&[], None, policy, &cfg).unwrap();
            let l = &s[&Competency::L];
            assert!(l.no_data);
            assert_eq!(l.average, 0.0);
            assert_eq!(l.tier, None);
        }
    }

    #[test]
    fn heat_map_classifies_each_cell() {
        let cfg = EngineConfig::default();
        let rows = heat_map(&[student("s1", Some(75)), student("s2", None)], &cfg).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cells[&Competency::L].tier, Some(Tier::C));
        assert_eq!(rows[1].cells[&Competency::L].tier, None);
        assert_eq!(rows[0].cells[&Competency::A].percentage, None);
    }
}
