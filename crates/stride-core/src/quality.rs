use crate::model::WeekOutput;
use crate::parser::ParseCandidate;
use serde::{Deserialize, Serialize};

/// Derived confidence statistics for one parse candidate. Recomputed per
/// candidate, never persisted on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseQuality {
    /// 0-100 confidence score; exactly 0 when no weeks were found.
    pub score: u32,
    pub week_count: usize,
    /// Populated days over total day slots (weeks x 7), 0-1.
    pub day_coverage: f64,
    pub populated_days: usize,
    pub avg_chars_per_populated_day: f64,
    /// Share of activities that classified as unknown.
    pub unknown_segment_ratio: f64,
    /// Longest run of consecutive week numbers over week count, 0-1.
    pub consecutive_week_coverage: f64,
}

/// Compute quality statistics over a classified week tree.
pub fn assess(weeks: &[WeekOutput]) -> ParseQuality {
    let week_count = weeks.len();

    let mut populated_days = 0usize;
    let mut populated_chars = 0usize;
    let mut activities = 0usize;
    let mut unknown_activities = 0usize;

    for week in weeks {
        for day in week.days.values() {
            if !day.raw.trim().is_empty() {
                populated_days += 1;
                populated_chars += day.raw.chars().count();
            }
            for activity in &day.activities {
                activities += 1;
                if activity.subtype == "unknown" {
                    unknown_activities += 1;
                }
            }
        }
    }

    let day_coverage = if week_count == 0 {
        0.0
    } else {
        populated_days as f64 / (week_count * 7) as f64
    };
    let avg_chars_per_populated_day = if populated_days == 0 {
        0.0
    } else {
        populated_chars as f64 / populated_days as f64
    };
    let unknown_segment_ratio = if activities == 0 {
        0.0
    } else {
        unknown_activities as f64 / activities as f64
    };
    let consecutive_week_coverage = consecutive_coverage(weeks);

    let mut quality = ParseQuality {
        score: 0,
        week_count,
        day_coverage,
        populated_days,
        avg_chars_per_populated_day,
        unknown_segment_ratio,
        consecutive_week_coverage,
    };
    quality.score = score(&quality);
    quality
}

/// Longest run of consecutive week numbers, as a fraction of week count.
fn consecutive_coverage(weeks: &[WeekOutput]) -> f64 {
    if weeks.is_empty() {
        return 0.0;
    }
    let mut numbers: Vec<u32> = weeks.iter().map(|w| w.week_number).collect();
    numbers.sort_unstable();

    let mut best = 1usize;
    let mut run = 1usize;
    for pair in numbers.windows(2) {
        if pair[1] == pair[0] + 1 {
            run += 1;
            best = best.max(run);
        } else {
            run = 1;
        }
    }
    best as f64 / numbers.len() as f64
}

/// The 0-100 scoring formula. Coverage dominates; plan length, day
/// richness and week contiguity add confidence; a high unknown ratio
/// subtracts.
fn score(q: &ParseQuality) -> u32 {
    if q.week_count == 0 || q.day_coverage == 0.0 {
        return 0;
    }

    let mut score: i64 = 20;
    if q.week_count >= 2 {
        score += 10;
    }
    if q.week_count >= 4 {
        score += 5;
    }
    if q.week_count >= 8 {
        score += 5;
    }

    score += (q.day_coverage.min(1.0) * 40.0).round() as i64;

    score += if q.avg_chars_per_populated_day >= 20.0 {
        10
    } else if q.avg_chars_per_populated_day >= 8.0 {
        8
    } else if q.avg_chars_per_populated_day >= 3.0 {
        5
    } else if q.avg_chars_per_populated_day > 0.0 {
        2
    } else {
        0
    };

    score += (q.consecutive_week_coverage.min(1.0) * 10.0).round() as i64;

    if q.unknown_segment_ratio > 0.6 {
        score -= 6;
    } else if q.unknown_segment_ratio > 0.35 {
        score -= 3;
    }

    score.clamp(0, 100) as u32
}

/// Pick the best candidate: higher score, then higher day coverage, then
/// higher week count, then the fixed parser priority (primary engine
/// first). Candidates with zero weeks are excluded entirely.
pub fn select_candidate(candidates: &[ParseCandidate]) -> Option<&ParseCandidate> {
    candidates
        .iter()
        .filter(|c| c.quality.week_count > 0)
        .max_by(|a, b| {
            a.quality
                .score
                .cmp(&b.quality.score)
                .then(
                    a.quality
                        .day_coverage
                        .partial_cmp(&b.quality.day_coverage)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
                .then(a.quality.week_count.cmp(&b.quality.week_count))
                // ParserId declaration order is priority; earlier wins.
                .then(b.parser.cmp(&a.parser))
        })
}

/// Caller-side acceptance policy applied to the selected parse. Not
/// enforced inside the parser.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityGate {
    pub min_score: u32,
    pub min_coverage: f64,
}

impl Default for QualityGate {
    fn default() -> Self {
        QualityGate {
            min_score: 30,
            min_coverage: 0.12,
        }
    }
}

impl QualityGate {
    pub fn accepts(&self, quality: &ParseQuality) -> bool {
        quality.score >= self.min_score && quality.day_coverage >= self.min_coverage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DayOutput, ParserId, WeekOutput};
    use crate::parser::ScanDiagnostics;
    use std::collections::BTreeMap;

    fn week(number: u32, day_texts: &[&str]) -> WeekOutput {
        let mut days = BTreeMap::new();
        for (i, text) in day_texts.iter().enumerate() {
            if text.is_empty() {
                continue;
            }
            days.insert(
                crate::model::DayKey::from_index(i).unwrap(),
                DayOutput {
                    raw: text.to_string(),
                    activities: Vec::new(),
                },
            );
        }
        WeekOutput {
            week_number: number,
            days,
        }
    }

    fn full_week(number: u32) -> WeekOutput {
        week(
            number,
            &[
                "rest day with mobility work",
                "4 miles easy effort on roads",
                "tempo run 5 miles in total",
                "4 miles at recovery pace",
                "strength session at the gym",
                "10 mile long run kept steady",
                "hike 2 hours in the hills",
            ],
        )
    }

    #[test]
    fn empty_parse_scores_zero() {
        assert_eq!(assess(&[]).score, 0);

        // Weeks exist but no day content.
        let q = assess(&[week(1, &["", "", "", "", "", "", ""])]);
        assert_eq!(q.score, 0);
    }

    #[test]
    fn full_plan_scores_high() {
        let weeks: Vec<WeekOutput> = (1..=8).map(full_week).collect();
        let q = assess(&weeks);
        assert_eq!(q.week_count, 8);
        assert_eq!(q.day_coverage, 1.0);
        assert_eq!(q.consecutive_week_coverage, 1.0);
        assert_eq!(q.score, 100);
    }

    #[test]
    fn score_monotonic_in_day_coverage() {
        let sparse = assess(&[
            week(1, &["4 miles", "", "", "", "", "", ""]),
            week(2, &["4 miles", "", "", "", "", "", ""]),
        ]);
        let denser = assess(&[
            week(1, &["4 miles", "4 miles", "4 miles", "", "", "", ""]),
            week(2, &["4 miles", "4 miles", "4 miles", "", "", "", ""]),
        ]);
        assert!(denser.day_coverage > sparse.day_coverage);
        assert!(denser.score >= sparse.score);
    }

    #[test]
    fn gapped_weeks_reduce_consecutive_coverage() {
        let q = assess(&[full_week(1), full_week(2), full_week(9)]);
        assert!((q.consecutive_week_coverage - 2.0 / 3.0).abs() < 1e-9);
    }

    fn candidate(parser: ParserId, score: u32, coverage: f64, weeks: usize) -> ParseCandidate {
        ParseCandidate {
            parser,
            weeks: Vec::new(),
            quality: ParseQuality {
                score,
                week_count: weeks,
                day_coverage: coverage,
                ..ParseQuality::default()
            },
            diagnostics: ScanDiagnostics::default(),
        }
    }

    #[test]
    fn higher_score_wins_regardless_of_priority() {
        let candidates = vec![
            candidate(ParserId::Layout, 40, 0.5, 4),
            candidate(ParserId::TextScan, 55, 0.4, 3),
        ];
        let selected = select_candidate(&candidates).unwrap();
        assert_eq!(selected.parser, ParserId::TextScan);
    }

    #[test]
    fn ties_break_by_parser_priority() {
        let candidates = vec![
            candidate(ParserId::TextScan, 50, 0.5, 4),
            candidate(ParserId::Layout, 50, 0.5, 4),
        ];
        let selected = select_candidate(&candidates).unwrap();
        assert_eq!(selected.parser, ParserId::Layout);
    }

    #[test]
    fn zero_week_candidates_excluded() {
        let candidates = vec![
            candidate(ParserId::Layout, 0, 0.0, 0),
            candidate(ParserId::TextScan, 25, 0.3, 1),
        ];
        let selected = select_candidate(&candidates).unwrap();
        assert_eq!(selected.parser, ParserId::TextScan);

        let only_empty = vec![candidate(ParserId::Layout, 0, 0.0, 0)];
        assert!(select_candidate(&only_empty).is_none());
    }

    #[test]
    fn quality_gate_defaults() {
        let gate = QualityGate::default();
        let good = ParseQuality {
            score: 45,
            day_coverage: 0.5,
            ..ParseQuality::default()
        };
        let low = ParseQuality {
            score: 20,
            day_coverage: 0.5,
            ..ParseQuality::default()
        };
        assert!(gate.accepts(&good));
        assert!(!gate.accepts(&low));
    }
}
