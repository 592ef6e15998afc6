use crate::classify::segment::{expand_alternatives, extract_markers, split_combined_activities};
use crate::classify::subtype::{classify_subtype, display_name, normalize_hint, subtype_to_type};
use crate::model::{
    ActivityDraft, ActivityKind, ActivityType, DayEntry, DayOutput, Distance, DistanceUnit,
    IntervalBlock, PhaseRange, RunStructure, Segment, Week, WeekOutput,
};
use crate::numeric::{infer_dominant_unit, resolve_distance, resolve_duration, round_storage};
use crate::text::decode_abbreviations;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::LazyLock;

/// Per-week classification context.
#[derive(Debug, Clone, Copy)]
pub struct ClassifyContext {
    /// Unit assumed for bare numbers and unitless phase ranges, inferred
    /// from the week's texts.
    pub default_unit: DistanceUnit,
}

const PHASE_VALUE: &str = r"(\d+(?:\.\d+)?)(?:\s*-\s*(\d+(?:\.\d+)?))?\s*(miles?|mi|kms?|km|k)?";

static WARMUP_PRE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)\b{PHASE_VALUE}\s*warm\s*up")).unwrap());
static WARMUP_POST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)warm\s*up\s*(?:of\s+)?{PHASE_VALUE}")).unwrap());
static TEMPO_PRE_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Structured runs abbreviate the tempo phase to a bare "T" ("4mi T").
    Regex::new(&format!(r"(?i)\b{PHASE_VALUE}\s*(?:at\s+)?(?:tempo|t)\b")).unwrap()
});
static TEMPO_POST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)tempo\s*(?:of\s+)?{PHASE_VALUE}")).unwrap());
static COOLDOWN_PRE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)\b{PHASE_VALUE}\s*cool\s*down")).unwrap());
static COOLDOWN_POST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)cool\s*down\s*(?:of\s+)?{PHASE_VALUE}")).unwrap());

static INTERVALS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,2})\s*[x\u{00d7}]\s*(\d+(?:\.\d+)?)\s*(miles?|mi|kms?|km|k|meters?|metres?|m)\b",
    )
    .unwrap()
});

static PACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2}:\d{2})\s*(?:/|per\s+)(mi|mile|km)\b").unwrap());

static EFFORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(easy|moderate|steady|comfortable|hard)\s+effort\b").unwrap()
});

fn phase_unit(raw: Option<&str>, default_unit: DistanceUnit) -> DistanceUnit {
    raw.and_then(DistanceUnit::from_str_loose)
        .unwrap_or(default_unit)
}

fn extract_phase(
    text: &str,
    pre: &Regex,
    post: &Regex,
    default_unit: DistanceUnit,
) -> Option<PhaseRange> {
    let caps = pre.captures(text).or_else(|| post.captures(text))?;
    let v1 = Decimal::from_str(&caps[1]).ok()?;
    let v2 = caps
        .get(2)
        .and_then(|m| Decimal::from_str(m.as_str()).ok())
        .unwrap_or(v1);
    let unit = phase_unit(caps.get(3).map(|m| m.as_str()), default_unit);
    Some(PhaseRange {
        min: v1.min(v2),
        max: v1.max(v2),
        unit,
    })
}

fn extract_intervals(text: &str) -> Option<IntervalBlock> {
    let caps = INTERVALS_RE.captures(text)?;
    let reps: u32 = caps[1].parse().ok()?;
    let each = Decimal::from_str(&caps[2]).ok()?;
    if reps == 0 || each <= Decimal::ZERO {
        return None;
    }
    let raw_unit = caps[3].to_lowercase();
    let (each, unit) = match raw_unit.as_str() {
        "mile" | "miles" | "mi" => (each, DistanceUnit::Miles),
        "km" | "kms" | "k" => (each, DistanceUnit::Km),
        "meter" | "meters" | "metre" | "metres" => {
            (each / Decimal::from(1000), DistanceUnit::Km)
        }
        "m" => {
            if each < Decimal::from(100) {
                return None;
            }
            (each / Decimal::from(1000), DistanceUnit::Km)
        }
        _ => return None,
    };
    Some(IntervalBlock { reps, each, unit })
}

/// Pull warmup/tempo/cooldown ranges and interval blocks out of a decoded
/// activity text.
pub fn extract_structure(text: &str, default_unit: DistanceUnit) -> RunStructure {
    RunStructure {
        warmup: extract_phase(text, &WARMUP_PRE_RE, &WARMUP_POST_RE, default_unit),
        tempo: extract_phase(text, &TEMPO_PRE_RE, &TEMPO_POST_RE, default_unit),
        cooldown: extract_phase(text, &COOLDOWN_PRE_RE, &COOLDOWN_POST_RE, default_unit),
        intervals: extract_intervals(text),
    }
}

fn metrics_distance(segment: &Segment) -> Option<Distance> {
    if let Some(d) = segment.metrics.distance() {
        return Some(d);
    }
    match (segment.metrics.distance_range, segment.metrics.distance_unit) {
        (Some((lo, hi)), Some(unit)) => Some(Distance::new(lo.max(hi), unit)),
        _ => None,
    }
}

fn metrics_duration(segment: &Segment) -> Option<u32> {
    segment
        .metrics
        .duration_min
        .or_else(|| segment.metrics.duration_range.map(|(lo, hi)| lo.max(hi)))
}

/// Build one activity draft from a split/expanded activity text.
fn build_draft(text: &str, segment: &Segment, ctx: &ClassifyContext) -> ActivityDraft {
    let (clean, must_do, bail_allowed) = extract_markers(text);
    let decoded = decode_abbreviations(&clean);

    let cascade_subtype = classify_subtype(&decoded).map(str::to_string).or_else(|| {
        segment
            .type_guess
            .as_deref()
            .and_then(normalize_hint)
    });

    let structure = extract_structure(&decoded, ctx.default_unit);

    let distance = metrics_distance(segment)
        .or_else(|| structure.phase_total())
        .or_else(|| resolve_distance(&decoded, Some(ctx.default_unit)))
        .map(|d| Distance::new(round_storage(d.value), d.unit));

    let duration_min = metrics_duration(segment).or_else(|| resolve_duration(&decoded));

    let (subtype, activity_type) = match cascade_subtype {
        Some(s) => {
            let t = subtype_to_type(&s);
            (s, t)
        }
        // A resolvable distance implies a run even without a keyword hit.
        None if distance.is_some() => ("run".to_string(), ActivityType::Run),
        None => ("unknown".to_string(), ActivityType::Other),
    };

    let kind = match activity_type {
        ActivityType::Run => ActivityKind::Run {
            pace_target: PACE_RE
                .captures(&decoded)
                .map(|c| format!("{}/{}", &c[1], c[2].to_lowercase())),
            effort_target: EFFORT_RE.find(&decoded).map(|m| m.as_str().to_lowercase()),
            structure: if structure.is_empty() {
                None
            } else {
                Some(structure)
            },
        },
        other => ActivityKind::bare(other),
    };

    ActivityDraft {
        kind,
        title: display_name(&subtype).to_string(),
        subtype,
        raw_text: decoded,
        distance,
        duration_min,
        priority: None,
        must_do,
        bail_allowed,
    }
}

/// Turn one day's segments (or its raw text when no segments exist) into
/// activity drafts.
pub fn classify_day(entry: &DayEntry, ctx: &ClassifyContext) -> Vec<ActivityDraft> {
    let pseudo;
    let segments: &[Segment] = if entry.segments.is_empty() {
        pseudo = [Segment {
            text: entry.raw_text.clone(),
            ..Segment::default()
        }];
        &pseudo
    } else {
        &entry.segments
    };

    let mut drafts = Vec::new();
    for segment in segments {
        for piece in split_combined_activities(&segment.text) {
            for alternative in expand_alternatives(&piece) {
                drafts.push(build_draft(&alternative, segment, ctx));
            }
        }
    }
    drafts
}

/// Classify a parsed week grid into the output tree, inferring each week's
/// dominant unit for its ambiguous bare numbers.
pub fn classify_weeks(weeks: &[Week], fallback_unit: DistanceUnit) -> Vec<WeekOutput> {
    weeks
        .iter()
        .map(|week| {
            let unit = infer_dominant_unit(
                week.days.values().map(|d| d.raw_text.as_str()),
                fallback_unit,
            );
            let ctx = ClassifyContext { default_unit: unit };
            WeekOutput {
                week_number: week.number,
                days: week
                    .days
                    .iter()
                    .map(|(day, entry)| {
                        (
                            *day,
                            DayOutput {
                                raw: entry.raw_text.clone(),
                                activities: classify_day(entry, &ctx),
                            },
                        )
                    })
                    .collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ctx() -> ClassifyContext {
        ClassifyContext {
            default_unit: DistanceUnit::Miles,
        }
    }

    fn day(raw: &str) -> DayEntry {
        DayEntry {
            raw_text: raw.into(),
            segments: Vec::new(),
        }
    }

    #[test]
    fn structured_run_stays_one_activity_with_phase_total() {
        let drafts = classify_day(&day("2mi WU + 4mi T + 1mi CD"), &ctx());
        assert_eq!(drafts.len(), 1);
        let draft = &drafts[0];
        assert_eq!(draft.activity_type(), ActivityType::Run);
        assert_eq!(
            draft.distance,
            Some(Distance::new(dec!(7), DistanceUnit::Miles))
        );
        match &draft.kind {
            ActivityKind::Run { structure, .. } => {
                let s = structure.as_ref().unwrap();
                assert_eq!(s.warmup.unwrap().max, dec!(2));
                assert_eq!(s.tempo.unwrap().max, dec!(4));
                assert_eq!(s.cooldown.unwrap().max, dec!(1));
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn combined_day_splits_into_two_activities() {
        let drafts = classify_day(&day("Strength; 30min easy"), &ctx());
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].activity_type(), ActivityType::Strength);
        assert_eq!(drafts[0].title, "Strength");
        assert_eq!(drafts[1].subtype, "easy");
        assert_eq!(drafts[1].duration_min, Some(30));
    }

    #[test]
    fn rest_or_alternative_yields_rest_plus_activity() {
        let drafts = classify_day(&day("rest day or 3 mile recovery"), &ctx());
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].activity_type(), ActivityType::Rest);
        assert_eq!(drafts[0].title, "Rest Day");
        assert_eq!(drafts[1].subtype, "recovery");
        assert_eq!(
            drafts[1].distance,
            Some(Distance::new(dec!(3), DistanceUnit::Miles))
        );
    }

    #[test]
    fn marker_glyphs_set_flags() {
        let drafts = classify_day(&day("★ 12 mile long run ♥"), &ctx());
        let draft = &drafts[0];
        assert!(draft.must_do);
        assert!(draft.bail_allowed);
        assert_eq!(draft.subtype, "long-run");
        assert!(!draft.raw_text.contains('★'));
    }

    #[test]
    fn abbreviations_decode_before_classification() {
        let drafts = classify_day(&day("RST"), &ctx());
        assert_eq!(drafts[0].activity_type(), ActivityType::Rest);

        let drafts = classify_day(&day("XT 45 min"), &ctx());
        assert_eq!(drafts[0].activity_type(), ActivityType::CrossTrain);
        assert_eq!(drafts[0].duration_min, Some(45));
    }

    #[test]
    fn distance_implies_run_without_keywords() {
        let drafts = classify_day(&day("6 miles"), &ctx());
        let draft = &drafts[0];
        assert_eq!(draft.activity_type(), ActivityType::Run);
        assert_eq!(draft.subtype, "run");
        assert_eq!(
            draft.distance,
            Some(Distance::new(dec!(6), DistanceUnit::Miles))
        );
    }

    #[test]
    fn unclassifiable_text_is_unknown_other() {
        let drafts = classify_day(&day("see coach notes"), &ctx());
        let draft = &drafts[0];
        assert_eq!(draft.subtype, "unknown");
        assert_eq!(draft.activity_type(), ActivityType::Other);
        assert_eq!(draft.title, "Workout");
    }

    #[test]
    fn segment_metrics_win_over_free_text() {
        let entry = DayEntry {
            raw_text: "4 miles easy".into(),
            segments: vec![Segment {
                text: "4 miles easy".into(),
                type_guess: None,
                metrics: crate::model::SegmentMetrics {
                    distance_value: Some(dec!(5)),
                    distance_unit: Some(DistanceUnit::Km),
                    ..Default::default()
                },
            }],
        };
        let drafts = classify_day(&entry, &ctx());
        assert_eq!(
            drafts[0].distance,
            Some(Distance::new(dec!(5), DistanceUnit::Km))
        );
    }

    #[test]
    fn type_guess_hint_used_when_cascade_misses() {
        let entry = DayEntry {
            raw_text: "45 min spin".into(),
            segments: vec![Segment {
                text: "45 min spin".into(),
                type_guess: Some("cross training".into()),
                metrics: Default::default(),
            }],
        };
        let drafts = classify_day(&entry, &ctx());
        assert_eq!(drafts[0].subtype, "cross-training");
        assert_eq!(drafts[0].activity_type(), ActivityType::CrossTrain);
    }

    #[test]
    fn interval_block_extracted() {
        let drafts = classify_day(&day("6 x 800m interval session"), &ctx());
        let draft = &drafts[0];
        match &draft.kind {
            ActivityKind::Run { structure, .. } => {
                let intervals = structure.as_ref().unwrap().intervals.unwrap();
                assert_eq!(intervals.reps, 6);
                assert_eq!(intervals.each, dec!(0.8));
                assert_eq!(intervals.unit, DistanceUnit::Km);
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn pace_and_effort_targets_extracted() {
        let drafts = classify_day(&day("5 miles easy effort at 9:15/mi"), &ctx());
        match &drafts[0].kind {
            ActivityKind::Run {
                pace_target,
                effort_target,
                ..
            } => {
                assert_eq!(pace_target.as_deref(), Some("9:15/mi"));
                assert_eq!(effort_target.as_deref(), Some("easy effort"));
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn week_unit_inference_applies_to_bare_numbers() {
        let mut week = Week::new(1);
        week.append_day_text(crate::model::DayKey::Monday, "8 km steady");
        week.append_day_text(crate::model::DayKey::Tuesday, "easy 5");
        let outputs = classify_weeks(&[week], DistanceUnit::Miles);
        let tuesday = &outputs[0].days[&crate::model::DayKey::Tuesday];
        assert_eq!(
            tuesday.activities[0].distance,
            Some(Distance::new(dec!(5), DistanceUnit::Km))
        );
    }
}
