use crate::model::{ActivityDraft, ActivityKind, ActivityType, RunStructure};
use crate::numeric::convert_distance;
use crate::text::count_abbreviation_tokens;
use rust_decimal::Decimal;

/// Minimum similarity for a deterministic/external pair to count as the
/// same activity.
const MATCH_THRESHOLD: i32 = 4;

/// Greedily reconcile one day's deterministic drafts with the externally
/// supplied drafts: each deterministic draft takes its best unmatched
/// external counterpart, unmatched externals append as new activities.
pub fn merge_day(
    deterministic: Vec<ActivityDraft>,
    external: Vec<ActivityDraft>,
) -> Vec<ActivityDraft> {
    let mut used = vec![false; external.len()];
    let mut merged = Vec::with_capacity(deterministic.len());

    for draft in deterministic {
        let mut best: Option<(usize, i32)> = None;
        for (i, candidate) in external.iter().enumerate() {
            if used[i] {
                continue;
            }
            let score = similarity(&draft, candidate);
            if score >= MATCH_THRESHOLD && best.map_or(true, |(_, s)| score > s) {
                best = Some((i, score));
            }
        }
        match best {
            Some((i, _)) => {
                used[i] = true;
                merged.push(merge_pair(draft, external[i].clone()));
            }
            None => merged.push(draft),
        }
    }

    for (i, candidate) in external.into_iter().enumerate() {
        if !used[i] {
            merged.push(candidate);
        }
    }

    merged
}

fn text_similarity(a: &str, b: &str, exact: i32, substring: i32) -> i32 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let a_lower = a.to_lowercase();
    let b_lower = b.to_lowercase();
    if a_lower == b_lower {
        exact
    } else if a_lower.contains(&b_lower) || b_lower.contains(&a_lower) {
        substring
    } else {
        0
    }
}

fn distance_proximity(a: &ActivityDraft, b: &ActivityDraft) -> i32 {
    let (Some(da), Some(db)) = (a.distance, b.distance) else {
        return 0;
    };
    let b_value = convert_distance(db.value, db.unit, da.unit);
    let diff = (da.value - b_value).abs();
    if diff <= Decimal::new(2, 1) {
        2
    } else if diff <= Decimal::new(5, 1) {
        1
    } else {
        0
    }
}

fn similarity(a: &ActivityDraft, b: &ActivityDraft) -> i32 {
    let mut score = 0;
    if a.activity_type() == b.activity_type() {
        score += 4;
    }
    if a.subtype == b.subtype {
        score += 4;
    }
    score += text_similarity(&a.raw_text, &b.raw_text, 8, 5);
    score += text_similarity(&a.title, &b.title, 3, 2);
    score += distance_proximity(a, b);
    score
}

fn run_payload(
    kind: &ActivityKind,
) -> (Option<String>, Option<String>, Option<RunStructure>) {
    match kind {
        ActivityKind::Run {
            pace_target,
            effort_target,
            structure,
        } => (pace_target.clone(), effort_target.clone(), structure.clone()),
        _ => (None, None, None),
    }
}

/// Merge a matched pair. Deterministic classification wins unless it is
/// the generic fallback; numeric fields fill gaps only; flags OR together;
/// raw text prefers the more decoded side.
fn merge_pair(det: ActivityDraft, ext: ActivityDraft) -> ActivityDraft {
    let subtype = if det.subtype == "unknown" && ext.subtype != "unknown" {
        ext.subtype.clone()
    } else {
        det.subtype.clone()
    };

    let title = if det.title == "Workout" && ext.title != "Workout" {
        ext.title.clone()
    } else {
        det.title.clone()
    };

    let activity_type = if det.activity_type() == ActivityType::Other
        && ext.activity_type() != ActivityType::Other
    {
        ext.activity_type()
    } else {
        det.activity_type()
    };

    let raw_text = pick_raw_text(&det.raw_text, &ext.raw_text);

    let kind = match activity_type {
        ActivityType::Run => {
            let (det_pace, det_effort, det_structure) = run_payload(&det.kind);
            let (ext_pace, ext_effort, ext_structure) = run_payload(&ext.kind);
            ActivityKind::Run {
                pace_target: det_pace.or(ext_pace),
                effort_target: det_effort.or(ext_effort),
                structure: det_structure.or(ext_structure),
            }
        }
        other => ActivityKind::bare(other),
    };

    ActivityDraft {
        kind,
        subtype,
        title,
        raw_text,
        distance: det.distance.or(ext.distance),
        duration_min: det.duration_min.or(ext.duration_min),
        priority: det.priority.or(ext.priority),
        must_do: det.must_do || ext.must_do,
        bail_allowed: det.bail_allowed || ext.bail_allowed,
    }
}

/// Whichever text has fewer abbreviation tokens left reads better; ties go
/// to the longer text.
fn pick_raw_text(det: &str, ext: &str) -> String {
    if det.is_empty() {
        return ext.to_string();
    }
    if ext.is_empty() {
        return det.to_string();
    }
    let det_tokens = count_abbreviation_tokens(det);
    let ext_tokens = count_abbreviation_tokens(ext);
    if ext_tokens < det_tokens || (ext_tokens == det_tokens && ext.len() > det.len()) {
        ext.to_string()
    } else {
        det.to_string()
    }
}
