use std::fmt::Write;
use stride_core::model::{ActivityDraft, PlanOutput};

/// Human-readable plan summary for terminal output.
pub fn format_plan(plan: &PlanOutput) -> String {
    let mut out = String::new();

    if let Some(profile) = &plan.program_profile {
        if let Some(name) = &profile.name {
            let _ = writeln!(out, "=== {name} ===");
        }
        if let Some(unit) = profile.dominant_unit {
            let _ = writeln!(out, "dominant unit: {unit}");
        }
    }
    let _ = writeln!(
        out,
        "parsed {} week(s) via {} (score {}, coverage {:.2})\n",
        plan.weeks.len(),
        plan.parse_meta.selected_parser,
        plan.parse_meta.quality.score,
        plan.parse_meta.quality.day_coverage
    );

    for week in &plan.weeks {
        let _ = writeln!(out, "Week {}", week.week_number);
        for (day, entry) in &week.days {
            if entry.raw.trim().is_empty() {
                continue;
            }
            let _ = writeln!(out, "  {:<9} {}", format!("{day}:"), truncate(&entry.raw, 70));
            for activity in &entry.activities {
                let _ = writeln!(out, "    - {}", describe_activity(activity));
            }
        }
        let _ = writeln!(out);
    }

    if let Some(glossary) = &plan.glossary {
        let _ = writeln!(out, "glossary: {} entr(ies)", glossary.entries.len());
        if !glossary.review_needed.is_empty() {
            let _ = writeln!(out, "  needs review: {}", glossary.review_needed.join(", "));
        }
    }

    out
}

fn describe_activity(activity: &ActivityDraft) -> String {
    let mut parts = vec![format!(
        "[{}/{}] {}",
        activity.activity_type(),
        activity.subtype,
        activity.title
    )];
    if let Some(distance) = activity.distance {
        parts.push(distance.to_string());
    }
    if let Some(minutes) = activity.duration_min {
        parts.push(format!("{minutes} min"));
    }
    if activity.must_do {
        parts.push("must-do".to_string());
    }
    if activity.bail_allowed {
        parts.push("bail-ok".to_string());
    }
    parts.join("  ")
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}
