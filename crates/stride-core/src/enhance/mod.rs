pub mod client;
pub mod merge;

use crate::model::{
    ActivityDraft, ActivityKind, ActivityType, DayKey, DayOutput, Distance, DistanceUnit,
    PlanOutput, WeekOutput,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tokio::time::timeout;

#[derive(Debug, thiserror::Error)]
pub enum EnhanceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("semantic extraction API error {0}: {1}")]
    Api(u16, String),

    #[error("semantic extraction response did not parse: {0}")]
    Parse(String),
}

/// One week's worth of context sent to the semantic-extraction collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct SemanticRequest {
    pub week_number: u32,
    pub week_context: String,
    pub day_raw_texts: BTreeMap<DayKey, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glossary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

/// The collaborator's response. Best-effort and untrusted: every field is
/// optional and unknown shapes are tolerated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SemanticWeek {
    #[serde(default)]
    pub days: BTreeMap<DayKey, Vec<SemanticActivity>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SemanticActivity {
    #[serde(default, rename = "type")]
    pub activity_type: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub raw_text: Option<String>,
    #[serde(default)]
    pub instruction_text: Option<String>,
    #[serde(default)]
    pub metrics: SemanticMetrics,
    #[serde(default)]
    pub priority: Option<u32>,
    #[serde(default)]
    pub constraints: SemanticConstraints,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SemanticMetrics {
    #[serde(default)]
    pub distance: Option<SemanticDistance>,
    #[serde(default)]
    pub duration_min: Option<u32>,
    #[serde(default)]
    pub pace_target: Option<String>,
    #[serde(default)]
    pub effort_target: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SemanticDistance {
    pub value: Decimal,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SemanticConstraints {
    #[serde(default)]
    pub bail_allowed: bool,
    #[serde(default)]
    pub must_do: bool,
}

/// Seam to the external semantic-extraction collaborator.
#[async_trait::async_trait]
pub trait SemanticExtractor: Send + Sync {
    async fn extract_week(&self, request: &SemanticRequest)
        -> Result<SemanticWeek, EnhanceError>;

    /// Name of this backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Timeouts and cost bounds for the enhancement pass.
#[derive(Debug, Clone)]
pub struct EnhanceOptions {
    /// Ceiling for any single collaborator call.
    pub per_call_timeout: Duration,
    /// Cumulative budget for the whole document; shrinks as weeks are
    /// processed. Once exhausted, remaining weeks keep their deterministic
    /// parse.
    pub total_budget: Duration,
    /// Send only the N most interesting days of each week, or all
    /// populated days when unset.
    pub max_days_per_week: Option<usize>,
    /// Optional glossary/guide text forwarded with every request.
    pub glossary_text: Option<String>,
    /// Optional document profile forwarded with every request.
    pub profile_text: Option<String>,
}

impl Default for EnhanceOptions {
    fn default() -> Self {
        EnhanceOptions {
            per_call_timeout: Duration::from_secs(20),
            total_budget: Duration::from_secs(90),
            max_days_per_week: None,
            glossary_text: None,
            profile_text: None,
        }
    }
}

/// Cost-control heuristic: days that are long, carry numbers, or resisted
/// deterministic classification benefit most from the semantic pass.
fn day_interest(day: &DayOutput) -> i64 {
    let mut score = 0i64;
    score += 3 * day
        .activities
        .iter()
        .filter(|a| a.subtype == "unknown")
        .count() as i64;
    if day.raw.chars().any(|c| c.is_ascii_digit()) {
        score += 2;
    }
    if day.raw.chars().count() > 40 {
        score += 1;
    }
    score
}

fn build_request(week: &WeekOutput, options: &EnhanceOptions) -> SemanticRequest {
    let mut populated: Vec<(DayKey, &DayOutput)> = week
        .days
        .iter()
        .filter(|(_, d)| !d.raw.trim().is_empty())
        .map(|(k, d)| (*k, d))
        .collect();

    if let Some(limit) = options.max_days_per_week {
        populated.sort_by_key(|(_, d)| std::cmp::Reverse(day_interest(d)));
        populated.truncate(limit);
    }

    let week_context = week
        .days
        .iter()
        .filter(|(_, d)| !d.raw.trim().is_empty())
        .map(|(k, d)| format!("{}: {}", k, d.raw))
        .collect::<Vec<_>>()
        .join("; ");

    SemanticRequest {
        week_number: week.week_number,
        week_context,
        day_raw_texts: populated
            .into_iter()
            .map(|(k, d)| (k, d.raw.clone()))
            .collect(),
        glossary: options.glossary_text.clone(),
        profile: options.profile_text.clone(),
    }
}

/// Convert one untrusted semantic record into a draft the reconciler can
/// merge. Junk fields degrade to the generic fallbacks.
fn external_draft(record: &SemanticActivity) -> ActivityDraft {
    let activity_type = record
        .activity_type
        .as_deref()
        .and_then(ActivityType::from_str_loose)
        .unwrap_or(ActivityType::Other);

    let subtype = record
        .subtype
        .as_deref()
        .and_then(crate::classify::subtype::normalize_hint)
        .unwrap_or_else(|| "unknown".to_string());

    let raw_text = record
        .raw_text
        .clone()
        .or_else(|| record.instruction_text.clone())
        .unwrap_or_default();

    let distance = record.metrics.distance.as_ref().and_then(|d| {
        if d.value <= Decimal::ZERO {
            return None;
        }
        let raw_unit = d.unit.as_deref().unwrap_or("");
        let unit = DistanceUnit::from_str_loose(raw_unit)?;
        // Meter-ish unit strings arrive as raw meters; fold to km.
        let meters = raw_unit.trim().to_lowercase().starts_with('m')
            && !raw_unit.trim().to_lowercase().starts_with("mi");
        let value = if meters && d.value >= Decimal::from(100) {
            d.value / Decimal::from(1000)
        } else {
            d.value
        };
        Some(Distance::new(value, unit))
    });

    let kind = match activity_type {
        ActivityType::Run => ActivityKind::Run {
            pace_target: record.metrics.pace_target.clone(),
            effort_target: record.metrics.effort_target.clone(),
            structure: None,
        },
        other => ActivityKind::bare(other),
    };

    ActivityDraft {
        kind,
        title: record
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "Workout".to_string()),
        subtype,
        raw_text,
        distance,
        duration_min: record.metrics.duration_min,
        priority: record.priority,
        must_do: record.constraints.must_do,
        bail_allowed: record.constraints.bail_allowed,
    }
}

/// Run the semantic-extraction pass over a parsed plan, week by week.
///
/// Each call races a per-call timeout and the document's shrinking time
/// budget; a failed or timed-out call leaves that week's deterministic
/// result untouched. This function never fails the parse.
pub async fn enhance_plan(
    plan: &mut PlanOutput,
    extractor: &dyn SemanticExtractor,
    options: &EnhanceOptions,
) {
    let started = Instant::now();

    for week in &mut plan.weeks {
        let remaining = options.total_budget.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            tracing::warn!(
                week = week.week_number,
                backend = extractor.backend_name(),
                "enhancement budget exhausted; remaining weeks keep deterministic parse"
            );
            break;
        }

        let request = build_request(week, options);
        if request.day_raw_texts.is_empty() {
            continue;
        }

        let call_timeout = remaining.min(options.per_call_timeout);
        match timeout(call_timeout, extractor.extract_week(&request)).await {
            Ok(Ok(response)) => apply_week(week, response),
            Ok(Err(err)) => {
                tracing::warn!(
                    week = week.week_number,
                    backend = extractor.backend_name(),
                    error = %err,
                    "semantic extraction failed; keeping deterministic parse"
                );
            }
            Err(_) => {
                tracing::warn!(
                    week = week.week_number,
                    backend = extractor.backend_name(),
                    "semantic extraction timed out; keeping deterministic parse"
                );
            }
        }
    }
}

fn apply_week(week: &mut WeekOutput, response: SemanticWeek) {
    for (day, records) in response.days {
        let Some(day_output) = week.days.get_mut(&day) else {
            continue;
        };
        let external: Vec<ActivityDraft> = records.iter().map(external_draft).collect();
        if external.is_empty() {
            continue;
        }
        let deterministic = std::mem::take(&mut day_output.activities);
        day_output.activities = merge::merge_day(deterministic, external);
    }
}
