use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One positioned text fragment from the PDF-text collaborator.
///
/// Coordinates use the PDF convention: origin bottom-left, y grows upward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedFragment {
    pub text: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub page: usize,
}

/// Everything the PDF-text collaborator supplies for a single page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageText {
    pub page_number: usize,
    pub width: f32,
    pub height: f32,
    pub fragments: Vec<PositionedFragment>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DayKey {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayKey {
    pub const ALL: [DayKey; 7] = [
        DayKey::Monday,
        DayKey::Tuesday,
        DayKey::Wednesday,
        DayKey::Thursday,
        DayKey::Friday,
        DayKey::Saturday,
        DayKey::Sunday,
    ];

    /// Zero-based position in the week (Monday = 0).
    pub fn index(self) -> usize {
        match self {
            DayKey::Monday => 0,
            DayKey::Tuesday => 1,
            DayKey::Wednesday => 2,
            DayKey::Thursday => 3,
            DayKey::Friday => 4,
            DayKey::Saturday => 5,
            DayKey::Sunday => 6,
        }
    }

    pub fn from_index(i: usize) -> Option<DayKey> {
        DayKey::ALL.get(i).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DayKey::Monday => "monday",
            DayKey::Tuesday => "tuesday",
            DayKey::Wednesday => "wednesday",
            DayKey::Thursday => "thursday",
            DayKey::Friday => "friday",
            DayKey::Saturday => "saturday",
            DayKey::Sunday => "sunday",
        }
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceUnit {
    #[serde(rename = "miles")]
    Miles,
    #[serde(rename = "km")]
    Km,
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceUnit::Miles => write!(f, "miles"),
            DistanceUnit::Km => write!(f, "km"),
        }
    }
}

impl DistanceUnit {
    /// Loose matching for unit strings from untrusted sources. Meter-ish
    /// spellings map to km since meters never escape the resolvers.
    pub fn from_str_loose(s: &str) -> Option<DistanceUnit> {
        let lower = s.trim().to_lowercase();
        if lower.starts_with("mi") {
            Some(DistanceUnit::Miles)
        } else if lower.starts_with('k') || lower.starts_with('m') {
            Some(DistanceUnit::Km)
        } else {
            None
        }
    }
}

/// A resolved distance. Value and unit travel together, so a distance can
/// never be half-populated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distance {
    pub value: Decimal,
    pub unit: DistanceUnit,
}

impl Distance {
    pub fn new(value: Decimal, unit: DistanceUnit) -> Distance {
        Distance { value, unit }
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Loosely-typed numeric hints attached to a segment before activity
/// splitting. Populated by externally-supplied candidates; the deterministic
/// parsers leave these empty and re-resolve from text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_value: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_unit: Option<DistanceUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_range: Option<(Decimal, Decimal)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_range: Option<(u32, u32)>,
}

impl SegmentMetrics {
    pub fn distance(&self) -> Option<Distance> {
        match (self.distance_value, self.distance_unit) {
            (Some(value), Some(unit)) => Some(Distance::new(value, unit)),
            _ => None,
        }
    }
}

/// A sub-unit of a day's raw text prior to activity-level splitting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_guess: Option<String>,
    #[serde(default)]
    pub metrics: SegmentMetrics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayEntry {
    pub raw_text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<Segment>,
}

impl DayEntry {
    /// Append more source text for the same day/week cell, space-joined.
    pub fn append_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.raw_text.is_empty() {
            self.raw_text = text.to_string();
        } else {
            self.raw_text.push(' ');
            self.raw_text.push_str(text);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Week {
    pub number: u32,
    pub days: BTreeMap<DayKey, DayEntry>,
}

impl Week {
    pub fn new(number: u32) -> Week {
        Week {
            number,
            days: BTreeMap::new(),
        }
    }

    pub fn append_day_text(&mut self, day: DayKey, text: &str) {
        self.days.entry(day).or_default().append_text(text);
    }

    pub fn populated_days(&self) -> usize {
        self.days
            .values()
            .filter(|d| !d.raw_text.trim().is_empty())
            .count()
    }
}

/// Coarse activity classification, the fixed enumeration of the output
/// contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    Run,
    Strength,
    CrossTrain,
    Rest,
    Hike,
    Yoga,
    Mobility,
    Other,
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActivityType::Run => "RUN",
            ActivityType::Strength => "STRENGTH",
            ActivityType::CrossTrain => "CROSS_TRAIN",
            ActivityType::Rest => "REST",
            ActivityType::Hike => "HIKE",
            ActivityType::Yoga => "YOGA",
            ActivityType::Mobility => "MOBILITY",
            ActivityType::Other => "OTHER",
        };
        f.write_str(s)
    }
}

impl ActivityType {
    pub fn from_str_loose(s: &str) -> Option<ActivityType> {
        let lower = s.trim().to_lowercase().replace(['-', ' '], "_");
        match lower.as_str() {
            "run" | "running" => Some(ActivityType::Run),
            "strength" | "strength_training" => Some(ActivityType::Strength),
            "cross_train" | "cross_training" | "xt" => Some(ActivityType::CrossTrain),
            "rest" | "rest_day" | "off" => Some(ActivityType::Rest),
            "hike" | "hiking" => Some(ActivityType::Hike),
            "yoga" => Some(ActivityType::Yoga),
            "mobility" => Some(ActivityType::Mobility),
            "other" | "workout" => Some(ActivityType::Other),
            _ => None,
        }
    }
}

/// A distance range for one phase of a structured run (e.g. "1-2 mile WU").
/// Single values carry min == max.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseRange {
    pub min: Decimal,
    pub max: Decimal,
    pub unit: DistanceUnit,
}

/// A repeated interval block, e.g. "6 x 800m".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalBlock {
    pub reps: u32,
    pub each: Decimal,
    pub unit: DistanceUnit,
}

impl IntervalBlock {
    pub fn total(&self) -> Decimal {
        Decimal::from(self.reps) * self.each
    }
}

/// Embedded workout structure extracted from a single run's text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStructure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warmup: Option<PhaseRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<PhaseRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<PhaseRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intervals: Option<IntervalBlock>,
}

impl RunStructure {
    pub fn is_empty(&self) -> bool {
        self.warmup.is_none()
            && self.tempo.is_none()
            && self.cooldown.is_none()
            && self.intervals.is_none()
    }

    /// Implied total distance when warmup, tempo and cooldown all resolved
    /// with the same unit (sum of phase maxima).
    pub fn phase_total(&self) -> Option<Distance> {
        let (w, t, c) = (self.warmup?, self.tempo?, self.cooldown?);
        if w.unit == t.unit && t.unit == c.unit {
            Some(Distance::new(w.max + t.max + c.max, w.unit))
        } else {
            None
        }
    }
}

/// Per-type payload of an activity draft. Run is the only variant that
/// carries pace and structure; the rest are bare tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityKind {
    Run {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pace_target: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        effort_target: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        structure: Option<RunStructure>,
    },
    Strength,
    CrossTrain,
    Rest,
    Hike,
    Yoga,
    Mobility,
    Other,
}

impl ActivityKind {
    pub fn activity_type(&self) -> ActivityType {
        match self {
            ActivityKind::Run { .. } => ActivityType::Run,
            ActivityKind::Strength => ActivityType::Strength,
            ActivityKind::CrossTrain => ActivityType::CrossTrain,
            ActivityKind::Rest => ActivityType::Rest,
            ActivityKind::Hike => ActivityType::Hike,
            ActivityKind::Yoga => ActivityType::Yoga,
            ActivityKind::Mobility => ActivityType::Mobility,
            ActivityKind::Other => ActivityType::Other,
        }
    }

    /// Empty payload for a coarse type, used when adopting externally
    /// classified activities.
    pub fn bare(activity_type: ActivityType) -> ActivityKind {
        match activity_type {
            ActivityType::Run => ActivityKind::Run {
                pace_target: None,
                effort_target: None,
                structure: None,
            },
            ActivityType::Strength => ActivityKind::Strength,
            ActivityType::CrossTrain => ActivityKind::CrossTrain,
            ActivityType::Rest => ActivityKind::Rest,
            ActivityType::Hike => ActivityKind::Hike,
            ActivityType::Yoga => ActivityKind::Yoga,
            ActivityType::Mobility => ActivityKind::Mobility,
            ActivityType::Other => ActivityKind::Other,
        }
    }
}

/// One classified, unit-normalized activity record, the engine's canonical
/// output unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityDraft {
    #[serde(flatten)]
    pub kind: ActivityKind,
    pub subtype: String,
    pub title: String,
    pub raw_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<Distance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    #[serde(default)]
    pub must_do: bool,
    #[serde(default)]
    pub bail_allowed: bool,
}

impl ActivityDraft {
    pub fn activity_type(&self) -> ActivityType {
        self.kind.activity_type()
    }
}

/// Identifies one independent parsing strategy. Declaration order is the
/// fixed tie-break priority used during candidate selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserId {
    /// Geometric table/weekday-grid engine with text fallback.
    Layout,
    /// Marker-driven free-text engine over the full fragment stream.
    TextScan,
    /// Externally supplied semantic parse.
    Semantic,
}

impl fmt::Display for ParserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParserId::Layout => "layout",
            ParserId::TextScan => "text_scan",
            ParserId::Semantic => "semantic",
        };
        f.write_str(s)
    }
}

/// Caller-supplied metadata echoed into the output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant_unit: Option<DistanceUnit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayOutput {
    pub raw: String,
    pub activities: Vec<ActivityDraft>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekOutput {
    pub week_number: u32,
    pub days: BTreeMap<DayKey, DayOutput>,
}

/// Per-candidate record kept for observability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateMeta {
    pub parser: ParserId,
    pub quality: crate::quality::ParseQuality,
    pub diagnostics: crate::parser::ScanDiagnostics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseMeta {
    pub selected_parser: ParserId,
    pub quality: crate::quality::ParseQuality,
    pub candidates: Vec<CandidateMeta>,
}

/// The full output contract consumed by persistence/UI collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanOutput {
    pub weeks: Vec<WeekOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glossary: Option<crate::glossary::Glossary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_profile: Option<ProgramProfile>,
    pub parse_meta: ParseMeta,
}
