use crate::model::ActivityType;
use regex::Regex;
use std::sync::LazyLock;

/// Ordered keyword cascade: first match wins, so more specific workout
/// names must precede the generic ones.
static SUBTYPE_RULES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    let rule = |subtype: &'static str, pattern: &str| (subtype, Regex::new(pattern).unwrap());
    vec![
        rule("strength", r"(?i)\bstrength\b"),
        rule("rest", r"(?i)\brest\b"),
        rule("cross-training", r"(?i)cross[ -]?train"),
        rule("training-race", r"(?i)training race"),
        rule("race", r"(?i)\brace\b"),
        rule("incline-treadmill", r"(?i)incline treadmill"),
        rule("hill-pyramid", r"(?i)hill pyramid"),
        rule("hills", r"(?i)\bhills\b"),
        rule("tempo", r"(?i)\btempo\b"),
        rule("progression", r"(?i)progres"),
        rule("recovery", r"(?i)\brecovery\b"),
        rule("trail-run", r"(?i)\btrail\b"),
        rule("fast-finish", r"(?i)fast finish"),
        rule("long-run", r"(?i)\blong run\b|\blrl\b"),
        rule("hike", r"(?i)\bhik(?:e|ing)\b"),
        rule("yoga", r"(?i)\byoga\b"),
        rule("mobility", r"(?i)\bmobility\b"),
        rule("easy", r"(?i)\beasy\b"),
    ]
});

/// Pace qualifiers would otherwise read as race workouts ("5 at race
/// pace"), so they are masked before the cascade runs.
static PACE_QUALIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:marathon|race)\s+pace\b").unwrap());

/// Run the keyword cascade over one activity text.
pub fn classify_subtype(text: &str) -> Option<&'static str> {
    let masked = PACE_QUALIFIER_RE.replace_all(text, "goal pace");
    SUBTYPE_RULES
        .iter()
        .find(|(_, re)| re.is_match(&masked))
        .map(|(subtype, _)| *subtype)
}

/// Normalize a caller-supplied type hint into subtype form.
pub fn normalize_hint(hint: &str) -> Option<String> {
    let normalized = hint
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    if normalized.is_empty() || normalized == "unknown" {
        None
    } else {
        Some(normalized)
    }
}

/// Fixed subtype → coarse type table. Unlisted subtypes are run variants
/// only when the cascade produced them; foreign hints fall through to the
/// loose type parser and then to OTHER.
pub fn subtype_to_type(subtype: &str) -> ActivityType {
    match subtype {
        "strength" => ActivityType::Strength,
        "rest" => ActivityType::Rest,
        "cross-training" => ActivityType::CrossTrain,
        "hike" => ActivityType::Hike,
        "yoga" => ActivityType::Yoga,
        "mobility" => ActivityType::Mobility,
        "training-race" | "race" | "incline-treadmill" | "hill-pyramid" | "hills" | "tempo"
        | "progression" | "recovery" | "trail-run" | "fast-finish" | "long-run" | "easy"
        | "run" => ActivityType::Run,
        other => ActivityType::from_str_loose(other).unwrap_or(ActivityType::Other),
    }
}

/// Display title for a subtype.
pub fn display_name(subtype: &str) -> &'static str {
    match subtype {
        "strength" => "Strength",
        "rest" => "Rest Day",
        "cross-training" => "Cross Training",
        "training-race" => "Training Race",
        "race" => "Race",
        "incline-treadmill" => "Incline Treadmill",
        "hill-pyramid" => "Hill Pyramid",
        "hills" => "Hills",
        "tempo" => "Tempo Run",
        "progression" => "Progression Run",
        "recovery" => "Recovery Run",
        "trail-run" => "Trail Run",
        "fast-finish" => "Fast Finish",
        "long-run" => "Long Run",
        "hike" => "Hike",
        "yoga" => "Yoga",
        "mobility" => "Mobility",
        "easy" => "Easy Run",
        "run" => "Run",
        "rest-day" => "Rest Day",
        _ => "Workout",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cascade_order_prefers_specific_workouts() {
        assert_eq!(classify_subtype("Strength 2"), Some("strength"));
        assert_eq!(classify_subtype("hill pyramid session"), Some("hill-pyramid"));
        assert_eq!(classify_subtype("4 mile tempo"), Some("tempo"));
        assert_eq!(classify_subtype("easy trail miles"), Some("trail-run"));
        assert_eq!(classify_subtype("6 easy"), Some("easy"));
        assert_eq!(classify_subtype("45 min spin"), None);
    }

    #[test]
    fn rest_beats_alternatives() {
        assert_eq!(classify_subtype("Rest Day"), Some("rest"));
    }

    #[test]
    fn pace_qualifier_does_not_classify_as_race() {
        assert_eq!(classify_subtype("6 miles at race pace"), None);
        assert_eq!(classify_subtype("tempo at marathon pace"), Some("tempo"));
        assert_eq!(classify_subtype("training race 10k"), Some("training-race"));
        assert_eq!(classify_subtype("goal race"), Some("race"));
    }

    #[test]
    fn subtype_type_table() {
        assert_eq!(subtype_to_type("tempo"), ActivityType::Run);
        assert_eq!(subtype_to_type("rest"), ActivityType::Rest);
        assert_eq!(subtype_to_type("cross-training"), ActivityType::CrossTrain);
        assert_eq!(subtype_to_type("yoga"), ActivityType::Yoga);
        assert_eq!(subtype_to_type("paddleboard"), ActivityType::Other);
    }

    #[test]
    fn hint_normalization() {
        assert_eq!(normalize_hint("Easy Run"), Some("easy-run".to_string()));
        assert_eq!(normalize_hint("unknown"), None);
        assert_eq!(normalize_hint("  "), None);
    }

    #[test]
    fn display_names() {
        assert_eq!(display_name("tempo"), "Tempo Run");
        assert_eq!(display_name("rest"), "Rest Day");
        assert_eq!(display_name("paddleboard"), "Workout");
    }
}
