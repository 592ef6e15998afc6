use crate::model::{Distance, DistanceUnit};
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::LazyLock;

/// Upper bound for a plausible implied distance (bare number with run
/// context). Guards against reading durations or weights as distances.
pub const IMPLIED_DISTANCE_MAX: u32 = 80;

/// Upper bound for apostrophe-minutes shorthand (`45'`).
pub const APOSTROPHE_MINUTES_MAX: u32 = 300;

fn mile_in_km() -> Decimal {
    // 1 mile = 1.609344 km, exact.
    Decimal::new(1_609_344, 6)
}

/// Distance unit spellings, longest-first so alternation never truncates.
const DIST_UNITS: &str =
    "kilometers|kilometres|kilometer|kilometre|meters|metres|meter|metre|miles|mile|kms|km|mi|m";

const DUR_UNITS: &str = "hours|hour|hrs|hr|h|minutes|minute|mins|min|seconds|second|secs|sec|s|m";

static REPEAT_DIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})\s*[x\u{{00d7}}]\s*(\d+(?:\.\d+)?)\s*({DIST_UNITS})\b"
    ))
    .unwrap()
});

static RANGE_DIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d+(?:\.\d+)?)\s*[\u{{2013}}-]\s*(\d+(?:\.\d+)?)\s*({DIST_UNITS})\b"
    ))
    .unwrap()
});

static SINGLE_DIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b(\d+(?:\.\d+)?)\s*({DIST_UNITS})\b")).unwrap()
});

static COMPACT_K_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*k\b").unwrap());

static BARE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+(?:\.\d+)?)\b").unwrap());

static METER_CONTEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(x|reps?|strides?|intervals?)\b").unwrap());

static RUN_CONTEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(run|tempo|easy|recovery|trail|race|threshold)\b|\b[ETI]\d").unwrap()
});

static NON_RUN_CONTEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(strength|rest|yoga|hike|hiking|cross|bike|biking|swim|swimming)\b")
        .unwrap()
});

static REPEAT_DUR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})\s*[x\u{{00d7}}]\s*(\d+(?:\.\d+)?)\s*({DUR_UNITS})\b"
    ))
    .unwrap()
});

static HOUR_MIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,2})\s*(?:hours?|hrs?|hr|h)\b(?:\s*(\d{1,2})\s*(?:minutes?|mins?|min|m)\b)?",
    )
    .unwrap()
});

static RANGE_MIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,3})\s*[\u{2013}-]\s*(\d{1,3})\s*(?:minutes?|mins?|min|m)\b").unwrap()
});

static MIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,3})\s*(?:minutes?|mins?|min|m)\b").unwrap());

static APOSTROPHE_MIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,3})'").unwrap());

/// Raw unit as written in the source, before meters are folded into km.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawUnit {
    Miles,
    Km,
    Meters,
}

/// Resolve a captured unit token, with the bare-`m` ambiguity rules: values
/// of 100+ are meters; smaller values are meters only under interval/rep
/// context, otherwise the token is likely minutes and no distance unit is
/// returned.
fn normalize_unit(raw: &str, value: Decimal, full_text: &str) -> Option<RawUnit> {
    let lower = raw.trim().to_lowercase();
    match lower.as_str() {
        "mile" | "miles" | "mi" => Some(RawUnit::Miles),
        "km" | "kms" | "kilometer" | "kilometers" | "kilometre" | "kilometres" => {
            Some(RawUnit::Km)
        }
        "meter" | "meters" | "metre" | "metres" => Some(RawUnit::Meters),
        "m" => {
            if value >= Decimal::from(100) {
                Some(RawUnit::Meters)
            } else if METER_CONTEXT_RE.is_match(full_text) {
                Some(RawUnit::Meters)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Meters fold into km here; callers only ever see miles or km.
fn to_distance(value: Decimal, unit: RawUnit) -> Distance {
    match unit {
        RawUnit::Miles => Distance::new(value, DistanceUnit::Miles),
        RawUnit::Km => Distance::new(value, DistanceUnit::Km),
        RawUnit::Meters => Distance::new(value / Decimal::from(1000), DistanceUnit::Km),
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let d = Decimal::from_str(s).ok()?;
    if d <= Decimal::ZERO || d >= Decimal::from(100_000) {
        return None;
    }
    Some(d)
}

/// Byte span of the first explicit-unit distance in `text`, if any. Used to
/// excise the distance before minute matching so a trailing `m` cannot be
/// double-counted.
fn explicit_distance_span(text: &str) -> Option<(usize, usize)> {
    if let Some(caps) = RANGE_DIST_RE.captures(text) {
        let hi = parse_decimal(&caps[2])?;
        if normalize_unit(&caps[3], hi, text).is_some() {
            let m = caps.get(0).unwrap();
            return Some((m.start(), m.end()));
        }
    }
    if let Some(caps) = SINGLE_DIST_RE.captures(text) {
        let value = parse_decimal(&caps[1])?;
        if normalize_unit(&caps[2], value, text).is_some() {
            let m = caps.get(0).unwrap();
            return Some((m.start(), m.end()));
        }
    }
    None
}

/// Extract a distance from free text.
///
/// Tries, in order: repeated-interval form (`3 x 1 mile`), explicit
/// single/ranged value (range keeps the maximum), compact `5k` shorthand,
/// and finally an implied distance for a bare number in unambiguous run
/// context. A malformed or implausible capture is a non-match, never an
/// error.
pub fn resolve_distance(text: &str, default_unit: Option<DistanceUnit>) -> Option<Distance> {
    if let Some(caps) = REPEAT_DIST_RE.captures(text) {
        if let (Some(reps), Some(each)) = (parse_decimal(&caps[1]), parse_decimal(&caps[2])) {
            if let Some(unit) = normalize_unit(&caps[3], each, text) {
                return Some(to_distance(reps * each, unit));
            }
        }
    }

    if let Some(caps) = RANGE_DIST_RE.captures(text) {
        let lo = parse_decimal(&caps[1]);
        let hi = parse_decimal(&caps[2]);
        if let (Some(lo), Some(hi)) = (lo, hi) {
            let max = lo.max(hi);
            if let Some(unit) = normalize_unit(&caps[3], max, text) {
                return Some(to_distance(max, unit));
            }
        }
    }

    if let Some(caps) = SINGLE_DIST_RE.captures(text) {
        if let Some(value) = parse_decimal(&caps[1]) {
            if let Some(unit) = normalize_unit(&caps[2], value, text) {
                return Some(to_distance(value, unit));
            }
        }
    }

    if let Some(caps) = COMPACT_K_RE.captures(text) {
        if let Some(value) = parse_decimal(&caps[1]) {
            return Some(Distance::new(value, DistanceUnit::Km));
        }
    }

    implied_distance(text, default_unit?)
}

/// A bare number reads as a distance only when the text carries run-context
/// keywords, carries no non-run keyword, and the number is plausible as a
/// session distance.
fn implied_distance(text: &str, default_unit: DistanceUnit) -> Option<Distance> {
    if !RUN_CONTEXT_RE.is_match(text) || NON_RUN_CONTEXT_RE.is_match(text) {
        return None;
    }
    for caps in BARE_NUMBER_RE.captures_iter(text) {
        let m = caps.get(1).unwrap();
        if number_has_unit_context(text, m.end()) || number_is_continuation(text, m.start()) {
            continue;
        }
        let value = parse_decimal(m.as_str())?;
        if value > Decimal::from(IMPLIED_DISTANCE_MAX) {
            return None;
        }
        return Some(Distance::new(value, default_unit));
    }
    None
}

/// True when the number starting at `start` continues an earlier token: the
/// minutes half of a pace (`5:30`) or the repeat count of an interval
/// (`4 x 30`).
fn number_is_continuation(text: &str, start: usize) -> bool {
    let before = text[..start].trim_end();
    before.ends_with(':') || before.ends_with('x') || before.ends_with('\u{00d7}')
}

/// True when the number ending at `end` is followed by a unit-ish token, a
/// pace colon, or apostrophe-minutes, and is therefore not a bare number.
fn number_has_unit_context(text: &str, end: usize) -> bool {
    let rest = text[end..].trim_start();
    if rest.starts_with('\'') || rest.starts_with(':') {
        return true;
    }
    let word: String = rest
        .chars()
        .take_while(|c| c.is_alphabetic())
        .collect::<String>()
        .to_lowercase();
    matches!(
        word.as_str(),
        "min"
            | "mins"
            | "minute"
            | "minutes"
            | "h"
            | "hr"
            | "hrs"
            | "hour"
            | "hours"
            | "sec"
            | "secs"
            | "second"
            | "seconds"
            | "s"
            | "m"
            | "mi"
            | "mile"
            | "miles"
            | "k"
            | "km"
            | "kms"
            | "kilometer"
            | "kilometers"
            | "kilometre"
            | "kilometres"
            | "meter"
            | "meters"
            | "metre"
            | "metres"
            | "x"
    )
}

fn duration_unit_seconds(raw: &str) -> Option<Decimal> {
    let lower = raw.trim().to_lowercase();
    match lower.as_str() {
        "hour" | "hours" | "hr" | "hrs" | "h" => Some(Decimal::from(3600)),
        "minute" | "minutes" | "min" | "mins" | "m" => Some(Decimal::from(60)),
        "second" | "seconds" | "sec" | "secs" | "s" => Some(Decimal::ONE),
        _ => None,
    }
}

/// Extract a duration in whole minutes from free text.
pub fn resolve_duration(text: &str) -> Option<u32> {
    // Excise the first explicit distance so its unit token cannot be read
    // as minutes.
    let cleaned = match explicit_distance_span(text) {
        Some((start, end)) => format!("{}{}", &text[..start], &text[end..]),
        None => text.to_string(),
    };
    let cleaned = cleaned.as_str();

    if let Some(caps) = REPEAT_DUR_RE.captures(cleaned) {
        if let (Some(reps), Some(each)) = (parse_decimal(&caps[1]), parse_decimal(&caps[2])) {
            if let Some(unit_secs) = duration_unit_seconds(&caps[3]) {
                let minutes = (reps * each * unit_secs / Decimal::from(60)).round();
                return minutes.to_u32().filter(|m| *m > 0);
            }
        }
    }

    if let Some(caps) = HOUR_MIN_RE.captures(cleaned) {
        let hours: u32 = caps[1].parse().ok()?;
        let minutes: u32 = caps
            .get(2)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);
        return Some(hours * 60 + minutes);
    }

    if let Some(caps) = RANGE_MIN_RE.captures(cleaned) {
        let lo: u32 = caps[1].parse().ok()?;
        let hi: u32 = caps[2].parse().ok()?;
        return Some(lo.max(hi));
    }

    if let Some(caps) = MIN_RE.captures(cleaned) {
        return caps[1].parse().ok();
    }

    if let Some(caps) = APOSTROPHE_MIN_RE.captures(cleaned) {
        let minutes: u32 = caps[1].parse().ok()?;
        if minutes <= APOSTROPHE_MINUTES_MAX {
            return Some(minutes);
        }
    }

    None
}

/// Linear unit conversion at full precision. Rounding happens only at the
/// storage boundary, via [`round_storage`].
pub fn convert_distance(value: Decimal, from: DistanceUnit, to: DistanceUnit) -> Decimal {
    match (from, to) {
        (DistanceUnit::Miles, DistanceUnit::Km) => value * mile_in_km(),
        (DistanceUnit::Km, DistanceUnit::Miles) => value / mile_in_km(),
        _ => value,
    }
}

/// Two-decimal rounding applied when a value crosses into storage.
pub fn round_storage(value: Decimal) -> Decimal {
    value.round_dp(2)
}

static MILE_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(miles?|mi)\b").unwrap());

static KM_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(kms?|kilometers?|kilometres?)\b|\b\d+(?:\.\d+)?\s*k\b").unwrap()
});

static METER_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b\d{3,}\s*(?:meters?|metres?|m)\b").unwrap());

/// Pick one default unit for ambiguous bare numbers by counting unit tokens
/// across a week's texts. Meter-ish evidence votes for km. Ties and zero
/// evidence fall back to the caller's default.
pub fn infer_dominant_unit<'a, I>(texts: I, fallback: DistanceUnit) -> DistanceUnit
where
    I: IntoIterator<Item = &'a str>,
{
    let mut miles = 0usize;
    let mut km = 0usize;
    for text in texts {
        miles += MILE_TOKEN_RE.find_iter(text).count();
        km += KM_TOKEN_RE.find_iter(text).count();
        km += METER_TOKEN_RE.find_iter(text).count();
    }
    if miles > km {
        DistanceUnit::Miles
    } else if km > miles {
        DistanceUnit::Km
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn repeated_interval_distance() {
        let d = resolve_distance("3 x 1 mile", None).unwrap();
        assert_eq!(d, Distance::new(dec!(3), DistanceUnit::Miles));

        let d = resolve_distance("6 x 800m", None).unwrap();
        assert_eq!(d, Distance::new(dec!(4.8), DistanceUnit::Km));
    }

    #[test]
    fn compact_k_shorthand() {
        let d = resolve_distance("5k easy run", None).unwrap();
        assert_eq!(d, Distance::new(dec!(5), DistanceUnit::Km));
    }

    #[test]
    fn meters_normalize_to_km() {
        let d = resolve_distance("800m repeats", None).unwrap();
        assert_eq!(d, Distance::new(dec!(0.8), DistanceUnit::Km));
    }

    #[test]
    fn range_keeps_maximum() {
        let d = resolve_distance("4-6 miles easy", None).unwrap();
        assert_eq!(d, Distance::new(dec!(6), DistanceUnit::Miles));
    }

    #[test]
    fn short_bare_m_is_not_a_distance() {
        // "45 m" reads as minutes, not 45 meters.
        assert_eq!(resolve_distance("45 m steady effort", None), None);
    }

    #[test]
    fn implied_distance_requires_run_context() {
        let d = resolve_distance("6 easy run", Some(DistanceUnit::Miles)).unwrap();
        assert_eq!(d, Distance::new(dec!(6), DistanceUnit::Miles));

        assert_eq!(resolve_distance("6 easy run", None), None);
        assert_eq!(resolve_distance("Strength 2", Some(DistanceUnit::Miles)), None);
        // Non-run keyword blocks the implication even with run context.
        assert_eq!(
            resolve_distance("easy bike 20", Some(DistanceUnit::Miles)),
            None
        );
        // Implausibly large bare numbers are not distances.
        assert_eq!(
            resolve_distance("tempo effort 180", Some(DistanceUnit::Km)),
            None
        );
        // A number wearing a duration unit or pace colon is not bare.
        assert_eq!(resolve_distance("30min easy", Some(DistanceUnit::Miles)), None);
        assert_eq!(
            resolve_distance("easy run at 5:30", Some(DistanceUnit::Miles)),
            None
        );
        // The unit-wearing number is skipped, a later bare one still counts.
        let d = resolve_distance("easy 30 min then 4 steady run", Some(DistanceUnit::Miles));
        assert_eq!(d, Some(Distance::new(dec!(4), DistanceUnit::Miles)));
    }

    #[test]
    fn repeated_duration_aggregates_to_minutes() {
        assert_eq!(resolve_duration("2 x 20 min"), Some(40));
        assert_eq!(resolve_duration("4 x 30 seconds"), Some(2));
    }

    #[test]
    fn hours_and_minutes_combine() {
        assert_eq!(resolve_duration("1h 15min"), Some(75));
        assert_eq!(resolve_duration("2 hours"), Some(120));
    }

    #[test]
    fn bare_and_apostrophe_minutes() {
        assert_eq!(resolve_duration("45 min recovery"), Some(45));
        assert_eq!(resolve_duration("45' recovery"), Some(45));
        assert_eq!(resolve_duration("500' climb"), None);
    }

    #[test]
    fn duration_range_keeps_maximum() {
        assert_eq!(resolve_duration("30-40 min"), Some(40));
    }

    #[test]
    fn distance_span_not_read_as_minutes() {
        // The "6 miles" span is excised, so no duration remains.
        assert_eq!(resolve_duration("6 miles easy"), None);
        // A duration alongside a distance still resolves.
        assert_eq!(resolve_duration("6 miles in 50 min"), Some(50));
    }

    #[test]
    fn conversion_round_trips_within_a_hundredth() {
        for v in [dec!(1), dec!(3.1), dec!(26.2), dec!(50)] {
            let km = convert_distance(v, DistanceUnit::Miles, DistanceUnit::Km);
            let back = round_storage(convert_distance(
                round_storage(km),
                DistanceUnit::Km,
                DistanceUnit::Miles,
            ));
            assert!((back - v).abs() <= dec!(0.01), "{v} -> {km} -> {back}");
        }
    }

    #[test]
    fn dominant_unit_inference() {
        let texts = ["5 miles easy", "tempo 4 mi", "10k race"];
        assert_eq!(
            infer_dominant_unit(texts, DistanceUnit::Km),
            DistanceUnit::Miles
        );

        let texts = ["8 km steady", "400m strides", "5k"];
        assert_eq!(
            infer_dominant_unit(texts, DistanceUnit::Miles),
            DistanceUnit::Km
        );

        assert_eq!(
            infer_dominant_unit(std::iter::empty::<&str>(), DistanceUnit::Miles),
            DistanceUnit::Miles
        );
    }
}
