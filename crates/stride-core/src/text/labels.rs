use crate::model::DayKey;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Locale-normalized meaning of a table header word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalLabel {
    Week,
    Day(DayKey),
    /// A trailing totals column (e.g. "TWM"), detected but never assigned
    /// cell content.
    Summary,
}

/// Localized day words. Adding a locale means adding rows here; parsing
/// logic never changes.
static DAY_WORDS: LazyLock<HashMap<&'static str, DayKey>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    // English
    m.insert("monday", DayKey::Monday);
    m.insert("mon", DayKey::Monday);
    m.insert("tuesday", DayKey::Tuesday);
    m.insert("tue", DayKey::Tuesday);
    m.insert("tues", DayKey::Tuesday);
    m.insert("wednesday", DayKey::Wednesday);
    m.insert("wed", DayKey::Wednesday);
    m.insert("thursday", DayKey::Thursday);
    m.insert("thu", DayKey::Thursday);
    m.insert("thur", DayKey::Thursday);
    m.insert("thurs", DayKey::Thursday);
    m.insert("friday", DayKey::Friday);
    m.insert("fri", DayKey::Friday);
    m.insert("saturday", DayKey::Saturday);
    m.insert("sat", DayKey::Saturday);
    m.insert("sunday", DayKey::Sunday);
    m.insert("sun", DayKey::Sunday);

    // Spanish
    m.insert("lunes", DayKey::Monday);
    m.insert("martes", DayKey::Tuesday);
    m.insert("miércoles", DayKey::Wednesday);
    m.insert("miercoles", DayKey::Wednesday);
    m.insert("jueves", DayKey::Thursday);
    m.insert("viernes", DayKey::Friday);
    m.insert("sábado", DayKey::Saturday);
    m.insert("sabado", DayKey::Saturday);
    m.insert("domingo", DayKey::Sunday);

    // French
    m.insert("lundi", DayKey::Monday);
    m.insert("mardi", DayKey::Tuesday);
    m.insert("mercredi", DayKey::Wednesday);
    m.insert("jeudi", DayKey::Thursday);
    m.insert("vendredi", DayKey::Friday);
    m.insert("samedi", DayKey::Saturday);
    m.insert("dimanche", DayKey::Sunday);

    // German
    m.insert("montag", DayKey::Monday);
    m.insert("dienstag", DayKey::Tuesday);
    m.insert("mittwoch", DayKey::Wednesday);
    m.insert("donnerstag", DayKey::Thursday);
    m.insert("freitag", DayKey::Friday);
    m.insert("samstag", DayKey::Saturday);
    m.insert("sonntag", DayKey::Sunday);

    // Swedish
    m.insert("måndag", DayKey::Monday);
    m.insert("mandag", DayKey::Monday);
    m.insert("tisdag", DayKey::Tuesday);
    m.insert("onsdag", DayKey::Wednesday);
    m.insert("torsdag", DayKey::Thursday);
    m.insert("fredag", DayKey::Friday);
    m.insert("lördag", DayKey::Saturday);
    m.insert("lordag", DayKey::Saturday);
    m.insert("söndag", DayKey::Sunday);
    m.insert("sondag", DayKey::Sunday);

    m
});

const WEEK_WORDS: &[&str] = &["week", "wk", "semana", "semaine", "woche", "vecka"];

const SUMMARY_WORDS: &[&str] = &["twm", "total", "totals", "mileage", "volume"];

static WEEK_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:week|wk|semana|semaine|woche|vecka)\.?\s*#?\s*(\d{1,3})\b").unwrap()
});

static BARE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}$").unwrap());

fn normalize_label(text: &str) -> String {
    text.trim()
        .trim_matches(|c: char| c == ':' || c == '.' || c == ',')
        .to_lowercase()
}

/// Map a header word to its canonical meaning, across locales.
pub fn canonicalize_table_label(text: &str) -> Option<CanonicalLabel> {
    let label = normalize_label(text);
    if label.is_empty() {
        return None;
    }
    if WEEK_WORDS.contains(&label.as_str()) {
        return Some(CanonicalLabel::Week);
    }
    if SUMMARY_WORDS.contains(&label.as_str()) {
        return Some(CanonicalLabel::Summary);
    }
    DAY_WORDS.get(label.as_str()).map(|d| CanonicalLabel::Day(*d))
}

/// Match a single localized weekday word.
pub fn day_from_word(text: &str) -> Option<DayKey> {
    DAY_WORDS.get(normalize_label(text).as_str()).copied()
}

/// Extract a week number from a worded marker only (`"Week 12"`, `"Semana 3"`).
/// Free-text parsing must not treat a bare numeral as a week boundary.
pub fn extract_week_marker(text: &str) -> Option<u32> {
    let n: u32 = WEEK_NUMBER_RE.captures(text)?[1].parse().ok()?;
    if n >= 1 {
        Some(n)
    } else {
        None
    }
}

/// A day marker found inside a line of text: a localized weekday word or
/// `"Day N"`, followed by a colon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayMarker {
    pub day: DayKey,
    /// Byte offset where the marker starts.
    pub start: usize,
    /// Byte offset just past the colon, where the day's content begins.
    pub content_start: usize,
}

static DAY_NUM_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bday\s*(\d{1,2})\s*:").unwrap());

static DAY_WORD_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    let words = DAY_WORDS.keys().copied().collect::<Vec<_>>().join("|");
    Regex::new(&format!(r"(?i)\b({words})\s*:")).unwrap()
});

/// Find all day markers in a line, in text order.
pub fn find_day_markers(text: &str) -> Vec<DayMarker> {
    let mut markers = Vec::new();

    for caps in DAY_NUM_MARKER_RE.captures_iter(text) {
        let m = caps.get(0).unwrap();
        if let Some(day) = caps[1]
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=7).contains(n))
            .and_then(|n| DayKey::from_index(n - 1))
        {
            markers.push(DayMarker {
                day,
                start: m.start(),
                content_start: m.end(),
            });
        }
    }

    for caps in DAY_WORD_MARKER_RE.captures_iter(text) {
        let m = caps.get(0).unwrap();
        if let Some(day) = day_from_word(&caps[1]) {
            markers.push(DayMarker {
                day,
                start: m.start(),
                content_start: m.end(),
            });
        }
    }

    markers.sort_by_key(|m| m.start);
    markers
}

/// Extract a week number from text: `"Week 12"`-style markers in any
/// supported locale, or a bare 1-3 digit numeral (table week cells).
/// Zero is never a valid week number.
pub fn extract_week_number(text: &str) -> Option<u32> {
    let n = match WEEK_NUMBER_RE.captures(text) {
        Some(caps) => caps[1].parse::<u32>().ok()?,
        None => {
            let trimmed = text.trim();
            if !BARE_NUMBER_RE.is_match(trimmed) {
                return None;
            }
            trimmed.parse::<u32>().ok()?
        }
    };
    if n >= 1 {
        Some(n)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_english_header_labels() {
        assert_eq!(canonicalize_table_label("WEEK"), Some(CanonicalLabel::Week));
        assert_eq!(
            canonicalize_table_label("MONDAY"),
            Some(CanonicalLabel::Day(DayKey::Monday))
        );
        assert_eq!(canonicalize_table_label("TWM"), Some(CanonicalLabel::Summary));
        assert_eq!(canonicalize_table_label("Notes"), None);
    }

    #[test]
    fn canonicalizes_localized_day_words() {
        assert_eq!(day_from_word("Miércoles"), Some(DayKey::Wednesday));
        assert_eq!(day_from_word("dimanche"), Some(DayKey::Sunday));
        assert_eq!(day_from_word("Donnerstag"), Some(DayKey::Thursday));
        assert_eq!(day_from_word("lördag"), Some(DayKey::Saturday));
    }

    #[test]
    fn strips_trailing_punctuation() {
        assert_eq!(day_from_word("Tuesday:"), Some(DayKey::Tuesday));
    }

    #[test]
    fn extracts_week_numbers_across_locales() {
        assert_eq!(extract_week_number("Week 12"), Some(12));
        assert_eq!(extract_week_number("WK#3"), Some(3));
        assert_eq!(extract_week_number("Semana 7 de base"), Some(7));
        assert_eq!(extract_week_number("Woche 2"), Some(2));
    }

    #[test]
    fn week_marker_requires_the_week_word() {
        assert_eq!(extract_week_marker("Week 3"), Some(3));
        assert_eq!(extract_week_marker("3"), None);
        assert_eq!(extract_week_number("3"), Some(3));
    }

    #[test]
    fn finds_day_markers_in_order() {
        let markers = find_day_markers("Monday: 5 easy Day 3: tempo");
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].day, DayKey::Monday);
        assert_eq!(markers[1].day, DayKey::Wednesday);
        assert!(markers[0].start < markers[1].start);
    }

    #[test]
    fn day_marker_number_out_of_range_ignored() {
        assert!(find_day_markers("Day 9: lost").is_empty());
    }

    #[test]
    fn extracts_bare_numerals() {
        assert_eq!(extract_week_number(" 4 "), Some(4));
        assert_eq!(extract_week_number("0"), None);
        assert_eq!(extract_week_number("4 miles"), None);
    }
}
