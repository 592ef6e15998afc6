use crate::layout::{cluster_rows, join_fragments, DEFAULT_Y_TOLERANCE};
use crate::model::{PageText, PositionedFragment};
use crate::text::normalize_whitespace;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Workout-type labels a plan glossary defines. Matching is
/// case-insensitive against the reassembled column text.
const GLOSSARY_LABELS: &[&str] = &[
    "Strength",
    "Easy",
    "Tempo",
    "Progression Run",
    "Hill Pyramid",
    "Incline Treadmill",
    "Hills",
    "Cross Training",
    "Recovery Run",
    "Fast Finish",
    "Long Run",
    "Training Race",
];

static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = GLOSSARY_LABELS
        .iter()
        .map(|l| regex::escape(l))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b({pattern})\s*:\s*")).unwrap()
});

static DISCLAIMER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)disclaimer\s*:").unwrap());

/// Per-label word-boundary matchers for cross-label overlap detection.
static LABEL_WORD_RES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    GLOSSARY_LABELS
        .iter()
        .map(|label| {
            let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(label))).unwrap();
            (*label, re)
        })
        .collect()
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlossaryEntry {
    pub title: String,
    pub definition: String,
    pub needs_review: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Glossary {
    pub entries: BTreeMap<String, GlossaryEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub review_needed: Vec<String>,
}

/// Reassemble one column's fragments into flowing text, reading order.
fn column_text(fragments: &[PositionedFragment]) -> String {
    let rows = cluster_rows(fragments, DEFAULT_Y_TOLERANCE);
    let joined = rows
        .iter()
        .map(|row| join_fragments(&row.fragments))
        .collect::<Vec<_>>()
        .join(" ");
    normalize_whitespace(&joined)
}

/// Slice a column's text into label → definition pairs.
fn parse_column(text: &str) -> BTreeMap<String, String> {
    let mut entries = BTreeMap::new();
    let matches: Vec<(usize, usize, String)> = LABEL_RE
        .captures_iter(text)
        .map(|caps| {
            let m = caps.get(0).unwrap();
            (m.start(), m.end(), caps[1].to_lowercase())
        })
        .collect();

    for (i, (_, def_start, label)) in matches.iter().enumerate() {
        let def_end = matches
            .get(i + 1)
            .map(|(start, _, _)| *start)
            .unwrap_or(text.len());
        let mut definition = text[*def_start..def_end].trim().to_string();
        if let Some(m) = DISCLAIMER_RE.find(&definition) {
            definition.truncate(m.start());
        }
        let definition = definition
            .trim()
            .trim_matches(|c| c == '-' || c == ';' || c == ' ')
            .to_string();
        if !definition.is_empty() {
            entries.insert(label.clone(), definition);
        }
    }
    entries
}

/// Extract the workout glossary from the trailing page of a plan.
///
/// Glossaries render as two columns; the page is split at the horizontal
/// midline and each half is reassembled and sliced at known labels. When a
/// label appears in both columns the wordier definition wins. Definitions
/// that mention another label are flagged for review rather than dropped.
pub fn extract_glossary(pages: &[PageText]) -> Option<Glossary> {
    let page = pages.last()?;
    let midline = page.width / 2.0;

    let (left, right): (Vec<PositionedFragment>, Vec<PositionedFragment>) = page
        .fragments
        .iter()
        .cloned()
        .partition(|f| f.x < midline);

    let left_entries = parse_column(&column_text(&left));
    let right_entries = parse_column(&column_text(&right));

    let mut entries = BTreeMap::new();
    let mut review_needed = Vec::new();

    for label in GLOSSARY_LABELS {
        let key = label.to_lowercase();
        let candidates: Vec<&String> = left_entries
            .get(&key)
            .into_iter()
            .chain(right_entries.get(&key))
            .collect();
        let Some(best) = candidates
            .into_iter()
            .max_by_key(|d| d.split_whitespace().count())
        else {
            continue;
        };

        let mut issues = Vec::new();
        for (other, other_re) in LABEL_WORD_RES.iter() {
            if other.eq_ignore_ascii_case(label) {
                continue;
            }
            if other_re.is_match(best) {
                issues.push(format!("overlap_with_label:{other}"));
            }
        }
        let needs_review = !issues.is_empty();
        if needs_review {
            review_needed.push(label.to_string());
        }

        entries.insert(
            key,
            GlossaryEntry {
                title: label.to_string(),
                definition: best.clone(),
                needs_review,
                issues,
            },
        );
    }

    if entries.is_empty() {
        None
    } else {
        Some(Glossary {
            entries,
            review_needed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(text: &str, x: f32, y: f32) -> PositionedFragment {
        PositionedFragment {
            text: text.into(),
            x,
            y,
            page: 3,
        }
    }

    fn glossary_page() -> PageText {
        PageText {
            page_number: 3,
            width: 612.0,
            height: 792.0,
            fragments: vec![
                frag("Tempo: comfortably hard effort you", 40.0, 700.0),
                frag("could hold for about an hour", 40.0, 680.0),
                frag("Easy: conversational pace recovery", 40.0, 640.0),
                frag("Hills: short steep repeats done", 340.0, 700.0),
                frag("at strong effort", 340.0, 680.0),
                frag("Fast Finish: final stretch at tempo", 340.0, 640.0),
            ],
        }
    }

    #[test]
    fn parses_two_column_glossary() {
        let glossary = extract_glossary(&[glossary_page()]).unwrap();
        assert_eq!(
            glossary.entries["tempo"].definition,
            "comfortably hard effort you could hold for about an hour"
        );
        assert_eq!(
            glossary.entries["hills"].definition,
            "short steep repeats done at strong effort"
        );
        assert!(glossary.entries.contains_key("easy"));
    }

    #[test]
    fn overlapping_definitions_flagged_for_review() {
        let glossary = extract_glossary(&[glossary_page()]).unwrap();
        // "Fast Finish" definition mentions Tempo, so it needs review.
        let fast_finish = &glossary.entries["fast finish"];
        assert!(fast_finish.needs_review);
        assert!(fast_finish
            .issues
            .iter()
            .any(|i| i == "overlap_with_label:Tempo"));
        assert!(glossary.review_needed.contains(&"Fast Finish".to_string()));
    }

    #[test]
    fn disclaimer_tail_trimmed() {
        let page = PageText {
            page_number: 1,
            width: 612.0,
            height: 792.0,
            fragments: vec![frag(
                "Easy: relaxed running Disclaimer: consult a physician",
                40.0,
                700.0,
            )],
        };
        let glossary = extract_glossary(&[page]).unwrap();
        assert_eq!(glossary.entries["easy"].definition, "relaxed running");
    }

    #[test]
    fn no_labels_yields_none() {
        let page = PageText {
            page_number: 1,
            width: 612.0,
            height: 792.0,
            fragments: vec![frag("just some closing notes", 40.0, 700.0)],
        };
        assert!(extract_glossary(&[page]).is_none());
    }
}
