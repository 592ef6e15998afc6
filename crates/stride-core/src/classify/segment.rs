use regex::Regex;
use std::sync::LazyLock;

static WARMUP_MARK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bwu\b|warm\s*up").unwrap());

static TEMPO_MARK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\btempo\b|\bT\d").unwrap());

static COOLDOWN_MARK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcd\b|cool\s*down").unwrap());

static NON_RUN_MARK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(strength|rest|yoga|hike|hiking|cross|bike|biking|swim|swimming)\b")
        .unwrap()
});

static REST_OR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^rest(?:\s+day)?\s+or\s+(.+)$").unwrap());

/// A segment that is one structured run with warm-up/tempo/cool-down phases
/// must stay whole even though it contains `+` joins. At least two of the
/// three phase markers, and no non-run marker.
fn looks_like_structured_run(text: &str) -> bool {
    if NON_RUN_MARK_RE.is_match(text) {
        return false;
    }
    let phases = [
        WARMUP_MARK_RE.is_match(text),
        TEMPO_MARK_RE.is_match(text),
        COOLDOWN_MARK_RE.is_match(text),
    ];
    phases.iter().filter(|p| **p).count() >= 2
}

/// Split a day segment into discrete activity strings.
///
/// Tokenizes on `+`, `;`, `|`, and `/` surrounded by whitespace, never
/// inside brackets, and never inside a structured-run segment.
pub fn split_combined_activities(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if looks_like_structured_run(trimmed) {
        return vec![trimmed.to_string()];
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut depth: i32 = 0;
    let chars: Vec<char> = trimmed.chars().collect();

    for (i, c) in chars.iter().enumerate() {
        match c {
            '(' | '[' | '{' => {
                depth += 1;
                current.push(*c);
            }
            ')' | ']' | '}' => {
                depth = (depth - 1).max(0);
                current.push(*c);
            }
            '+' | ';' | '|' if depth == 0 => {
                pieces.push(std::mem::take(&mut current));
            }
            '/' if depth == 0 => {
                let prev_ws = i > 0 && chars[i - 1].is_whitespace();
                let next_ws = chars.get(i + 1).is_some_and(|n| n.is_whitespace());
                if prev_ws && next_ws {
                    pieces.push(std::mem::take(&mut current));
                } else {
                    current.push(*c);
                }
            }
            _ => current.push(*c),
        }
    }
    pieces.push(current);

    pieces
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// `"rest day or X"` offers two alternatives: a rest entry and X.
pub fn expand_alternatives(text: &str) -> Vec<String> {
    match REST_OR_RE.captures(text.trim()) {
        Some(caps) => vec!["Rest Day".to_string(), caps[1].trim().to_string()],
        None => vec![text.trim().to_string()],
    }
}

/// Strip the priority/bail marker glyphs, returning the cleaned text and
/// the flags they carried.
pub fn extract_markers(text: &str) -> (String, bool, bool) {
    let must_do = text.contains('★');
    let bail_allowed = text.contains('♥');
    let cleaned = text
        .replace(['★', '♥'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    (cleaned, must_do, bail_allowed)
}
