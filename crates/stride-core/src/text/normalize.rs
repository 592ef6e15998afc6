use regex::Regex;
use std::sync::LazyLock;

/// Unicode superscript/subscript digits and signs that PDF extractors emit
/// for footnote anchors.
const SUPER_SUB_SCRIPTS: &str = "\u{2070}\u{00b9}\u{00b2}\u{00b3}\u{2074}\u{2075}\u{2076}\u{2077}\u{2078}\u{2079}\u{207a}\u{207b}\u{207c}\u{207d}\u{207e}\u{2080}\u{2081}\u{2082}\u{2083}\u{2084}\u{2085}\u{2086}\u{2087}\u{2088}\u{2089}\u{208a}\u{208b}\u{208c}\u{208d}\u{208e}";

const FOOTNOTE_GLYPHS: &str = "\u{2020}\u{2021}\u{00a7}\u{00b6}\u{2016}\u{203b}";

const REFERENCE_ARROWS: &str = "\u{2190}\u{2191}\u{2192}\u{2193}\u{21b3}\u{2197}";

/// `★3` / `♥2`: the glyph is a plan marker (priority / bail-allowed), only
/// the trailing footnote index is noise.
static MARKER_INDEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([★♥])\s*\d+").unwrap());

/// Digit suffix glued to a word of 2+ letters, e.g. `RP9`, `miles2`.
static WORD_FOOTNOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Za-z]{2,})\d+\b").unwrap());

/// Bracketed or parenthesized footnote indices: `[1]`, `(3)`, `(iv)`.
static BRACKET_INDEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\d+\]|\((?:\d+|[ivxlcdm]+)\)").unwrap());

static HYPHEN_JOIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w)\s*[\u{2013}\u{2014}-]\s*(\w)").unwrap());

static PLUS_JOIN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\+\s*").unwrap());

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static SPLIT_MILES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d)\s*iles\b").unwrap());

static STRAY_MARKER_R_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"★\s*R\s+").unwrap());

/// Remove footnote artifacts left behind by PDF text extraction.
pub fn strip_footnote_artifacts(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter(|c| !SUPER_SUB_SCRIPTS.contains(*c))
        .filter(|c| !FOOTNOTE_GLYPHS.contains(*c))
        .filter(|c| !REFERENCE_ARROWS.contains(*c))
        .collect();
    let kept = MARKER_INDEX_RE.replace_all(&kept, "$1");
    let kept = WORD_FOOTNOTE_RE.replace_all(&kept, "$1");
    let kept = BRACKET_INDEX_RE.replace_all(&kept, "");
    kept.into_owned()
}

/// Collapse whitespace runs, tighten hyphenation and `+`-joins.
pub fn normalize_whitespace(text: &str) -> String {
    let s = HYPHEN_JOIN_RE.replace_all(text, "$1-$2");
    let s = PLUS_JOIN_RE.replace_all(&s, " + ");
    let s = WHITESPACE_RE.replace_all(&s, " ");
    s.trim().to_string()
}

/// Repair damage that table extraction inflicts on cell text: a capital
/// eaten at a cell boundary (`est;` for `Rest;`), a word split from its
/// leading letter (`iles` for `miles`), and a stray `R` left between a
/// marker glyph and the workout text.
fn repair_cell_text(text: &str) -> String {
    let mut s = text.to_string();
    if s.to_lowercase().starts_with("est;") {
        s.replace_range(..4, "Rest;");
    }
    let s = SPLIT_MILES_RE.replace_all(&s, "$1 miles");
    let s = STRAY_MARKER_R_RE.replace_all(&s, "★ ");
    s.into_owned()
}

/// Full cleanup for one table cell or text line: strip footnote artifacts,
/// normalize whitespace, repair extraction damage.
pub fn normalize_cell_text(text: &str) -> String {
    repair_cell_text(&normalize_whitespace(&strip_footnote_artifacts(text)))
}
