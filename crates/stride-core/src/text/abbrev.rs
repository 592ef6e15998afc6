use regex::Regex;
use std::sync::LazyLock;

/// Ordered abbreviation decoding rules. Longer/more specific tokens come
/// first so e.g. `LRL` never decodes as `LR` plus a stray letter.
static ABBREV_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    let rule = |pattern: &str, replacement: &'static str| {
        (Regex::new(pattern).unwrap(), replacement)
    };
    vec![
        rule(r"(?i)\bLRL\b", "long run"),
        rule(r"(?i)\bLR\b", "long run"),
        rule(r"(?i)\bWU\b", "warm up"),
        rule(r"(?i)\bCD\b", "cool down"),
        rule(r"(?i)\bSTR\b", "strength"),
        rule(r"(?i)\bRST\b", "rest"),
        rule(r"(?i)\bXT\b", "cross training"),
        rule(r"(?i)\bMOB\b", "mobility"),
        rule(r"(?i)\bREC\b", "recovery"),
        rule(r"(?i)\bFF\b", "fast finish"),
        rule(r"(?i)\bMP\b", "marathon pace"),
        rule(r"(?i)\bRP\b", "race pace"),
        // Single-letter pace codes are only decoded in uppercase and only
        // directly before a number, e.g. "T4" or "E 5".
        rule(r"\bE\s*(\d)", "easy run $1"),
        rule(r"\bT\s*(\d)", "tempo $1"),
        rule(r"\bI\s*(\d)", "interval $1"),
    ]
});

/// Expand plan abbreviations into their long forms, applying the ordered
/// rule list.
pub fn decode_abbreviations(text: &str) -> String {
    let mut s = text.to_string();
    for (re, replacement) in ABBREV_RULES.iter() {
        s = re.replace_all(&s, *replacement).into_owned();
    }
    s
}

/// How many abbreviation tokens remain undecoded in `text`. Used when two
/// raw-text variants of the same activity compete: fewer remaining tokens
/// means the more readable text.
pub fn count_abbreviation_tokens(text: &str) -> usize {
    ABBREV_RULES
        .iter()
        .map(|(re, _)| re.find_iter(text).count())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_structured_run_shorthand() {
        assert_eq!(
            decode_abbreviations("2mi WU + 4mi tempo + 1mi CD"),
            "2mi warm up + 4mi tempo + 1mi cool down"
        );
    }

    #[test]
    fn lrl_decodes_before_lr() {
        assert_eq!(decode_abbreviations("LRL 16 miles"), "long run 16 miles");
        assert_eq!(decode_abbreviations("LR 10"), "long run 10");
    }

    #[test]
    fn multi_letter_rules_are_case_insensitive() {
        assert_eq!(decode_abbreviations("wu then xt"), "warm up then cross training");
    }

    #[test]
    fn pace_codes_require_uppercase_and_number() {
        assert_eq!(decode_abbreviations("T4"), "tempo 4");
        assert_eq!(decode_abbreviations("E 5 miles"), "easy run 5 miles");
        assert_eq!(decode_abbreviations("I8x400"), "interval 8x400");
        // Lowercase or bare letters stay untouched.
        assert_eq!(decode_abbreviations("t4 time"), "t4 time");
        assert_eq!(decode_abbreviations("plan E"), "plan E");
    }

    #[test]
    fn counts_remaining_tokens() {
        assert_eq!(count_abbreviation_tokens("2mi WU + 1mi CD"), 2);
        assert_eq!(count_abbreviation_tokens("warm up and cool down"), 0);
    }
}
