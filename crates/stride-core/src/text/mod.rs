pub mod abbrev;
pub mod labels;
pub mod normalize;

pub use abbrev::{count_abbreviation_tokens, decode_abbreviations};
pub use labels::{canonicalize_table_label, day_from_word, extract_week_number, CanonicalLabel};
pub use normalize::{normalize_cell_text, normalize_whitespace, strip_footnote_artifacts};
