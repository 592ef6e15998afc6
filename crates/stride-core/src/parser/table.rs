use crate::layout::{cluster_rows, RowCluster};
use crate::model::{DayKey, PageText, PositionedFragment, Week};
use crate::parser::{weeks_from_map, ParseOutcome, ScanDiagnostics};
use crate::text::{
    canonicalize_table_label, extract_week_number, normalize_cell_text, CanonicalLabel,
};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Body rows must sit at least this far below the header row.
const HEADER_Y_MARGIN: f32 = 4.0;

/// Rows below this y are footer territory and are skipped.
const FOOTER_MIN_Y: f32 = 40.0;

/// Leading-boundary extension when the first column gap is degenerate.
const LEADING_BOUNDARY_FALLBACK: f32 = 36.0;

/// A detected weekday header row: one column anchor per WEEK + 7 weekdays,
/// plus an optional trailing summary column that is never assigned content.
#[derive(Debug, Clone)]
pub struct TableHeader {
    pub page: usize,
    pub y: f32,
    pub column_x: [f32; 8],
    pub summary_column_x: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnRole {
    WeekNumber,
    Day(DayKey),
}

/// Column anchors sorted left-to-right with the cell boundaries between them.
#[derive(Debug, Clone)]
struct ColumnGrid {
    roles: [ColumnRole; 8],
    boundaries: [f32; 9],
}

static FOOTNOTE_ONLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d{1,2}|\[\d+\]|[★♥\s]+)$").unwrap());

/// Footnote residue that should not become day content: bare 1-2 digit
/// numbers, bracketed numbers, bare marker glyphs.
fn is_likely_footnote_only(text: &str) -> bool {
    FOOTNOTE_ONLY_RE.is_match(text.trim())
}

/// Scan one page for a weekday header row.
///
/// Anchors on fragments whose canonical label is MONDAY, then requires the
/// full {WEEK, MONDAY..SUNDAY} set within y tolerance. This rejects headers
/// bisected by page breaks and decorative repeats of single day words.
pub fn detect_header(page: &PageText, y_tolerance: f32) -> Option<TableHeader> {
    for anchor in &page.fragments {
        if canonicalize_table_label(&anchor.text) != Some(CanonicalLabel::Day(DayKey::Monday)) {
            continue;
        }

        let mut xs: [Option<f32>; 8] = [None; 8];
        let mut summary = None;
        for fragment in &page.fragments {
            if (fragment.y - anchor.y).abs() > y_tolerance {
                continue;
            }
            match canonicalize_table_label(&fragment.text) {
                Some(CanonicalLabel::Week) => {
                    xs[0].get_or_insert(fragment.x);
                }
                Some(CanonicalLabel::Day(day)) => {
                    xs[1 + day.index()].get_or_insert(fragment.x);
                }
                Some(CanonicalLabel::Summary) => {
                    summary.get_or_insert(fragment.x);
                }
                None => {}
            }
        }

        if xs.iter().all(|x| x.is_some()) {
            let mut column_x = [0.0f32; 8];
            for (slot, x) in column_x.iter_mut().zip(xs) {
                *slot = x.unwrap();
            }
            return Some(TableHeader {
                page: page.page_number,
                y: anchor.y,
                column_x,
                summary_column_x: summary,
            });
        }
    }
    None
}

/// Derive cell boundaries from a header: midpoints between adjacent
/// anchors, a half-gap leading extension, and a trailing edge stopping at
/// the summary column when one exists.
fn build_grid(header: &TableHeader, page_width: f32) -> ColumnGrid {
    let mut columns: Vec<(f32, ColumnRole)> = vec![(header.column_x[0], ColumnRole::WeekNumber)];
    for day in DayKey::ALL {
        columns.push((header.column_x[1 + day.index()], ColumnRole::Day(day)));
    }
    columns.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let xs: Vec<f32> = columns.iter().map(|(x, _)| *x).collect();
    let mut boundaries = [0.0f32; 9];

    let first_gap = xs[1] - xs[0];
    boundaries[0] = if first_gap > 0.0 {
        (xs[0] - first_gap / 2.0).max(0.0)
    } else {
        (xs[0] - LEADING_BOUNDARY_FALLBACK).max(0.0)
    };
    for i in 1..8 {
        boundaries[i] = (xs[i - 1] + xs[i]) / 2.0;
    }
    boundaries[8] = match header.summary_column_x {
        Some(summary_x) => (xs[7] + summary_x) / 2.0,
        None => (xs[7] + (xs[7] - xs[6])).min(page_width),
    };

    let mut roles = [ColumnRole::WeekNumber; 8];
    for (slot, (_, role)) in roles.iter_mut().zip(&columns) {
        *slot = *role;
    }
    ColumnGrid { roles, boundaries }
}

/// Body fragments for one page: strictly below the header (when this page
/// has one), above the footer band, inside the boundary span.
fn body_rows(
    page: &PageText,
    header_y: Option<f32>,
    grid: &ColumnGrid,
    y_tolerance: f32,
) -> Vec<RowCluster> {
    let fragments: Vec<PositionedFragment> = page
        .fragments
        .iter()
        .filter(|f| match header_y {
            Some(hy) => f.y < hy - HEADER_Y_MARGIN,
            None => true,
        })
        .filter(|f| f.y > FOOTER_MIN_Y)
        .filter(|f| f.x >= grid.boundaries[0] && f.x <= grid.boundaries[8])
        .cloned()
        .collect();
    cluster_rows(&fragments, y_tolerance)
}

/// Bucket one row's fragments into the 8 column cells. Fragments outside
/// every boundary are discarded.
fn row_cells(row: &RowCluster, grid: &ColumnGrid) -> [String; 8] {
    let mut buckets: [Vec<&PositionedFragment>; 8] = Default::default();
    for fragment in &row.fragments {
        for i in 0..8 {
            if fragment.x >= grid.boundaries[i] && fragment.x < grid.boundaries[i + 1] {
                buckets[i].push(fragment);
                break;
            }
        }
    }
    let mut cells: [String; 8] = Default::default();
    for (cell, bucket) in cells.iter_mut().zip(&buckets) {
        let joined = bucket
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        *cell = normalize_cell_text(&joined);
    }
    cells
}

/// A body row that is itself a repeated header row (all canonical labels
/// present) must be dropped, not appended as content.
fn is_repeated_header(cells: &[String; 8]) -> bool {
    let mut has_week = false;
    let mut days = [false; 7];
    for cell in cells {
        match canonicalize_table_label(cell) {
            Some(CanonicalLabel::Week) => has_week = true,
            Some(CanonicalLabel::Day(day)) => days[day.index()] = true,
            _ => {}
        }
    }
    has_week && days.iter().all(|d| *d)
}

/// Parse a weekday-grid document into weeks. Zero weeks means table mode
/// failed and the caller should fall through to text-fallback mode.
pub fn parse_table(pages: &[PageText], y_tolerance: f32) -> ParseOutcome {
    let mut weeks: BTreeMap<u32, Week> = BTreeMap::new();
    let mut diagnostics = ScanDiagnostics::default();
    let mut active_week: Option<u32> = None;
    let mut grid: Option<ColumnGrid> = None;

    for page in pages {
        diagnostics.pages_scanned += 1;

        let header = detect_header(page, y_tolerance);
        if let Some(ref h) = header {
            grid = Some(build_grid(h, page.width));
        }
        let Some(current_grid) = grid.as_ref() else {
            // No header seen anywhere yet; nothing on this page can be
            // placed into columns.
            continue;
        };

        let rows = body_rows(page, header.as_ref().map(|h| h.y), current_grid, y_tolerance);
        diagnostics.row_clusters += rows.len();

        for row in &rows {
            let cells = row_cells(row, current_grid);
            if is_repeated_header(&cells) {
                continue;
            }

            let mut day_texts: Vec<(DayKey, &str)> = Vec::new();
            for (i, role) in current_grid.roles.iter().enumerate() {
                let text = cells[i].as_str();
                if text.is_empty() {
                    continue;
                }
                match role {
                    ColumnRole::WeekNumber => {
                        if let Some(n) = extract_week_number(text) {
                            active_week = Some(n);
                            diagnostics.week_markers_found += 1;
                        }
                    }
                    ColumnRole::Day(day) => {
                        if is_likely_footnote_only(text) {
                            continue;
                        }
                        if canonicalize_table_label(text).is_some() {
                            // A stray re-detected column label, not content.
                            continue;
                        }
                        day_texts.push((*day, text));
                    }
                }
            }

            if day_texts.is_empty() {
                continue;
            }
            let Some(week_number) = active_week else {
                diagnostics.lines_dropped_no_week += 1;
                continue;
            };

            let week = weeks
                .entry(week_number)
                .or_insert_with(|| Week::new(week_number));
            for (day, text) in day_texts {
                week.append_day_text(day, text);
                diagnostics.lines_assigned += 1;
            }
        }
    }

    ParseOutcome {
        weeks: weeks_from_map(weeks),
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::DEFAULT_Y_TOLERANCE;

    fn frag(text: &str, x: f32, y: f32) -> PositionedFragment {
        PositionedFragment {
            text: text.into(),
            x,
            y,
            page: 1,
        }
    }

    const COLS: [f32; 8] = [40.0, 100.0, 170.0, 240.0, 310.0, 380.0, 450.0, 520.0];
    const DAY_LABELS: [&str; 7] = [
        "MONDAY",
        "TUESDAY",
        "WEDNESDAY",
        "THURSDAY",
        "FRIDAY",
        "SATURDAY",
        "SUNDAY",
    ];

    fn header_fragments(y: f32) -> Vec<PositionedFragment> {
        let mut out = vec![frag("WEEK", COLS[0], y)];
        for (i, label) in DAY_LABELS.iter().enumerate() {
            out.push(frag(label, COLS[1 + i], y));
        }
        out
    }

    fn page(fragments: Vec<PositionedFragment>) -> PageText {
        PageText {
            page_number: 1,
            width: 612.0,
            height: 792.0,
            fragments,
        }
    }

    #[test]
    fn detects_complete_header() {
        let p = page(header_fragments(700.0));
        let header = detect_header(&p, DEFAULT_Y_TOLERANCE).unwrap();
        assert_eq!(header.y, 700.0);
        assert_eq!(header.column_x[0], 40.0);
        assert!(header.summary_column_x.is_none());
    }

    #[test]
    fn rejects_partial_header() {
        // MONDAY present but the rest of the label set missing.
        let p = page(vec![frag("MONDAY", 100.0, 700.0), frag("WEEK", 40.0, 700.0)]);
        assert!(detect_header(&p, DEFAULT_Y_TOLERANCE).is_none());
    }

    #[test]
    fn records_summary_column_without_assigning_it() {
        let mut fragments = header_fragments(700.0);
        fragments.push(frag("TWM", 580.0, 700.0));
        fragments.push(frag("1", COLS[0], 650.0));
        fragments.push(frag("Rest", COLS[1], 650.0));
        // Weekly total sits in the summary column and must be discarded.
        fragments.push(frag("32", 580.0, 650.0));
        let outcome = parse_table(&[page(fragments)], DEFAULT_Y_TOLERANCE);

        assert_eq!(outcome.weeks.len(), 1);
        let week = &outcome.weeks[0];
        assert_eq!(week.days[&DayKey::Monday].raw_text, "Rest");
        assert_eq!(week.populated_days(), 1);
    }

    #[test]
    fn week_number_carries_forward_across_rows() {
        let mut fragments = header_fragments(700.0);
        fragments.push(frag("2", COLS[0], 650.0));
        fragments.push(frag("4 miles easy", COLS[2], 650.0));
        // Continuation row without a week cell.
        fragments.push(frag("+ strides", COLS[2], 630.0));
        let outcome = parse_table(&[page(fragments)], DEFAULT_Y_TOLERANCE);

        assert_eq!(outcome.weeks.len(), 1);
        assert_eq!(outcome.weeks[0].number, 2);
        assert_eq!(
            outcome.weeks[0].days[&DayKey::Tuesday].raw_text,
            "4 miles easy + strides"
        );
    }

    #[test]
    fn footnote_only_cells_discarded() {
        let mut fragments = header_fragments(700.0);
        fragments.push(frag("1", COLS[0], 650.0));
        fragments.push(frag("5 miles", COLS[1], 650.0));
        fragments.push(frag("3", COLS[2], 650.0));
        fragments.push(frag("★", COLS[3], 650.0));
        let outcome = parse_table(&[page(fragments)], DEFAULT_Y_TOLERANCE);

        let week = &outcome.weeks[0];
        assert_eq!(week.populated_days(), 1);
        assert_eq!(week.days[&DayKey::Monday].raw_text, "5 miles");
    }

    #[test]
    fn repeated_header_rows_dropped() {
        let mut fragments = header_fragments(700.0);
        fragments.push(frag("1", COLS[0], 680.0));
        fragments.push(frag("Rest", COLS[1], 680.0));
        // The header repeats mid-table (new month block).
        fragments.extend(header_fragments(660.0));
        fragments.push(frag("2", COLS[0], 640.0));
        fragments.push(frag("Tempo", COLS[1], 640.0));
        let outcome = parse_table(&[page(fragments)], DEFAULT_Y_TOLERANCE);

        assert_eq!(outcome.weeks.len(), 2);
        assert_eq!(outcome.weeks[0].days[&DayKey::Monday].raw_text, "Rest");
        assert_eq!(outcome.weeks[1].days[&DayKey::Monday].raw_text, "Tempo");
    }

    #[test]
    fn continuation_page_reuses_header_grid() {
        let page1 = {
            let mut fragments = header_fragments(700.0);
            fragments.push(frag("1", COLS[0], 650.0));
            fragments.push(frag("Rest", COLS[1], 650.0));
            page(fragments)
        };
        let page2 = PageText {
            page_number: 2,
            width: 612.0,
            height: 792.0,
            fragments: vec![frag("2", COLS[0], 700.0), frag("Hills", COLS[1], 700.0)],
        };
        let outcome = parse_table(&[page1, page2], DEFAULT_Y_TOLERANCE);

        assert_eq!(outcome.weeks.len(), 2);
        assert_eq!(outcome.weeks[1].days[&DayKey::Monday].raw_text, "Hills");
    }

    #[test]
    fn no_header_anywhere_yields_zero_weeks() {
        let p = page(vec![
            frag("Week 1", 40.0, 700.0),
            frag("Monday: 5 miles", 40.0, 680.0),
        ]);
        let outcome = parse_table(&[p], DEFAULT_Y_TOLERANCE);
        assert!(outcome.is_empty());
    }
}
