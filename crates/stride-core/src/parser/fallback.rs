use crate::layout::{cluster_rows, join_fragments, split_row_by_gaps};
use crate::model::{DayKey, PageText, Week};
use crate::parser::{weeks_from_map, ParseOutcome, ScanDiagnostics};
use crate::text::labels::{extract_week_marker, find_day_markers};
use crate::text::normalize_cell_text;
use std::collections::{BTreeMap, BTreeSet};

/// Thresholds for promoting day content seen before any explicit week
/// marker into a synthesized week. Tuned empirically; kept configurable
/// rather than re-derived.
#[derive(Debug, Clone, Copy)]
pub struct PromotionThresholds {
    /// Promote once this many distinct days have been buffered.
    pub min_distinct_days: usize,
    /// Promote once this many consecutive weekdays appear in sequence
    /// (e.g. Mon, Tue, Wed).
    pub consecutive_days: usize,
}

impl Default for PromotionThresholds {
    fn default() -> Self {
        PromotionThresholds {
            min_distinct_days: 5,
            consecutive_days: 3,
        }
    }
}

/// Day content observed before a week boundary is confirmed, plus the
/// day-sequence log that drives promotion.
#[derive(Debug, Default)]
struct PendingBuffer {
    days: BTreeMap<DayKey, String>,
    sequence: Vec<DayKey>,
    active_day: Option<DayKey>,
}

impl PendingBuffer {
    fn append(&mut self, day: DayKey, text: &str) {
        let slot = self.days.entry(day).or_default();
        if text.is_empty() {
            return;
        }
        if slot.is_empty() {
            slot.push_str(text);
        } else {
            slot.push(' ');
            slot.push_str(text);
        }
    }

    fn log_day(&mut self, day: DayKey) {
        self.sequence.push(day);
        self.active_day = Some(day);
    }

    fn should_promote(&self, thresholds: &PromotionThresholds) -> bool {
        let distinct: BTreeSet<DayKey> = self.sequence.iter().copied().collect();
        if distinct.len() >= thresholds.min_distinct_days {
            return true;
        }
        let run = thresholds.consecutive_days;
        if run < 2 || self.sequence.len() < run {
            return false;
        }
        self.sequence.windows(run).any(|window| {
            window
                .windows(2)
                .all(|pair| pair[1].index() == pair[0].index() + 1)
        })
    }
}

/// Where the scan currently stands relative to week structure.
#[derive(Debug)]
enum WeekCursor {
    /// Nothing seen yet.
    Idle,
    /// Day content buffered, no week boundary confirmed.
    Pending(PendingBuffer),
    /// Committed to a week number.
    Active(u32),
}

impl WeekCursor {
    fn active_week(&self) -> Option<u32> {
        match self {
            WeekCursor::Active(n) => Some(*n),
            _ => None,
        }
    }
}

struct TextScanState {
    thresholds: PromotionThresholds,
    weeks: BTreeMap<u32, Week>,
    cursor: WeekCursor,
    active_day: Option<DayKey>,
    max_week_seen: u32,
    diagnostics: ScanDiagnostics,
}

impl TextScanState {
    fn new(thresholds: PromotionThresholds) -> Self {
        TextScanState {
            thresholds,
            weeks: BTreeMap::new(),
            cursor: WeekCursor::Idle,
            active_day: None,
            max_week_seen: 0,
            diagnostics: ScanDiagnostics::default(),
        }
    }

    fn commit(&mut self, week_number: u32, day: DayKey, text: &str) {
        let week = self
            .weeks
            .entry(week_number)
            .or_insert_with(|| Week::new(week_number));
        week.days.entry(day).or_default();
        if !text.is_empty() {
            week.append_day_text(day, text);
            self.diagnostics.lines_assigned += 1;
        }
    }

    /// Flush the whole pending buffer into a freshly synthesized week.
    /// Synthetic numbers grow monotonically past anything already seen.
    fn promote_pending(&mut self, buffer: PendingBuffer) {
        let week_number = self.max_week_seen + 1;
        self.max_week_seen = week_number;
        self.active_day = buffer.active_day;
        for (day, text) in buffer.days {
            self.commit(week_number, day, &text);
        }
        self.cursor = WeekCursor::Active(week_number);
    }

    /// Route one day-marker segment through the current cursor state.
    fn day_segment(&mut self, day: DayKey, content: &str) {
        if let Some(week_number) = self.cursor.active_week() {
            self.active_day = Some(day);
            self.commit(week_number, day, content);
            return;
        }

        if matches!(self.cursor, WeekCursor::Idle) {
            self.cursor = WeekCursor::Pending(PendingBuffer::default());
        }
        let promote = {
            let WeekCursor::Pending(buffer) = &mut self.cursor else {
                return;
            };
            buffer.append(day, content);
            buffer.log_day(day);
            buffer.should_promote(&self.thresholds)
        };
        if promote {
            if let WeekCursor::Pending(buffer) =
                std::mem::replace(&mut self.cursor, WeekCursor::Idle)
            {
                self.promote_pending(buffer);
            }
        }
    }

    fn process_line(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }

        let week_marker = extract_week_marker(line);
        if let Some(n) = week_marker {
            // An explicit week boundary discards any unpromoted pending
            // content and clears the day cursor.
            self.cursor = WeekCursor::Active(n);
            self.active_day = None;
            self.max_week_seen = self.max_week_seen.max(n);
            self.diagnostics.week_markers_found += 1;
        }

        let markers = find_day_markers(line);
        if markers.is_empty() {
            if week_marker.is_none() {
                self.continuation_line(line);
            }
            return;
        }

        self.diagnostics.day_markers_found += markers.len();
        for (i, marker) in markers.iter().enumerate() {
            let end = markers.get(i + 1).map(|m| m.start).unwrap_or(line.len());
            let content = line[marker.content_start..end].trim().to_string();
            self.day_segment(marker.day, &content);
        }
    }

    /// A line with no week or day marker continues the current day, or is
    /// dropped and counted.
    fn continuation_line(&mut self, line: &str) {
        if let Some(week_number) = self.cursor.active_week() {
            match self.active_day {
                Some(day) => {
                    self.commit(week_number, day, line);
                    self.diagnostics.continuation_lines += 1;
                }
                None => self.diagnostics.lines_dropped_no_day += 1,
            }
            return;
        }

        match &mut self.cursor {
            WeekCursor::Pending(buffer) if buffer.active_day.is_some() => {
                let day = buffer.active_day.unwrap();
                buffer.append(day, line);
                self.diagnostics.continuation_lines += 1;
            }
            _ => self.diagnostics.lines_dropped_no_week += 1,
        }
    }
}

/// Parse a free-form document using week/day textual markers and the
/// implicit-structure promotion heuristic. Rows come from the layout
/// clusterer; gap-split segments are independent lines.
pub fn parse_text(
    pages: &[PageText],
    y_tolerance: f32,
    thresholds: PromotionThresholds,
) -> ParseOutcome {
    let mut state = TextScanState::new(thresholds);

    for page in pages {
        state.diagnostics.pages_scanned += 1;
        let rows = cluster_rows(&page.fragments, y_tolerance);
        state.diagnostics.row_clusters += rows.len();
        for row in &rows {
            for group in split_row_by_gaps(row, page.width) {
                let line = normalize_cell_text(&join_fragments(&group));
                state.process_line(&line);
            }
        }
    }

    if state.weeks.is_empty() {
        tracing::debug!(
            dropped_no_week = state.diagnostics.lines_dropped_no_week,
            dropped_no_day = state.diagnostics.lines_dropped_no_day,
            "text-fallback scan found no week structure"
        );
    }

    ParseOutcome {
        weeks: weeks_from_map(state.weeks),
        diagnostics: state.diagnostics,
    }
}
