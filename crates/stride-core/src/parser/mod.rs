pub mod fallback;
pub mod table;

use crate::model::{ParserId, Week};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counters accumulated while scanning a document. Kept on the candidate
/// for quality scoring and operator debugging; never shown to end users.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanDiagnostics {
    pub pages_scanned: usize,
    pub row_clusters: usize,
    pub week_markers_found: usize,
    pub day_markers_found: usize,
    pub lines_assigned: usize,
    pub continuation_lines: usize,
    pub lines_dropped_no_week: usize,
    pub lines_dropped_no_day: usize,
}

/// What one parsing strategy produced: the week grid plus its scan counters.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub weeks: Vec<Week>,
    pub diagnostics: ScanDiagnostics,
}

impl ParseOutcome {
    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }
}

/// One independently-computed parse, scored and ready for selection.
/// Request-scoped: created, scored, one selected, all discarded.
#[derive(Debug, Clone)]
pub struct ParseCandidate {
    pub parser: ParserId,
    pub weeks: Vec<Week>,
    pub quality: crate::quality::ParseQuality,
    pub diagnostics: ScanDiagnostics,
}

/// Drain a week accumulation map into week-number order.
pub(crate) fn weeks_from_map(map: BTreeMap<u32, Week>) -> Vec<Week> {
    map.into_values().collect()
}
