use std::path::PathBuf;
use stride_core::model::PageText;
use stride_core::{ParseOptions, StrideError};

/// Parse and dump per-candidate quality plus scan counters, for operator
/// debugging of a misbehaving document.
pub fn run(input_file: PathBuf) -> Result<(), StrideError> {
    let raw = std::fs::read_to_string(&input_file)?;
    let pages: Vec<PageText> = serde_json::from_str(&raw)?;

    let plan = stride_core::parse_plan(&pages, &ParseOptions::default())?;

    println!(
        "selected: {} (score {})",
        plan.parse_meta.selected_parser, plan.parse_meta.quality.score
    );
    for candidate in &plan.parse_meta.candidates {
        let q = &candidate.quality;
        let d = &candidate.diagnostics;
        println!("\ncandidate: {}", candidate.parser);
        println!(
            "  score {}  weeks {}  coverage {:.2}  populated days {}",
            q.score, q.week_count, q.day_coverage, q.populated_days
        );
        println!(
            "  avg chars/day {:.1}  unknown ratio {:.2}  consecutive coverage {:.2}",
            q.avg_chars_per_populated_day, q.unknown_segment_ratio, q.consecutive_week_coverage
        );
        println!(
            "  pages {}  rows {}  week markers {}  day markers {}",
            d.pages_scanned, d.row_clusters, d.week_markers_found, d.day_markers_found
        );
        println!(
            "  assigned {}  continuations {}  dropped no-week {}  dropped no-day {}",
            d.lines_assigned,
            d.continuation_lines,
            d.lines_dropped_no_week,
            d.lines_dropped_no_day
        );
    }

    Ok(())
}
