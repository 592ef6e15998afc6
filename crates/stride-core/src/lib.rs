pub mod classify;
pub mod enhance;
pub mod error;
pub mod glossary;
pub mod layout;
pub mod model;
pub mod numeric;
pub mod parser;
pub mod quality;
pub mod text;

pub use enhance::{enhance_plan, EnhanceOptions, SemanticExtractor};
pub use error::StrideError;
pub use model::{PageText, PlanOutput, PositionedFragment};
pub use quality::QualityGate;

use model::{CandidateMeta, DistanceUnit, ParseMeta, ParserId, ProgramProfile, Week, WeekOutput};
use parser::fallback::PromotionThresholds;
use parser::{ParseCandidate, ParseOutcome};

/// Knobs for one parse request. The tuned heuristic thresholds live here
/// so they can be calibrated without touching parser code.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Row-clustering tolerance in PDF units.
    pub y_tolerance: f32,
    /// Unit assumed for bare numbers when a week's texts give no evidence.
    pub default_unit: DistanceUnit,
    /// Attempt glossary extraction from the trailing page.
    pub extract_glossary: bool,
    pub promotion: PromotionThresholds,
    /// Echoed into the output's program profile.
    pub program_name: Option<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            y_tolerance: layout::DEFAULT_Y_TOLERANCE,
            default_unit: DistanceUnit::Miles,
            extract_glossary: true,
            promotion: PromotionThresholds::default(),
            program_name: None,
        }
    }
}

/// Main API entry point: parse a positioned-fragment stream into a
/// normalized training plan.
///
/// Runs every parsing strategy, scores each candidate, classifies the
/// winner's days into activity drafts and assembles the output contract.
pub fn parse_plan(pages: &[PageText], options: &ParseOptions) -> Result<PlanOutput, StrideError> {
    parse_plan_with_candidates(pages, Vec::new(), options)
}

/// Like [`parse_plan`], with extra externally-computed candidates (e.g. a
/// semantic full-document parse) entered into candidate selection.
pub fn parse_plan_with_candidates(
    pages: &[PageText],
    extra: Vec<(ParserId, Vec<Week>)>,
    options: &ParseOptions,
) -> Result<PlanOutput, StrideError> {
    let mut outcomes: Vec<(ParserId, ParseOutcome)> = Vec::new();

    // Primary engine: table mode, falling through to text mode on the same
    // fragment stream when no header grid exists.
    let table = parser::table::parse_table(pages, options.y_tolerance);
    let layout_outcome = if table.is_empty() {
        tracing::debug!("table mode found no weeks, falling back to text mode");
        parser::fallback::parse_text(pages, options.y_tolerance, options.promotion)
    } else {
        table
    };
    outcomes.push((ParserId::Layout, layout_outcome));

    // Secondary engine: marker-driven scan over the full stream,
    // independent of table geometry.
    outcomes.push((
        ParserId::TextScan,
        parser::fallback::parse_text(pages, options.y_tolerance, options.promotion),
    ));

    for (parser, weeks) in extra {
        outcomes.push((
            parser,
            ParseOutcome {
                weeks,
                diagnostics: parser::ScanDiagnostics::default(),
            },
        ));
    }

    // Classify every candidate so quality can see subtype coverage, then
    // rank them.
    let mut candidates: Vec<ParseCandidate> = Vec::new();
    let mut classified: Vec<Vec<WeekOutput>> = Vec::new();
    for (parser, outcome) in outcomes {
        let outputs = classify::classify_weeks(&outcome.weeks, options.default_unit);
        let quality = quality::assess(&outputs);
        candidates.push(ParseCandidate {
            parser,
            weeks: outcome.weeks,
            quality,
            diagnostics: outcome.diagnostics,
        });
        classified.push(outputs);
    }

    let Some(selected) = quality::select_candidate(&candidates) else {
        let reasons = candidates
            .iter()
            .map(|c| {
                format!(
                    "{}: no week structure (rows={}, dropped_no_week={}, dropped_no_day={})",
                    c.parser,
                    c.diagnostics.row_clusters,
                    c.diagnostics.lines_dropped_no_week,
                    c.diagnostics.lines_dropped_no_day
                )
            })
            .collect::<Vec<_>>()
            .join("; ");
        return Err(StrideError::NoStructure(reasons));
    };

    let selected_index = candidates
        .iter()
        .position(|c| std::ptr::eq(c, selected))
        .unwrap_or(0);

    tracing::debug!(
        parser = %selected.parser,
        score = selected.quality.score,
        weeks = selected.quality.week_count,
        "selected parse candidate"
    );

    let weeks = classified[selected_index].clone();
    let glossary = if options.extract_glossary {
        glossary::extract_glossary(pages)
    } else {
        None
    };

    let dominant_unit = numeric::infer_dominant_unit(
        weeks
            .iter()
            .flat_map(|w| w.days.values())
            .map(|d| d.raw.as_str()),
        options.default_unit,
    );

    let parse_meta = ParseMeta {
        selected_parser: selected.parser,
        quality: selected.quality.clone(),
        candidates: candidates
            .iter()
            .map(|c| CandidateMeta {
                parser: c.parser,
                quality: c.quality.clone(),
                diagnostics: c.diagnostics,
            })
            .collect(),
    };

    Ok(PlanOutput {
        weeks,
        glossary,
        program_profile: Some(ProgramProfile {
            name: options.program_name.clone(),
            dominant_unit: Some(dominant_unit),
        }),
        parse_meta,
    })
}
