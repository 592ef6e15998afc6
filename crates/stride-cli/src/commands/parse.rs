use clap::Args;
use std::path::PathBuf;
use stride_core::enhance::client::SemanticHttpClient;
use stride_core::model::{DistanceUnit, PageText};
use stride_core::{enhance_plan, EnhanceOptions, ParseOptions, QualityGate, StrideError};

use crate::output;

#[derive(Args)]
pub struct ParseArgs {
    /// Path to the PDF-text collaborator's fragment JSON
    pub input_file: PathBuf,

    /// Output format: table (default) or json
    #[arg(short, long, default_value = "table")]
    pub output: String,

    /// Write the full plan JSON to a file
    #[arg(short = 'O', long = "out", value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Default unit for bare numbers: miles or km
    #[arg(long, default_value = "miles")]
    pub unit: String,

    /// Program name recorded in the plan profile
    #[arg(long)]
    pub name: Option<String>,

    /// Skip glossary extraction
    #[arg(long)]
    pub no_glossary: bool,

    /// Flag the parse when the quality score falls below this value
    #[arg(long)]
    pub min_score: Option<u32>,

    /// Flag the parse when day coverage falls below this value
    #[arg(long)]
    pub min_coverage: Option<f64>,

    /// Semantic-extraction service URL enabling the enhancement pass
    #[arg(long, value_name = "URL")]
    pub enhance_url: Option<String>,

    /// Per-call timeout for the enhancement pass, in seconds
    #[arg(long, default_value_t = 20)]
    pub enhance_timeout: u64,

    /// Total enhancement time budget for the document, in seconds
    #[arg(long, default_value_t = 90)]
    pub enhance_budget: u64,

    /// Enhance only the N most interesting days of each week
    #[arg(long, value_name = "N")]
    pub enhance_days: Option<usize>,
}

pub fn run(args: ParseArgs) -> Result<(), StrideError> {
    let raw = std::fs::read_to_string(&args.input_file)?;
    let pages: Vec<PageText> = serde_json::from_str(&raw)?;

    let options = ParseOptions {
        default_unit: DistanceUnit::from_str_loose(&args.unit).unwrap_or(DistanceUnit::Miles),
        extract_glossary: !args.no_glossary,
        program_name: args.name.clone(),
        ..ParseOptions::default()
    };

    let mut plan = stride_core::parse_plan(&pages, &options)?;

    if let Some(url) = &args.enhance_url {
        match SemanticHttpClient::new(url.clone()) {
            Ok(client) => {
                let enhance_options = EnhanceOptions {
                    per_call_timeout: std::time::Duration::from_secs(args.enhance_timeout),
                    total_budget: std::time::Duration::from_secs(args.enhance_budget),
                    max_days_per_week: args.enhance_days,
                    ..EnhanceOptions::default()
                };
                let runtime = tokio::runtime::Runtime::new()?;
                runtime.block_on(enhance_plan(&mut plan, &client, &enhance_options));
            }
            Err(e) => eprintln!("warning: enhancement disabled: {e}"),
        }
    }

    // Caller-side quality gate: flag, never delete.
    if args.min_score.is_some() || args.min_coverage.is_some() {
        let defaults = QualityGate::default();
        let gate = QualityGate {
            min_score: args.min_score.unwrap_or(defaults.min_score),
            min_coverage: args.min_coverage.unwrap_or(defaults.min_coverage),
        };
        if !gate.accepts(&plan.parse_meta.quality) {
            eprintln!(
                "warning: low-confidence parse (score {}, coverage {:.2})",
                plan.parse_meta.quality.score, plan.parse_meta.quality.day_coverage
            );
        }
    }

    let output_str = match args.output.as_str() {
        "json" => output::json::format_plan(&plan)?,
        _ => output::table::format_plan(&plan),
    };

    match args.out {
        Some(path) => {
            // Always write JSON when saving to file.
            let json = output::json::format_plan(&plan)?;
            std::fs::write(&path, json)?;
            eprintln!(
                "Parsed {} week(s) via {} (score {}), written to {}",
                plan.weeks.len(),
                plan.parse_meta.selected_parser,
                plan.parse_meta.quality.score,
                path.display()
            );
        }
        None => println!("{output_str}"),
    }

    Ok(())
}
