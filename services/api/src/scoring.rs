use crate::cli::ModelArgs;
use crate::infra::load_pipeline;
use cardio_severity::config::AppConfig;
use cardio_severity::error::AppError;
use cardio_severity::severity::{
    BatchReport, BatchScorer, ModelInfo, PredictionResult, RawRecord, RowOutcome, SeverityLabel,
};
use clap::Args;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct PredictArgs {
    /// JSON file holding one patient record keyed by field name
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Print the raw prediction payload instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
    #[command(flatten)]
    pub(crate) model: ModelArgs,
}

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// CSV export with one record per row; a `num` column is read as ground truth
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Print the full batch report as JSON
    #[arg(long)]
    pub(crate) json: bool,
    #[command(flatten)]
    pub(crate) model: ModelArgs,
}

#[derive(Args, Debug)]
pub(crate) struct InfoArgs {
    #[command(flatten)]
    pub(crate) model: ModelArgs,
}

pub(crate) fn run_predict(args: PredictArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let pipeline = load_pipeline(&config, &args.model)?;

    let reader = BufReader::new(File::open(&args.input)?);
    let record: RawRecord = serde_json::from_reader(reader)?;
    let result = pipeline.predict(&record)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        render_prediction(&result);
    }
    Ok(())
}

pub(crate) fn run_batch(args: BatchArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let pipeline = load_pipeline(&config, &args.model)?;
    let report = BatchScorer::new(&pipeline).score_path(&args.csv)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render_batch(&report);
    }
    Ok(())
}

pub(crate) fn run_info(args: InfoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let pipeline = load_pipeline(&config, &args.model)?;
    render_info(&pipeline.info());
    Ok(())
}

fn render_prediction(result: &PredictionResult) {
    println!("{}", result.title());
    println!(
        "Risk category: {} / {} ({:.1}% confidence)",
        result.risk_category(),
        result.risk_level(),
        result.confidence() * 100.0
    );
    println!("Urgency: {}", result.urgency());
    println!("\nClass probabilities");
    for label in SeverityLabel::ordered() {
        println!(
            "- {:<16} {:>5.1}%",
            label.name(),
            result.probability(label) * 100.0
        );
    }
    if result.is_low_confidence() {
        println!("\nLow confidence: treat this assessment with additional caution");
    }
    println!("\nRecommended actions");
    for item in result.action_items() {
        println!("- {}", item);
    }
}

fn render_batch(report: &BatchReport) {
    println!("Batch scoring summary");
    println!(
        "- {} rows | {} scored | {} rejected | {} low confidence",
        report.rows.len(),
        report.scored,
        report.rejected,
        report.low_confidence
    );

    println!("\nPredicted classes");
    for label in SeverityLabel::ordered() {
        let count = report
            .predicted_counts
            .get(&label.index().to_string())
            .copied()
            .unwrap_or(0);
        println!("- {:<16} {}", label.name(), count);
    }

    let labelled: Vec<_> = report
        .rows
        .iter()
        .filter_map(|row| Some((row.expected?, row.prediction()?)))
        .collect();
    if !labelled.is_empty() {
        let correct = labelled
            .iter()
            .filter(|(expected, result)| *expected == result.label())
            .count();
        println!(
            "\nAgreement with recorded severity: {}/{} ({:.1}%)",
            correct,
            labelled.len(),
            correct as f64 / labelled.len() as f64 * 100.0
        );
    }

    let rejected: Vec<_> = report
        .rows
        .iter()
        .filter_map(|row| match &row.outcome {
            RowOutcome::Rejected { error, .. } => Some((row.row, error)),
            RowOutcome::Scored { .. } => None,
        })
        .collect();
    if !rejected.is_empty() {
        println!("\nRejected rows");
        for (row, error) in rejected {
            println!("- row {}: {}", row, error);
        }
    }
}

fn render_info(info: &ModelInfo) {
    println!("{} (version {})", info.model, info.version);
    if !info.description.is_empty() {
        println!("{}", info.description);
    }
    println!(
        "- strategy {} | {} features | {} classes",
        info.strategy, info.features, info.num_classes
    );
    println!(
        "- weighted F1 {:.3} | accuracy {:.3}",
        info.performance.test_f1_weighted, info.performance.test_accuracy
    );
    println!(
        "- low-confidence threshold {:.2}",
        info.low_confidence_threshold
    );
    println!("\nClass mapping");
    for (index, name) in &info.class_mapping {
        println!("- {}: {}", index, name);
    }
}
