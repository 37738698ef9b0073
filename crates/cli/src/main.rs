use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::filter::LevelFilter;

use morph_eval::{available_languages, pipeline, training_file, PipelineKind, RunOptions};

/// Output format for the final report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Inference pipeline to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PipelineArg {
    Deterministic,
    Ostia,
    #[value(name = "pac_ostia")]
    PacOstia,
}

impl From<PipelineArg> for PipelineKind {
    fn from(arg: PipelineArg) -> Self {
        match arg {
            PipelineArg::Deterministic => PipelineKind::Deterministic,
            PipelineArg::Ostia => PipelineKind::Ostia,
            PipelineArg::PacOstia => PipelineKind::PacOstia,
        }
    }
}

/// Size of the training data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Quality {
    Low,
    Medium,
    High,
}

impl Quality {
    fn as_str(&self) -> &'static str {
        match self {
            Quality::Low => "low",
            Quality::Medium => "medium",
            Quality::High => "high",
        }
    }
}

/// Morphological inflection learner.
#[derive(Parser)]
#[command(name = "morph", version, about = "Morphological inflection learner")]
struct Cli {
    /// Pipeline to run
    #[arg(short, long, default_value = "deterministic", value_enum)]
    pipeline: PipelineArg,

    /// Language of the training and dev files
    #[arg(short, long, default_value = "english")]
    language: String,

    /// Size of the training data
    #[arg(short, long, default_value = "low", value_enum)]
    quality: Quality,

    /// Directory holding `<language>-train-<quality>` and `<language>-dev`
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Trace verbosity (-v summary, -vv debug, -vvv full)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// RNG seed for the equivalence oracle (entropy when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Accuracy tolerance for the PAC basis
    #[arg(long, default_value_t = 1.0)]
    epsilon: f64,

    /// Confidence tolerance for the PAC basis
    #[arg(long, default_value_t = 1.0)]
    delta: f64,

    /// Output format (text or json)
    #[arg(long, default_value = "text", value_enum)]
    output: OutputFormat,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let train = training_file(&cli.data_dir, &cli.language, cli.quality.as_str());
    if !train.is_file() {
        let known = available_languages(&cli.data_dir);
        if known.is_empty() {
            eprintln!(
                "error: no training data found under {}",
                cli.data_dir.display()
            );
        } else {
            eprintln!(
                "error: chosen language ({}) is invalid; choose one from {}",
                cli.language,
                known.join(", ")
            );
        }
        process::exit(1);
    }

    let opts = RunOptions {
        data_dir: cli.data_dir.clone(),
        language: cli.language.clone(),
        quality: cli.quality.as_str().to_string(),
        epsilon: cli.epsilon,
        delta: cli.delta,
    };
    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    match pipeline::run(cli.pipeline.into(), &opts, rng) {
        Ok(report) => match cli.output {
            OutputFormat::Text => println!("{}", report.summary_line()),
            OutputFormat::Json => match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("error: cannot serialize report: {e}");
                    process::exit(1);
                }
            },
        },
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Map the -v count onto the three trace levels; traces go to stderr so
/// stdout carries only the report.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::OFF,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}
