use api_shared::{
    predictions_by_id, BatchRes, CommandRes, DemoRes, InsightsRes, PredictionBody, PredictionRes,
    PromptItemRes, PromptRes, RecordValidationRes, SkippedRowRes, ValidationRes,
};
use clap::{Parser, Subcommand};
use readmit_core::constants::DEFAULT_DEMO_RECORDS;
use readmit_core::{
    build_prompt, core_config_from_env_values, demo_batch, interpret, normalise_transcript,
    parse_prediction_response, summarise, validate_batch, BatchReport, BatchService, CoreConfig,
};
use readmit_ids::{SequentialIdGenerator, UuidIdGenerator};
use std::collections::HashMap;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "readmit")]
#[command(about = "Readmission-risk assistant CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interpret a spoken command transcript
    Interpret {
        /// Transcript as recognised, in any case
        transcript: String,
    },
    /// Parse a batch file into patient records
    Batch {
        /// Path to the batch file
        file: PathBuf,
        /// Number generated ids 1, 2, 3... instead of stamping them with the time
        #[arg(long, conflicts_with = "uuid_ids")]
        sequential_ids: bool,
        /// Give rows without an id a random UUID instead of a timestamp
        #[arg(long)]
        uuid_ids: bool,
    },
    /// Parse a batch file and coerce every record
    Validate {
        /// Path to the batch file
        file: PathBuf,
    },
    /// Build the prediction prompt for every record in a batch file
    Prompt {
        /// Path to the batch file
        file: PathBuf,
    },
    /// Parse a saved prediction model reply
    ParsePrediction {
        /// Path to the file holding the model reply
        file: PathBuf,
    },
    /// Summarise a batch file and its predictions for the insights dashboard
    Insights {
        /// Path to the batch file
        file: PathBuf,
        /// JSON file mapping record id to prediction; records without one count as lower risk
        #[arg(long)]
        predictions: Option<PathBuf>,
    },
    /// Generate a seeded demo batch with predictions
    Demo {
        /// Number of records
        #[arg(long, default_value_t = DEFAULT_DEMO_RECORDS)]
        count: usize,
        /// Generator seed; the same seed always yields the same batch
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("readmit=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'readmit --help' for commands");
        return ExitCode::SUCCESS;
    };

    let result = core_config_from_env_values(
        std::env::var("READMIT_ID_PREFIX").ok(),
        std::env::var("READMIT_MAX_BATCH_BYTES").ok(),
    )
    .map_err(Box::<dyn Error>::from)
    .and_then(|cfg| execute(command, Arc::new(cfg)))
    .and_then(|output| serde_json::to_string_pretty(&output).map_err(Into::into));

    match result {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Runs one subcommand and returns the JSON document to print.
fn execute(command: Commands, cfg: Arc<CoreConfig>) -> CliResult<serde_json::Value> {
    let output = match command {
        Commands::Interpret { transcript } => {
            let command = interpret(&normalise_transcript(&transcript));
            serde_json::to_value(CommandRes::from(&command))?
        }
        Commands::Batch {
            file,
            sequential_ids,
            uuid_ids,
        } => {
            let service = if sequential_ids {
                let ids = SequentialIdGenerator::new(cfg.id_prefix())?;
                BatchService::with_generator(cfg, Arc::new(ids))
            } else if uuid_ids {
                let ids = UuidIdGenerator::new(cfg.id_prefix())?;
                BatchService::with_generator(cfg, Arc::new(ids))
            } else {
                BatchService::new(cfg)?
            };
            let report = service.ingest(&read_file(&file)?)?;
            serde_json::to_value(BatchRes::from(&report))?
        }
        Commands::Validate { file } => {
            let report = ingest_file(cfg, &file)?;
            let results = validate_batch(&report.records)
                .iter()
                .map(RecordValidationRes::from)
                .collect();
            serde_json::to_value(ValidationRes {
                results,
                skipped_rows: skipped(&report),
            })?
        }
        Commands::Prompt { file } => {
            let report = ingest_file(cfg, &file)?;
            let prompts = report
                .records
                .iter()
                .map(|record| PromptItemRes {
                    id: record.id().to_string(),
                    prompt: build_prompt(record.data()),
                })
                .collect();
            serde_json::to_value(PromptRes {
                prompts,
                skipped_rows: skipped(&report),
            })?
        }
        Commands::ParsePrediction { file } => {
            let result = parse_prediction_response(&read_file(&file)?)?;
            serde_json::to_value(PredictionRes::from(&result))?
        }
        Commands::Insights { file, predictions } => {
            let report = ingest_file(cfg, &file)?;
            let predictions: HashMap<String, PredictionBody> = match predictions {
                Some(path) => serde_json::from_str(&read_file(&path)?)?,
                None => HashMap::new(),
            };
            let insights = summarise(&report.records, &predictions_by_id(predictions));
            serde_json::to_value(InsightsRes::new(&insights, &report))?
        }
        Commands::Demo { count, seed } => {
            let pairs = demo_batch(count, seed)?;
            serde_json::to_value(DemoRes::from(pairs.as_slice()))?
        }
    };

    Ok(output)
}

fn read_file(path: &Path) -> CliResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e).into())
}

fn ingest_file(cfg: Arc<CoreConfig>, path: &Path) -> CliResult<BatchReport> {
    Ok(BatchService::new(cfg)?.ingest(&read_file(path)?)?)
}

fn skipped(report: &BatchReport) -> Vec<SkippedRowRes> {
    report.skipped_rows.iter().map(SkippedRowRes::from).collect()
}
