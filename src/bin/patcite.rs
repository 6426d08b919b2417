use std::process::ExitCode;

use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use patent_citations::app::{BatchRunner, ProgressSink};
use patent_citations::config::{
    ConfigLoader, ConfigOverrides, DEFAULT_IMAGE_ROOT, DEFAULT_INPUT_ROOT, DEFAULT_OUTPUT_ROOT,
};
use patent_citations::error::PatentError;
use patent_citations::fetcher::GooglePatentsClient;
use patent_citations::output::{ConsoleOutput, JsonOutput, OutputMode, QuietOutput};

#[derive(Parser)]
#[command(name = "patcite")]
#[command(
    about = "Scrape Google Patents and save patent data for the documents cited against each query patent"
)]
#[command(version, author)]
struct Cli {
    #[arg(long, help = format!("Directory to read query JSON files from [default: {DEFAULT_INPUT_ROOT}]"))]
    json_dir_input: Option<String>,

    #[arg(long, help = format!("Directory to save front images to [default: {DEFAULT_IMAGE_ROOT}]"))]
    front_imgs_dir: Option<String>,

    #[arg(long, help = format!("Directory to save document JSON files to [default: {DEFAULT_OUTPUT_ROOT}]"))]
    json_dir_output: Option<String>,

    #[arg(long, help = "Config file (defaults to ./patcite.json when present)")]
    config: Option<String>,

    #[arg(long = "exclude", value_name = "CPC", help = "Skip a CPC category directory")]
    exclude: Vec<String>,

    #[arg(long, help = "Per-request timeout in seconds")]
    timeout_secs: Option<u64>,

    #[arg(long, conflicts_with = "quiet", help = "Print the batch report as JSON")]
    json: bool,

    #[arg(long, help = "Only print the final summary")]
    quiet: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<PatentError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &PatentError) -> u8 {
    match error {
        PatentError::ConfigRead(_)
        | PatentError::ConfigParse(_)
        | PatentError::MalformedInput { .. }
        | PatentError::InvalidCategory(_)
        | PatentError::InvalidPatentId(_) => 2,
        PatentError::FetchHttp(_)
        | PatentError::FetchStatus { .. }
        | PatentError::AssetUnavailable(_) => 3,
        PatentError::Persistence(_) => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Console
    };

    let overrides = ConfigOverrides {
        json_dir_input: cli.json_dir_input,
        front_imgs_dir: cli.front_imgs_dir,
        json_dir_output: cli.json_dir_output,
        exclude: cli.exclude,
        timeout_secs: cli.timeout_secs,
    };
    let resolved = ConfigLoader::resolve(cli.config.as_deref(), overrides)?;

    let client = GooglePatentsClient::new(resolved.client.clone())?;
    let runner = BatchRunner::from_roots(&resolved.roots, client).with_exclude(resolved.exclude);

    let sink: &dyn ProgressSink = match output_mode {
        OutputMode::Console => &ConsoleOutput,
        OutputMode::Json => &JsonOutput,
        OutputMode::Quiet => &QuietOutput,
    };
    let report = runner.run(sink)?;

    match output_mode {
        OutputMode::Json => JsonOutput::print_report(&report).into_diagnostic()?,
        OutputMode::Console | OutputMode::Quiet => ConsoleOutput::print_summary(&report),
    }
    Ok(())
}
