// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Gradesheet: checkbox answer-sheet grading from the command line.
//
// Entry point. Initialises logging, parses the command line, loads the exam
// configuration and key, and dispatches to the grading pipeline.

mod services;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use gradesheet_core::error::Result;
use gradesheet_core::human_errors::humanize_error;
use gradesheet_core::{ExamConfig, GradesheetError};
use gradesheet_document::DocumentRasterizer;
use gradesheet_omr::{FixedZoneDetector, NullZoneDetector, ZoneDetector};
use gradesheet_security::{IdentityCodec, StudentIdentity, UnavailableQrScanner, load_key};
use gradesheet_security::key::read_key;
use tracing::{error, info};

use services::data_dir;
use services::pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "gradesheet", version)]
#[command(about = "Grade scanned checkbox answer sheets")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Grade one or more scanned documents (PDF, image, or directory of page images).
    Grade(GradeArgs),
    /// Manage the exam configuration file.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Produce the encrypted identity payload to print as a QR code.
    Seal(SealArgs),
}

#[derive(Args)]
struct GradeArgs {
    /// Documents to grade.
    #[arg(required = true)]
    documents: Vec<PathBuf>,

    /// Exam configuration file. Defaults to the user config directory.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Key file used to open identity payloads.
    #[arg(long)]
    key: Option<PathBuf>,

    /// Directory for summaries and visualizations. Defaults to each
    /// document's directory.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Do not write page visualizations.
    #[arg(long)]
    no_vis: bool,

    /// Dump classifier intermediate images into this directory.
    #[arg(long)]
    debug_dir: Option<PathBuf>,

    /// Worker threads for page processing.
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Write a configuration file with default values.
    Init {
        /// Target path. Defaults to the user config directory.
        path: Option<PathBuf>,
    },
    /// Print the effective configuration.
    Show {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args)]
struct SealArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    id: String,
    #[arg(long = "class")]
    class_name: String,
    #[arg(long)]
    university: String,
    /// Key file. Defaults to the usual key search.
    #[arg(long)]
    key: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Grade(args) => grade(args),
        Command::Config(cmd) => config(cmd),
        Command::Seal(args) => seal(args),
    };

    match outcome {
        Ok(code) => code,
        Err(err) => {
            report_failure(None, &err);
            ExitCode::FAILURE
        }
    }
}

fn grade(args: GradeArgs) -> Result<ExitCode> {
    let mut cfg = ExamConfig::load(args.config.unwrap_or_else(data_dir::default_config_path))?;
    if args.no_vis {
        cfg.save_visualizations = false;
    }
    if let Some(dir) = args.debug_dir {
        cfg.debug_cv = true;
        cfg.debug_dir = Some(dir);
    }
    if args.threads.is_some() {
        cfg.parallel.max_threads = args.threads;
    }
    cfg.validate()?;

    let key = resolve_key(args.key.as_deref())?;
    let codec = IdentityCodec::new(key);

    let detector: &dyn ZoneDetector = if cfg.zone_region.is_some() {
        &FixedZoneDetector
    } else {
        &NullZoneDetector
    };

    let pipeline = Pipeline {
        cfg: &cfg,
        rasterizer: &DocumentRasterizer,
        detector,
        scanner: &UnavailableQrScanner,
        codec: &codec,
        out_dir: args.out_dir,
    };

    let mut failures = 0usize;
    for document in &args.documents {
        match pipeline.grade_document(document) {
            Ok(report) => println!(
                "{}: {} ({}) -> {}",
                document.display(),
                report.summary.grading.score,
                report.summary.grading.letter,
                report.summary_path.display()
            ),
            Err(err) => {
                failures += 1;
                report_failure(Some(document), &err);
            }
        }
    }

    info!(documents = args.documents.len(), failures, "Batch complete");
    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn config(cmd: ConfigCommand) -> Result<ExitCode> {
    match cmd {
        ConfigCommand::Init { path } => {
            let path = path.unwrap_or_else(data_dir::default_config_path);
            ExamConfig::default().save(&path)?;
            println!("wrote {}", path.display());
        }
        ConfigCommand::Show { config } => {
            let cfg = ExamConfig::load(config.unwrap_or_else(data_dir::default_config_path))?;
            println!("{}", serde_json::to_string_pretty(&cfg)?);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn seal(args: SealArgs) -> Result<ExitCode> {
    let codec = IdentityCodec::new(resolve_key(args.key.as_deref())?);
    let payload = codec.seal(&StudentIdentity {
        name: args.name,
        id: args.id,
        class_name: args.class_name,
        university: args.university,
    })?;
    println!("{payload}");
    Ok(ExitCode::SUCCESS)
}

fn resolve_key(explicit: Option<&Path>) -> Result<String> {
    match explicit {
        Some(path) => read_key(path),
        None => {
            let (key, source) = load_key(&data_dir::key_search_dirs(), &data_dir::config_dir())?;
            info!(%source, "Exam key ready");
            Ok(key)
        }
    }
}

fn report_failure(document: Option<&Path>, err: &GradesheetError) {
    let human = humanize_error(err);
    match document {
        Some(doc) => error!(document = %doc.display(), %err, "Document failed"),
        None => error!(%err, "Command failed"),
    }
    eprintln!("error: {}", human.message);
    eprintln!("  {}", human.suggestion);
}
