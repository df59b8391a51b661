//! loadset-engine: structural load-case engine
//!
//! Command-line front end. Every command loads a LoadSet into a fresh tool
//! session, optionally scales and converts it, runs one tool and prints the
//! tool's JSON response on stdout.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args as ClapArgs, Parser, Subcommand};
use serde_json::{json, Value};
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use loadset_engine::config;
use loadset_engine::tools::{Session, ToolRequest, ToolResponse};

/// Structural load-case engine.
///
/// Converts, scales, envelopes and compares LoadSets and exports them as
/// ANSYS input decks.
#[derive(Parser, Debug)]
#[command(name = "loadset-engine")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "CONFIG_FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

/// Input file plus the optional transformations applied before a command.
#[derive(ClapArgs, Debug)]
struct Input {
    /// LoadSet JSON file
    #[arg(value_name = "LOADSET")]
    file: PathBuf,

    /// Scale factor applied after loading
    #[arg(long, value_name = "FACTOR")]
    scale: Option<f64>,

    /// Force unit to convert to after scaling (N, kN, lbf, klbf)
    #[arg(long, value_name = "UNIT")]
    units: Option<String>,

    /// Moment unit to convert to; defaults to the force unit's companion
    #[arg(long, value_name = "UNIT", requires = "units")]
    moment_units: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print counts, units and extremes
    Summary {
        #[command(flatten)]
        input: Input,
    },
    /// List load cases
    Cases {
        #[command(flatten)]
        input: Input,
        /// Only cases with this category
        #[arg(long)]
        category: Option<String>,
    },
    /// Print per-point, per-component extremes
    Extremes {
        #[command(flatten)]
        input: Input,
    },
    /// Reduce to the envelope load cases
    Envelope {
        #[command(flatten)]
        input: Input,
        /// Write the envelope LoadSet to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert to the units given by --units and optionally save the result
    Convert {
        #[command(flatten)]
        input: Input,
        /// Write the converted LoadSet to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Scale by the factor given by --scale and optionally save the result
    Scale {
        #[command(flatten)]
        input: Input,
        /// Write the scaled LoadSet to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compare against a previous LoadSet
    Compare {
        #[command(flatten)]
        input: Input,
        /// Previous LoadSet JSON file
        #[arg(value_name = "PREVIOUS")]
        previous: PathBuf,
        /// Write the full comparison report as JSON
        #[arg(long)]
        json: Option<PathBuf>,
        /// Write the extreme comparison rows as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Write one SVG range chart per point into this folder
        #[arg(long, value_name = "DIR")]
        charts: Option<PathBuf>,
    },
    /// Write one ANSYS input deck per load case
    Export {
        #[command(flatten)]
        input: Input,
        /// Output folder
        #[arg(short, long)]
        folder: PathBuf,
        /// File name prefix
        #[arg(short, long)]
        stem: String,
    },
}

impl Command {
    const fn input(&self) -> &Input {
        match self {
            Self::Summary { input }
            | Self::Cases { input, .. }
            | Self::Extremes { input }
            | Self::Envelope { input, .. }
            | Self::Convert { input, .. }
            | Self::Scale { input, .. }
            | Self::Compare { input, .. }
            | Self::Export { input, .. } => input,
        }
    }

    /// Tool requests after loading and preparing the input.
    fn requests(&self) -> Vec<ToolRequest> {
        let save = |output: &Option<PathBuf>| {
            output
                .iter()
                .map(|p| ToolRequest::SaveLoadset {
                    file_path: p.clone(),
                })
                .collect::<Vec<_>>()
        };
        match self {
            Self::Summary { .. } => vec![ToolRequest::GetLoadSummary {}],
            Self::Cases { category, .. } => vec![ToolRequest::ListLoadCases {
                category: category.clone(),
            }],
            Self::Extremes { .. } => vec![ToolRequest::GetPointExtremes {}],
            Self::Envelope { output, .. } => {
                let mut requests = vec![ToolRequest::EnvelopeLoadset {}];
                requests.extend(save(output));
                requests
            }
            Self::Convert { output, .. } | Self::Scale { output, .. } => {
                let mut requests = save(output);
                requests.push(ToolRequest::GetLoadSummary {});
                requests
            }
            Self::Compare {
                previous,
                json,
                csv,
                charts,
                ..
            } => {
                let mut requests = vec![
                    ToolRequest::LoadSecondLoadset {
                        file_path: previous.clone(),
                    },
                    ToolRequest::CompareLoadsets {},
                ];
                requests.extend(json.iter().map(|p| ToolRequest::ExportComparisonJson {
                    file_path: p.clone(),
                }));
                requests.extend(csv.iter().map(|p| ToolRequest::ExportComparisonCsv {
                    file_path: p.clone(),
                }));
                requests.extend(charts.iter().map(|p| ToolRequest::GenerateComparisonCharts {
                    output_dir: p.clone(),
                    format: None,
                }));
                requests.push(ToolRequest::GetComparisonSummary {});
                requests
            }
            Self::Export { folder, stem, .. } => vec![ToolRequest::ExportToAnsys {
                folder_path: folder.clone(),
                name_stem: stem.clone(),
            }],
        }
    }
}

impl Input {
    fn requests(&self) -> Vec<ToolRequest> {
        let mut requests = vec![ToolRequest::LoadFromJson {
            file_path: self.file.clone(),
        }];
        if let Some(factor) = self.scale {
            requests.push(ToolRequest::ScaleLoads { factor });
        }
        if let Some(units) = &self.units {
            requests.push(ToolRequest::ConvertUnits {
                target_units: units.clone(),
                moment_units: self.moment_units.clone(),
            });
        }
        requests
    }
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN, // Default to warn for unknown levels
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Runs requests in order, stopping at the first failure.
///
/// Returns the failing response, or the last one when all succeed.
fn run(session: &mut Session, requests: Vec<ToolRequest>) -> ToolResponse {
    let mut last = ToolResponse::ok("Nothing to do", json!({}));
    for request in requests {
        last = session.call(request);
        if !last.success {
            break;
        }
    }
    last
}

fn print_response(response: &ToolResponse) {
    let value: Value = response.to_value();
    match serde_json::to_string_pretty(&value) {
        Ok(text) => println!("{text}"),
        Err(e) => error!(error = %e, "Failed to serialise response"),
    }
}

/// Entry point for the loadset-engine CLI.
fn main() -> ExitCode {
    let args = Args::parse();

    // Load configuration
    let config_path = args.config.as_deref();
    let cfg = match config::load_config_or_default(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialise logging
    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        allowed_paths = ?cfg.allowed_paths,
        "Starting loadset-engine"
    );

    let mut session = Session::with_config(&cfg);
    let mut requests = args.command.input().requests();
    requests.extend(args.command.requests());

    let response = run(&mut session, requests);
    print_response(&response);

    if response.success {
        ExitCode::SUCCESS
    } else {
        error!(code = ?response.error_code, "{}", response.message);
        ExitCode::FAILURE
    }
}
