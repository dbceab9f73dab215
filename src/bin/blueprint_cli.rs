//! Blueprint CLI - Bridge interface for the storage service
//!
//! Commands: decode, inspect, encode
//! Outputs JSON to stdout, logs to stderr
//! Returns 2 when a blueprint is rejected

use clap::{Parser, Subcommand};
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use blueprint_core::{config::ParserConfig, encode, BlueprintParser, ParseError};

#[derive(Parser)]
#[command(name = "blueprint-cli")]
#[command(about = "Blueprint CLI - decode blueprint strings and extract metadata")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a JSON parser config
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the decoded JSON document
    Decode {
        /// Blueprint string, `-` or omitted reads stdin
        blueprint: Option<String>,
    },

    /// Print metadata and document fingerprint
    Inspect {
        /// Blueprint string, `-` or omitted reads stdin
        blueprint: Option<String>,
    },

    /// Encode a JSON document into a blueprint string
    Encode {
        /// JSON document, `-` or omitted reads stdin
        document: Option<String>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match ParserConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                print_error(&e.to_string(), None);
                return ExitCode::FAILURE;
            }
        },
        None => ParserConfig::default(),
    };

    let parser = BlueprintParser::new(config);

    match cli.command {
        Commands::Decode { blueprint } => {
            let raw = match read_input(blueprint) {
                Ok(r) => r,
                Err(e) => return input_failure(e),
            };

            match parser.decode(&raw) {
                Ok(document) => print_json(&document),
                Err(e) => rejected(&ParseError::from(e)),
            }
        }

        Commands::Inspect { blueprint } => {
            let raw = match read_input(blueprint) {
                Ok(r) => r,
                Err(e) => return input_failure(e),
            };

            match parser.parse_report(&raw) {
                Ok(report) => print_json(&report),
                Err(e) => rejected(&e),
            }
        }

        Commands::Encode { document } => {
            let text = match read_input(document) {
                Ok(t) => t,
                Err(e) => return input_failure(e),
            };

            let document: serde_json::Value = match serde_json::from_str(&text) {
                Ok(d) => d,
                Err(e) => {
                    print_error(&format!("Invalid document: {}", e), None);
                    return ExitCode::FAILURE;
                }
            };

            match encode(&document) {
                Ok(raw) => {
                    println!("{}", raw);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    print_error(&e.to_string(), None);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

/// The argument itself, or stdin when it is `-` or missing. Surrounding
/// whitespace is trimmed so piped input with a trailing newline decodes.
fn read_input(arg: Option<String>) -> io::Result<String> {
    let text = match arg.as_deref() {
        None | Some("-") => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
        Some(value) => value.to_string(),
    };
    Ok(text.trim().to_string())
}

fn rejected(e: &ParseError) -> ExitCode {
    tracing::debug!(error = %e, "blueprint rejected");
    print_error(&e.to_string(), Some(e.reason()));
    ExitCode::from(2)
}

fn input_failure(e: io::Error) -> ExitCode {
    print_error(&format!("Failed to read input: {}", e), None);
    ExitCode::FAILURE
}

fn print_json<T: serde::Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(out) => {
            println!("{}", out);
            ExitCode::SUCCESS
        }
        Err(e) => {
            print_error(&e.to_string(), None);
            ExitCode::FAILURE
        }
    }
}

fn print_error(message: &str, reason: Option<&str>) {
    let output = serde_json::json!({
        "error": message,
        "reason": reason,
    });
    println!("{}", output);
}
