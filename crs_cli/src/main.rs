//! # Restraint Planner CLI
//!
//! Reads an engineering request as JSON, validates it against the built-in
//! reference tables and prints the outcome, plus the test matrix when the
//! request is valid.
//!
//! ```text
//! crs_cli [REQUEST.json | -] [--settings SETTINGS.toml]
//! ```
//!
//! With no path (or `-`) the request is read from stdin. JSON goes to
//! stdout, logs to stderr (`RUST_LOG` controls the level). The exit code is
//! 0 for a valid request, 1 for an invalid one and 2 on errors.

use std::io::{self, Read};
use std::process::ExitCode;

use crs_core::prelude::*;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Default)]
struct Args {
    request_path: Option<String>,
    settings_path: Option<String>,
}

#[derive(Serialize)]
struct Report<'a> {
    outcome: &'a ValidationOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    matrix: Option<TestMatrix>,
}

fn print_help() {
    println!("crs_cli - child restraint test-plan generator");
    println!();
    println!("USAGE:");
    println!("    crs_cli [REQUEST.json | -] [--settings SETTINGS.toml]");
    println!();
    println!("OPTIONS:");
    println!("    --settings <FILE>    Validator settings (TOML)");
    println!("    -h, --help           Print this help");
}

fn parse_args() -> Result<Option<Args>, PlanError> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--settings" => {
                let path = iter.next().ok_or_else(|| PlanError::ConfigError {
                    reason: "--settings needs a file path".to_string(),
                })?;
                args.settings_path = Some(path);
            }
            "-" => args.request_path = None,
            other if other.starts_with("--") => {
                return Err(PlanError::ConfigError {
                    reason: format!("unknown option {}", other),
                });
            }
            other => args.request_path = Some(other.to_string()),
        }
    }
    Ok(Some(args))
}

fn read_source(path: Option<&str>) -> Result<String, PlanError> {
    let mut text = String::new();
    let result = match path {
        Some(path) => std::fs::File::open(path).and_then(|mut f| f.read_to_string(&mut text)),
        None => io::stdin().read_to_string(&mut text),
    };
    result.map_err(|e| PlanError::ConfigError {
        reason: format!("cannot read {}: {}", path.unwrap_or("stdin"), e),
    })?;
    Ok(text)
}

fn run(args: &Args) -> Result<bool, PlanError> {
    let settings = match &args.settings_path {
        Some(path) => {
            info!("Loading settings from {}", path);
            EngineSettings::from_toml_str(&read_source(Some(path))?)?
        }
        None => EngineSettings::default(),
    };
    debug!(?settings, "Validator settings");

    let request = EngineeringRequest::from_json(&read_source(args.request_path.as_deref())?)?;
    let validator = Validator::new(DummyRegistry::builtin(), RuleBook::builtin(), settings);
    let outcome = validator.validate(&request)?;

    let matrix = if outcome.valid {
        Some(TestMatrix::assemble_builtin(&outcome)?)
    } else {
        None
    };

    let report = Report {
        outcome: &outcome,
        matrix,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(outcome.valid)
}

fn main() -> ExitCode {
    // stdout carries the JSON report; logs go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_writer(io::stderr).with_env_filter(filter).with_target(false).init();

    let args = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_help();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Ok(json) = serde_json::to_string_pretty(&e) {
                eprintln!();
                eprintln!("Error JSON:");
                eprintln!("{}", json);
            }
            ExitCode::from(2)
        }
    }
}
