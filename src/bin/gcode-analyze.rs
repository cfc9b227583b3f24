use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use gcode_analyzer::analyze;
use gcode_analyzer::config::{init_logging, Args, Config, OutputFormat};
use gcode_analyzer::report::{FileReport, TextReport};

/// Exit status when `--strict` finds error-level findings
const EXIT_FINDINGS: u8 = 2;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.analysis.log_level);

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let config = Config::from_args(args.analysis)?;
    let registry = config.build_registry()?;

    let mut reports = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let bytes = match std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))
        {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("{:#}", e);
                reports.push(FileReport {
                    file: path.display().to_string(),
                    machine: None,
                    analysis: None,
                    error: Some(format!("{:#}", e)),
                });
                continue;
            }
        };
        // Modeline lookup only; the analyzer does its own decoding
        let content = String::from_utf8_lossy(&bytes);
        let (analysis_config, machine) = config.analysis_config(&registry, &content);
        log::debug!("{}: {:?}", path.display(), analysis_config);

        let outcome = analyze(&bytes, &analysis_config);
        reports.push(FileReport {
            file: path.display().to_string(),
            machine: machine.map(|m| m.name.clone()),
            error: outcome.as_ref().err().map(ToString::to_string),
            analysis: outcome.ok(),
        });
    }

    match args.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&reports).context("Failed to serialize report")?
            );
        }
        OutputFormat::Text => {
            for (i, report) in reports.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                match (&report.analysis, &report.error) {
                    (Some(result), _) => print!(
                        "{}",
                        TextReport {
                            file: &report.file,
                            machine: report.machine.as_deref(),
                            result,
                        }
                    ),
                    (None, error) => println!(
                        "{}\n  error: {}",
                        report.file,
                        error.as_deref().unwrap_or("unknown")
                    ),
                }
            }
        }
    }

    let failed = reports.iter().any(|report| report.error.is_some());
    let has_errors = reports
        .iter()
        .filter_map(|report| report.analysis.as_ref())
        .any(|result| result.has_errors());

    Ok(if failed {
        ExitCode::FAILURE
    } else if args.strict && has_errors {
        ExitCode::from(EXIT_FINDINGS)
    } else {
        ExitCode::SUCCESS
    })
}
