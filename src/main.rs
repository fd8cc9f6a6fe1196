use clap::Parser;
use sharezip::RunOutcome;
use sharezip::cli::{Cli, init_tracing, run_cli};
use sharezip::output::OutputFormatter;
use std::env;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    OutputFormatter::use_stderr(cli.json);

    let working_dir = match env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            OutputFormatter::error(&format!("Error: cannot read current directory: {}", e));
            return ExitCode::FAILURE;
        }
    };

    // Per-item failures are part of the outcome; only structural errors land here.
    let outcome = match run_cli(&cli, &working_dir) {
        Ok(outcome) => outcome,
        Err(e) => {
            OutputFormatter::error(&format!("Error: {}", e));
            return ExitCode::FAILURE;
        }
    };

    if let RunOutcome::Completed(report) = &outcome {
        OutputFormatter::summary_table(report);
    }

    if cli.json {
        match serde_json::to_string_pretty(&outcome) {
            Ok(json) => println!("{}", json),
            Err(e) => OutputFormatter::error(&format!("Could not serialize result: {}", e)),
        }
    }

    ExitCode::SUCCESS
}
