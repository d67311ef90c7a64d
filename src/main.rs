//! Command-line key analysis of a single audio file

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use stratum_key::{analyze_file_with_progress, AnalysisConfig};

/// Command-line arguments for stratum-key
#[derive(Parser, Debug)]
#[command(name = "stratum-key")]
#[command(about = "Analyze the key of an audio file.")]
#[command(version)]
struct Args {
    /// Path to the audio file
    file_path: PathBuf,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let result = analyze_file_with_progress(&args.file_path, AnalysisConfig::default(), &mut |stage| {
        println!("{}", stage);
    });

    match result {
        Ok(analysis) => {
            println!("The best matching key is: {}", analysis.key);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
