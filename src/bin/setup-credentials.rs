//! Writes or clears the default login credentials in an env file.
//!
//! Usage:
//!   setup-credentials <path-to-env-file> SET     # write placeholder values
//!   setup-credentials <path-to-env-file> RESET   # remove both keys

use report_dashboard::credentials::{self, CredentialMode};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    if args.len() <= 2 {
        println!("Pass the path of the environment variables and the mode.");
        return ExitCode::FAILURE;
    }

    let dotenv_path = PathBuf::from(&args[1]);
    let mode: CredentialMode = match args[2].parse() {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("❌ {}", e);
            return ExitCode::FAILURE;
        }
    };

    match credentials::apply(&dotenv_path, mode) {
        Ok(()) => {
            println!("✅ {:?} applied to {}", mode, dotenv_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Failed to update {}: {}", dotenv_path.display(), e);
            ExitCode::FAILURE
        }
    }
}
