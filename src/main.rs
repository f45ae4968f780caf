//! Cascade - task manager with dependency-aware planning

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = cascade::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
