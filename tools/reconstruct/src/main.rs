//! 批量重建电极网格.
//!
//! ```text
//! reconstruct run --cases cases.json [--data-dir DIR] [--out-dir DIR] [--log-level info]
//! reconstruct check --cases cases.json
//! ```

mod case;
mod cli;
mod error;
mod result;
mod runner;

use std::process::ExitCode;

fn main() -> ExitCode {
    match cli::run_from_env() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
