use std::process::ExitCode;

use super::common::{load_unit, render_error};
use crate::cli::InputArgs;

/// Compile the inputs without writing class files.
pub fn check_files(input: &InputArgs) -> ExitCode {
    let unit = match load_unit(input) {
        Ok(unit) => unit,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match unit.compile() {
        Ok(program) => {
            tracing::info!(classes = program.classes.len(), "check passed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", render_error(&e, &unit));
            ExitCode::FAILURE
        }
    }
}
