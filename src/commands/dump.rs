use std::process::ExitCode;

use super::common::{load_unit, render_error};
use crate::cli::InputArgs;

/// Print every compiled class with its instructions.
pub fn dump_files(input: &InputArgs) -> ExitCode {
    let unit = match load_unit(input) {
        Ok(unit) => unit,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let program = match unit.compile() {
        Ok(program) => program,
        Err(e) => {
            eprintln!("{}", render_error(&e, &unit));
            return ExitCode::FAILURE;
        }
    };

    for (i, class) in program.classes.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print!("{class}");
    }
    ExitCode::SUCCESS
}
