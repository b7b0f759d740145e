//! Shared utilities for CLI commands.

use std::fs;

use atypical_core::AtypicalError;

use crate::cli::InputArgs;
use crate::unit::Unit;

/// Read every input file into a unit configured from the arguments.
pub fn load_unit(input: &InputArgs) -> Result<Unit, AtypicalError> {
    let mut unit = Unit::with_options(input.options());
    for path in &input.files {
        let text = fs::read_to_string(path).map_err(|source| AtypicalError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), bytes = text.len(), "loaded source");
        unit.add_source(path.to_string_lossy(), text);
    }
    Ok(unit)
}

/// Render an error for the terminal, quoting the offending line where the
/// error carries a location.
pub fn render_error(err: &AtypicalError, unit: &Unit) -> String {
    let source_of = |file: &str| {
        unit.sources()
            .iter()
            .find(|s| s.name == file)
            .map(|s| s.text.as_str())
    };

    match err {
        AtypicalError::Parse { file, errors } => {
            let text = source_of(file).unwrap_or("");
            errors
                .iter()
                .map(|e| format!("error: {file}: {}", e.display_with_source(text)))
                .collect::<Vec<_>>()
                .join("\n")
        }
        AtypicalError::Compilation { file, source } => {
            let span = source.span();
            if span.line == 0 {
                format!("error: {file}: {source}")
            } else {
                format!("error: {file}:{span}: {source}")
            }
        }
        AtypicalError::Registration { file, source } => {
            format!("error: {file}:{}: {source}", source.span())
        }
        other => format!("error: {other}"),
    }
}
