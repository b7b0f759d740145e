use std::fs;
use std::path::Path;
use std::process::ExitCode;

use atypical_core::AtypicalError;

use super::common::{load_unit, render_error};
use crate::classfile::ClassFileWriter;
use crate::cli::InputArgs;
use crate::unit::ClassFile;

/// Compile the inputs and write each class under `out_dir`, one directory
/// per package segment.
pub fn build_files(input: &InputArgs, out_dir: &Path, class_version: u16) -> ExitCode {
    let unit = match load_unit(input) {
        Ok(unit) => unit,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut writer = ClassFileWriter::new().with_major_version(class_version);
    let classes = match unit.build_with(&mut writer) {
        Ok(classes) => classes,
        Err(e) => {
            eprintln!("{}", render_error(&e, &unit));
            return ExitCode::FAILURE;
        }
    };

    for class in &classes {
        if let Err(e) = write_class(out_dir, class) {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    }
    tracing::info!(classes = classes.len(), out_dir = %out_dir.display(), "build finished");
    ExitCode::SUCCESS
}

/// Write one class file, creating its package directories.
pub fn write_class(out_dir: &Path, class: &ClassFile) -> Result<(), AtypicalError> {
    let path = out_dir.join(class.relative_path());
    let io_err = |source| AtypicalError::Io {
        path: path.clone(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(&path, &class.bytes).map_err(io_err)?;
    tracing::debug!(path = %path.display(), "wrote class");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_land_in_package_directories() {
        let out = std::env::temp_dir().join(format!("atypical-build-{}", std::process::id()));
        let class = ClassFile {
            name: "geo/Point".into(),
            bytes: vec![0xca, 0xfe, 0xba, 0xbe],
        };
        write_class(&out, &class).unwrap();
        let written = fs::read(out.join("geo").join("Point.class")).unwrap();
        assert_eq!(written, class.bytes);
        fs::remove_dir_all(&out).unwrap();
    }
}
