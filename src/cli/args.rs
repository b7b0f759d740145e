//! Command line arguments.

use std::path::PathBuf;

use atypical_compiler::{CompilerOptions, TraitCastMode};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::classfile::DEFAULT_MAJOR_VERSION;

/// Atypical compiler
#[derive(Parser)]
#[command(name = "atypical")]
#[command(version = "0.1.0")]
#[command(about = "Compile Atypical sources to class files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile source files and write one class file per type
    Build {
        #[command(flatten)]
        input: InputArgs,

        /// Directory the class files are written under
        #[arg(short = 'o', long, value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,

        /// Class file major version
        #[arg(long, value_name = "VERSION", default_value_t = DEFAULT_MAJOR_VERSION)]
        class_version: u16,
    },
    /// Type check source files without writing anything
    Check {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print the compiled classes and their instructions
    Dump {
        #[command(flatten)]
        input: InputArgs,
    },
}

/// Source files and code generation options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Source files, compiled together in the order given
    #[arg(value_name = "FILES", required = true)]
    pub files: Vec<PathBuf>,

    /// How `cast<Trait>(..)` finds the adapter class
    #[arg(long, value_enum, default_value_t = TraitCastArg::Reflective)]
    pub trait_casts: TraitCastArg,

    /// Do not emit line number tables
    #[arg(long)]
    pub no_line_numbers: bool,
}

impl InputArgs {
    pub fn options(&self) -> CompilerOptions {
        CompilerOptions::default()
            .with_trait_casts(self.trait_casts.into())
            .with_line_numbers(!self.no_line_numbers)
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraitCastArg {
    /// Derive the adapter name at runtime
    Reflective,
    /// Construct known adapters directly
    Static,
}

impl From<TraitCastArg> for TraitCastMode {
    fn from(arg: TraitCastArg) -> Self {
        match arg {
            TraitCastArg::Reflective => TraitCastMode::Reflective,
            TraitCastArg::Static => TraitCastMode::Static,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_arguments() {
        let cli = Cli::try_parse_from([
            "atypical",
            "build",
            "a.atp",
            "b.atp",
            "-o",
            "out",
            "--trait-casts",
            "static",
            "--no-line-numbers",
        ])
        .unwrap();
        let Commands::Build {
            input,
            out_dir,
            class_version,
        } = cli.command
        else {
            panic!("expected build");
        };
        assert_eq!(input.files, vec![PathBuf::from("a.atp"), PathBuf::from("b.atp")]);
        assert_eq!(out_dir, PathBuf::from("out"));
        assert_eq!(class_version, 49);
        let options = input.options();
        assert_eq!(options.trait_casts, TraitCastMode::Static);
        assert!(!options.line_numbers);
    }

    #[test]
    fn files_are_required() {
        assert!(Cli::try_parse_from(["atypical", "check"]).is_err());
    }
}
