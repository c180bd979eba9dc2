//! CLI logic for the Fiz recipe compiler.
//!
//! Reads a recipe file, compiles it with imports resolved next to the file,
//! and writes the textual graph dump.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{fs, path::Path};

use log::info;

use fiz::{
    Compiler, FizError,
    config::{AppConfig, ImportConfig},
    diagnostics::Diagnostic,
};

/// What a successful run produced besides the dump itself.
#[derive(Debug)]
pub struct Outcome {
    /// The recipe text the diagnostics point into
    pub source: String,
    /// Warnings raised while compiling, and parse errors in lenient mode
    pub diagnostics: Vec<Diagnostic>,
}

/// Run the Fiz CLI application
///
/// Compiles the input file and writes the dump of the resulting graph to the
/// output file, or to stdout when no output is given. Imports resolve below
/// the configured import root, or next to the input file when none is set.
///
/// # Errors
///
/// Returns `FizError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Parsing errors, unless running leniently
pub async fn run(args: &Args) -> Result<Outcome, FizError> {
    info!(
        input_path = args.input,
        output_path:? = args.output;
        "Processing recipe"
    );

    let app_config = config::load_config(args.config.as_ref())?;
    let app_config = with_default_root(app_config, Path::new(&args.input));

    let source = fs::read_to_string(&args.input)?;

    let compiler = Compiler::from_config(app_config);
    let compilation = if args.lenient {
        compiler.compile_lenient(&source).await
    } else {
        compiler.compile(&source).await?
    };
    let (dag, diagnostics) = compilation.into_parts();

    let dump = format!("{dag}");
    match &args.output {
        Some(output) => {
            fs::write(output, dump)?;
            info!(output_file = output; "Graph dump written");
        }
        None => print!("{dump}"),
    }

    Ok(Outcome {
        source,
        diagnostics,
    })
}

/// Use the input file's directory as import root unless one is configured.
fn with_default_root(config: AppConfig, input: &Path) -> AppConfig {
    if config.imports().root().is_some() {
        return config;
    }
    let root = input.parent().unwrap_or(Path::new("."));
    let imports: ImportConfig = config.imports().clone().with_root(root);
    AppConfig::new(imports)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_root_is_input_directory() {
        let config = with_default_root(AppConfig::default(), Path::new("recipes/tea.fiz"));
        assert_eq!(config.imports().root(), Some(Path::new("recipes")));
    }

    #[test]
    fn test_configured_root_is_kept() {
        let config = AppConfig::new(ImportConfig::default().with_root("/srv/recipes"));
        let config = with_default_root(config, Path::new("tea.fiz"));
        assert_eq!(config.imports().root(), Some(Path::new("/srv/recipes")));
    }
}
