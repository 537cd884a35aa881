//! Command-line interface implementation for Stencil.
//! Provides argument parsing and help text formatting using clap.

use clap::{error::ErrorKind, CommandFactory, Parser};
use std::path::PathBuf;

/// Command-line arguments structure for Stencil.
#[derive(Parser, Debug)]
#[command(author, version, about = "Stencil: transactional project scaffolding", long_about = None)]
pub struct Args {
    /// Path to the template directory or tag of an installed template
    #[arg(value_name = "TEMPLATE")]
    pub template: String,

    /// Directory where the generated project will be created.
    /// Its parent directory must already exist.
    #[arg(value_name = "TARGET_DIR")]
    pub target_dir: PathBuf,

    /// Answer every variable with its default instead of prompting
    #[arg(short = 'd', long)]
    pub use_defaults: bool,

    /// Read answers from a JSON or YAML file (implies --use-defaults).
    /// The run fails if the file lacks a value the template used.
    #[arg(short = 'u', long, value_name = "FILE")]
    pub use_file: Option<PathBuf>,

    /// Write the values used in this run to a JSON file, suitable for --use-file
    #[arg(short = 'j', long, value_name = "FILE")]
    pub json_file: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Whether variables are answered without prompting.
    pub fn should_use_defaults(&self) -> bool {
        self.use_defaults || self.use_file.is_some()
    }
}

/// Parses command line arguments and returns the Args structure.
///
/// # Returns
/// * `Args` - Parsed command line arguments
///
/// # Exits
/// * With status code 1 if required arguments are missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if e.kind() == ErrorKind::MissingRequiredArgument {
                let printed = Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help();
                if let Err(err) = printed {
                    eprintln!("{err}");
                }
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}
