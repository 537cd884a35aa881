//! Stencil's main application entry point.
//! Handles command-line argument parsing, logging setup and reporting.

use std::sync::Arc;

use stencil::{
    cli::get_args,
    error::default_error_handler,
    prompt::{DialoguerPrompter, Prompter},
    runner::run,
};

/// Main application entry point.
fn main() {
    let args = get_args();

    // Logger configuration
    env_logger::Builder::new()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .init();

    let prompter: Arc<dyn Prompter> = Arc::new(DialoguerPrompter::new());

    match run(&args, prompter) {
        Ok(outcome) => {
            if !args.should_use_defaults() {
                for file in &outcome.written {
                    println!("Created '{}'", file.display());
                }
            }
            println!(
                "Successfully executed the project template {} in {}.",
                outcome.template,
                outcome.target.display()
            );
        }
        Err(err) => default_error_handler(err),
    }
}
