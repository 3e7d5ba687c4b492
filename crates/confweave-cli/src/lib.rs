//! Command-line front-end for confweave
//!
//! Parses flags into the preference registry, runs the generation
//! orchestrator, and prints either a colored summary or the JSON result.
//! The process exit code is non-zero whenever any issue was reported at any
//! level, so CI can fail on warnings like unused tokens.

pub mod args;
pub mod report;

use anyhow::Context;
use tracing::debug;

use confweave_generation::Generator;

use crate::args::CliArgs;

/// Execute a full generation run for the parsed arguments.
///
/// Returns the process exit code.
pub fn run(args: &CliArgs) -> anyhow::Result<i32> {
    let preferences = args
        .to_preferences()
        .context("invalid command-line preferences")?;

    let generator = Generator::new(preferences);
    let result = generator.generate();
    debug!(
        files = result.generated_files.len(),
        issues = result.all_issues().count(),
        "generation complete"
    );

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("serialising generation result")?
        );
    } else {
        report::print_summary(&result);
    }

    Ok(if result.has_issues() { 1 } else { 0 })
}
