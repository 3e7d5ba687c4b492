//! Human-readable generation report

use colored::Colorize;

use confweave_domain::{GeneratedFile, GenerationResult};

/// Render the per-configuration summary as printable text.
pub fn summary(result: &GenerationResult) -> String {
    let mut out = String::new();

    for issue in &result.issues {
        out.push_str(&format!("{} {}\n", "error:".red().bold(), issue));
    }

    for file in &result.generated_files {
        out.push_str(&format!(
            "{:<24} {}\n",
            file.configuration_name,
            status_label(file)
        ));
        for issue in &file.issues {
            out.push_str(&format!("    {}\n", issue));
        }
    }

    let changed = result
        .generated_files
        .iter()
        .filter(|f| f.has_changed)
        .count();
    let issues = result.all_issues().count();
    out.push_str(&format!(
        "{} configuration(s), {} changed, {} issue(s)\n",
        result.generated_files.len(),
        changed,
        issues
    ));

    out
}

/// Print the summary to stdout.
pub fn print_summary(result: &GenerationResult) {
    print!("{}", summary(result));
}

fn status_label(file: &GeneratedFile) -> String {
    match (&file.full_path, file.has_changed) {
        (None, _) => "failed".red().bold().to_string(),
        (Some(_), true) => "changed".green().to_string(),
        (Some(_), false) => "unchanged".dimmed().to_string(),
    }
}
