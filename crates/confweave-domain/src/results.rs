//! Outcome types for rendering and generation

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::issue::GenerationIssue;

/// Outcome status of rendering one configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateRenderStatus {
    /// Rendering produced a document.
    Success,
    /// Rendering failed; no document was produced.
    Error,
}

/// Per-configuration outcome of a template render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateRenderResult {
    /// Name of the configuration this result belongs to.
    pub configuration_name: String,
    /// Whether rendering succeeded.
    pub status: TemplateRenderStatus,
    /// The rendered document; present iff `status` is `Success`.
    pub rendered: Option<String>,
    /// Tokens consumed by directives or placeholders.
    pub used_tokens: Vec<String>,
    /// Configuration tokens consumed by nothing in the template.
    pub unused_tokens: Vec<String>,
    /// Tokens referenced by the template but absent from the configuration.
    pub unrecognised_tokens: Vec<String>,
    /// Preferences requested by the template's own directives, in document
    /// order. Applied later by the orchestrator so caller-pinned values win.
    pub template_preferences: Vec<(String, String)>,
    /// Errors that failed the render.
    pub errors: Vec<GenerationIssue>,
    /// Non-fatal issues raised while rendering.
    pub warnings: Vec<GenerationIssue>,
}

impl TemplateRenderResult {
    /// True when the render produced a document.
    pub fn is_success(&self) -> bool {
        self.status == TemplateRenderStatus::Success
    }
}

/// Final artifact record for one configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedFile {
    /// Name of the configuration that produced this file.
    pub configuration_name: String,
    /// Resolved output path; `None` when generation failed before a path was
    /// resolved.
    pub full_path: Option<PathBuf>,
    /// Tokens consumed while generating this file.
    pub used_tokens: Vec<String>,
    /// Configuration tokens consumed by nothing.
    pub unused_tokens: Vec<String>,
    /// Tokens referenced but absent from the configuration.
    pub unrecognised_tokens: Vec<String>,
    /// Warnings and errors attached to this file.
    pub issues: Vec<GenerationIssue>,
    /// True when generated content differs from any pre-existing file (a
    /// missing file counts as changed).
    pub has_changed: bool,
}

impl GeneratedFile {
    /// True when any issue is attached to this file.
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

/// Overall outcome of a generation run.
///
/// The run always completes and returns this object; callers decide success
/// or failure from the issue lists, never from unhandled faults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    /// One record per configuration, in configuration load order.
    pub generated_files: Vec<GeneratedFile>,
    /// Issues not attributable to a single file (e.g. a missing template).
    pub issues: Vec<GenerationIssue>,
}

impl GenerationResult {
    /// Overall issues followed by every generated file's issues.
    pub fn all_issues(&self) -> impl Iterator<Item = &GenerationIssue> {
        self.issues
            .iter()
            .chain(self.generated_files.iter().flat_map(|f| f.issues.iter()))
    }

    /// True when any issue exists at any level.
    pub fn has_issues(&self) -> bool {
        self.all_issues().next().is_some()
    }

    /// The generated file record for a configuration, by name.
    pub fn configuration(&self, name: &str) -> Option<&GeneratedFile> {
        self.generated_files
            .iter()
            .find(|f| f.configuration_name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::codes;

    fn file(name: &str, issues: Vec<GenerationIssue>) -> GeneratedFile {
        GeneratedFile {
            configuration_name: name.to_string(),
            full_path: None,
            used_tokens: Vec::new(),
            unused_tokens: Vec::new(),
            unrecognised_tokens: Vec::new(),
            issues,
            has_changed: false,
        }
    }

    #[test]
    fn test_all_issues_concatenates_overall_and_per_file() {
        let result = GenerationResult {
            generated_files: vec![
                file("C1", Vec::new()),
                file(
                    "C2",
                    vec![GenerationIssue::bare(codes::UNUSED_TOKEN, "Generator")],
                ),
            ],
            issues: vec![GenerationIssue::bare(
                codes::TEMPLATE_FILE_NOT_FOUND,
                "Generator",
            )],
        };
        let codes: Vec<&str> = result.all_issues().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["TemplateFileNotFound", "UnusedToken"]);
        assert!(result.has_issues());
    }

    #[test]
    fn test_configuration_lookup() {
        let result = GenerationResult {
            generated_files: vec![file("C1", Vec::new())],
            issues: Vec::new(),
        };
        assert!(result.configuration("C1").is_some());
        assert!(result.configuration("C2").is_none());
        assert!(!result.has_issues());
    }
}
