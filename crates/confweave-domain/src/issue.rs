//! Issues reported against a generation run or a single generated file

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable issue codes shared across the pipeline.
///
/// Codes are plain strings so they survive serialization and can be matched
/// by callers without depending on internal error types.
pub mod codes {
    /// The template file could not be found; the run is aborted.
    pub const TEMPLATE_FILE_NOT_FOUND: &str = "TemplateFileNotFound";
    /// The settings file could not be found; the run is aborted.
    pub const SETTINGS_FILE_NOT_FOUND: &str = "SettingsFileNotFound";
    /// The settings file existed but could not be loaded.
    pub const SETTINGS_LOAD_ERROR: &str = "SettingsLoadError";
    /// The template file existed but could not be parsed.
    pub const TEMPLATE_LOAD_ERROR: &str = "TemplateLoadError";
    /// A conditional directive carried an empty or unevaluable expression.
    pub const CONDITION_PROCESSING_ERROR: &str = "ConditionProcessingError";
    /// A directive element or attribute was not recognised.
    pub const BAD_MARKUP_ERROR: &str = "BadMarkupError";
    /// A condition block violated the When/ElseWhen/Else structure.
    pub const APPLY_WHEN_ELSE_FORMAT_ERROR: &str = "ApplyWhenElseFormatError";
    /// A preference directive named an unknown preference.
    pub const UNRECOGNISED_PREFERENCE: &str = "UnrecognisedPreference";
    /// A preference directive carried an unparseable value.
    pub const INVALID_PREFERENCE_VALUE: &str = "InvalidPreferenceValue";
    /// Pretty-print post-processing failed for a rendered document.
    pub const PRETTY_PRINT_ERROR: &str = "PrettyPrintError";
    /// A configuration value was consumed by neither directives nor
    /// placeholders.
    pub const UNUSED_TOKEN: &str = "UnusedToken";
    /// The template referenced a token the configuration does not define.
    pub const UNRECOGNISED_TOKEN: &str = "UnrecognisedToken";
    /// The output file could not be written.
    pub const OUTPUT_WRITE_ERROR: &str = "OutputWriteError";
}

/// A warning or error attached to the overall run or to one generated file.
///
/// The same shape carries both fatal failures and non-fatal warnings; the
/// orchestrator only concatenates issue lists and never inspects internals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationIssue {
    /// Stable machine-readable code (see [`codes`]).
    pub code: String,
    /// Name of the component that produced the issue.
    pub source: String,
    /// Human-readable detail, when available.
    pub detail: Option<String>,
}

impl GenerationIssue {
    /// Create an issue with detail text.
    pub fn new(code: &str, source: &str, detail: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            source: source.to_string(),
            detail: Some(detail.into()),
        }
    }

    /// Create an issue without detail text.
    pub fn bare(code: &str, source: &str) -> Self {
        Self {
            code: code.to_string(),
            source: source.to_string(),
            detail: None,
        }
    }
}

impl fmt::Display for GenerationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "[{}] {}: {}", self.code, self.source, detail),
            None => write!(f, "[{}] {}", self.code, self.source),
        }
    }
}
