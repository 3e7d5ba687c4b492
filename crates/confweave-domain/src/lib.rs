#![warn(missing_docs)]

//! Core data model for confweave
//!
//! Defines the vocabulary shared by every other crate: configurations and
//! their token datasets, the preference registry, render and generation
//! results, and the issue type used for both warnings and errors. This crate
//! has no knowledge of any concrete template format or settings source.

pub mod configuration;
pub mod issue;
pub mod preferences;
pub mod results;
pub mod settings_loader;
pub mod token_dataset;

pub use configuration::Configuration;
pub use issue::{codes, GenerationIssue};
pub use preferences::{
    find_preference, PreferenceDef, PreferenceError, Preferences, PreferencesManager, REGISTRY,
};
pub use results::{GeneratedFile, GenerationResult, TemplateRenderResult, TemplateRenderStatus};
pub use settings_loader::{SettingsLoadError, SettingsLoader};
pub use token_dataset::TokenDataset;
