//! Typed preferences and the name-keyed preference registry
//!
//! Preferences arrive from two places: the caller (CLI flags) and
//! `Preferences` directives inside a template. Both paths go through the
//! same registry of known names, each entry pairing a public name with a
//! typed parse-and-apply function. Caller-supplied values are pinned and
//! cannot be overridden from a template.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default indent width for XML pretty-printing.
pub const DEFAULT_PRETTY_PRINT_TAB_SIZE: usize = 2;

/// Typed rendering and output options for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    /// Path to the template file.
    pub template_file: PathBuf,
    /// Path to the settings file.
    pub settings_file: PathBuf,
    /// Root directory for generated output; the working directory if unset.
    pub output_directory: Option<PathBuf>,
    /// Fixed output filename overriding all other filename resolution.
    pub forced_filename: Option<String>,
    /// Name of the token whose value supplies the output filename.
    pub filename_setting: Option<String>,
    /// Dry-run: report changes without writing files.
    pub inhibit_write: bool,
    /// Pretty-print rendered XML before writing.
    pub xml_pretty_print: bool,
    /// Indent width used when pretty-printing.
    pub xml_pretty_print_tab_size: usize,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            template_file: PathBuf::from("template.xml"),
            settings_file: PathBuf::from("settings.csv"),
            output_directory: None,
            forced_filename: None,
            filename_setting: None,
            inhibit_write: false,
            xml_pretty_print: false,
            xml_pretty_print_tab_size: DEFAULT_PRETTY_PRINT_TAB_SIZE,
        }
    }
}

/// Failure to apply a named preference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreferenceError {
    /// The name matches no registered preference.
    #[error("unrecognised preference: {0}")]
    Unrecognised(String),
    /// The value could not be parsed as the preference's type.
    #[error("invalid value '{value}' for preference {name}: expected {expected}")]
    InvalidValue {
        /// The preference name.
        name: String,
        /// The offending value.
        value: String,
        /// What the preference expects.
        expected: &'static str,
    },
}

/// A registered preference: its public name, help text, and a typed
/// parse-and-apply function.
pub struct PreferenceDef {
    /// Public preference name, as used by the CLI and template directives.
    pub name: &'static str,
    /// One-line description for help output.
    pub description: &'static str,
    apply_fn: fn(&mut Preferences, &str) -> Result<(), PreferenceError>,
}

impl PreferenceDef {
    /// Parse `value` and apply it to `target`.
    pub fn apply(&self, target: &mut Preferences, value: &str) -> Result<(), PreferenceError> {
        (self.apply_fn)(target, value)
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, PreferenceError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(PreferenceError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
            expected: "a boolean",
        }),
    }
}

fn parse_usize(name: &str, value: &str) -> Result<usize, PreferenceError> {
    value
        .trim()
        .parse()
        .map_err(|_| PreferenceError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
            expected: "a non-negative integer",
        })
}

/// All registered preferences, validated at compile time rather than through
/// runtime property lookup.
pub static REGISTRY: &[PreferenceDef] = &[
    PreferenceDef {
        name: "TemplateFilePath",
        description: "Path to the template file",
        apply_fn: |p, v| {
            p.template_file = PathBuf::from(v);
            Ok(())
        },
    },
    PreferenceDef {
        name: "SettingsFilePath",
        description: "Path to the settings file",
        apply_fn: |p, v| {
            p.settings_file = PathBuf::from(v);
            Ok(())
        },
    },
    PreferenceDef {
        name: "OutputDirectory",
        description: "Root directory for generated output",
        apply_fn: |p, v| {
            p.output_directory = Some(PathBuf::from(v));
            Ok(())
        },
    },
    PreferenceDef {
        name: "ForcedFilename",
        description: "Fixed output filename for every configuration",
        apply_fn: |p, v| {
            p.forced_filename = Some(v.to_string());
            Ok(())
        },
    },
    PreferenceDef {
        name: "FilenameSetting",
        description: "Token whose value names each configuration's output file",
        apply_fn: |p, v| {
            p.filename_setting = Some(v.to_string());
            Ok(())
        },
    },
    PreferenceDef {
        name: "InhibitWrite",
        description: "Report changes without writing any files",
        apply_fn: |p, v| {
            p.inhibit_write = parse_bool("InhibitWrite", v)?;
            Ok(())
        },
    },
    PreferenceDef {
        name: "XmlPrettyPrint",
        description: "Pretty-print rendered XML before writing",
        apply_fn: |p, v| {
            p.xml_pretty_print = parse_bool("XmlPrettyPrint", v)?;
            Ok(())
        },
    },
    PreferenceDef {
        name: "XmlPrettyPrintTabSize",
        description: "Indent width used when pretty-printing",
        apply_fn: |p, v| {
            p.xml_pretty_print_tab_size = parse_usize("XmlPrettyPrintTabSize", v)?;
            Ok(())
        },
    },
];

/// Look up a registered preference by name (case-sensitive).
pub fn find_preference(name: &str) -> Option<&'static PreferenceDef> {
    REGISTRY.iter().find(|def| def.name == name)
}

/// Preferences plus the record of which names the caller set explicitly.
///
/// Template directives apply through [`PreferencesManager::apply_from_template`]
/// and silently lose to caller-pinned names, so a caller can always disable
/// what a template asks for.
#[derive(Debug, Clone, Default)]
pub struct PreferencesManager {
    preferences: Preferences,
    pinned: BTreeSet<String>,
}

impl PreferencesManager {
    /// Start from defaults with nothing pinned.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply caller-supplied name/value pairs, pinning every applied name.
    pub fn from_caller<'a, I>(pairs: I) -> Result<Self, PreferenceError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut manager = Self::new();
        for (name, value) in pairs {
            manager.set_from_caller(name, value)?;
        }
        Ok(manager)
    }

    /// Apply one caller value, pinning the name against template overrides.
    pub fn set_from_caller(&mut self, name: &str, value: &str) -> Result<(), PreferenceError> {
        let def = find_preference(name)
            .ok_or_else(|| PreferenceError::Unrecognised(name.to_string()))?;
        def.apply(&mut self.preferences, value)?;
        self.pinned.insert(name.to_string());
        Ok(())
    }

    /// Apply one template-directive value unless the caller pinned the name.
    pub fn apply_from_template(&mut self, name: &str, value: &str) -> Result<(), PreferenceError> {
        let def = find_preference(name)
            .ok_or_else(|| PreferenceError::Unrecognised(name.to_string()))?;
        if self.pinned.contains(name) {
            return Ok(());
        }
        def.apply(&mut self.preferences, value)
    }

    /// The effective preferences.
    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Mutable access for programmatic setup outside the registry.
    pub fn preferences_mut(&mut self) -> &mut Preferences {
        &mut self.preferences
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_knows_every_preference() {
        for name in [
            "TemplateFilePath",
            "SettingsFilePath",
            "OutputDirectory",
            "ForcedFilename",
            "FilenameSetting",
            "InhibitWrite",
            "XmlPrettyPrint",
            "XmlPrettyPrintTabSize",
        ] {
            assert!(find_preference(name).is_some(), "missing {name}");
        }
        assert!(find_preference("NotAPreference").is_none());
    }

    #[test]
    fn test_bool_values_parse_loosely() {
        let mut manager = PreferencesManager::new();
        manager.set_from_caller("XmlPrettyPrint", "True").unwrap();
        assert!(manager.preferences().xml_pretty_print);
        manager.set_from_caller("XmlPrettyPrint", "0").unwrap();
        assert!(!manager.preferences().xml_pretty_print);
    }

    #[test]
    fn test_invalid_value_is_rejected() {
        let mut manager = PreferencesManager::new();
        let err = manager
            .set_from_caller("XmlPrettyPrintTabSize", "wide")
            .unwrap_err();
        assert!(matches!(err, PreferenceError::InvalidValue { .. }));
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let mut manager = PreferencesManager::new();
        let err = manager.set_from_caller("Nope", "1").unwrap_err();
        assert_eq!(err, PreferenceError::Unrecognised("Nope".to_string()));
    }

    #[test]
    fn test_caller_pins_beat_template_values() {
        let mut manager = PreferencesManager::new();
        manager.set_from_caller("XmlPrettyPrint", "false").unwrap();
        manager
            .apply_from_template("XmlPrettyPrint", "true")
            .unwrap();
        assert!(!manager.preferences().xml_pretty_print);

        // unpinned names still accept template values
        manager
            .apply_from_template("XmlPrettyPrintTabSize", "4")
            .unwrap();
        assert_eq!(manager.preferences().xml_pretty_print_tab_size, 4);
    }
}
