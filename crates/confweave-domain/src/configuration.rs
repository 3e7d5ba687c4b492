//! Named sets of token values driving generation

use std::collections::HashMap;

/// One named set of token values, driving one generated file.
///
/// Configurations are created by a settings loader, consumed read-only by
/// the rendering pipeline, and discarded once generation finishes. Setting
/// names are case-sensitive; load order is preserved.
#[derive(Debug, Clone)]
pub struct Configuration {
    name: String,
    settings: Vec<(String, Option<String>)>,
    index: HashMap<String, usize>,
}

impl Configuration {
    /// Create a configuration from its name and ordered setting pairs.
    ///
    /// If a setting name appears more than once, the first value wins.
    pub fn new(name: impl Into<String>, settings: Vec<(String, Option<String>)>) -> Self {
        let mut index = HashMap::with_capacity(settings.len());
        let mut kept = Vec::with_capacity(settings.len());
        for (key, value) in settings {
            if !index.contains_key(&key) {
                index.insert(key.clone(), kept.len());
                kept.push((key, value));
            }
        }
        Self {
            name: name.into(),
            settings: kept,
            index,
        }
    }

    /// The unique configuration name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when a setting with the given name exists, even with no value.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Look up a setting value.
    ///
    /// Returns `None` when the setting does not exist, and `Some(None)` when
    /// it exists without a value.
    pub fn get(&self, name: &str) -> Option<Option<&str>> {
        self.index.get(name).map(|&i| self.settings[i].1.as_deref())
    }

    /// Setting names in load order.
    pub fn setting_names(&self) -> impl Iterator<Item = &str> {
        self.settings.iter().map(|(key, _)| key.as_str())
    }

    /// Number of settings.
    pub fn len(&self) -> usize {
        self.settings.len()
    }

    /// True when the configuration holds no settings.
    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Configuration {
        Configuration::new(
            "Server1",
            vec![
                ("MachineName".to_string(), Some("Server1".to_string())),
                ("Environment".to_string(), Some("PROD".to_string())),
                ("LogLevel".to_string(), None),
            ],
        )
    }

    #[test]
    fn test_lookup_by_name() {
        let configuration = sample();
        assert_eq!(configuration.get("Environment"), Some(Some("PROD")));
        assert_eq!(configuration.get("LogLevel"), Some(None));
        assert_eq!(configuration.get("Missing"), None);
    }

    #[test]
    fn test_contains_includes_valueless_settings() {
        let configuration = sample();
        assert!(configuration.contains("LogLevel"));
        assert!(!configuration.contains("Missing"));
    }

    #[test]
    fn test_setting_names_preserve_load_order() {
        let configuration = sample();
        let names: Vec<&str> = configuration.setting_names().collect();
        assert_eq!(names, vec!["MachineName", "Environment", "LogLevel"]);
    }

    #[test]
    fn test_first_duplicate_wins() {
        let configuration = Configuration::new(
            "C",
            vec![
                ("Key".to_string(), Some("first".to_string())),
                ("Key".to_string(), Some("second".to_string())),
            ],
        );
        assert_eq!(configuration.len(), 1);
        assert_eq!(configuration.get("Key"), Some(Some("first")));
    }
}
