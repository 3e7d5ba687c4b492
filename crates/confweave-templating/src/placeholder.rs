//! Textual token placeholder substitution
//!
//! Placeholders use the `[%TokenName%]` form and may appear in text nodes,
//! CDATA sections and attribute values. A resolvable placeholder is replaced
//! with the token's value and recorded as used; an unresolvable one is left
//! verbatim and recorded as unrecognised (a warning, never fatal).

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use confweave_domain::TokenDataset;

use crate::processors::RenderAccumulator;
use crate::tree::{XmlElement, XmlNode};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[%([^%\[\]]+)%\]").expect("placeholder pattern is valid"));

/// Substitute placeholders in one text fragment, recording token usage.
pub fn substitute(
    input: &str,
    dataset: &TokenDataset<'_>,
    accumulator: &mut RenderAccumulator,
) -> String {
    PLACEHOLDER
        .replace_all(input, |captures: &Captures<'_>| {
            let token = captures[1].trim().to_string();
            match dataset.try_get(&token) {
                Some(value) => {
                    let replacement = value.unwrap_or_default().to_string();
                    accumulator.used.insert(token);
                    replacement
                }
                None => {
                    accumulator.unrecognised.insert(token);
                    captures[0].to_string()
                }
            }
        })
        .into_owned()
}

/// Substitute placeholders across an element's subtree.
pub fn substitute_tree(
    element: &mut XmlElement,
    dataset: &TokenDataset<'_>,
    accumulator: &mut RenderAccumulator,
) {
    for attribute in &mut element.attributes {
        attribute.value = substitute(&attribute.value, dataset, accumulator);
    }
    for child in &mut element.children {
        match child {
            XmlNode::Element(child) => substitute_tree(child, dataset, accumulator),
            XmlNode::Text(text) | XmlNode::CData(text) => {
                *text = substitute(text, dataset, accumulator);
            }
            XmlNode::Comment(_) | XmlNode::ProcessingInstruction(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confweave_domain::Configuration;

    fn configuration() -> Configuration {
        Configuration::new(
            "C1",
            vec![
                ("Value1".to_string(), Some("A".to_string())),
                ("Empty".to_string(), None),
            ],
        )
    }

    #[test]
    fn test_resolvable_placeholder_is_substituted_and_used() {
        let configuration = configuration();
        let dataset = TokenDataset::new(&configuration);
        let mut accumulator = RenderAccumulator::default();
        let output = substitute("before [%Value1%] after", &dataset, &mut accumulator);
        assert_eq!(output, "before A after");
        assert!(accumulator.used.contains("Value1"));
        assert!(accumulator.unrecognised.is_empty());
    }

    #[test]
    fn test_unresolvable_placeholder_is_left_verbatim() {
        let configuration = configuration();
        let dataset = TokenDataset::new(&configuration);
        let mut accumulator = RenderAccumulator::default();
        let output = substitute("[%Missing%]", &dataset, &mut accumulator);
        assert_eq!(output, "[%Missing%]");
        assert!(accumulator.unrecognised.contains("Missing"));
        assert!(accumulator.used.is_empty());
    }

    #[test]
    fn test_valueless_token_substitutes_empty_and_counts_as_used() {
        let configuration = configuration();
        let dataset = TokenDataset::new(&configuration);
        let mut accumulator = RenderAccumulator::default();
        let output = substitute("x[%Empty%]y", &dataset, &mut accumulator);
        assert_eq!(output, "xy");
        assert!(accumulator.used.contains("Empty"));
    }

    #[test]
    fn test_multiple_placeholders_in_one_fragment() {
        let configuration = configuration();
        let dataset = TokenDataset::new(&configuration);
        let mut accumulator = RenderAccumulator::default();
        let output = substitute("[%Value1%]-[%Value1%]-[%Missing%]", &dataset, &mut accumulator);
        assert_eq!(output, "A-A-[%Missing%]");
    }
}
