//! Property-based tests for template rendering
//!
//! Property: rendering is deterministic, order-preserving across parallel
//! execution, and isolated between configurations.

use proptest::prelude::*;

use confweave_domain::{Configuration, TokenDataset};
use confweave_templating::XmlTemplate;

fn token_value_strategy() -> impl Strategy<Value = String> {
    // values exercise XML escaping as well as plain text
    r"[a-zA-Z0-9 &<>']{0,12}"
}

fn configurations_strategy() -> impl Strategy<Value = Vec<Configuration>> {
    prop::collection::vec(token_value_strategy(), 1..8).prop_map(|values| {
        values
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                Configuration::new(
                    format!("Config{index}"),
                    vec![("Value".to_string(), Some(value))],
                )
            })
            .collect()
    })
}

proptest! {
    /// Property: `render_all` output order equals dataset input order, for
    /// any number of configurations.
    #[test]
    fn prop_render_all_preserves_input_order(configurations in configurations_strategy()) {
        let template = XmlTemplate::parse("<root><v>[%Value%]</v></root>")
            .expect("template parses");
        let datasets: Vec<TokenDataset<'_>> =
            configurations.iter().map(TokenDataset::new).collect();

        let results = template.render_all(&datasets);

        prop_assert_eq!(results.len(), configurations.len());
        for (result, configuration) in results.iter().zip(&configurations) {
            prop_assert_eq!(&result.configuration_name, configuration.name());
        }
    }

    /// Property: rendering the same dataset twice yields identical output.
    #[test]
    fn prop_rendering_is_deterministic(value in token_value_strategy()) {
        let configuration = Configuration::new(
            "Config",
            vec![("Value".to_string(), Some(value))],
        );
        let template = XmlTemplate::parse("<root a=\"[%Value%]\"><v>[%Value%]</v></root>")
            .expect("template parses");
        let dataset = TokenDataset::new(&configuration);

        let first = template.render(&dataset);
        let second = template.render(&dataset);

        prop_assert_eq!(first.rendered, second.rendered);
        prop_assert_eq!(first.used_tokens, second.used_tokens);
        prop_assert_eq!(first.unused_tokens, second.unused_tokens);
    }

    /// Property: substituted values survive a serialise/parse round trip
    /// unchanged, whatever escaping the writer applied.
    #[test]
    fn prop_substituted_values_round_trip(value in token_value_strategy()) {
        let configuration = Configuration::new(
            "Config",
            vec![("Value".to_string(), Some(value.clone()))],
        );
        let template = XmlTemplate::parse("<root><v>[%Value%]</v></root>")
            .expect("template parses");

        let result = template.render(&TokenDataset::new(&configuration));
        let rendered = result.rendered.expect("render succeeds");

        let reparsed = confweave_templating::XmlDocument::parse(&rendered)
            .expect("rendered output is well-formed");
        match &reparsed.root.children[0] {
            confweave_templating::XmlNode::Element(v) => {
                prop_assert_eq!(v.text_content(), value);
            }
            other => prop_assert!(false, "unexpected node: {:?}", other),
        }
    }

    /// Property: a successful render with only resolvable placeholders never
    /// reports unrecognised tokens.
    #[test]
    fn prop_resolvable_placeholders_report_no_unrecognised(value in token_value_strategy()) {
        let configuration = Configuration::new(
            "Config",
            vec![
                ("Value".to_string(), Some(value)),
                ("Spare".to_string(), Some("s".to_string())),
            ],
        );
        let template = XmlTemplate::parse("<root><v>[%Value%]</v></root>")
            .expect("template parses");

        let result = template.render(&TokenDataset::new(&configuration));

        prop_assert!(result.unrecognised_tokens.is_empty());
        prop_assert_eq!(result.used_tokens, vec!["Value".to_string()]);
        prop_assert_eq!(result.unused_tokens, vec!["Spare".to_string()]);
    }
}
