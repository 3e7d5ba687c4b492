//! The XML template: parsed once, rendered per configuration

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use rayon::prelude::*;
use tracing::debug;

use confweave_domain::{
    codes, GenerationIssue, TemplateRenderResult, TemplateRenderStatus, TokenDataset,
};

use crate::error::TemplateError;
use crate::placeholder;
use crate::processors::{
    detect_directive, find_directive_attribute, ConditionAttributeProcessor,
    ConditionBlockProcessor, ConditionOutcome, DirectiveKind, NamespaceStripProcessor,
    PreferencesProcessor, RenderAccumulator, TEMPLATE_SOURCE,
};
use crate::tree::{XmlDocument, XmlElement, XmlNode};

/// A parsed XML template, rendered once per configuration.
///
/// The parsed document is immutable; every render operates on its own clone,
/// so renders for different configurations are fully independent and may run
/// in parallel.
#[derive(Debug, Clone)]
pub struct XmlTemplate {
    document: XmlDocument,
}

impl XmlTemplate {
    /// Parse a template from source text.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        Ok(Self {
            document: XmlDocument::parse(source)?,
        })
    }

    /// Load and parse a template file.
    pub fn from_file(path: &Path) -> Result<Self, TemplateError> {
        if !path.exists() {
            return Err(TemplateError::FileNotFound(path.to_path_buf()));
        }
        let source = fs::read_to_string(path)?;
        Self::parse(&source)
    }

    /// Render the template for a single configuration.
    ///
    /// Walks a fresh clone of the document depth-first, dispatching each
    /// directive to its processor, then substitutes remaining placeholders
    /// and reports token usage. A processing error fails this configuration
    /// only; the rendered text is omitted on failure.
    pub fn render(&self, dataset: &TokenDataset<'_>) -> TemplateRenderResult {
        let mut accumulator = RenderAccumulator::default();
        let mut document = self.document.clone();
        let prefixes = document.directive_prefixes();

        process_root(&mut document.root, &prefixes, dataset, &mut accumulator);
        NamespaceStripProcessor::process(&mut document.root);

        let rendered = if accumulator.errors.is_empty() {
            placeholder::substitute_tree(&mut document.root, dataset, &mut accumulator);
            match document.to_xml() {
                Ok(text) => Some(text),
                Err(err) => {
                    accumulator.errors.push(GenerationIssue::new(
                        codes::TEMPLATE_LOAD_ERROR,
                        TEMPLATE_SOURCE,
                        format!(
                            "failed to serialise output for configuration '{}': {}",
                            dataset.name(),
                            err
                        ),
                    ));
                    None
                }
            }
        } else {
            None
        };

        let status = if rendered.is_some() {
            TemplateRenderStatus::Success
        } else {
            TemplateRenderStatus::Error
        };

        let used_tokens: Vec<String> = accumulator.used.iter().cloned().collect();
        let unused_tokens: Vec<String> = dataset
            .token_names()
            .filter(|token| !accumulator.used.contains(*token))
            .map(str::to_string)
            .collect();
        let unrecognised_tokens: Vec<String> =
            accumulator.unrecognised.iter().cloned().collect();

        debug!(
            configuration = dataset.name(),
            used = used_tokens.len(),
            unused = unused_tokens.len(),
            unrecognised = unrecognised_tokens.len(),
            success = rendered.is_some(),
            "template rendered"
        );

        TemplateRenderResult {
            configuration_name: dataset.name().to_string(),
            status,
            rendered,
            used_tokens,
            unused_tokens,
            unrecognised_tokens,
            template_preferences: accumulator.preferences,
            errors: accumulator.errors,
            warnings: accumulator.warnings,
        }
    }

    /// Render the template for every dataset, preserving input order.
    ///
    /// Rendering is embarrassingly parallel across configurations: each
    /// render works on its own clone and accumulator. Results are collected
    /// by index, so parallel execution cannot reorder them.
    pub fn render_all(&self, datasets: &[TokenDataset<'_>]) -> Vec<TemplateRenderResult> {
        datasets
            .par_iter()
            .map(|dataset| self.render(dataset))
            .collect()
    }
}

/// Process the root element.
///
/// The root is special-cased: its `applyWhen` may strip the attribute but can
/// never remove the root, and the root itself cannot be a directive element.
fn process_root(
    root: &mut XmlElement,
    prefixes: &BTreeSet<String>,
    dataset: &TokenDataset<'_>,
    accumulator: &mut RenderAccumulator,
) {
    if let Some(position) = find_directive_attribute(root, prefixes, "applyWhen") {
        let outcome =
            ConditionAttributeProcessor::process(root, position, dataset, accumulator);
        if outcome == ConditionOutcome::Remove {
            accumulator.errors.push(GenerationIssue::new(
                codes::BAD_MARKUP_ERROR,
                TEMPLATE_SOURCE,
                format!(
                    "the document root cannot be conditionally removed (configuration '{}')",
                    dataset.name()
                ),
            ));
            return;
        }
    }

    if matches!(
        detect_directive(root, prefixes),
        Some(
            DirectiveKind::ConditionBlock
                | DirectiveKind::Preferences
                | DirectiveKind::UnknownDirective
        )
    ) {
        accumulator.errors.push(GenerationIssue::new(
            codes::BAD_MARKUP_ERROR,
            TEMPLATE_SOURCE,
            format!(
                "the document root cannot be a directive element (configuration '{}')",
                dataset.name()
            ),
        ));
        return;
    }

    check_directive_attributes(root, prefixes, dataset, accumulator);
    process_children(root, prefixes, dataset, accumulator);
}

/// Depth-first walk over an element's children, in document order.
///
/// Directive elements are consumed in place; a removed element
/// short-circuits its whole subtree. Children spliced in by a condition
/// block are reprocessed from the splice point, so nested directives inside
/// a chosen branch behave exactly like inline markup.
fn process_children(
    parent: &mut XmlElement,
    prefixes: &BTreeSet<String>,
    dataset: &TokenDataset<'_>,
    accumulator: &mut RenderAccumulator,
) {
    let mut index = 0;
    while index < parent.children.len() {
        let XmlNode::Element(element) = &mut parent.children[index] else {
            index += 1;
            continue;
        };

        match detect_directive(element, prefixes) {
            Some(DirectiveKind::ConditionAttribute) => {
                let position = match find_directive_attribute(element, prefixes, "applyWhen") {
                    Some(position) => position,
                    None => {
                        index += 1;
                        continue;
                    }
                };
                let outcome =
                    ConditionAttributeProcessor::process(element, position, dataset, accumulator);
                if outcome == ConditionOutcome::Remove {
                    parent.children.remove(index);
                    continue;
                }
                // retained: fall through to the element on the next pass so a
                // directive element behind the condition is still handled
            }
            Some(DirectiveKind::ConditionBlock) => {
                let XmlNode::Element(block) = parent.children.remove(index) else {
                    continue;
                };
                let replacement =
                    ConditionBlockProcessor::process(block, prefixes, dataset, accumulator);
                parent.children.splice(index..index, replacement);
                continue;
            }
            Some(DirectiveKind::Preferences) => {
                PreferencesProcessor::process(element, dataset, accumulator);
                parent.children.remove(index);
                continue;
            }
            Some(DirectiveKind::UnknownDirective) => {
                accumulator.errors.push(GenerationIssue::new(
                    codes::BAD_MARKUP_ERROR,
                    TEMPLATE_SOURCE,
                    format!(
                        "unrecognised directive element '{}' for configuration '{}'",
                        element.name,
                        dataset.name()
                    ),
                ));
                parent.children.remove(index);
                continue;
            }
            None => {
                check_directive_attributes(element, prefixes, dataset, accumulator);
                process_children(element, prefixes, dataset, accumulator);
                index += 1;
                continue;
            }
        }
    }
}

/// Flag leftover directive-namespace attributes other than `applyWhen`.
fn check_directive_attributes(
    element: &mut XmlElement,
    prefixes: &BTreeSet<String>,
    dataset: &TokenDataset<'_>,
    accumulator: &mut RenderAccumulator,
) {
    let mut position = 0;
    while position < element.attributes.len() {
        let attribute = &element.attributes[position];
        let in_namespace = attribute
            .prefix()
            .is_some_and(|prefix| prefixes.contains(prefix));
        if in_namespace {
            accumulator.errors.push(GenerationIssue::new(
                codes::BAD_MARKUP_ERROR,
                TEMPLATE_SOURCE,
                format!(
                    "unrecognised directive attribute '{}' on element '{}' for configuration '{}'",
                    attribute.name,
                    element.name,
                    dataset.name()
                ),
            ));
            element.attributes.remove(position);
            continue;
        }
        position += 1;
    }
}
