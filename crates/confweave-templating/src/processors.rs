//! Node processors for template directives
//!
//! Each directive kind has its own processor; dispatch is a closed enum
//! driven by the reserved namespace rather than open-ended name matching.
//! Processors record token usage into a per-render accumulator and convert
//! their own failures into issues, so nothing here ever reaches the
//! orchestrator as an unhandled fault.

use std::collections::BTreeSet;

use confweave_domain::{codes, find_preference, GenerationIssue, TokenDataset};

use crate::expression;
use crate::tree::{XmlElement, XmlNode, DIRECTIVE_NAMESPACE};

/// Component name reported as the `source` of template issues.
pub const TEMPLATE_SOURCE: &str = "XmlTemplate";

/// The closed set of directives understood by the processor pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    /// `applyWhen` conditional-inclusion attribute.
    ConditionAttribute,
    /// `Apply` condition block element with `When`/`ElseWhen`/`Else` branches.
    ConditionBlock,
    /// `Preferences` preference-extraction element.
    Preferences,
    /// An element in the directive namespace that matches no known directive.
    UnknownDirective,
}

/// Identify the directive an element carries, if any.
///
/// An `applyWhen` attribute takes precedence over the element's own name so
/// that a directive element can itself be conditionally included.
pub fn detect_directive(
    element: &XmlElement,
    prefixes: &BTreeSet<String>,
) -> Option<DirectiveKind> {
    if find_directive_attribute(element, prefixes, "applyWhen").is_some() {
        return Some(DirectiveKind::ConditionAttribute);
    }
    match element.prefix() {
        Some(prefix) if prefixes.contains(prefix) => match element.local_name() {
            "Apply" => Some(DirectiveKind::ConditionBlock),
            "Preferences" => Some(DirectiveKind::Preferences),
            _ => Some(DirectiveKind::UnknownDirective),
        },
        _ => None,
    }
}

/// Position of the named directive attribute on `element`, if present.
pub fn find_directive_attribute(
    element: &XmlElement,
    prefixes: &BTreeSet<String>,
    local: &str,
) -> Option<usize> {
    element.attributes.iter().position(|attribute| {
        attribute.local_name() == local
            && attribute
                .prefix()
                .is_some_and(|prefix| prefixes.contains(prefix))
    })
}

/// Running accounting for a single render.
///
/// One accumulator exists per configuration per render call; nothing is
/// shared across configurations.
#[derive(Debug, Default)]
pub struct RenderAccumulator {
    /// Tokens consumed so far.
    pub used: BTreeSet<String>,
    /// Tokens referenced but absent from the dataset.
    pub unrecognised: BTreeSet<String>,
    /// Preference name/value pairs requested by the template, in document
    /// order.
    pub preferences: Vec<(String, String)>,
    /// Errors that fail the render.
    pub errors: Vec<GenerationIssue>,
    /// Non-fatal issues.
    pub warnings: Vec<GenerationIssue>,
}

impl RenderAccumulator {
    /// Record every referenced token as either used or unrecognised.
    ///
    /// A referenced token is used when the dataset contains it and
    /// unrecognised otherwise, never both.
    pub fn record_referenced(
        &mut self,
        referenced: BTreeSet<String>,
        dataset: &TokenDataset<'_>,
    ) {
        for token in referenced {
            if dataset.contains(&token) {
                self.used.insert(token);
            } else {
                self.unrecognised.insert(token);
            }
        }
    }

    fn error(&mut self, code: &str, detail: String) {
        self.errors
            .push(GenerationIssue::new(code, TEMPLATE_SOURCE, detail));
    }
}

/// What the conditional-inclusion processor decided for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionOutcome {
    /// Keep the element; its subtree is processed normally.
    Retain,
    /// Remove the element and its entire subtree.
    Remove,
}

/// Processor for the `applyWhen` conditional-inclusion attribute.
pub struct ConditionAttributeProcessor;

impl ConditionAttributeProcessor {
    /// Evaluate the element's `applyWhen` attribute against the dataset.
    ///
    /// Referenced tokens are recorded before evaluation, so accounting covers
    /// expressions that fail or evaluate false. The attribute itself is
    /// always stripped. An empty expression is a non-fatal issue and the
    /// element is retained; a malformed expression fails the render.
    pub fn process(
        element: &mut XmlElement,
        position: usize,
        dataset: &TokenDataset<'_>,
        accumulator: &mut RenderAccumulator,
    ) -> ConditionOutcome {
        let expression_text = element.attributes.remove(position).value;

        if expression_text.trim().is_empty() {
            accumulator.warnings.push(GenerationIssue::new(
                codes::CONDITION_PROCESSING_ERROR,
                TEMPLATE_SOURCE,
                format!(
                    "empty condition on element '{}' for configuration '{}'",
                    element.name,
                    dataset.name()
                ),
            ));
            return ConditionOutcome::Retain;
        }

        accumulator.record_referenced(
            expression::extract_referenced_tokens(&expression_text),
            dataset,
        );

        match expression::evaluate(&expression_text, dataset) {
            Ok(true) => ConditionOutcome::Retain,
            Ok(false) => ConditionOutcome::Remove,
            Err(err) => {
                accumulator.error(
                    codes::CONDITION_PROCESSING_ERROR,
                    format!(
                        "condition '{}' failed for configuration '{}': {}",
                        expression_text,
                        dataset.name(),
                        err
                    ),
                );
                ConditionOutcome::Remove
            }
        }
    }
}

/// Processor for `Apply` condition blocks.
pub struct ConditionBlockProcessor;

struct Branch {
    condition: Option<String>,
    children: Vec<XmlNode>,
}

impl ConditionBlockProcessor {
    /// Select the first branch whose condition holds and return its children
    /// for splicing into the parent.
    ///
    /// Branch structure is `When` first, then any number of `ElseWhen`, then
    /// at most one final `Else`. Only evaluated conditions have their tokens
    /// recorded; an unevaluated branch behaves like a removed subtree. Any
    /// structural violation fails the render and yields no replacement.
    pub fn process(
        element: XmlElement,
        prefixes: &BTreeSet<String>,
        dataset: &TokenDataset<'_>,
        accumulator: &mut RenderAccumulator,
    ) -> Vec<XmlNode> {
        let branches = match Self::branches(element, prefixes, dataset, accumulator) {
            Some(branches) => branches,
            None => return Vec::new(),
        };

        for branch in branches {
            let truthy = match &branch.condition {
                None => true,
                Some(condition) => {
                    accumulator.record_referenced(
                        expression::extract_referenced_tokens(condition),
                        dataset,
                    );
                    match expression::evaluate(condition, dataset) {
                        Ok(result) => result,
                        Err(err) => {
                            accumulator.error(
                                codes::CONDITION_PROCESSING_ERROR,
                                format!(
                                    "condition '{}' failed for configuration '{}': {}",
                                    condition,
                                    dataset.name(),
                                    err
                                ),
                            );
                            return Vec::new();
                        }
                    }
                }
            };
            if truthy {
                return branch.children;
            }
        }

        Vec::new()
    }

    fn branches(
        element: XmlElement,
        prefixes: &BTreeSet<String>,
        dataset: &TokenDataset<'_>,
        accumulator: &mut RenderAccumulator,
    ) -> Option<Vec<Branch>> {
        let mut branches: Vec<Branch> = Vec::new();
        let mut saw_else = false;

        for child in element.children {
            let child = match child {
                XmlNode::Element(child) => child,
                node if node.is_whitespace_text() => continue,
                XmlNode::Comment(_) => continue,
                _ => {
                    accumulator.error(
                        codes::APPLY_WHEN_ELSE_FORMAT_ERROR,
                        format!(
                            "condition block may only contain When/ElseWhen/Else branches \
                             (configuration '{}')",
                            dataset.name()
                        ),
                    );
                    return None;
                }
            };

            let in_namespace = child
                .prefix()
                .is_some_and(|prefix| prefixes.contains(prefix));
            let kind = if in_namespace {
                child.local_name().to_string()
            } else {
                String::new()
            };

            let branch = match kind.as_str() {
                "When" if branches.is_empty() => Self::conditional_branch(child),
                "When" => {
                    accumulator.error(
                        codes::APPLY_WHEN_ELSE_FORMAT_ERROR,
                        format!(
                            "a condition block holds a single When branch, in first position \
                             (configuration '{}')",
                            dataset.name()
                        ),
                    );
                    return None;
                }
                "ElseWhen" if !branches.is_empty() && !saw_else => {
                    Self::conditional_branch(child)
                }
                "Else" if !branches.is_empty() && !saw_else => {
                    saw_else = true;
                    Some(Branch {
                        condition: None,
                        children: child.children,
                    })
                }
                _ => {
                    accumulator.error(
                        codes::APPLY_WHEN_ELSE_FORMAT_ERROR,
                        format!(
                            "unexpected element '{}' in condition block for configuration '{}'",
                            child.name,
                            dataset.name()
                        ),
                    );
                    return None;
                }
            };

            match branch {
                Some(branch) => branches.push(branch),
                None => {
                    accumulator.error(
                        codes::APPLY_WHEN_ELSE_FORMAT_ERROR,
                        format!(
                            "condition block branch is missing its condition attribute \
                             (configuration '{}')",
                            dataset.name()
                        ),
                    );
                    return None;
                }
            }
        }

        if branches.is_empty() {
            accumulator.error(
                codes::APPLY_WHEN_ELSE_FORMAT_ERROR,
                format!(
                    "condition block has no When branch (configuration '{}')",
                    dataset.name()
                ),
            );
            return None;
        }

        Some(branches)
    }

    fn conditional_branch(child: XmlElement) -> Option<Branch> {
        let condition = child.attribute("condition")?.to_string();
        Some(Branch {
            condition: Some(condition),
            children: child.children,
        })
    }
}

/// Processor for `Preferences` directive elements.
pub struct PreferencesProcessor;

impl PreferencesProcessor {
    /// Collect preference name/value pairs from the element's children.
    ///
    /// Names are validated against the preference registry here, so an
    /// unknown name fails the configuration at render time; values are
    /// parsed later, when the orchestrator applies them with caller
    /// precedence.
    pub fn process(
        element: &XmlElement,
        dataset: &TokenDataset<'_>,
        accumulator: &mut RenderAccumulator,
    ) {
        for child in &element.children {
            match child {
                XmlNode::Element(entry) => {
                    let name = entry.local_name().to_string();
                    if find_preference(&name).is_none() {
                        accumulator.error(
                            codes::UNRECOGNISED_PREFERENCE,
                            format!(
                                "unrecognised preference '{}' for configuration '{}'",
                                name,
                                dataset.name()
                            ),
                        );
                        continue;
                    }
                    accumulator
                        .preferences
                        .push((name, entry.text_content().trim().to_string()));
                }
                node if node.is_whitespace_text() => {}
                XmlNode::Comment(_) => {}
                _ => accumulator.error(
                    codes::BAD_MARKUP_ERROR,
                    format!(
                        "unexpected content in preferences element for configuration '{}'",
                        dataset.name()
                    ),
                ),
            }
        }
    }
}

/// Removes directive-namespace declarations so the reserved namespace never
/// leaks into generated output.
pub struct NamespaceStripProcessor;

impl NamespaceStripProcessor {
    /// Strip matching namespace declarations, recursively.
    pub fn process(element: &mut XmlElement) {
        element.attributes.retain(|attribute| {
            let declares_directive_namespace = attribute.value == DIRECTIVE_NAMESPACE
                && (attribute.prefix() == Some("xmlns") || attribute.name == "xmlns");
            !declares_directive_namespace
        });
        for child in &mut element.children {
            if let XmlNode::Element(child) = child {
                Self::process(child);
            }
        }
    }
}
