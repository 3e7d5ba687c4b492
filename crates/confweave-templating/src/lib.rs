#![warn(missing_docs)]

//! XML template engine for confweave
//!
//! Provides the template rendering pipeline:
//! - A mutable document tree parsed once per template and cloned per render
//! - Conditional-inclusion, condition-block and preference directives in the
//!   reserved `urn:confweave:template:1` namespace
//! - A restricted boolean expression evaluator over token values
//! - `[%TokenName%]` placeholder substitution in text and attribute values
//! - Pretty-print post-processing of rendered documents

pub mod error;
pub mod expression;
pub mod placeholder;
pub mod pretty_print;
pub mod processors;
pub mod template;
pub mod tree;

pub use error::{ExpressionError, TemplateError};
pub use pretty_print::XmlPrettyPrinter;
pub use processors::{DirectiveKind, RenderAccumulator, TEMPLATE_SOURCE};
pub use template::XmlTemplate;
pub use tree::{XmlAttribute, XmlDocument, XmlElement, XmlNode, DIRECTIVE_NAMESPACE};
