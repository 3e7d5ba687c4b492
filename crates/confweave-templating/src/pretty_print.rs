//! XML pretty-print post-processing
//!
//! Applied between successful rendering and output writing when the
//! `XmlPrettyPrint` preference is enabled. Failures here are reported as
//! file-level issues by the orchestrator, never as process faults.

use crate::error::TemplateError;
use crate::tree::{XmlDocument, XmlElement, XmlNode};

/// Re-indents rendered XML before it is written to disk.
#[derive(Debug, Clone, Copy)]
pub struct XmlPrettyPrinter {
    tab_size: usize,
}

impl XmlPrettyPrinter {
    /// Create a printer indenting by `tab_size` spaces per nesting level.
    pub fn new(tab_size: usize) -> Self {
        Self { tab_size }
    }

    /// Reformat a rendered document.
    ///
    /// Whitespace-only text between elements is discarded and rebuilt from
    /// the indent width; mixed content (an element holding both text and
    /// elements) is left untouched so significant text never moves.
    pub fn process(&self, rendered: &str) -> Result<String, TemplateError> {
        let mut document = XmlDocument::parse(rendered)?;
        drop_layout_whitespace(&mut document.root);
        document.to_xml_indented(self.tab_size)
    }
}

fn drop_layout_whitespace(element: &mut XmlElement) {
    let has_element_children = element
        .children
        .iter()
        .any(|child| matches!(child, XmlNode::Element(_)));
    let has_text_content = element.children.iter().any(|child| {
        matches!(child, XmlNode::Text(_) | XmlNode::CData(_)) && !child.is_whitespace_text()
    });

    if has_element_children && !has_text_content {
        element.children.retain(|child| !child.is_whitespace_text());
    }
    for child in &mut element.children {
        if let XmlNode::Element(child) = child {
            drop_layout_whitespace(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reindents_nested_elements() {
        let printer = XmlPrettyPrinter::new(2);
        let output = printer
            .process("<root><a><b>text</b></a><c/></root>")
            .unwrap();
        assert_eq!(output, "<root>\n  <a>\n    <b>text</b>\n  </a>\n  <c/>\n</root>");
    }

    #[test]
    fn test_tab_size_is_honoured() {
        let printer = XmlPrettyPrinter::new(4);
        let output = printer.process("<root><a/></root>").unwrap();
        assert_eq!(output, "<root>\n    <a/>\n</root>");
    }

    #[test]
    fn test_mixed_content_is_not_reflowed() {
        let printer = XmlPrettyPrinter::new(2);
        let source = "<root><p>some <b>bold</b> text</p></root>";
        let output = printer.process(source).unwrap();
        assert!(output.contains("some <b>bold</b> text"));
    }

    #[test]
    fn test_declaration_survives_pretty_printing() {
        let printer = XmlPrettyPrinter::new(2);
        let output = printer
            .process("<?xml version=\"1.0\"?><root><a/></root>")
            .unwrap();
        assert!(output.starts_with("<?xml version=\"1.0\"?>"));
    }

    #[test]
    fn test_malformed_input_is_an_error() {
        let printer = XmlPrettyPrinter::new(2);
        assert!(printer.process("<root><broken></root>").is_err());
    }
}
