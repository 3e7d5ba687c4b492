//! Mutable document tree for template processing
//!
//! Templates are parsed once into this tree, cloned per render, mutated by
//! the node processors, and serialised back through quick-xml. Text and
//! attribute values are stored unescaped; escaping is reapplied on write.

use std::collections::BTreeSet;
use std::io::Write;

use quick_xml::events::{BytesCData, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::TemplateError;

/// Reserved namespace URI for template directives.
pub const DIRECTIVE_NAMESPACE: &str = "urn:confweave:template:1";

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    /// A child element.
    Element(XmlElement),
    /// Character data, unescaped.
    Text(String),
    /// A CDATA section.
    CData(String),
    /// A comment.
    Comment(String),
    /// A processing instruction.
    ProcessingInstruction(String),
}

impl XmlNode {
    /// True for text nodes containing only whitespace.
    pub fn is_whitespace_text(&self) -> bool {
        matches!(self, XmlNode::Text(text) if text.trim().is_empty())
    }
}

/// A single attribute, with its qualified name and unescaped value.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlAttribute {
    /// Qualified attribute name (`prefix:local` or `local`).
    pub name: String,
    /// Unescaped attribute value.
    pub value: String,
}

impl XmlAttribute {
    /// Namespace prefix, when the name is qualified.
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Name without its prefix.
    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }
}

/// An element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    /// Qualified element name.
    pub name: String,
    /// Attributes in document order.
    pub attributes: Vec<XmlAttribute>,
    /// Child nodes in document order.
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Create an element with no attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Namespace prefix, when the name is qualified.
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Name without its prefix.
    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    /// Value of the attribute with the given qualified name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Concatenated direct text and CDATA content.
    pub fn text_content(&self) -> String {
        let mut content = String::new();
        for child in &self.children {
            match child {
                XmlNode::Text(text) | XmlNode::CData(text) => content.push_str(text),
                _ => {}
            }
        }
        content
    }
}

/// A parsed document: prolog, root element and epilog.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    /// Raw declaration text (`<?xml version="1.0"?>`), when present.
    pub declaration: Option<String>,
    /// Raw DOCTYPE text, when present.
    pub doctype: Option<String>,
    /// Comments and processing instructions before the root element.
    pub prolog: Vec<XmlNode>,
    /// The document root.
    pub root: XmlElement,
    /// Comments and processing instructions after the root element.
    pub epilog: Vec<XmlNode>,
}

impl XmlDocument {
    /// Parse a document from source text.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut reader = Reader::from_str(source);
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut declaration = None;
        let mut doctype = None;
        let mut prolog = Vec::new();
        let mut root: Option<XmlElement> = None;
        let mut epilog = Vec::new();

        loop {
            let node = match reader.read_event()? {
                Event::Eof => break,
                Event::Decl(decl) => {
                    declaration =
                        Some(format!("<?{}?>", String::from_utf8_lossy(decl.as_ref())));
                    continue;
                }
                Event::DocType(text) => {
                    doctype =
                        Some(format!("<!DOCTYPE {}>", String::from_utf8_lossy(text.as_ref())));
                    continue;
                }
                Event::Start(start) => {
                    stack.push(element_from_start(&start)?);
                    continue;
                }
                Event::End(_) => {
                    // quick-xml has already verified tag pairing
                    match stack.pop() {
                        Some(element) => XmlNode::Element(element),
                        None => {
                            return Err(TemplateError::Markup(
                                "unbalanced closing tag".to_string(),
                            ))
                        }
                    }
                }
                Event::Empty(start) => XmlNode::Element(element_from_start(&start)?),
                Event::Text(text) => XmlNode::Text(text.unescape()?.into_owned()),
                Event::CData(cdata) => {
                    XmlNode::CData(String::from_utf8_lossy(&cdata.into_inner()).into_owned())
                }
                Event::Comment(text) => {
                    XmlNode::Comment(String::from_utf8_lossy(text.as_ref()).into_owned())
                }
                Event::PI(pi) => XmlNode::ProcessingInstruction(
                    String::from_utf8_lossy(pi.as_ref()).into_owned(),
                ),
            };

            if let Some(parent) = stack.last_mut() {
                parent.children.push(node);
            } else {
                match node {
                    XmlNode::Element(element) => {
                        if root.is_some() {
                            return Err(TemplateError::Markup(
                                "multiple root elements".to_string(),
                            ));
                        }
                        root = Some(element);
                    }
                    node if node.is_whitespace_text() => {}
                    XmlNode::Text(text) => {
                        return Err(TemplateError::Markup(format!(
                            "text outside the root element: '{}'",
                            text.trim()
                        )));
                    }
                    node => {
                        if root.is_none() {
                            prolog.push(node);
                        } else {
                            epilog.push(node);
                        }
                    }
                }
            }
        }

        let root = root.ok_or(TemplateError::MissingRoot)?;
        Ok(Self {
            declaration,
            doctype,
            prolog,
            root,
            epilog,
        })
    }

    /// Prefixes bound to the directive namespace anywhere in the document.
    pub fn directive_prefixes(&self) -> BTreeSet<String> {
        let mut prefixes = BTreeSet::new();
        collect_directive_prefixes(&self.root, &mut prefixes);
        prefixes
    }

    /// Serialise the document back to markup text.
    pub fn to_xml(&self) -> Result<String, TemplateError> {
        self.write(None)
    }

    /// Serialise the document with `indent` spaces per nesting level.
    pub fn to_xml_indented(&self, indent: usize) -> Result<String, TemplateError> {
        self.write(Some(indent))
    }

    fn write(&self, indent: Option<usize>) -> Result<String, TemplateError> {
        let mut buf = Vec::new();
        if let Some(declaration) = &self.declaration {
            buf.extend_from_slice(declaration.as_bytes());
            buf.push(b'\n');
        }
        if let Some(doctype) = &self.doctype {
            buf.extend_from_slice(doctype.as_bytes());
            buf.push(b'\n');
        }

        let mut writer = match indent {
            Some(width) => Writer::new_with_indent(buf, b' ', width),
            None => Writer::new(buf),
        };
        for node in &self.prolog {
            write_node(&mut writer, node)?;
            writer.get_mut().write_all(b"\n")?;
        }
        write_element(&mut writer, &self.root)?;
        for node in &self.epilog {
            writer.get_mut().write_all(b"\n")?;
            write_node(&mut writer, node)?;
        }
        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement, TemplateError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = XmlElement::new(name);
    for attribute in start.attributes() {
        let attribute = attribute?;
        element.attributes.push(XmlAttribute {
            name: String::from_utf8_lossy(attribute.key.as_ref()).into_owned(),
            value: attribute.unescape_value()?.into_owned(),
        });
    }
    Ok(element)
}

fn collect_directive_prefixes(element: &XmlElement, prefixes: &mut BTreeSet<String>) {
    for attribute in &element.attributes {
        if attribute.value == DIRECTIVE_NAMESPACE {
            if let Some(prefix) = attribute.name.strip_prefix("xmlns:") {
                prefixes.insert(prefix.to_string());
            }
        }
    }
    for child in &element.children {
        if let XmlNode::Element(child) = child {
            collect_directive_prefixes(child, prefixes);
        }
    }
}

fn write_element<W: Write>(
    writer: &mut Writer<W>,
    element: &XmlElement,
) -> Result<(), TemplateError> {
    let mut start = BytesStart::new(element.name.as_str());
    for attribute in &element.attributes {
        start.push_attribute((attribute.name.as_str(), attribute.value.as_str()));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}

fn write_node<W: Write>(writer: &mut Writer<W>, node: &XmlNode) -> Result<(), TemplateError> {
    match node {
        XmlNode::Element(element) => write_element(writer, element)?,
        XmlNode::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
        XmlNode::CData(text) => writer.write_event(Event::CData(BytesCData::new(text)))?,
        XmlNode::Comment(text) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))?
        }
        XmlNode::ProcessingInstruction(text) => {
            writer.write_event(Event::PI(BytesPI::new(text.as_str())))?
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_serialise_round_trip() {
        let source = r#"<root attr="value"><child>text</child><empty/></root>"#;
        let document = XmlDocument::parse(source).unwrap();
        assert_eq!(document.root.name, "root");
        assert_eq!(document.root.attribute("attr"), Some("value"));
        assert_eq!(document.to_xml().unwrap(), source);
    }

    #[test]
    fn test_declaration_is_preserved() {
        let source = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<root/>";
        let document = XmlDocument::parse(source).unwrap();
        let output = document.to_xml().unwrap();
        assert!(output.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(output.ends_with("<root/>"));
    }

    #[test]
    fn test_text_is_unescaped_in_tree_and_escaped_on_write() {
        let source = "<root>a &amp; b</root>";
        let document = XmlDocument::parse(source).unwrap();
        assert_eq!(document.root.text_content(), "a & b");
        assert_eq!(document.to_xml().unwrap(), source);
    }

    #[test]
    fn test_attribute_values_are_escaped_on_write() {
        let mut element = XmlElement::new("root");
        element.attributes.push(XmlAttribute {
            name: "attr".to_string(),
            value: "a<b".to_string(),
        });
        let document = XmlDocument {
            declaration: None,
            doctype: None,
            prolog: Vec::new(),
            root: element,
            epilog: Vec::new(),
        };
        assert_eq!(document.to_xml().unwrap(), "<root attr=\"a&lt;b\"/>");
    }

    #[test]
    fn test_directive_prefixes_are_collected() {
        let source = format!(
            r#"<root xmlns:cw="{DIRECTIVE_NAMESPACE}" xmlns:other="urn:other"><a/></root>"#
        );
        let document = XmlDocument::parse(&source).unwrap();
        let prefixes = document.directive_prefixes();
        assert!(prefixes.contains("cw"));
        assert!(!prefixes.contains("other"));
    }

    #[test]
    fn test_comments_and_cdata_survive() {
        let source = "<root><!-- note --><data><![CDATA[1 < 2]]></data></root>";
        let document = XmlDocument::parse(source).unwrap();
        assert_eq!(document.to_xml().unwrap(), source);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        assert!(matches!(
            XmlDocument::parse("<!-- only a comment -->"),
            Err(TemplateError::MissingRoot)
        ));
    }

    #[test]
    fn test_malformed_markup_is_an_error() {
        assert!(XmlDocument::parse("<root><unclosed></root>").is_err());
    }

    #[test]
    fn test_local_name_and_prefix() {
        let element = XmlElement::new("cw:Apply");
        assert_eq!(element.prefix(), Some("cw"));
        assert_eq!(element.local_name(), "Apply");

        let plain = XmlElement::new("Value");
        assert_eq!(plain.prefix(), None);
        assert_eq!(plain.local_name(), "Value");
    }
}
