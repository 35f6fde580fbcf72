//! Attributed element tree adapter over `xmltree`
//!
//! Parses XACML-style XML into an [`Element`] tree and renders a tree back into bytes.
//! The walkers in [`decoder`] and [`encoder`] translate between that tree and the
//! shared grammar.
//!
//! Attribute keys are qualified names exactly as written in the source (`ex:attr`,
//! `xml:lang`). Namespace declarations made on an element are kept among its attributes
//! as `xmlns` / `xmlns:<prefix>` keys, so a match mapping can carry the bindings its own
//! prefixed keys rely on.

pub(crate) mod decoder;
pub(crate) mod encoder;
mod names;

pub(crate) use decoder::decode_document;
pub(crate) use encoder::encode_document;
pub(crate) use names::{check_attribute_match, check_attribute_value};

use xml::name::OwnedName;
use xml::namespace::{Namespace, NamespaceStack, NS_NO_PREFIX, NS_XMLNS_PREFIX};
use xml::reader::{EventReader, ParserConfig, XmlEvent};
use xmltree::{Element, EmitterConfig, XMLNode};

use crate::error::{Format, Result, TranslationError};
use crate::model::{non_empty_attr, AttributeMatch};

/// Parse raw XML bytes into an attributed element tree
pub(crate) fn parse(bytes: &[u8]) -> Result<Element> {
    let config = ParserConfig::new()
        .ignore_comments(true)
        .cdata_to_characters(true);
    let mut reader = EventReader::new_with_config(bytes, config);

    let mut scopes = vec![NamespaceStack::default().squash()];
    let mut open: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        let event = reader
            .next()
            .map_err(|e| TranslationError::parse(Format::Xml, e.to_string()))?;
        match event {
            XmlEvent::StartElement {
                name,
                attributes,
                namespace,
            } => {
                let mut element = Element::new(&name.local_name);
                if let Some(inherited) = scopes.last() {
                    for (prefix, uri) in declared_here(inherited, &namespace) {
                        element
                            .attributes
                            .insert(declaration_key(prefix), uri.to_string());
                    }
                }
                for attribute in attributes {
                    element
                        .attributes
                        .insert(qualified_key(&attribute.name), attribute.value);
                }
                scopes.push(namespace);
                open.push(element);
            }
            XmlEvent::EndElement { .. } => {
                scopes.pop();
                let Some(element) = open.pop() else {
                    return Err(TranslationError::parse(Format::Xml, "unbalanced end tag"));
                };
                match open.last_mut() {
                    Some(parent) => parent.children.push(XMLNode::Element(element)),
                    None => root = Some(element),
                }
            }
            XmlEvent::Characters(text) => {
                if let Some(parent) = open.last_mut() {
                    parent.children.push(XMLNode::Text(text));
                }
            }
            XmlEvent::EndDocument => break,
            _ => {}
        }
    }

    root.ok_or_else(|| TranslationError::parse(Format::Xml, "document has no root element"))
}

/// Bindings in `namespace` that differ from the ones inherited from the parent element
fn declared_here<'a>(
    inherited: &'a Namespace,
    namespace: &'a Namespace,
) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
    namespace
        .0
        .iter()
        .filter(move |(prefix, uri)| inherited.get(prefix.as_str()) != Some(uri.as_str()))
        .map(|(prefix, uri)| (prefix.as_str(), uri.as_str()))
}

fn declaration_key(prefix: &str) -> String {
    if prefix == NS_NO_PREFIX {
        NS_XMLNS_PREFIX.to_string()
    } else {
        format!("{}:{}", NS_XMLNS_PREFIX, prefix)
    }
}

fn qualified_key(name: &OwnedName) -> String {
    match &name.prefix {
        Some(prefix) => format!("{}:{}", prefix, name.local_name),
        None => name.local_name.clone(),
    }
}

/// Render an attributed element tree as XML text without the leading declaration
pub(crate) fn serialize(root: &Element, indent: bool) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut config = EmitterConfig::new().perform_indent(indent);
    config.perform_escaping = false;
    let mut root = root.clone();
    escape_tree(&mut root);
    root.write_with_config(&mut buffer, config)
        .map_err(|e| TranslationError::serialize(Format::Xml, e.to_string()))?;
    Ok(strip_declaration(buffer))
}

/// Escape attribute values and text in place. Whitespace inside attribute values is
/// written as character references so that attribute-value normalization on the way
/// back in leaves it untouched.
fn escape_tree(element: &mut Element) {
    for value in element.attributes.values_mut() {
        *value = escape(value, true);
    }
    for node in &mut element.children {
        match node {
            XMLNode::Element(child) => escape_tree(child),
            XMLNode::Text(text) => *text = escape(text, false),
            _ => {}
        }
    }
}

fn escape(raw: &str, in_attribute: bool) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' if in_attribute => escaped.push_str("&quot;"),
            '\'' if in_attribute => escaped.push_str("&apos;"),
            '\t' if in_attribute => escaped.push_str("&#x9;"),
            '\n' if in_attribute => escaped.push_str("&#xA;"),
            '\r' => escaped.push_str("&#xD;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Drop an `<?xml ...?>` declaration (and the line break after it) from the front of `xml`
fn strip_declaration(mut xml: Vec<u8>) -> Vec<u8> {
    if !xml.starts_with(b"<?xml") {
        return xml;
    }
    if let Some(end) = xml.windows(2).position(|w| w == b"?>") {
        let mut start = end + 2;
        while matches!(xml.get(start), Some(b'\r' | b'\n')) {
            start += 1;
        }
        xml.drain(..start);
    }
    xml
}

/// Child elements of `parent` with the given tag name, in document order
pub(crate) fn child_elements<'a>(
    parent: &'a Element,
    name: &'a str,
) -> impl Iterator<Item = &'a Element> + 'a {
    parent.children.iter().filter_map(move |node| match node {
        XMLNode::Element(child) if child.name == name => Some(child),
        _ => None,
    })
}

/// Value of an optional attribute; empty values count as absent
pub(crate) fn attribute(element: &Element, name: &str) -> Option<String> {
    non_empty_attr(element.attributes.get(name).map(String::as_str))
}

/// Copy of an element's whole attribute set
pub(crate) fn attribute_match(element: &Element) -> AttributeMatch {
    element
        .attributes
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
