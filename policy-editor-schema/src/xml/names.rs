//! Well-formedness checks for attribute names and values written to XML
//!
//! The element tree renders attribute keys and values as given, so anything XML cannot
//! carry has to be caught before serialization.

use std::collections::BTreeMap;

use xml::namespace::{NS_XMLNS_PREFIX, NS_XMLNS_URI, NS_XML_PREFIX, NS_XML_URI};

use crate::error::{Format, Result, TranslationError};
use crate::model::AttributeMatch;

/// Check a single attribute value for characters outside the XML `Char` range
pub(crate) fn check_attribute_value(name: &str, value: &str) -> Result<()> {
    match value.chars().find(|c| !is_xml_char(*c)) {
        Some(c) => Err(TranslationError::serialize(
            Format::Xml,
            format!(
                "attribute '{}' contains U+{:04X}, which XML cannot represent",
                name, c as u32
            ),
        )),
        None => Ok(()),
    }
}

/// Check that a match mapping can be written as the attribute set of one element.
///
/// Keys must be qualified names. A prefix other than `xml` has to be declared by an
/// `xmlns:<prefix>` key in the same mapping, and no two keys may name the same
/// namespaced attribute.
pub(crate) fn check_attribute_match(attributes: &AttributeMatch) -> Result<()> {
    let mut expanded = BTreeMap::new();
    for (key, value) in attributes {
        check_attribute_value(key, value)?;
        let (prefix, local) = split_qualified(key)?;
        match prefix {
            None if local == NS_XMLNS_PREFIX => check_default_namespace(key, value)?,
            None => {}
            Some(NS_XMLNS_PREFIX) => check_declaration(key, local, value)?,
            Some(prefix) => {
                let uri = binding(attributes, prefix).ok_or_else(|| {
                    invalid_key(key, &format!("prefix '{}' is not declared", prefix))
                })?;
                if let Some(other) = expanded.insert((uri, local), key) {
                    return Err(invalid_key(
                        key,
                        &format!("names the same attribute as '{}'", other),
                    ));
                }
            }
        }
    }
    Ok(())
}

fn split_qualified(key: &str) -> Result<(Option<&str>, &str)> {
    let (prefix, local) = match key.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, key),
    };
    let valid = prefix.map_or(true, is_nc_name) && is_nc_name(local);
    if valid {
        Ok((prefix, local))
    } else {
        Err(invalid_key(key, "not a valid XML attribute name"))
    }
}

fn check_declaration(key: &str, declared: &str, uri: &str) -> Result<()> {
    if declared == NS_XML_PREFIX || declared == NS_XMLNS_PREFIX {
        return Err(invalid_key(key, "reserved prefixes cannot be redeclared"));
    }
    if uri.is_empty() {
        return Err(invalid_key(key, "a prefixed namespace declaration needs a URI"));
    }
    check_namespace_uri(key, uri)
}

fn check_default_namespace(key: &str, uri: &str) -> Result<()> {
    if uri == NS_XML_PREFIX || uri == NS_XMLNS_PREFIX {
        return Err(invalid_key(key, "reserved prefixes cannot be a default namespace"));
    }
    check_namespace_uri(key, uri)
}

fn check_namespace_uri(key: &str, uri: &str) -> Result<()> {
    if uri == NS_XML_URI || uri == NS_XMLNS_URI {
        return Err(invalid_key(key, "reserved namespace URIs cannot be bound"));
    }
    Ok(())
}

/// Namespace URI a prefix resolves to inside a single match mapping
fn binding<'a>(attributes: &'a AttributeMatch, prefix: &str) -> Option<&'a str> {
    if prefix == NS_XML_PREFIX {
        return Some(NS_XML_URI);
    }
    attributes
        .get(&format!("{}:{}", NS_XMLNS_PREFIX, prefix))
        .map(String::as_str)
}

fn invalid_key(key: &str, reason: &str) -> TranslationError {
    TranslationError::serialize(
        Format::Xml,
        format!("attribute name '{}' cannot be written: {}", key, reason),
    )
}

fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\u{9}' | '\u{A}' | '\u{D}' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

fn is_nc_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(is_name_start_char) && chars.all(is_name_char)
}

fn is_name_start_char(c: char) -> bool {
    matches!(
        c,
        'A'..='Z'
            | '_'
            | 'a'..='z'
            | '\u{C0}'..='\u{D6}'
            | '\u{D8}'..='\u{F6}'
            | '\u{F8}'..='\u{2FF}'
            | '\u{370}'..='\u{37D}'
            | '\u{37F}'..='\u{1FFF}'
            | '\u{200C}'..='\u{200D}'
            | '\u{2070}'..='\u{218F}'
            | '\u{2C00}'..='\u{2FEF}'
            | '\u{3001}'..='\u{D7FF}'
            | '\u{F900}'..='\u{FDCF}'
            | '\u{FDF0}'..='\u{FFFD}'
            | '\u{10000}'..='\u{EFFFF}'
    )
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(
            c,
            '-' | '.' | '0'..='9' | '\u{B7}' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}'
        )
}
