//! Policy translation API
//!
//! Whole-buffer entry points for both directions. Each call is self-contained: the parsed
//! tree is threaded through the walkers as a value and dropped once serialized.

mod files;

pub use files::{editor_to_policy, policy_to_editor, read_source, write_destination};

use log::debug;

use crate::error::Result;
use crate::{editor, xml};

/// Output formatting options shared by both directions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslateOptions {
    /// Pretty-print editor JSON instead of emitting it on one line
    pub pretty_json: bool,
    /// Indent nested XML elements
    pub indent_xml: bool,
}

/// Translate an XML policy into editor JSON using default options
pub fn decode(source: &[u8]) -> Result<Vec<u8>> {
    decode_with(source, &TranslateOptions::default())
}

/// Translate an XML policy into editor JSON
pub fn decode_with(source: &[u8], options: &TranslateOptions) -> Result<Vec<u8>> {
    let root = xml::parse(source)?;
    let document = xml::decode_document(&root)?;
    debug!("Decoded {} document: {:#?}", document.root_name(), document);
    editor::serialize(&document, options.pretty_json)
}

/// Translate editor JSON into an XML policy using default options
pub fn encode(source: &[u8]) -> Result<Vec<u8>> {
    encode_with(source, &TranslateOptions::default())
}

/// Translate editor JSON into an XML policy.
///
/// The output never starts with an XML declaration.
pub fn encode_with(source: &[u8], options: &TranslateOptions) -> Result<Vec<u8>> {
    let document = editor::parse(source)?;
    debug!("Parsed {} document: {:#?}", document.root_name(), document);
    let root = xml::encode_document(&document)?;
    xml::serialize(&root, options.indent_xml)
}
