//! Decoder implementations
//!
//! Each decoder turns a response body into a page envelope.

use super::types::PageFormat;
use super::xml::{parse_document, NodeDeserializer};
use crate::error::{Error, Result};
use crate::pagination::PageEnvelope;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Decode a page body in the given format
pub fn decode_page<T: DeserializeOwned>(format: PageFormat, body: &str) -> Result<PageEnvelope<T>> {
    match format {
        PageFormat::Json => decode_json_page(body),
        PageFormat::Xml => decode_xml_page(body),
    }
}

// ============================================================================
// JSON Decoder
// ============================================================================

/// Decode a JSON page body
pub fn decode_json_page<T: DeserializeOwned>(body: &str) -> Result<PageEnvelope<T>> {
    serde_json::from_str(body)
        .map_err(|e| Error::deserialization(format!("Failed to parse JSON page: {e}")))
}

// ============================================================================
// XML Decoder
// ============================================================================

/// Decode an XML page body.
///
/// Expected shape:
///
/// ```text
/// <page>
///   <has_more>true</has_more>
///   <next>/items?cursor=abc</next>
///   <data><item>...</item><item>...</item></data>
/// </page>
/// ```
///
/// The children of `data` become the page elements in document order,
/// regardless of their tag name. An empty or self-closing `data` is an empty
/// page. `next` is taken verbatim from the element text.
pub fn decode_xml_page<T: DeserializeOwned>(body: &str) -> Result<PageEnvelope<T>> {
    let root = parse_document(body)?;

    if root.children.is_empty() && !root.text.trim().is_empty() {
        return Err(Error::deserialization(
            "XML page root must contain has_more, next and data elements",
        ));
    }

    PageEnvelope::deserialize(NodeDeserializer::new(&root))
        .map_err(|e| Error::deserialization(format!("Failed to read XML page: {e}")))
}

/// Basic XML to JSON conversion.
///
/// Returns the content of the root element: an object of its children, a
/// string for text-only content, or `null` when empty. Repeated child tags
/// collect into an array. Leaf text is kept as a string. Attributes are
/// ignored.
pub fn xml_to_json(xml: &str) -> Result<Value> {
    let root = parse_document(xml)?;
    Value::deserialize(NodeDeserializer::new(&root))
        .map_err(|e| Error::deserialization(format!("Failed to convert XML: {e}")))
}
