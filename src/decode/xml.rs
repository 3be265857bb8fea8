//! XML element tree and a serde deserializer over it
//!
//! The parser keeps children in document order and leaf text verbatim. The
//! deserializer reads text according to the requested type, so `<code>1001</code>`
//! is a string for a `String` field and a number for a `u32` field.

use crate::error::{Error, Result};
use serde::de::value::BorrowedStrDeserializer;
use serde::de::{self, DeserializeSeed, Deserializer as _, MapAccess, SeqAccess, Visitor};
use std::fmt::Display;

// ============================================================================
// Tree
// ============================================================================

/// One parsed element. Attributes are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct XmlNode {
    pub name: String,
    /// Unescaped character data, including CDATA sections
    pub text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    fn is_blank(&self) -> bool {
        self.children.is_empty() && self.text.trim().is_empty()
    }
}

/// Parse a document into its root element
pub(crate) fn parse_document(xml: &str) -> Result<XmlNode> {
    let xml = xml.trim();

    if !xml.starts_with('<') {
        return Err(Error::deserialization("Input does not appear to be XML"));
    }

    let rest = skip_prolog(xml)?;
    let (root, _) = parse_element(rest)?;
    Ok(root)
}

/// Skip the XML declaration, doctype and any leading comments
fn skip_prolog(mut input: &str) -> Result<&str> {
    loop {
        input = input.trim_start();
        if let Some(rest) = input.strip_prefix("<?") {
            let end = rest
                .find("?>")
                .ok_or_else(|| Error::deserialization("Unterminated XML declaration"))?;
            input = &rest[end + 2..];
        } else if input.starts_with("<!--") {
            input = skip_comment(input)?;
        } else if let Some(rest) = input.strip_prefix("<!DOCTYPE") {
            let end = rest
                .find('>')
                .ok_or_else(|| Error::deserialization("Unterminated DOCTYPE"))?;
            input = &rest[end + 1..];
        } else {
            return Ok(input);
        }
    }
}

fn skip_comment(input: &str) -> Result<&str> {
    let end = input
        .find("-->")
        .ok_or_else(|| Error::deserialization("Unterminated XML comment"))?;
    Ok(&input[end + 3..])
}

/// Parse one element starting at `<`, returning it and the remaining input
fn parse_element(input: &str) -> Result<(XmlNode, &str)> {
    let input = input.trim_start();
    if !input.starts_with('<') {
        return Err(Error::deserialization("Expected opening tag"));
    }

    let open_end = input
        .find('>')
        .ok_or_else(|| Error::deserialization("Malformed tag"))?;
    let open_tag = input[1..open_end].trim();
    let self_closing = open_tag.ends_with('/');

    let name = open_tag
        .trim_end_matches('/')
        .split_whitespace()
        .next()
        .ok_or_else(|| Error::deserialization("Expected tag name"))?;

    let mut node = XmlNode {
        name: name.to_string(),
        ..XmlNode::default()
    };
    let mut rest = &input[open_end + 1..];
    if self_closing {
        return Ok((node, rest));
    }

    let close_tag = format!("</{name}>");

    loop {
        if let Some(after) = rest.strip_prefix(close_tag.as_str()) {
            return Ok((node, after));
        }

        if rest.is_empty() {
            return Err(Error::deserialization(format!(
                "Missing closing tag for {name}"
            )));
        }

        if rest.starts_with("<!--") {
            rest = skip_comment(rest)?;
        } else if let Some(cdata) = rest.strip_prefix("<![CDATA[") {
            let end = cdata
                .find("]]>")
                .ok_or_else(|| Error::deserialization("Unterminated CDATA section"))?;
            node.text.push_str(&cdata[..end]);
            rest = &cdata[end + 3..];
        } else if rest.starts_with("</") {
            return Err(Error::deserialization(format!(
                "Mismatched closing tag inside {name}"
            )));
        } else if rest.starts_with('<') {
            let (child, after) = parse_element(rest)?;
            node.children.push(child);
            rest = after;
        } else {
            let end = rest.find('<').unwrap_or(rest.len());
            node.text.push_str(&unescape(&rest[..end]));
            rest = &rest[end..];
        }
    }
}

/// Replace the predefined XML entities
fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

// ============================================================================
// Deserializer
// ============================================================================

/// Error raised while reading a tree into a typed value
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub(crate) struct XmlDeError(String);

impl de::Error for XmlDeError {
    fn custom<T: Display>(msg: T) -> Self {
        Self(msg.to_string())
    }
}

type DeResult<T> = std::result::Result<T, XmlDeError>;

/// Deserializes one element, or a run of same-named siblings.
///
/// An element with children reads as a map keyed by child tag, or as a
/// sequence of its children in document order. A leaf reads as its text,
/// parsed into whatever scalar the target asks for.
pub(crate) struct NodeDeserializer<'de> {
    node: &'de XmlNode,
    /// Later siblings sharing `node`'s tag
    siblings: Vec<&'de XmlNode>,
}

impl<'de> NodeDeserializer<'de> {
    pub fn new(node: &'de XmlNode) -> Self {
        Self {
            node,
            siblings: Vec::new(),
        }
    }

    fn parse<T>(&self, expected: &str) -> DeResult<T>
    where
        T: std::str::FromStr,
        T::Err: Display,
    {
        let text = self.node.text.trim();
        text.parse().map_err(|e| {
            XmlDeError(format!(
                "<{}>: cannot read '{text}' as {expected}: {e}",
                self.node.name
            ))
        })
    }
}

macro_rules! deserialize_parsed {
    ($($method:ident => $visit:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> DeResult<V::Value> {
                visitor.$visit(self.parse::<$ty>(stringify!($ty))?)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for NodeDeserializer<'de> {
    type Error = XmlDeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> DeResult<V::Value> {
        if !self.siblings.is_empty() {
            self.deserialize_seq(visitor)
        } else if !self.node.children.is_empty() {
            self.deserialize_map(visitor)
        } else if self.node.text.trim().is_empty() {
            visitor.visit_unit()
        } else {
            visitor.visit_borrowed_str(&self.node.text)
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> DeResult<V::Value> {
        match self.node.text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => visitor.visit_bool(true),
            "false" | "0" => visitor.visit_bool(false),
            other => Err(XmlDeError(format!(
                "<{}>: cannot read '{other}' as bool",
                self.node.name
            ))),
        }
    }

    deserialize_parsed! {
        deserialize_i8 => visit_i8(i8),
        deserialize_i16 => visit_i16(i16),
        deserialize_i32 => visit_i32(i32),
        deserialize_i64 => visit_i64(i64),
        deserialize_u8 => visit_u8(u8),
        deserialize_u16 => visit_u16(u16),
        deserialize_u32 => visit_u32(u32),
        deserialize_u64 => visit_u64(u64),
        deserialize_f32 => visit_f32(f32),
        deserialize_f64 => visit_f64(f64),
        deserialize_char => visit_char(char),
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> DeResult<V::Value> {
        visitor.visit_borrowed_str(&self.node.text)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> DeResult<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> DeResult<V::Value> {
        visitor.visit_borrowed_bytes(self.node.text.as_bytes())
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> DeResult<V::Value> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> DeResult<V::Value> {
        if self.siblings.is_empty() && self.node.is_blank() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> DeResult<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> DeResult<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> DeResult<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> DeResult<V::Value> {
        if !self.siblings.is_empty() {
            // A repeated tag: each occurrence is one element
            let nodes = std::iter::once(self.node).chain(self.siblings);
            visitor.visit_seq(NodeSeq { nodes })
        } else if !self.node.children.is_empty() {
            // A container: its children are the elements, whatever their tags
            visitor.visit_seq(NodeSeq {
                nodes: self.node.children.iter(),
            })
        } else if self.node.text.trim().is_empty() {
            visitor.visit_seq(NodeSeq {
                nodes: std::iter::empty::<&XmlNode>(),
            })
        } else {
            visitor.visit_seq(NodeSeq {
                nodes: std::iter::once(self.node),
            })
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> DeResult<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> DeResult<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> DeResult<V::Value> {
        visitor.visit_map(NodeMap::new(&self.node.children))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> DeResult<V::Value> {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> DeResult<V::Value> {
        if !self.node.children.is_empty() {
            return Err(XmlDeError(format!(
                "<{}>: only unit enum variants can be read from XML",
                self.node.name
            )));
        }
        visitor.visit_enum(BorrowedStrDeserializer::new(self.node.text.trim()))
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> DeResult<V::Value> {
        visitor.visit_borrowed_str(self.node.text.trim())
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> DeResult<V::Value> {
        visitor.visit_unit()
    }
}

struct NodeSeq<I> {
    nodes: I,
}

impl<'de, I> SeqAccess<'de> for NodeSeq<I>
where
    I: Iterator<Item = &'de XmlNode>,
{
    type Error = XmlDeError;

    fn next_element_seed<S: DeserializeSeed<'de>>(
        &mut self,
        seed: S,
    ) -> DeResult<Option<S::Value>> {
        match self.nodes.next() {
            Some(node) => seed.deserialize(NodeDeserializer::new(node)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.nodes.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

/// Children grouped by tag, in order of each tag's first appearance
struct NodeMap<'de> {
    groups: std::vec::IntoIter<(&'de str, Vec<&'de XmlNode>)>,
    pending: Option<Vec<&'de XmlNode>>,
}

impl<'de> NodeMap<'de> {
    fn new(children: &'de [XmlNode]) -> Self {
        let mut groups: Vec<(&'de str, Vec<&'de XmlNode>)> = Vec::new();
        for child in children {
            match groups.iter_mut().find(|(name, _)| *name == child.name) {
                Some((_, nodes)) => nodes.push(child),
                None => groups.push((child.name.as_str(), vec![child])),
            }
        }

        Self {
            groups: groups.into_iter(),
            pending: None,
        }
    }
}

impl<'de> MapAccess<'de> for NodeMap<'de> {
    type Error = XmlDeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> DeResult<Option<K::Value>> {
        match self.groups.next() {
            Some((name, nodes)) => {
                self.pending = Some(nodes);
                seed.deserialize(BorrowedStrDeserializer::new(name)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<S: DeserializeSeed<'de>>(&mut self, seed: S) -> DeResult<S::Value> {
        let mut nodes = self
            .pending
            .take()
            .ok_or_else(|| XmlDeError("value requested before key".to_string()))?
            .into_iter();
        let node = nodes
            .next()
            .ok_or_else(|| XmlDeError("empty element group".to_string()))?;

        seed.deserialize(NodeDeserializer {
            node,
            siblings: nodes.collect(),
        })
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.groups.len())
    }
}
