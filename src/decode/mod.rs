//! Page decoder module
//!
//! Supports: JSON, XML
//!
//! # Overview
//!
//! Turns a response body into a typed [`PageEnvelope`](crate::pagination::PageEnvelope).
//! JSON goes straight through serde. XML is parsed into an ordered element
//! tree which serde then reads directly, each field deciding how its text is
//! interpreted.

mod decoders;
mod types;
mod xml;

pub use decoders::{decode_json_page, decode_page, decode_xml_page, xml_to_json};
pub use types::PageFormat;
