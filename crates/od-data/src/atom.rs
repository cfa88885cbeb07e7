//! Atom entry documents for create and update payloads.

use std::borrow::Cow;
use std::collections::BTreeMap;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{Error, ErrorKind, Result};
use crate::record::FieldValue;

/// Atom namespace.
pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
/// OData data namespace, bound to the `d` prefix.
pub const DATA_NS: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices";
/// OData metadata namespace, bound to the `m` prefix.
pub const METADATA_NS: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices/metadata";

/// How null fields are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Null fields are left out.
    Create,
    /// Null fields are sent as `<d:Field m:null="true"/>` to clear them.
    Update,
}

/// Remove characters that cannot appear in an XML document.
///
/// Drops C0 controls other than tab, line feed and carriage return, DEL, C1
/// controls, U+FEFF, U+FFFE and U+FFFF.
pub fn scrub_xml_text(text: &str) -> Cow<'_, str> {
    if !text.chars().any(is_xml_illegal) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.chars().filter(|c| !is_xml_illegal(*c)).collect())
}

fn is_xml_illegal(c: char) -> bool {
    matches!(
        c,
        '\u{0}'..='\u{8}'
            | '\u{B}'
            | '\u{C}'
            | '\u{E}'..='\u{1F}'
            | '\u{7F}'..='\u{9F}'
            | '\u{FEFF}'
            | '\u{FFFE}'
            | '\u{FFFF}'
    )
}

/// True when `name` can be used as an element name after the `d:` prefix.
pub fn is_valid_field_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Serialize a field map into an Atom entry document.
pub fn build_entry(fields: &BTreeMap<String, FieldValue>, kind: EntryKind) -> Result<String> {
    if let Some(bad) = fields.keys().find(|name| !is_valid_field_name(name)) {
        return Err(Error::new(ErrorKind::InvalidInput(format!(
            "field name cannot be written as XML: {bad:?}"
        ))));
    }

    let mut writer = Writer::new(Vec::new());

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(write_error)?;

    let mut entry = BytesStart::new("entry");
    entry.push_attribute(("xmlns", ATOM_NS));
    entry.push_attribute(("xmlns:d", DATA_NS));
    entry.push_attribute(("xmlns:m", METADATA_NS));
    writer.write_event(Event::Start(entry)).map_err(write_error)?;

    let mut content = BytesStart::new("content");
    content.push_attribute(("type", "application/xml"));
    writer.write_event(Event::Start(content)).map_err(write_error)?;
    writer
        .write_event(Event::Start(BytesStart::new("m:properties")))
        .map_err(write_error)?;

    for (name, value) in fields {
        let element = format!("d:{name}");
        match value.to_wire_string() {
            Some(text) => {
                writer
                    .write_event(Event::Start(BytesStart::new(element.as_str())))
                    .map_err(write_error)?;
                writer
                    .write_event(Event::Text(BytesText::new(&scrub_xml_text(&text))))
                    .map_err(write_error)?;
                writer
                    .write_event(Event::End(BytesEnd::new(element.as_str())))
                    .map_err(write_error)?;
            }
            None if kind == EntryKind::Update => {
                let mut empty = BytesStart::new(element.as_str());
                empty.push_attribute(("m:null", "true"));
                writer.write_event(Event::Empty(empty)).map_err(write_error)?;
            }
            None => {}
        }
    }

    writer
        .write_event(Event::End(BytesEnd::new("m:properties")))
        .map_err(write_error)?;
    writer
        .write_event(Event::End(BytesEnd::new("content")))
        .map_err(write_error)?;
    writer
        .write_event(Event::End(BytesEnd::new("entry")))
        .map_err(write_error)?;

    String::from_utf8(writer.into_inner())
        .map_err(|e| Error::with_source(ErrorKind::Other("entry is not UTF-8".to_string()), e))
}

fn write_error(err: impl std::fmt::Display) -> Error {
    Error::new(ErrorKind::Other(format!("Error in writing XML: {err}")))
}
