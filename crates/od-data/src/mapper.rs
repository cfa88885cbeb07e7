//! Atom entry → field map.
//!
//! Property values are kept as text. Typed nulls (`Edm.Guid` all zeros,
//! `Edm.DateTime` min date) and empty values are left out of the map, and
//! `Edm.Boolean` values become `"1"` / `"0"`.
//!
//! Expanded relations arrive as `<link><m:inline><entry>` children. Their
//! fields are flattened into the parent map as
//! `<linkTitle>__<field>`; they are written after the entry's own
//! properties, so a flattened key wins over a colliding base key.

use std::collections::BTreeMap;

use bpm_odata_client::XmlElement;

use crate::record::FieldValue;

/// Separator between a link title and a nested field name.
pub const NESTED_FIELD_SEPARATOR: &str = "__";

const EMPTY_GUID: &str = "00000000-0000-0000-0000-000000000000";
const MIN_DATE_TIME: &str = "0001-01-01T00:00:00";

/// Map the properties of an entry, including expanded nested entries.
pub fn entry_fields(entry: &XmlElement) -> BTreeMap<String, FieldValue> {
    let mut fields = BTreeMap::new();

    for content in entry.children_named("content") {
        let Some(properties) = content.child("properties") else {
            continue;
        };
        for property in properties.children() {
            if let Some(value) = property_value(property) {
                fields.insert(property.local_name().to_string(), FieldValue::Text(value));
            }
        }
    }

    for link in entry.children_named("link") {
        let Some(inline) = link.child("inline") else {
            continue;
        };
        let title = link.attr("title").unwrap_or_default();
        for nested in inline.children_named("entry") {
            for (name, value) in entry_fields(nested) {
                fields.insert(format!("{title}{NESTED_FIELD_SEPARATOR}{name}"), value);
            }
        }
    }

    fields
}

fn property_value(property: &XmlElement) -> Option<String> {
    let text = property.inner_text();
    if text.is_empty() {
        return None;
    }

    match property.attr("type") {
        Some("Edm.Guid") if text == EMPTY_GUID => None,
        Some("Edm.DateTime") if text == MIN_DATE_TIME => None,
        Some("Edm.Boolean") => Some(match text.as_str() {
            "true" => "1".to_string(),
            "false" => "0".to_string(),
            _ => text,
        }),
        _ => Some(text),
    }
}

/// Href of the entry's binary payload link, if it has one.
///
/// The payload link is titled `data` and its `rel` ends with `edit-media/data`.
pub fn data_link(entry: &XmlElement) -> Option<&str> {
    entry
        .children_named("link")
        .find(|link| {
            link.attr("title")
                .is_some_and(|t| t.eq_ignore_ascii_case("data"))
                && link
                    .attr("rel")
                    .is_some_and(|r| r.to_ascii_lowercase().ends_with("edit-media/data"))
        })
        .and_then(|link| link.attr("href"))
}
