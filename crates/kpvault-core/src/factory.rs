//! Builders for the canonical sub-trees of a database document.
//!
//! Everything that creates well-formed field structure lives here: string
//! fields, UUIDs, Times blocks, and the timestamp and UUID encodings the
//! stored format uses. Entities never assemble raw elements themselves.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::xml::XmlNode;

/// Format an instant the way the stored format expects: RFC 3339 with a
/// `Z` suffix at second precision.
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a stored timestamp. Returns `None` for unparseable text.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Encode a UUID the way the stored format expects: base64 over the 16
/// raw bytes.
pub fn encode_uuid(uuid: Uuid) -> String {
    BASE64.encode(uuid.as_bytes())
}

/// Decode a stored UUID. Returns `None` for text that is not base64 or
/// not 16 bytes long.
pub fn decode_uuid(text: &str) -> Option<Uuid> {
    let bytes = BASE64.decode(text.trim()).ok()?;
    Uuid::from_slice(&bytes).ok()
}

/// A `String` field: `<String><Key>k</Key><Value>v</Value></String>`.
pub fn string_field(key: &str, value: &str) -> XmlNode {
    let field = XmlNode::new("String");
    field.append_child(XmlNode::with_text("Key", key));
    field.append_child(XmlNode::with_text("Value", value));
    field
}

pub fn title(text: Option<&str>) -> XmlNode {
    string_field("Title", text.unwrap_or_default())
}

pub fn username(text: Option<&str>) -> XmlNode {
    string_field("UserName", text.unwrap_or_default())
}

/// Password field; the Value is marked memory-protected as the stored
/// format does for credentials.
pub fn password(text: Option<&str>) -> XmlNode {
    let field = string_field("Password", text.unwrap_or_default());
    if let Some(value) = field.child("Value") {
        value.set_attribute("Protected", "True");
    }
    field
}

pub fn url(text: &str) -> XmlNode {
    string_field("URL", text)
}

pub fn notes(text: &str) -> XmlNode {
    string_field("Notes", text)
}

pub fn tags(text: &str) -> XmlNode {
    XmlNode::with_text("Tags", text)
}

pub fn icon(id: &str) -> XmlNode {
    XmlNode::with_text("IconID", id)
}

/// A fresh `<UUID>` element. Every call generates a new v4 UUID.
pub fn uuid() -> XmlNode {
    XmlNode::with_text("UUID", encode_uuid(Uuid::new_v4()))
}

/// A full Times block stamped with the current instant.
///
/// ExpiryTime defaults to the creation instant when no expiry is given,
/// which is what the stored format does for non-expiring records.
pub fn times(expires: bool, expiry_time: Option<DateTime<Utc>>) -> XmlNode {
    let now = format_timestamp(Utc::now());
    let expiry = expiry_time.map(format_timestamp).unwrap_or_else(|| now.clone());

    let times = XmlNode::new("Times");
    times.append_child(XmlNode::with_text("CreationTime", now.clone()));
    times.append_child(XmlNode::with_text("LastModificationTime", now.clone()));
    times.append_child(XmlNode::with_text("LastAccessTime", now.clone()));
    times.append_child(XmlNode::with_text("ExpiryTime", expiry));
    times.append_child(XmlNode::with_text(
        "Expires",
        if expires { "True" } else { "False" },
    ));
    times.append_child(XmlNode::with_text("UsageCount", "0"));
    times.append_child(XmlNode::with_text("LocationChanged", now));
    times
}

/// Skeleton for a fresh group: Name, UUID and Times.
pub fn group(name: &str) -> XmlNode {
    let group = XmlNode::new("Group");
    group.append_child(XmlNode::with_text("Name", name));
    group.append_child(uuid());
    group.append_child(times(false, None));
    group
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_round_trip() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 9, 17, 5, 44).unwrap();
        let text = format_timestamp(instant);
        assert_eq!(text, "2024-03-09T17:05:44Z");
        assert_eq!(parse_timestamp(&text), Some(instant));
    }

    #[test]
    fn timestamp_parse_rejects_garbage() {
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn uuid_round_trip() {
        let id = Uuid::new_v4();
        assert_eq!(decode_uuid(&encode_uuid(id)), Some(id));
        assert_eq!(decode_uuid("@@@"), None);
        // Wrong length.
        assert_eq!(decode_uuid(&BASE64.encode(b"short")), None);
    }

    #[test]
    fn uuid_elements_are_unique() {
        assert_ne!(uuid().text(), uuid().text());
    }

    #[test]
    fn string_field_shape() {
        let field = string_field("Custom", "v");
        assert_eq!(field.name(), "String");
        assert_eq!(field.child_text("Key").as_deref(), Some("Custom"));
        assert_eq!(field.child_text("Value").as_deref(), Some("v"));
    }

    #[test]
    fn password_value_is_protected() {
        let field = password(Some("s3cr3t"));
        let value = field.child("Value").unwrap();
        assert_eq!(value.attribute("Protected").as_deref(), Some("True"));
        assert_eq!(value.text().as_deref(), Some("s3cr3t"));
    }

    #[test]
    fn times_block_is_complete() {
        let block = times(true, None);
        for name in [
            "CreationTime",
            "LastModificationTime",
            "LastAccessTime",
            "ExpiryTime",
            "Expires",
            "UsageCount",
            "LocationChanged",
        ] {
            assert!(block.child(name).is_some(), "missing {name}");
        }
        assert_eq!(block.child_text("Expires").as_deref(), Some("True"));
        assert!(parse_timestamp(&block.child_text("CreationTime").unwrap()).is_some());
    }
}
