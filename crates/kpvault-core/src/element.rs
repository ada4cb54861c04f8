//! Shared capability for entities backed by a tree node.
//!
//! [`BaseElement`] carries everything Entry and Group have in common:
//! identity, UUID, generic field access, and path resolution. It never
//! owns the tree; implementors hold a handle into a tree owned by the
//! session for its lifetime.

use uuid::Uuid;

use crate::factory;
use crate::xml::XmlNode;

/// Identity, generic field access, and path resolution for one node of
/// the database tree.
pub trait BaseElement {
    /// The backing tree node.
    fn element(&self) -> &XmlNode;

    /// Display name used in paths. Entries alias their title; groups use
    /// their Name child.
    fn name(&self) -> Option<String>;

    fn set_name(&self, value: &str);

    /// UUID read from the fixed UUID sub-field. Immutable after
    /// creation; there is no setter.
    fn uuid(&self) -> Option<Uuid> {
        self.element()
            .child_text("UUID")
            .and_then(|text| factory::decode_uuid(&text))
    }

    /// Value of the first String sub-field whose Key matches exactly.
    fn string_field(&self, key: &str) -> Option<String> {
        string_field_of(self.element(), key)
    }

    /// Overwrite the first matching String sub-field in place, keeping
    /// its position among the siblings; append a fresh field when no
    /// match exists.
    fn set_string_field(&self, key: &str, value: &str) {
        match find_string_field(self.element(), key) {
            Some(field) => match field.child("Value") {
                Some(v) => v.set_text(value),
                None => field.append_child(XmlNode::with_text("Value", value)),
            },
            None => {
                tracing::debug!(key, "no field with this key, creating it");
                self.element().append_child(factory::string_field(key, value));
            }
        }
    }

    /// Text of the first direct child with the given tag name.
    fn subelement_text(&self, name: &str) -> Option<String> {
        self.element().child_text(name)
    }

    /// Overwrite the first matching child's text in place; append a
    /// fresh element when no match exists.
    fn set_subelement_text(&self, name: &str, value: &str) {
        match self.element().child(name) {
            Some(child) => child.set_text(value),
            None => self.element().append_child(XmlNode::with_text(name, value)),
        }
    }

    /// Names from the oldest ancestor group down to this node itself.
    ///
    /// Recomputed on every call; the tree may have been reparented since
    /// the last one. The root group and detached nodes yield the empty
    /// path.
    fn path(&self) -> Vec<String> {
        node_path(self.element())
    }

    /// Structural parent node. Navigation only; no ownership implied.
    fn parent_element(&self) -> Option<XmlNode> {
        self.element().parent()
    }

    /// Identity comparison: true iff both views wrap the same node.
    fn same_element<E: BaseElement + ?Sized>(&self, other: &E) -> bool {
        self.element().same_node(other.element())
    }
}

pub(crate) fn find_string_field(node: &XmlNode, key: &str) -> Option<XmlNode> {
    node.children_named("String")
        .into_iter()
        .find(|field| field.child_text("Key").as_deref() == Some(key))
}

pub(crate) fn string_field_of(node: &XmlNode, key: &str) -> Option<String> {
    find_string_field(node, key).and_then(|field| field.child_text("Value"))
}

fn display_name(node: &XmlNode) -> Option<String> {
    match node.name().as_str() {
        "Group" => node.child_text("Name"),
        "Entry" => string_field_of(node, "Title"),
        _ => None,
    }
}

/// Walk the parent chain while the parent is a Group, collecting display
/// names. The top-level group is never part of a path, so its own path
/// is empty, as is the path of any node outside the group tree.
pub(crate) fn node_path(node: &XmlNode) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = node.clone();
    while let Some(parent) = current.parent() {
        if parent.name() != "Group" {
            break;
        }
        segments.push(display_name(&current).unwrap_or_default());
        current = parent;
    }
    segments.reverse();
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;

    struct View(XmlNode);

    impl BaseElement for View {
        fn element(&self) -> &XmlNode {
            &self.0
        }
        fn name(&self) -> Option<String> {
            self.0.child_text("Name")
        }
        fn set_name(&self, value: &str) {
            self.set_subelement_text("Name", value);
        }
    }

    fn entry_with_fields() -> XmlNode {
        parse_document(
            "<Entry>\
             <String><Key>Title</Key><Value>GMail</Value></String>\
             <String><Key>UserName</Key><Value>jdoe</Value></String>\
             </Entry>",
        )
        .unwrap()
    }

    #[test]
    fn string_field_lookup_is_exact() {
        let view = View(entry_with_fields());
        assert_eq!(view.string_field("Title").as_deref(), Some("GMail"));
        assert_eq!(view.string_field("title"), None);
        assert_eq!(view.string_field("URL"), None);
    }

    #[test]
    fn set_string_field_updates_in_place() {
        let view = View(entry_with_fields());
        view.set_string_field("Title", "Mail");
        assert_eq!(view.string_field("Title").as_deref(), Some("Mail"));
        // Still the first child; the update did not move the field.
        let first = view.element().children()[0].clone();
        assert_eq!(first.child_text("Key").as_deref(), Some("Title"));
    }

    #[test]
    fn set_string_field_is_idempotent_on_child_count() {
        let view = View(entry_with_fields());
        view.set_string_field("URL", "https://example.com");
        let count = view.element().child_count();
        view.set_string_field("URL", "https://example.com");
        assert_eq!(view.element().child_count(), count);
    }

    #[test]
    fn duplicate_keys_use_first_match() {
        let node = parse_document(
            "<Entry>\
             <String><Key>X</Key><Value>first</Value></String>\
             <String><Key>X</Key><Value>second</Value></String>\
             </Entry>",
        )
        .unwrap();
        let view = View(node);
        assert_eq!(view.string_field("X").as_deref(), Some("first"));
        view.set_string_field("X", "updated");
        assert_eq!(view.string_field("X").as_deref(), Some("updated"));
        let fields = view.element().children_named("String");
        assert_eq!(fields[1].child_text("Value").as_deref(), Some("second"));
    }

    #[test]
    fn path_walks_ancestor_groups() {
        let doc = parse_document(
            "<Root><Group><Name>Top</Name>\
             <Group><Name>Mail</Name>\
             <Entry><String><Key>Title</Key><Value>GMail</Value></String></Entry>\
             </Group></Group></Root>",
        )
        .unwrap();
        let top = doc.child("Group").unwrap();
        let mail = top.child("Group").unwrap();
        let entry = mail.child("Entry").unwrap();

        assert_eq!(node_path(&top), Vec::<String>::new());
        assert_eq!(node_path(&mail), vec!["Mail"]);
        assert_eq!(node_path(&entry), vec!["Mail", "GMail"]);
    }

    #[test]
    fn path_of_detached_node_is_empty() {
        let view = View(entry_with_fields());
        assert!(view.path().is_empty());
    }

    #[test]
    fn identity_equality_across_views() {
        let node = entry_with_fields();
        let a = View(node.clone());
        let b = View(node);
        assert!(a.same_element(&b));
        assert!(!a.same_element(&View(entry_with_fields())));
    }
}
