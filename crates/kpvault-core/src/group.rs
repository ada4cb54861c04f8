//! Group: a container node holding entries and nested groups.

use std::fmt;

use crate::element::BaseElement;
use crate::entry::Entry;
use crate::factory;
use crate::xml::XmlNode;

/// One group of the database tree, viewed over its node. Like entries,
/// groups are live views; child lists are snapshots of the current tree
/// state.
#[derive(Debug, Clone)]
pub struct Group {
    element: XmlNode,
}

impl BaseElement for Group {
    fn element(&self) -> &XmlNode {
        &self.element
    }

    fn name(&self) -> Option<String> {
        self.element.child_text("Name")
    }

    fn set_name(&self, value: &str) {
        self.set_subelement_text("Name", value);
    }
}

impl Group {
    /// View an existing Group node.
    pub fn wrap(element: XmlNode) -> Self {
        Self { element }
    }

    /// Build a fresh, unattached group with the given name.
    pub fn create(name: &str) -> Self {
        Self {
            element: factory::group(name),
        }
    }

    /// Direct child entries, in document order.
    pub fn entries(&self) -> Vec<Entry> {
        self.element
            .children_named("Entry")
            .into_iter()
            .map(Entry::wrap)
            .collect()
    }

    /// Direct child groups, in document order.
    pub fn groups(&self) -> Vec<Group> {
        self.element
            .children_named("Group")
            .into_iter()
            .map(Group::wrap)
            .collect()
    }

    /// Attach an entry at the end of this group's children.
    pub fn add_entry(&self, entry: &Entry) {
        self.element.append_child(entry.element().clone());
    }

    /// Attach a subgroup at the end of this group's children.
    pub fn add_group(&self, group: &Group) {
        self.element.append_child(group.element().clone());
    }

    /// Detach an entry from this group. Returns false when the entry is
    /// not a child of this group.
    pub fn remove_entry(&self, entry: &Entry) -> bool {
        self.element.remove_child(entry.element())
    }

    /// First direct subgroup with the given name.
    pub fn find_group(&self, name: &str) -> Option<Group> {
        self.groups().into_iter().find(|g| g.name().as_deref() == Some(name))
    }

    /// First direct entry with the given title.
    pub fn find_entry_by_title(&self, title: &str) -> Option<Entry> {
        self.entries()
            .into_iter()
            .find(|e| e.title().as_deref() == Some(title))
    }

    /// Transient view of the parent group, when this group is nested.
    pub fn parent_group(&self) -> Option<Group> {
        self.element
            .parent()
            .filter(|p| p.name() == "Group")
            .map(Group::wrap)
    }
}

/// Groups compare by identity: two views are equal iff they wrap the
/// same node.
impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        self.same_element(other)
    }
}

impl Eq for Group {}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Group {} at {}",
            self.name().unwrap_or_default(),
            self.path().join("/")
        )
    }
}
