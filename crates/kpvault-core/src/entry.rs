//! Entry: a credential record projected onto one tree node.
//!
//! An [`Entry`] is a live view, not a copy: it reads and writes the tree
//! through its node handle, and every other view of the same node sees
//! mutations immediately. Field reads are total over present/absent and
//! never fail, even on a node detached from its tree.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::element::BaseElement;
use crate::factory;
use crate::group::Group;
use crate::xml::XmlNode;

/// Field values for a fresh entry.
///
/// Everything is optional at this layer; missing title/username/password
/// become empty field values, not errors. Validation, if any, belongs to
/// the caller.
#[derive(Debug, Clone, Default)]
pub struct NewEntry {
    pub title: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub url: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub icon: Option<String>,
    pub expires: bool,
    pub expiry_time: Option<DateTime<Utc>>,
}

/// Ordered tag sequence accepted by [`Entry::set_tags`], convertible from
/// a single tag or any sequence of tags.
#[derive(Debug, Clone)]
pub struct TagList(Vec<String>);

impl TagList {
    fn joined(&self) -> String {
        self.0.join(";")
    }
}

impl From<&str> for TagList {
    fn from(tag: &str) -> Self {
        TagList(vec![tag.to_string()])
    }
}

impl From<String> for TagList {
    fn from(tag: String) -> Self {
        TagList(vec![tag])
    }
}

impl From<Vec<String>> for TagList {
    fn from(tags: Vec<String>) -> Self {
        TagList(tags)
    }
}

impl From<Vec<&str>> for TagList {
    fn from(tags: Vec<&str>) -> Self {
        TagList(tags.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for TagList {
    fn from(tags: &[&str]) -> Self {
        TagList(tags.iter().map(|t| t.to_string()).collect())
    }
}

/// One credential record, viewed over its tree node.
#[derive(Debug, Clone)]
pub struct Entry {
    element: XmlNode,
}

impl BaseElement for Entry {
    fn element(&self) -> &XmlNode {
        &self.element
    }

    // Name is an alias for the title, so entries and groups share the
    // same path machinery.
    fn name(&self) -> Option<String> {
        self.title()
    }

    fn set_name(&self, value: &str) {
        self.set_title(value);
    }
}

impl Entry {
    /// View an existing Entry node.
    pub fn wrap(element: XmlNode) -> Self {
        Self { element }
    }

    /// Build a fresh, unattached entry. Title, UUID, UserName, Password
    /// and the Times block are always present; url, notes, tags and icon
    /// only when a non-empty value was supplied. The caller attaches the
    /// result to a group.
    pub fn create(fields: NewEntry) -> Self {
        let element = XmlNode::new("Entry");

        if let Some(url) = fields.url.filter(|v| !v.is_empty()) {
            element.append_child(factory::url(&url));
        }
        if let Some(notes) = fields.notes.filter(|v| !v.is_empty()) {
            element.append_child(factory::notes(&notes));
        }
        if let Some(tags) = fields.tags.filter(|v| !v.is_empty()) {
            element.append_child(factory::tags(&tags.join(";")));
        }
        if let Some(icon) = fields.icon.filter(|v| !v.is_empty()) {
            element.append_child(factory::icon(&icon));
        }
        element.append_child(factory::title(fields.title.as_deref()));
        element.append_child(factory::uuid());
        element.append_child(factory::username(fields.username.as_deref()));
        element.append_child(factory::password(fields.password.as_deref()));
        element.append_child(factory::times(fields.expires, fields.expiry_time));

        Self { element }
    }

    pub fn title(&self) -> Option<String> {
        self.string_field("Title")
    }

    pub fn set_title(&self, value: &str) {
        self.set_string_field("Title", value);
    }

    pub fn username(&self) -> Option<String> {
        self.string_field("UserName")
    }

    pub fn set_username(&self, value: &str) {
        self.set_string_field("UserName", value);
    }

    pub fn password(&self) -> Option<String> {
        self.string_field("Password")
    }

    pub fn set_password(&self, value: &str) {
        self.set_string_field("Password", value);
    }

    pub fn url(&self) -> Option<String> {
        self.string_field("URL")
    }

    pub fn set_url(&self, value: &str) {
        self.set_string_field("URL", value);
    }

    pub fn notes(&self) -> Option<String> {
        self.string_field("Notes")
    }

    pub fn set_notes(&self, value: &str) {
        self.set_string_field("Notes", value);
    }

    pub fn icon(&self) -> Option<String> {
        self.subelement_text("IconID")
    }

    pub fn set_icon(&self, value: &str) {
        self.set_subelement_text("IconID", value);
    }

    /// Decoded tag list. Both an absent Tags field and a present-but-
    /// empty one mean "no tags"; the raw distinction stays observable
    /// through [`BaseElement::subelement_text`].
    pub fn tags(&self) -> Option<Vec<String>> {
        self.subelement_text("Tags")
            .filter(|stored| !stored.is_empty())
            .map(|stored| stored.split(';').map(str::to_string).collect())
    }

    /// Store tags as a single `;`-joined string. Accepts one tag or a
    /// sequence.
    pub fn set_tags(&self, tags: impl Into<TagList>) {
        self.set_subelement_text("Tags", &tags.into().joined());
    }

    fn times_text(&self, name: &str) -> Option<String> {
        self.element.child("Times").and_then(|t| t.child_text(name))
    }

    fn times_timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        self.times_text(name)
            .and_then(|text| factory::parse_timestamp(&text))
    }

    pub fn ctime(&self) -> Option<DateTime<Utc>> {
        self.times_timestamp("CreationTime")
    }

    pub fn atime(&self) -> Option<DateTime<Utc>> {
        self.times_timestamp("LastAccessTime")
    }

    pub fn mtime(&self) -> Option<DateTime<Utc>> {
        self.times_timestamp("LastModificationTime")
    }

    pub fn expiry_time(&self) -> Option<DateTime<Utc>> {
        self.times_timestamp("ExpiryTime")
    }

    pub fn expires(&self) -> Option<bool> {
        self.times_text("Expires").map(|v| v == "True")
    }

    /// Set the last-access time to the current instant; with `modify`,
    /// set the last-modification time to the same instant as well.
    pub fn touch(&self, modify: bool) {
        let stamp = factory::format_timestamp(Utc::now());
        let times = match self.element.child("Times") {
            Some(times) => times,
            None => {
                let times = XmlNode::new("Times");
                self.element.append_child(times.clone());
                times
            }
        };
        set_or_append(&times, "LastAccessTime", &stamp);
        if modify {
            set_or_append(&times, "LastModificationTime", &stamp);
        }
    }

    /// Archived snapshots, oldest first. Empty when the entry has no
    /// history. History grows only through [`Entry::save_history`];
    /// there is deliberately no way to assign it.
    pub fn history(&self) -> Vec<Entry> {
        self.element
            .child("History")
            .map(|h| {
                h.children_named("Entry")
                    .into_iter()
                    .map(Entry::wrap)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Snapshot the entry into its own history.
    ///
    /// The snapshot is a deep copy taken at call time with its own
    /// nested history stripped, so archived entries never carry history
    /// of their own. Current field values are left untouched.
    pub fn save_history(&self) {
        let archive = self.element.deep_copy();
        if let Some(nested) = archive.child("History") {
            archive.remove_child(&nested);
        }
        let history = match self.element.child("History") {
            Some(history) => history,
            None => {
                let history = XmlNode::new("History");
                self.element.append_child(history.clone());
                history
            }
        };
        history.append_child(archive);
    }

    /// Transient view of the owning group, when the entry is attached to
    /// one.
    pub fn parent_group(&self) -> Option<Group> {
        self.element
            .parent()
            .filter(|p| p.name() == "Group")
            .map(Group::wrap)
    }
}

fn set_or_append(parent: &XmlNode, name: &str, value: &str) {
    match parent.child(name) {
        Some(child) => child.set_text(value),
        None => parent.append_child(XmlNode::with_text(name, value)),
    }
}

/// Content equality over every typed field, the four timestamps, the
/// expiry flag and the UUID. Identity equality stays available through
/// [`BaseElement::same_element`].
impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.title() == other.title()
            && self.username() == other.username()
            && self.password() == other.password()
            && self.url() == other.url()
            && self.notes() == other.notes()
            && self.icon() == other.icon()
            && self.tags() == other.tags()
            && self.atime() == other.atime()
            && self.ctime() == other.ctime()
            && self.mtime() == other.mtime()
            && self.expiry_time() == other.expiry_time()
            && self.expires() == other.expires()
            && self.uuid() == other.uuid()
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Entry {}: {} at {}",
            self.title().unwrap_or_default(),
            self.username().unwrap_or_default(),
            self.path().join("/")
        )
    }
}
