//! Mutable XML tree with parent navigation.
//!
//! The tree is shared: [`XmlNode`] is a cheap handle and any number of
//! handles may point at the same node. Mutation through one handle is
//! immediately visible through every other handle into the same tree.
//! Handles are single-threaded (`Rc`); callers embedding the tree in a
//! multi-threaded host must serialize access externally.

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Result, VaultError};

struct NodeData {
    name: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<XmlNode>,
    parent: Weak<RefCell<NodeData>>,
}

/// Handle to one element of a mutable XML tree.
///
/// Equality and hashing are identity-based: two handles compare equal iff
/// they point at the same underlying node, regardless of content.
#[derive(Clone)]
pub struct XmlNode {
    data: Rc<RefCell<NodeData>>,
}

impl XmlNode {
    /// Create a detached element with the given tag name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            data: Rc::new(RefCell::new(NodeData {
                name: name.into(),
                attributes: Vec::new(),
                text: None,
                children: Vec::new(),
                parent: Weak::new(),
            })),
        }
    }

    /// Create a detached element carrying text content.
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let node = Self::new(name);
        node.set_text(text);
        node
    }

    pub fn name(&self) -> String {
        self.data.borrow().name.clone()
    }

    pub fn text(&self) -> Option<String> {
        self.data.borrow().text.clone()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        self.data.borrow_mut().text = Some(text.into());
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.data
            .borrow()
            .attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    /// Set an attribute, replacing an existing one with the same name.
    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        let mut data = self.data.borrow_mut();
        if let Some(attr) = data.attributes.iter_mut().find(|(k, _)| *k == name) {
            attr.1 = value;
        } else {
            data.attributes.push((name, value));
        }
    }

    pub fn attributes(&self) -> Vec<(String, String)> {
        self.data.borrow().attributes.clone()
    }

    /// Snapshot of the current children, in document order.
    pub fn children(&self) -> Vec<XmlNode> {
        self.data.borrow().children.clone()
    }

    pub fn child_count(&self) -> usize {
        self.data.borrow().children.len()
    }

    /// First child with the given tag name. Matching is exact and
    /// case-sensitive.
    pub fn child(&self, name: &str) -> Option<XmlNode> {
        self.data
            .borrow()
            .children
            .iter()
            .find(|c| c.data.borrow().name == name)
            .cloned()
    }

    /// All children with the given tag name, in document order.
    pub fn children_named(&self, name: &str) -> Vec<XmlNode> {
        self.data
            .borrow()
            .children
            .iter()
            .filter(|c| c.data.borrow().name == name)
            .cloned()
            .collect()
    }

    /// Text of the first child with the given tag name.
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).and_then(|c| c.text())
    }

    /// Append a child at the end, re-parenting it. A child already
    /// attached elsewhere is detached from its old parent first.
    pub fn append_child(&self, child: XmlNode) {
        child.detach();
        child.data.borrow_mut().parent = Rc::downgrade(&self.data);
        self.data.borrow_mut().children.push(child);
    }

    /// Remove a child by identity. Returns false when the node is not a
    /// child of this element.
    pub fn remove_child(&self, child: &XmlNode) -> bool {
        let mut data = self.data.borrow_mut();
        let before = data.children.len();
        data.children.retain(|c| !Rc::ptr_eq(&c.data, &child.data));
        if data.children.len() < before {
            child.data.borrow_mut().parent = Weak::new();
            true
        } else {
            false
        }
    }

    /// Detach this node from its parent, if it has one.
    pub fn detach(&self) {
        if let Some(parent) = self.parent() {
            parent.remove_child(self);
        }
    }

    /// Structural parent, or `None` for a detached node or the document
    /// root.
    pub fn parent(&self) -> Option<XmlNode> {
        self.data
            .borrow()
            .parent
            .upgrade()
            .map(|data| XmlNode { data })
    }

    /// Recursive copy of this node and its subtree. The copy is detached:
    /// it has no parent and shares no storage with the original.
    pub fn deep_copy(&self) -> XmlNode {
        let copy = XmlNode::new(self.name());
        {
            let mut data = copy.data.borrow_mut();
            let src = self.data.borrow();
            data.attributes = src.attributes.clone();
            data.text = src.text.clone();
        }
        for child in self.children() {
            copy.append_child(child.deep_copy());
        }
        copy
    }

    /// Identity comparison: true iff both handles point at the same node.
    pub fn same_node(&self, other: &XmlNode) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

impl PartialEq for XmlNode {
    fn eq(&self, other: &Self) -> bool {
        self.same_node(other)
    }
}

impl Eq for XmlNode {}

impl Hash for XmlNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.data) as usize).hash(state);
    }
}

impl fmt::Debug for XmlNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data.borrow();
        f.debug_struct("XmlNode")
            .field("name", &data.name)
            .field("text", &data.text)
            .field("children", &data.children.len())
            .finish()
    }
}

/// Parse an XML document, returning its root element.
pub fn parse_document(xml: &str) -> Result<XmlNode> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut root: Option<XmlNode> = None;
    let mut stack: Vec<XmlNode> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let node = node_from_tag(e)?;
                attach(&mut root, &stack, &node)?;
                stack.push(node);
            }
            Ok(Event::Empty(ref e)) => {
                let node = node_from_tag(e)?;
                attach(&mut root, &stack, &node)?;
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| VaultError::Xml(e.to_string()))?
                    .into_owned();
                if let Some(top) = stack.last() {
                    top.set_text(text);
                }
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                if let Some(top) = stack.last() {
                    top.set_text(text);
                }
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(VaultError::Xml(format!(
                    "parse error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    root.ok_or_else(|| VaultError::Xml("document has no root element".into()))
}

fn node_from_tag(e: &BytesStart<'_>) -> Result<XmlNode> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let node = XmlNode::new(name);
    for attr in e.attributes() {
        let attr = attr.map_err(|e| VaultError::Xml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| VaultError::Xml(e.to_string()))?
            .into_owned();
        node.set_attribute(key, value);
    }
    Ok(node)
}

fn attach(root: &mut Option<XmlNode>, stack: &[XmlNode], node: &XmlNode) -> Result<()> {
    match stack.last() {
        Some(parent) => parent.append_child(node.clone()),
        None => {
            if root.is_some() {
                return Err(VaultError::Xml("multiple root elements".into()));
            }
            *root = Some(node.clone());
        }
    }
    Ok(())
}

/// Serialize a tree to an XML document string with a declaration and
/// tab indentation.
pub fn write_document(root: &XmlNode) -> Result<String> {
    let mut writer = Writer::new_with_indent(std::io::Cursor::new(Vec::new()), b'\t', 1);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(|e| VaultError::Xml(e.to_string()))?;
    write_node(&mut writer, root)?;

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| VaultError::Xml(e.to_string()))
}

fn write_node<W: std::io::Write>(writer: &mut Writer<W>, node: &XmlNode) -> Result<()> {
    let name = node.name();
    let mut start = BytesStart::new(name.clone());
    for (key, value) in node.attributes() {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    let text = node.text();
    let children = node.children();

    if text.is_none() && children.is_empty() {
        writer
            .write_event(Event::Empty(start))
            .map_err(|e| VaultError::Xml(e.to_string()))?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| VaultError::Xml(e.to_string()))?;
    if let Some(text) = text {
        if !text.is_empty() {
            writer
                .write_event(Event::Text(BytesText::new(&text)))
                .map_err(|e| VaultError::Xml(e.to_string()))?;
        }
    }
    for child in &children {
        write_node(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(|e| VaultError::Xml(e.to_string()))?;
    Ok(())
}
