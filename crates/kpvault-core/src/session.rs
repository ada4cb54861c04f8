//! Vault session: ownership of the decoded document and persistence.
//!
//! The session owns the tree for its lifetime; entries and groups handed
//! out are views into it. The encrypted container stays behind
//! [`VaultCodec`], so everything above this boundary works on the plain
//! decoded document.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::element::BaseElement;
use crate::entry::{Entry, NewEntry};
use crate::error::VaultError;
use crate::factory;
use crate::group::Group;
use crate::xml::{self, XmlNode};

/// Credential material used to unlock the container codec. The field
/// logic above the codec never looks at it.
#[derive(Debug, Clone, Default)]
pub struct VaultKey {
    password: Option<String>,
    keyfile: Option<PathBuf>,
}

impl VaultKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    pub fn with_keyfile(mut self, path: impl Into<PathBuf>) -> Self {
        self.keyfile = Some(path.into());
        self
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn keyfile(&self) -> Option<&Path> {
        self.keyfile.as_deref()
    }
}

/// Container boundary: turns stored bytes into a decoded document tree
/// and back. Implementations own headers, key derivation and
/// compression; the object model never sees them.
pub trait VaultCodec {
    fn decode(&self, data: &[u8], key: &VaultKey) -> crate::error::Result<XmlNode>;
    fn encode(&self, document: &XmlNode, key: &VaultKey) -> crate::error::Result<Vec<u8>>;
}

/// Codec for databases stored as plain (already decoded) XML payloads.
/// Ignores the key material.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainXmlCodec;

impl VaultCodec for PlainXmlCodec {
    fn decode(&self, data: &[u8], _key: &VaultKey) -> crate::error::Result<XmlNode> {
        let text = std::str::from_utf8(data).map_err(|e| VaultError::Xml(e.to_string()))?;
        xml::parse_document(text)
    }

    fn encode(&self, document: &XmlNode, _key: &VaultKey) -> crate::error::Result<Vec<u8>> {
        xml::write_document(document).map(String::into_bytes)
    }
}

/// An open database: decoded document, credentials, and persistence.
pub struct VaultSession {
    document: XmlNode,
    root: XmlNode,
    path: PathBuf,
    key: VaultKey,
    codec: Box<dyn VaultCodec>,
}

impl std::fmt::Debug for VaultSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSession")
            .field("document", &self.document)
            .field("root", &self.root)
            .field("path", &self.path)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl VaultSession {
    /// Open and decode a database file.
    pub fn unlock(
        path: impl AsRef<Path>,
        key: VaultKey,
        codec: impl VaultCodec + 'static,
    ) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)
            .with_context(|| format!("Failed to read database: {}", path.display()))?;
        let document = codec
            .decode(&data, &key)
            .with_context(|| format!("Failed to decode database: {}", path.display()))?;
        let root = validate_document(&document)?;
        tracing::info!(path = %path.display(), "unlocked database");

        Ok(Self {
            document,
            root,
            path: path.to_path_buf(),
            key,
            codec: Box::new(codec),
        })
    }

    /// Start a fresh database with an empty root group. Nothing is
    /// written until [`VaultSession::save`].
    pub fn create(
        path: impl AsRef<Path>,
        key: VaultKey,
        codec: impl VaultCodec + 'static,
    ) -> Self {
        let document = XmlNode::new("KeePassFile");
        let root_holder = XmlNode::new("Root");
        let root = factory::group("Root");
        root_holder.append_child(root.clone());
        document.append_child(root_holder);

        Self {
            document,
            root,
            path: path.as_ref().to_path_buf(),
            key,
            codec: Box::new(codec),
        }
    }

    /// The database's top-level group.
    pub fn root_group(&self) -> Group {
        Group::wrap(self.root.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve a `/`-separated group path from the root. The empty path
    /// resolves to the root group itself.
    pub fn find_group_by_path(&self, path: &str) -> Option<Group> {
        let mut group = self.root_group();
        for name in path.split('/').filter(|s| !s.is_empty()) {
            group = group.find_group(name)?;
        }
        Some(group)
    }

    /// Create an entry in the group at `group_path`. A duplicate title
    /// in that group is an error unless `force` is set, in which case
    /// the new entry is created alongside the old one.
    pub fn add_entry(&self, group_path: &str, fields: NewEntry, force: bool) -> Result<Entry> {
        let group = self
            .find_group_by_path(group_path)
            .ok_or_else(|| VaultError::GroupNotFound(group_path.to_string()))?;

        let title = fields.title.clone().unwrap_or_default();
        if !force && group.find_entry_by_title(&title).is_some() {
            return Err(VaultError::DuplicateEntry {
                title,
                group: group.name().unwrap_or_default(),
            }
            .into());
        }

        let entry = Entry::create(fields);
        group.add_entry(&entry);
        tracing::info!(title = %title, group_path, "added entry");
        Ok(entry)
    }

    /// Save in place.
    pub fn save(&self) -> Result<()> {
        self.save_to(self.path.clone())
    }

    /// Encode and write the document to `path`, atomically: the payload
    /// goes to a temporary file in the destination directory first and
    /// is persisted over the target in one rename.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = self
            .codec
            .encode(&self.document, &self.key)
            .context("Failed to encode database")?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
        tmp.write_all(&data)
            .context("Failed to write database payload")?;
        tmp.persist(path)
            .with_context(|| format!("Failed to save database: {}", path.display()))?;

        tracing::info!(path = %path.display(), "saved database");
        Ok(())
    }
}

fn validate_document(document: &XmlNode) -> crate::error::Result<XmlNode> {
    if document.name() != "KeePassFile" {
        return Err(VaultError::MalformedDocument(format!(
            "expected KeePassFile, found {}",
            document.name()
        )));
    }
    document
        .child("Root")
        .and_then(|root| root.child("Group"))
        .ok_or_else(|| VaultError::MalformedDocument("missing Root/Group".into()))
}
