//! Object model over the decoded XML tree of a KeePass-style database.
//!
//! Entries and groups are live views onto a shared mutable tree: reading
//! and writing typed fields (title, username, password, tags, timestamps,
//! history) mutates the tree in place while preserving document structure.
//! The encrypted container is behind the [`session::VaultCodec`] boundary;
//! this crate never touches key derivation or the binary file layout.
//!
//! The tree is single-threaded by construction. Hosts that share a
//! session across threads must serialize access with an external lock.

pub mod element;
pub mod entry;
pub mod error;
pub mod factory;
pub mod group;
pub mod session;
pub mod xml;

pub use element::BaseElement;
pub use entry::{Entry, NewEntry, TagList};
pub use error::{Result, VaultError};
pub use group::Group;
pub use session::{PlainXmlCodec, VaultCodec, VaultKey, VaultSession};
pub use xml::XmlNode;
