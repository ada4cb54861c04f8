//! End-to-end round trips through the session and the plain XML codec.

use kpvault_core::{
    BaseElement, Entry, Group, NewEntry, PlainXmlCodec, VaultKey, VaultSession,
};

fn new_session(path: &std::path::Path) -> VaultSession {
    VaultSession::create(path, VaultKey::new().with_password("master"), PlainXmlCodec)
}

#[test]
fn save_and_reopen_preserves_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault.xml");

    let session = new_session(&path);
    session.root_group().add_group(&Group::create("Internet"));
    let entry = session
        .add_entry(
            "Internet",
            NewEntry {
                title: Some("GMail".into()),
                username: Some("jdoe".into()),
                password: Some("s3cr3t".into()),
                url: Some("https://mail.google.com".into()),
                tags: Some(vec!["email".into(), "work".into()]),
                ..Default::default()
            },
            false,
        )
        .unwrap();
    let uuid = entry.uuid().unwrap();
    session.save().unwrap();

    let reopened = VaultSession::unlock(&path, VaultKey::new(), PlainXmlCodec).unwrap();
    let group = reopened.find_group_by_path("Internet").unwrap();
    let entry = group.find_entry_by_title("GMail").unwrap();

    assert_eq!(entry.username().as_deref(), Some("jdoe"));
    assert_eq!(entry.password().as_deref(), Some("s3cr3t"));
    assert_eq!(entry.url().as_deref(), Some("https://mail.google.com"));
    assert_eq!(
        entry.tags(),
        Some(vec!["email".to_string(), "work".to_string()])
    );
    assert_eq!(entry.uuid(), Some(uuid));
    assert_eq!(entry.path(), vec!["Internet", "GMail"]);
    assert!(entry.ctime().is_some());
}

#[test]
fn history_survives_save_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault.xml");

    let session = new_session(&path);
    let entry = session
        .add_entry(
            "",
            NewEntry {
                title: Some("Router".into()),
                password: Some("first".into()),
                ..Default::default()
            },
            false,
        )
        .unwrap();
    entry.save_history();
    entry.set_password("second");
    entry.save_history();
    session.save().unwrap();

    let reopened = VaultSession::unlock(&path, VaultKey::new(), PlainXmlCodec).unwrap();
    let entry = reopened
        .root_group()
        .find_entry_by_title("Router")
        .unwrap();

    let history = entry.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].password().as_deref(), Some("first"));
    assert_eq!(history[1].password().as_deref(), Some("second"));
    assert!(history[0].history().is_empty());
    assert_eq!(entry.password().as_deref(), Some("second"));
}

#[test]
fn untouched_structure_is_stable_across_edits() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault.xml");

    let session = new_session(&path);
    let entry = session
        .add_entry(
            "",
            NewEntry {
                title: Some("Bank".into()),
                username: Some("alice".into()),
                ..Default::default()
            },
            false,
        )
        .unwrap();
    let field_count = entry.element().child_count();

    // In-place updates must not duplicate or reorder fields.
    entry.set_username("alice");
    entry.set_username("bob");
    assert_eq!(entry.element().child_count(), field_count);
    session.save().unwrap();

    let reopened = VaultSession::unlock(&path, VaultKey::new(), PlainXmlCodec).unwrap();
    let entry = reopened.root_group().find_entry_by_title("Bank").unwrap();
    assert_eq!(entry.element().child_count(), field_count);
    assert_eq!(entry.username().as_deref(), Some("bob"));
}

#[test]
fn views_alias_the_same_tree() {
    let dir = tempfile::tempdir().unwrap();
    let session = new_session(&dir.path().join("vault.xml"));
    session
        .add_entry(
            "",
            NewEntry {
                title: Some("Shared".into()),
                ..Default::default()
            },
            false,
        )
        .unwrap();

    let first = session.root_group().find_entry_by_title("Shared").unwrap();
    let second = session.root_group().find_entry_by_title("Shared").unwrap();
    first.set_notes("written through one view");

    assert!(first.same_element(&second));
    assert_eq!(
        second.notes().as_deref(),
        Some("written through one view")
    );
}

#[test]
fn archived_snapshot_is_a_navigable_entry() {
    let dir = tempfile::tempdir().unwrap();
    let session = new_session(&dir.path().join("vault.xml"));
    let entry = session
        .add_entry(
            "",
            NewEntry {
                title: Some("Wiki".into()),
                username: Some("editor".into()),
                tags: Some(vec!["docs".into()]),
                ..Default::default()
            },
            false,
        )
        .unwrap();
    entry.save_history();

    let snapshot: Entry = entry.history().remove(0);
    assert_eq!(snapshot.title().as_deref(), Some("Wiki"));
    assert_eq!(snapshot.username().as_deref(), Some("editor"));
    assert_eq!(snapshot.tags(), Some(vec!["docs".to_string()]));
    assert_eq!(snapshot, entry);
    assert!(!snapshot.same_element(&entry));
}
