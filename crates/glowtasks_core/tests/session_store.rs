use glowtasks_core::session::SqliteSessionPort;
use glowtasks_core::{SessionStore, Theme};
use rusqlite::Connection;

#[test]
fn identity_and_theme_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("glowtasks.sqlite3");

    let session = SessionStore::open(SqliteSessionPort::open(&path).unwrap()).unwrap();
    assert!(!session.is_signed_in());
    assert_eq!(session.theme(), Theme::Light);
    session.sign_in("  ada ").unwrap();
    assert_eq!(session.toggle_theme().unwrap(), Theme::Dark);
    drop(session);

    let session = SessionStore::open(SqliteSessionPort::open(&path).unwrap()).unwrap();
    assert_eq!(session.identity().as_deref(), Some("ada"));
    assert_eq!(session.theme(), Theme::Dark);
}

#[test]
fn sign_out_forgets_identity_but_keeps_theme() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("glowtasks.sqlite3");

    let session = SessionStore::open(SqliteSessionPort::open(&path).unwrap()).unwrap();
    session.sign_in("ada").unwrap();
    session.set_theme(Theme::Dark).unwrap();
    session.sign_out().unwrap();
    drop(session);

    let session = SessionStore::open(SqliteSessionPort::open(&path).unwrap()).unwrap();
    assert_eq!(session.identity(), None);
    assert_eq!(session.theme(), Theme::Dark);
}

#[test]
fn unknown_persisted_theme_falls_back_to_light() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("glowtasks.sqlite3");
    drop(SqliteSessionPort::open(&path).unwrap());

    let conn = Connection::open(&path).unwrap();
    conn.execute(
        "INSERT INTO preferences (key, value) VALUES ('ui.theme', 'sepia');",
        [],
    )
    .unwrap();
    drop(conn);

    let session = SessionStore::open(SqliteSessionPort::open(&path).unwrap()).unwrap();
    assert_eq!(session.theme(), Theme::Light);

    session.set_theme(Theme::Dark).unwrap();
    drop(session);
    let session = SessionStore::open(SqliteSessionPort::open(&path).unwrap()).unwrap();
    assert_eq!(session.theme(), Theme::Dark);
}

#[test]
fn rename_is_ignored_when_signed_out() {
    let session = SessionStore::open(SqliteSessionPort::in_memory().unwrap()).unwrap();

    session.rename("ghost").unwrap();

    assert!(!session.is_signed_in());
}
