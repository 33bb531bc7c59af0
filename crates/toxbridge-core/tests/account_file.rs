//! Account file import and export against a real filesystem.

#![allow(clippy::unwrap_used)]

use toxbridge_core::{
    AccountBlob, AccountError, MAX_ACCOUNT_DATA_SIZE, PublicKey,
    account::{read_account_file, suggested_export_name, write_account_file},
};

#[test]
fn written_file_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("me.tox");
    let blob = AccountBlob::new(b"account state".to_vec()).unwrap();

    write_account_file(&path, &blob).unwrap();
    assert_eq!(read_account_file(&path).unwrap(), blob);
}

#[cfg(unix)]
#[test]
fn written_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("me.tox");
    write_account_file(&path, &AccountBlob::new(vec![1]).unwrap()).unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn empty_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.tox");
    std::fs::write(&path, b"").unwrap();

    assert_eq!(read_account_file(&path), Err(AccountError::Empty));
}

#[test]
fn oversized_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.tox");
    std::fs::write(&path, vec![0u8; MAX_ACCOUNT_DATA_SIZE + 1]).unwrap();

    let err = read_account_file(&path).unwrap_err();
    assert!(matches!(err, AccountError::TooLarge { .. }), "{err:?}");
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_account_file(&dir.path().join("nope.tox")).unwrap_err();
    assert!(matches!(err, AccountError::Io { .. }), "{err:?}");
}

#[test]
fn export_name_is_key_with_extension() {
    let key = PublicKey::from_bytes([0x11; 32]);
    assert_eq!(suggested_export_name(&key), format!("{}.tox", "11".repeat(32)));
}
