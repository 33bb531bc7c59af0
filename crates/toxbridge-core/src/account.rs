//! Account blob persistence.
//!
//! The network core serializes all durable account state (keys, friend list,
//! pending requests) into one opaque buffer. This module never looks inside
//! it; it only enforces a size window and moves it between storage forms:
//!
//! - base64 text inside the host's per-account config (`messenger` setting)
//! - raw bytes in exported/imported files
//!
//! A stored empty string is the explicit "nothing to save" marker and is
//! distinct from both "never set up" and corrupt data.

use std::{
    fmt,
    fs::{self, File, OpenOptions},
    io::{Read, Write},
    path::Path,
};

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::{
    error::{ACCESS_FAILED, AccountError, OPEN_FAILED, READ_FAILED, SAVE_FAILED},
    identity::PublicKey,
};

/// Largest account blob accepted on import (1 MiB).
pub const MAX_ACCOUNT_DATA_SIZE: usize = 1024 * 1024;

/// File extension for exported account data.
pub const EXPORT_EXTENSION: &str = "tox";

fn check_size(size: u64) -> Result<(), AccountError> {
    if size == 0 {
        return Err(AccountError::Empty);
    }
    if size > MAX_ACCOUNT_DATA_SIZE as u64 {
        return Err(AccountError::TooLarge { size, max: MAX_ACCOUNT_DATA_SIZE });
    }
    Ok(())
}

/// Non-empty account data within the accepted size window.
#[derive(Clone, PartialEq, Eq)]
pub struct AccountBlob(Vec<u8>);

impl AccountBlob {
    /// Validate and wrap account data.
    ///
    /// # Errors
    ///
    /// - `AccountError::Empty` for zero bytes
    /// - `AccountError::TooLarge` above [`MAX_ACCOUNT_DATA_SIZE`]
    pub fn new(bytes: Vec<u8>) -> Result<Self, AccountError> {
        check_size(bytes.len() as u64)?;
        Ok(Self(bytes))
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Size in bytes (always at least one).
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Base64 text for the host's config.
    pub fn to_config_string(&self) -> String {
        STANDARD.encode(&self.0)
    }

    /// Decode base64 config text.
    ///
    /// # Errors
    ///
    /// - `AccountError::Encoding` if the text is not base64
    /// - size errors as for [`AccountBlob::new`]
    pub fn from_config_string(text: &str) -> Result<Self, AccountError> {
        let bytes =
            STANDARD.decode(text.trim()).map_err(|e| AccountError::Encoding(e.to_string()))?;
        Self::new(bytes)
    }
}

// Account data holds secret keys; never print it.
impl fmt::Debug for AccountBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountBlob({} bytes)", self.0.len())
    }
}

/// Result of serializing the network core's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountExport {
    /// The core reported nothing to save.
    Empty,
    /// Serialized state.
    Blob(AccountBlob),
}

impl AccountExport {
    /// Returns true for the empty marker.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// The blob, unless this is the empty marker.
    pub fn blob(&self) -> Option<&AccountBlob> {
        match self {
            Self::Empty => None,
            Self::Blob(blob) => Some(blob),
        }
    }

    /// Config text: base64 for a blob, the empty string for the marker.
    pub fn to_config_string(&self) -> String {
        self.blob().map(AccountBlob::to_config_string).unwrap_or_default()
    }
}

/// What the host's config holds for the account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredAccount {
    /// No setting at all; first login on this account.
    Missing,
    /// Explicit empty marker from an earlier session.
    Empty,
    /// Saved account data.
    Blob(AccountBlob),
}

impl StoredAccount {
    /// Interpret the `messenger` config value.
    ///
    /// # Errors
    ///
    /// Errors from [`AccountBlob::from_config_string`] for non-empty values.
    pub fn from_config(value: Option<&str>) -> Result<Self, AccountError> {
        match value {
            None => Ok(Self::Missing),
            Some(text) if text.trim().is_empty() => Ok(Self::Empty),
            Some(text) => AccountBlob::from_config_string(text).map(Self::Blob),
        }
    }
}

/// Read an exported account file.
///
/// The size is checked from file metadata before any data is read, and the
/// read itself stops one byte past the limit in case the file grew since.
///
/// # Errors
///
/// - `AccountError::Io` when the file cannot be accessed, opened or fully read
/// - size errors as for [`AccountBlob::new`]
pub fn read_account_file(path: &Path) -> Result<AccountBlob, AccountError> {
    let metadata = fs::metadata(path).map_err(|e| AccountError::io(ACCESS_FAILED, &e))?;
    check_size(metadata.len())?;

    let file = File::open(path).map_err(|e| AccountError::io(OPEN_FAILED, &e))?;
    let bytes = read_bounded(file, metadata.len())?;

    tracing::debug!(path = %path.display(), size = bytes.len(), "read account data file");
    AccountBlob::new(bytes)
}

fn read_bounded(reader: impl Read, expected: u64) -> Result<Vec<u8>, AccountError> {
    let mut bytes = Vec::with_capacity(expected as usize);
    reader
        .take(MAX_ACCOUNT_DATA_SIZE as u64 + 1)
        .read_to_end(&mut bytes)
        .map_err(|e| AccountError::io(READ_FAILED, &e))?;

    check_size(bytes.len() as u64)?;
    if bytes.len() as u64 != expected {
        return Err(AccountError::Io {
            context: READ_FAILED,
            reason: "file changed while reading".to_string(),
        });
    }
    Ok(bytes)
}

/// Write account data to a file, readable only by the owner on Unix.
///
/// # Errors
///
/// - `AccountError::Io` when the file cannot be created or written
pub fn write_account_file(path: &Path, blob: &AccountBlob) -> Result<(), AccountError> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(|e| AccountError::io(SAVE_FAILED, &e))?;
    file.write_all(blob.as_bytes()).map_err(|e| AccountError::io(SAVE_FAILED, &e))?;
    file.flush().map_err(|e| AccountError::io(SAVE_FAILED, &e))?;

    tracing::debug!(path = %path.display(), size = blob.size(), "wrote account data file");
    Ok(())
}

/// File name offered when exporting an account.
pub fn suggested_export_name(public_key: &PublicKey) -> String {
    format!("{public_key}.{EXPORT_EXTENSION}")
}
