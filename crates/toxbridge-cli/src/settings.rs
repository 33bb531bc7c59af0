//! Account settings persisted between runs as a CBOR file.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use toxbridge_core::AccountConfig;

/// Errors reading or writing the settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// File system failure.
    #[error("settings file {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The file exists but does not hold settings.
    #[error("settings file {path} is invalid: {reason}")]
    Decode {
        /// File involved.
        path: PathBuf,
        /// Decoder message.
        reason: String,
    },

    /// Settings could not be encoded.
    #[error("failed to encode settings: {0}")]
    Encode(String),
}

/// Settings file on disk.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    /// Settings stored at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the settings; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// - `SettingsError::Io` if the file exists but cannot be read
    /// - `SettingsError::Decode` if the contents are not valid settings
    pub fn load(&self) -> Result<AccountConfig, SettingsError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no settings file, using defaults");
                return Ok(AccountConfig::default());
            },
            Err(source) => return Err(SettingsError::Io { path: self.path.clone(), source }),
        };

        ciborium::from_reader(bytes.as_slice())
            .map_err(|e| SettingsError::Decode { path: self.path.clone(), reason: e.to_string() })
    }

    /// Replace the file with `config`.
    ///
    /// # Errors
    ///
    /// - `SettingsError::Encode` if encoding fails
    /// - `SettingsError::Io` if the file cannot be written
    pub fn save(&self, config: &AccountConfig) -> Result<(), SettingsError> {
        let mut bytes = Vec::new();
        ciborium::into_writer(config, &mut bytes)
            .map_err(|e| SettingsError::Encode(e.to_string()))?;

        let staging = self.path.with_extension("tmp");
        fs::write(&staging, &bytes)
            .and_then(|()| fs::rename(&staging, &self.path))
            .map_err(|source| SettingsError::Io { path: self.path.clone(), source })?;

        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "settings saved");
        Ok(())
    }
}
