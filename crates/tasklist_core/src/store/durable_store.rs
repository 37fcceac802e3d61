//! Typed durable cells over a key-value repository.
//!
//! # Responsibility
//! - Own the JSON encoding of every persisted value.
//! - Recover from missing or undecodable entries by falling back to a default.
//!
//! # Invariants
//! - `read` never fails; storage and decode failures are logged and replaced
//!   by the caller's default.
//! - `write` overwrites unconditionally and reports failures to the caller.
//! - Blank stored text is treated the same as an absent key.

use crate::repo::kv_repo::{KvRepository, RepoError};
use log::{debug, error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure while persisting a value.
#[derive(Debug)]
pub enum StoreError {
    /// Value could not be encoded as JSON.
    Encode {
        key: String,
        source: serde_json::Error,
    },
    /// Underlying repository rejected the write.
    Repo { key: String, source: RepoError },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode { key, source } => write!(f, "failed to encode `{key}`: {source}"),
            Self::Repo { key, source } => write!(f, "failed to persist `{key}`: {source}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode { source, .. } => Some(source),
            Self::Repo { source, .. } => Some(source),
        }
    }
}

/// Outcome of [`DurableStore::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stored<T> {
    /// No entry, or only blank text.
    Absent,
    Decoded(T),
    /// The entry exists but the repository failed or the text did not decode.
    Unreadable,
}

/// Durable store adapter: typed get/set over string keys.
pub struct DurableStore<R: KvRepository> {
    repo: R,
}

impl<R: KvRepository> DurableStore<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Borrows the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Reads and decodes the value stored under `key`.
    ///
    /// Returns `default` when the key is absent, blank, unreadable or fails
    /// to decode as `T`.
    pub fn read<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.load(key) {
            Stored::Decoded(value) => value,
            Stored::Absent | Stored::Unreadable => default,
        }
    }

    /// Like [`Self::read`], but tells an absent entry apart from one that
    /// exists and could not be read or decoded.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Stored<T> {
        let raw = match self.repo.get_item(key) {
            Ok(Some(raw)) if !raw.trim().is_empty() => raw,
            Ok(_) => {
                debug!("event=store_read module=store status=absent key={key}");
                return Stored::Absent;
            }
            Err(err) => {
                error!(
                    "event=store_read module=store status=fallback key={} error_code=storage_read_failed error={}",
                    key, err
                );
                return Stored::Unreadable;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(
                    "event=store_read module=store status=ok key={} bytes={}",
                    key,
                    raw.len()
                );
                Stored::Decoded(value)
            }
            Err(err) => {
                warn!(
                    "event=store_read module=store status=fallback key={} bytes={} error_code=decode_failed error={}",
                    key,
                    raw.len(),
                    err
                );
                Stored::Unreadable
            }
        }
    }

    /// Encodes `value` and stores it under `key`, replacing any prior value.
    ///
    /// # Errors
    /// - `StoreError::Encode` when `value` cannot be serialized.
    /// - `StoreError::Repo` when the repository rejects the write.
    pub fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StoreResult<()> {
        let encoded = serde_json::to_string(value).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;

        if let Err(source) = self.repo.set_item(key, &encoded) {
            error!(
                "event=store_write module=store status=error key={} bytes={} error={}",
                key,
                encoded.len(),
                source
            );
            return Err(StoreError::Repo {
                key: key.to_string(),
                source,
            });
        }

        debug!(
            "event=store_write module=store status=ok key={} bytes={}",
            key,
            encoded.len()
        );
        Ok(())
    }
}
