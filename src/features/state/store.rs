//! State record storage
//!
//! One file per key under the state directory, replaced wholesale on
//! every write. Readers never cache.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: `v1 <RFC-3339>` text records written via temp file + rename
//! - 1.0.0: Initial release

use chrono::{DateTime, TimeZone, Utc};
use log::{debug, warn};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::{ReflectError, ReflectResult};

/// Prefix written in front of every timestamp record
const FORMAT_TAG: &str = "v1";

/// Distinguishes temp files written by the same process
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Names of the persisted records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKey {
    WakeupTime,
    Reflected,
    NextReflectionTime,
    Bedtime,
}

impl StateKey {
    pub const ALL: [StateKey; 4] = [
        StateKey::WakeupTime,
        StateKey::Reflected,
        StateKey::NextReflectionTime,
        StateKey::Bedtime,
    ];

    /// File name of the record inside the state directory
    pub fn as_str(self) -> &'static str {
        match self {
            StateKey::WakeupTime => "wakeup_time",
            StateKey::Reflected => "reflected",
            StateKey::NextReflectionTime => "next_notification_time",
            StateKey::Bedtime => "bedtime",
        }
    }
}

/// Everything the reporter and the alert body need, read in one go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSnapshot {
    pub wakeup_time: DateTime<Utc>,
    pub bedtime: DateTime<Utc>,
    pub next_reflection_time: DateTime<Utc>,
    pub reflected: bool,
}

/// Directory-backed store, one file per [`StateKey`].
///
/// No locking: each record is replaced wholesale and the last writer wins.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    /// Open the store, creating the directory on first use
    pub fn open(dir: impl Into<PathBuf>) -> ReflectResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            ReflectError::state_io("state_dir", format!("cannot create {}: {e}", dir.display()))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: StateKey) -> PathBuf {
        self.dir.join(key.as_str())
    }

    pub fn exists(&self, key: StateKey) -> bool {
        self.path_for(key).exists()
    }

    /// Remove a record; an already absent record is fine
    pub fn delete(&self, key: StateKey) -> ReflectResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ReflectError::state_io(key.as_str(), e)),
        }
    }

    /// Read a timestamp record, `None` when it has never been written
    pub fn read_timestamp(&self, key: StateKey) -> ReflectResult<Option<DateTime<Utc>>> {
        let contents = match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ReflectError::state_io(key.as_str(), e)),
        };

        decode_timestamp(&contents)
            .map(Some)
            .ok_or_else(|| ReflectError::state_io(key.as_str(), format!("unreadable contents {:?}", contents.trim())))
    }

    /// Store an instant; any timezone is normalized to UTC
    pub fn write_timestamp<Tz: TimeZone>(&self, key: StateKey, value: &DateTime<Tz>) -> ReflectResult<()> {
        let line = format!("{FORMAT_TAG} {}\n", encode_timestamp(&value.with_timezone(&Utc)));
        self.replace(key, line.as_bytes())
    }

    /// Read a timestamp, writing `now` first if it is missing or corrupt
    pub fn timestamp_or_init(&self, key: StateKey, now: DateTime<Utc>) -> ReflectResult<DateTime<Utc>> {
        match self.read_timestamp(key) {
            Ok(Some(value)) => Ok(value),
            Ok(None) => {
                debug!("Initializing {} to {}", key.as_str(), now);
                self.write_timestamp(key, &now)?;
                Ok(now)
            }
            Err(e) => {
                warn!("Regenerating {} after read failure: {}", key.as_str(), e);
                self.write_timestamp(key, &now)?;
                Ok(now)
            }
        }
    }

    pub fn is_reflected(&self) -> bool {
        self.exists(StateKey::Reflected)
    }

    /// Raise the reflected flag; the body records when, for humans only
    pub fn set_reflected(&self, at: DateTime<Utc>) -> ReflectResult<()> {
        let line = format!("{FORMAT_TAG} {}\n", encode_timestamp(&at));
        self.replace(StateKey::Reflected, line.as_bytes())
    }

    pub fn clear_reflected(&self) -> ReflectResult<()> {
        self.delete(StateKey::Reflected)
    }

    /// Load all four values, lazily defaulting missing timestamps to `now`
    pub fn snapshot(&self, now: DateTime<Utc>) -> ReflectResult<StateSnapshot> {
        Ok(StateSnapshot {
            wakeup_time: self.timestamp_or_init(StateKey::WakeupTime, now)?,
            bedtime: self.timestamp_or_init(StateKey::Bedtime, now)?,
            next_reflection_time: self.timestamp_or_init(StateKey::NextReflectionTime, now)?,
            reflected: self.is_reflected(),
        })
    }

    /// Write to a sibling temp file and rename it over the record
    fn replace(&self, key: StateKey, bytes: &[u8]) -> ReflectResult<()> {
        let target = self.path_for(key);
        let tmp = self.dir.join(format!(
            ".{}.tmp.{}.{}",
            key.as_str(),
            std::process::id(),
            WRITE_SEQ.fetch_add(1, Ordering::Relaxed)
        ));

        let result = fs::File::create(&tmp)
            .and_then(|mut file| {
                file.write_all(bytes)?;
                file.sync_all()
            })
            .and_then(|()| fs::rename(&tmp, &target));

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp);
            return Err(ReflectError::state_io(key.as_str(), e));
        }
        Ok(())
    }
}

fn encode_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Accepts `v1 <rfc3339>` as well as a bare RFC-3339 string
fn decode_timestamp(contents: &str) -> Option<DateTime<Utc>> {
    let trimmed = contents.trim();
    let body = match trimmed.split_once(char::is_whitespace) {
        Some((tag, rest)) if tag == FORMAT_TAG => rest.trim(),
        Some(_) => return None,
        None => trimmed,
    };

    DateTime::parse_from_rfc3339(body)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
