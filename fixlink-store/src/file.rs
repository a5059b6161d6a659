/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! File-backed store and message log.
//!
//! Layout under the storage directory:
//! - `<key>.json`: the latest [`SessionRecord`], replaced atomically
//! - `<key>.log`: raw outbound messages, one per line, in send order

use crate::record::SessionRecord;
use crate::traits::{LogEntries, MessageLog, SessionStore};
use bytes::Bytes;
use fixlink_core::error::StoreError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// [`SessionStore`] keeping one JSON document per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    /// Returns `StoreError::Io` if the directory cannot be created.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Returns the storage directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<SessionRecord>, StoreError> {
        let data = match fs::read(self.path(key)) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|err| StoreError::Corrupted {
                key: key.to_string(),
                reason: err.to_string(),
            })
    }

    fn set(&self, key: &str, record: &SessionRecord) -> Result<(), StoreError> {
        let data = serde_json::to_vec(record).map_err(|err| StoreError::Serialize {
            key: key.to_string(),
            reason: err.to_string(),
        })?;

        let tmp = self.dir.join(format!("{key}.json.tmp"));
        fs::write(&tmp, data)?;
        fs::rename(&tmp, self.path(key))?;
        Ok(())
    }
}

/// [`MessageLog`] appending newline-delimited raw messages to `<key>.log`.
///
/// Append handles are opened on first use and kept until [`MessageLog::close`]
/// or [`MessageLog::remove`].
#[derive(Debug)]
pub struct FileMessageLog {
    dir: PathBuf,
    handles: Mutex<HashMap<String, File>>,
}

impl FileMessageLog {
    /// Opens a log rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    /// Returns `StoreError::Io` if the directory cannot be created.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            handles: Mutex::new(HashMap::new()),
        })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.log"))
    }
}

impl MessageLog for FileMessageLog {
    fn append(&self, key: &str, raw: &[u8]) -> Result<(), StoreError> {
        let mut handles = self.handles.lock();
        let file = match handles.entry(key.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let path = self.path(key);
                debug!(path = %path.display(), "opening message log");
                entry.insert(OpenOptions::new().create(true).append(true).open(path)?)
            }
        };

        let mut line = Vec::with_capacity(raw.len() + 1);
        line.extend_from_slice(raw);
        line.push(b'\n');
        file.write_all(&line)?;
        Ok(())
    }

    fn entries(&self, key: &str) -> Result<LogEntries<'_>, StoreError> {
        let file = match File::open(self.path(key)) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(Box::new(std::iter::empty()));
            }
            Err(err) => return Err(err.into()),
        };

        let lines = BufReader::new(file)
            .split(b'\n')
            .filter(|line| !matches!(line, Ok(bytes) if bytes.is_empty()))
            .map(|line| line.map(Bytes::from).map_err(StoreError::from));
        Ok(Box::new(lines))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.handles.lock().remove(key);
        match fs::remove_file(self.path(key)) {
            Ok(()) => {
                debug!(key, "message log removed");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn close(&self, key: &str) {
        self.handles.lock().remove(key);
    }
}
