//! Durable journal as an append-only JSON-lines file.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use folio_events::JournalEvent;

use super::r#trait::{EventLog, UncommittedEvent, next_position, select_range};
use crate::store::StorageError;

struct Inner {
    file: File,
    /// File length covered by fully written events.
    committed_len: u64,
    events: Vec<JournalEvent>,
}

impl Inner {
    fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        self.file.write_all(line)?;
        self.file.sync_data()
    }

    /// Cut the file back to the last complete event so a failed append leaves
    /// no partial line for the next one to follow.
    fn rollback(&mut self) -> io::Result<()> {
        self.file.set_len(self.committed_len)?;
        self.file.sync_data()
    }
}

/// One event per line, synced before `append` returns.
///
/// An append that fails part way is cut back out of the file, so the journal
/// on disk only ever holds whole events.
///
/// The whole file is loaded on open. A torn final line (a crash in the middle
/// of an append) is cut off; damage anywhere else is reported as corruption.
pub struct JsonlEventLog {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl core::fmt::Debug for JsonlEventLog {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("JsonlEventLog")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl JsonlEventLog {
    /// Open (or create) the journal file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;

        let mut raw = String::new();
        file.read_to_string(&mut raw)?;

        let events = load(&path, &mut file, &raw)?;
        let committed_len = file.metadata()?.len();
        tracing::debug!(path = %path.display(), events = events.len(), "journal opened");

        Ok(Self {
            path,
            inner: Mutex::new(Inner {
                file,
                committed_len,
                events,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn load(path: &Path, file: &mut File, raw: &str) -> Result<Vec<JournalEvent>, StorageError> {
    let mut events: Vec<JournalEvent> = Vec::new();
    let mut offset = 0usize;

    let lines: Vec<&str> = raw.split_inclusive('\n').collect();
    for (idx, line) in lines.iter().enumerate() {
        let start = offset;
        offset += line.len();

        let body = line.trim_end_matches(['\n', '\r']);
        if body.trim().is_empty() {
            continue;
        }

        let terminated = line.ends_with('\n');
        match serde_json::from_str::<JournalEvent>(body) {
            Ok(event) => {
                let previous = events.last().map(|e| e.sequence());
                if previous.is_some_and(|last| event.sequence() <= last) {
                    return Err(StorageError::Corrupt(format!(
                        "{}: sequence {} follows {}",
                        path.display(),
                        event.sequence(),
                        previous.unwrap_or_default()
                    )));
                }
                events.push(event);
                if !terminated {
                    file.write_all(b"\n")?;
                    file.sync_data()?;
                }
            }
            Err(err) if idx + 1 == lines.len() && !terminated => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "discarding torn final journal line"
                );
                file.set_len(start as u64)?;
                file.sync_data()?;
            }
            Err(err) => {
                return Err(StorageError::Corrupt(format!(
                    "{}: line {}: {err}",
                    path.display(),
                    idx + 1
                )));
            }
        }
    }

    Ok(events)
}

impl EventLog for JsonlEventLog {
    fn append(&self, event: UncommittedEvent) -> Result<JournalEvent, StorageError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| StorageError::Unavailable("lock poisoned".to_string()))?;

        let (sequence, transaction_time) = next_position(inner.events.last());
        let stored = event.commit(sequence, transaction_time);

        let mut line = serde_json::to_string(&stored)?;
        line.push('\n');
        if let Err(err) = inner.write_line(line.as_bytes()) {
            match inner.rollback() {
                Ok(()) => tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "journal append failed; partial line removed"
                ),
                Err(cleanup) => tracing::error!(
                    path = %self.path.display(),
                    error = %err,
                    cleanup_error = %cleanup,
                    "journal append failed and the partial line could not be removed"
                ),
            }
            return Err(err.into());
        }

        inner.committed_len += line.len() as u64;
        inner.events.push(stored.clone());
        Ok(stored)
    }

    fn query(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<JournalEvent>, StorageError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| StorageError::Unavailable("lock poisoned".to_string()))?;
        Ok(select_range(&inner.events, from, to))
    }

    fn all(&self) -> Result<Vec<JournalEvent>, StorageError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| StorageError::Unavailable("lock poisoned".to_string()))?;
        Ok(inner.events.clone())
    }

    fn len(&self) -> Result<u64, StorageError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| StorageError::Unavailable("lock poisoned".to_string()))?;
        Ok(inner.events.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use folio_core::{EventId, UserId};
    use serde_json::json;

    use super::*;

    fn draft(n: i64) -> UncommittedEvent {
        UncommittedEvent {
            event_id: EventId::new(),
            event_type: "test.noted".to_string(),
            event_version: 1,
            valid_time: Utc::now(),
            user_id: UserId::new("auditor").unwrap(),
            payload: json!({ "n": n }),
        }
    }

    #[test]
    fn events_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");

        let first = {
            let log = JsonlEventLog::open(&path).unwrap();
            let first = log.append(draft(1)).unwrap();
            log.append(draft(2)).unwrap();
            first
        };

        let log = JsonlEventLog::open(&path).unwrap();
        let all = log.all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], first);

        let third = log.append(draft(3)).unwrap();
        assert_eq!(third.sequence(), 3);
    }

    #[test]
    fn torn_tail_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");

        {
            let log = JsonlEventLog::open(&path).unwrap();
            log.append(draft(1)).unwrap();
        }
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(br#"{"event_id":"trunc"#).unwrap();
        drop(file);

        let log = JsonlEventLog::open(&path).unwrap();
        assert_eq!(log.len().unwrap(), 1);
        log.append(draft(2)).unwrap();

        let reopened = JsonlEventLog::open(&path).unwrap();
        assert_eq!(reopened.len().unwrap(), 2);
    }

    #[test]
    fn failed_append_leaves_no_partial_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");

        let log = JsonlEventLog::open(&path).unwrap();
        log.append(draft(1)).unwrap();
        {
            // A short write: half a line reached the file before the error.
            let mut inner = log.inner.lock().unwrap();
            inner.file.write_all(br#"{"event_id":"half"#).unwrap();
            inner.rollback().unwrap();
        }
        log.append(draft(2)).unwrap();
        drop(log);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("half"));
        assert_eq!(raw.lines().count(), 2);
        let reopened = JsonlEventLog::open(&path).unwrap();
        let sequences: Vec<_> = reopened.all().unwrap().iter().map(|e| e.sequence()).collect();
        assert_eq!(sequences, vec![1, 2]);
    }

    #[test]
    fn damage_before_the_tail_is_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");

        {
            let log = JsonlEventLog::open(&path).unwrap();
            log.append(draft(1)).unwrap();
        }
        let good = fs::read_to_string(&path).unwrap();
        fs::write(&path, format!("not json\n{good}")).unwrap();

        let err = JsonlEventLog::open(&path).unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)));
    }
}
