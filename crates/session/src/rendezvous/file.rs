//! File-backed rendezvous for processes sharing a filesystem.
//!
//! One file per key under a shared directory. Publishing writes to a
//! process-unique temp file first and renames it into place, so a polling
//! reader either finds no file or a complete value, never a partial write.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::debug;

use super::{RendezvousChannel, RendezvousError, validate_key};

/// Rendezvous channel backed by a shared directory.
#[derive(Clone, Debug)]
pub struct FileRendezvous {
    dir: PathBuf,
}

impl FileRendezvous {
    /// Opens (and creates if needed) the shared exchange directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, RendezvousError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| RendezvousError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// The directory records are exchanged through.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    fn io_error(key: &str, source: io::Error) -> RendezvousError {
        RendezvousError::Io {
            key: key.to_string(),
            source,
        }
    }
}

impl RendezvousChannel for FileRendezvous {
    fn publish(&self, key: &str, value: &str) -> Result<(), RendezvousError> {
        validate_key(key)?;
        // Temp name carries the pid so two leaders misconfigured onto the
        // same key at least never corrupt each other's in-flight write.
        let tmp = self
            .dir
            .join(format!(".{key}.tmp-{pid}", pid = std::process::id()));
        fs::write(&tmp, value).map_err(|source| Self::io_error(key, source))?;
        fs::rename(&tmp, self.record_path(key)).map_err(|source| Self::io_error(key, source))?;
        debug!(key, bytes = value.len(), "published rendezvous record");
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), RendezvousError> {
        validate_key(key)?;
        match fs::remove_file(self.record_path(key)) {
            Ok(()) => {
                debug!(key, "cleared stale rendezvous record");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(Self::io_error(key, source)),
        }
    }

    fn read(&self, key: &str) -> Result<Option<String>, RendezvousError> {
        validate_key(key)?;
        match fs::read_to_string(self.record_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(Self::io_error(key, source)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_then_read_returns_value() {
        let dir = tempfile::tempdir().unwrap();
        let channel = FileRendezvous::new(dir.path()).unwrap();

        channel.publish("relay_join_code", "ABC123").unwrap();
        assert_eq!(
            channel.read("relay_join_code").unwrap().as_deref(),
            Some("ABC123")
        );
    }

    #[test]
    fn read_of_absent_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let channel = FileRendezvous::new(dir.path()).unwrap();
        assert_eq!(channel.read("relay_join_code").unwrap(), None);
    }

    #[test]
    fn clear_is_idempotent_and_removes_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let channel = FileRendezvous::new(dir.path()).unwrap();

        channel.clear("relay_join_code").unwrap();
        channel.publish("relay_join_code", "ABC123").unwrap();
        channel.clear("relay_join_code").unwrap();
        assert_eq!(channel.read("relay_join_code").unwrap(), None);
    }

    #[test]
    fn publish_replaces_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let channel = FileRendezvous::new(dir.path()).unwrap();

        channel.publish("relay_join_code", "OLD").unwrap();
        channel.publish("relay_join_code", "NEW").unwrap();
        assert_eq!(
            channel.read("relay_join_code").unwrap().as_deref(),
            Some("NEW")
        );
    }

    #[test]
    fn path_like_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let channel = FileRendezvous::new(dir.path()).unwrap();
        assert!(matches!(
            channel.publish("../outside", "x"),
            Err(RendezvousError::InvalidKey(_))
        ));
    }
}
