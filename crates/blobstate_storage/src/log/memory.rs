//! In-memory byte log.

use super::{shrink_error, LogBackend};
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;

/// A byte log held entirely in memory.
///
/// Used by tests and by ephemeral document stores. Pre-seeding it with
/// [`MemoryLog::with_data`] makes torn-write recovery easy to exercise.
#[derive(Debug, Default)]
pub struct MemoryLog {
    data: RwLock<Vec<u8>>,
}

impl MemoryLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a log that already holds `data`.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    /// Returns a copy of the log contents.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.data.read().clone()
    }
}

impl LogBackend for MemoryLog {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let data = self.data.read();
        let size = data.len() as u64;
        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        let end = start.saturating_add(len);

        if offset > size || end > data.len() {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        Ok(data[start..end].to_vec())
    }

    fn append(&mut self, bytes: &[u8]) -> StorageResult<u64> {
        let mut data = self.data.write();
        let offset = data.len() as u64;
        data.extend_from_slice(bytes);
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.data.read().len() as u64)
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        let mut data = self.data.write();
        let size = data.len() as u64;
        if new_size > size {
            return Err(shrink_error(new_size, size));
        }
        let keep = usize::try_from(new_size).unwrap_or(data.len());
        data.truncate(keep);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_returns_offsets() {
        let mut log = MemoryLog::new();
        assert_eq!(log.append(b"abc").unwrap(), 0);
        assert_eq!(log.append(b"de").unwrap(), 3);
        assert_eq!(log.size().unwrap(), 5);
    }

    #[test]
    fn read_all_returns_everything() {
        let mut log = MemoryLog::new();
        log.append(b"hello ").unwrap();
        log.append(b"journal").unwrap();
        assert_eq!(log.read_all().unwrap(), b"hello journal");
    }

    #[test]
    fn read_past_end_fails() {
        let log = MemoryLog::with_data(b"abc".to_vec());
        assert!(matches!(
            log.read_at(2, 5),
            Err(StorageError::ReadPastEnd { .. })
        ));
    }

    #[test]
    fn truncate_shrinks_only() {
        let mut log = MemoryLog::with_data(b"abcdef".to_vec());
        log.truncate(2).unwrap();
        assert_eq!(log.data(), b"ab");
        assert!(log.truncate(10).is_err());
    }
}
