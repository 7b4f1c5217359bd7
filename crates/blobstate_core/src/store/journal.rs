//! Commit journal for the file-backed document store.
//!
//! Every committed batch becomes one record:
//!
//! ```text
//! | magic "BSJ1" (4) | version (2) | length (4) | CBOR payload (N) | crc32 (4) |
//! ```
//!
//! Integers are little-endian; the CRC covers header and payload.
//!
//! ## Recovery
//!
//! - a record cut short at the end of the log is a write that never
//!   completed: it is dropped and the log truncated to the last whole record
//! - bad magic or an unknown version is fatal (`JournalCorruption`)
//! - a whole record whose CRC does not match is fatal (`ChecksumMismatch`)

use super::table::Change;
use crate::error::{CoreError, CoreResult};
use blobstate_storage::{LogBackend, StorageResult};
use tracing::{debug, warn};

/// Magic bytes opening every journal record.
pub(crate) const JOURNAL_MAGIC: [u8; 4] = *b"BSJ1";

/// Current journal format version.
pub(crate) const JOURNAL_VERSION: u16 = 1;

/// magic (4) + version (2) + length (4)
const HEADER_SIZE: usize = 10;

const CRC_SIZE: usize = 4;

pub(crate) struct Journal {
    log: Box<dyn LogBackend>,
    sync_on_commit: bool,
}

impl Journal {
    pub fn new(log: Box<dyn LogBackend>, sync_on_commit: bool) -> Self {
        Self {
            log,
            sync_on_commit,
        }
    }

    /// Reads every committed batch, dropping a torn tail.
    pub fn replay(&mut self) -> CoreResult<Vec<Vec<Change>>> {
        let data = self.log.read_all()?;
        let (batches, valid_len) = decode_records(&data)?;

        if valid_len < data.len() {
            warn!(
                valid_len,
                discarded = data.len() - valid_len,
                "dropping incomplete journal record"
            );
            self.log.truncate(valid_len as u64)?;
        }
        debug!(batches = batches.len(), bytes = valid_len, "replayed journal");
        Ok(batches)
    }

    /// Appends one batch. On failure the log is cut back to where it was.
    pub fn append(&mut self, changes: &[Change]) -> CoreResult<()> {
        let record = encode_record(changes)?;
        let start = self.log.size()?;

        if let Err(e) = self.write_record(&record) {
            if let Err(undo) = self.log.truncate(start) {
                warn!(error = %undo, "failed to discard partial journal record");
            }
            return Err(e.into());
        }
        Ok(())
    }

    fn write_record(&mut self, record: &[u8]) -> StorageResult<()> {
        self.log.append(record)?;
        self.log.flush()?;
        if self.sync_on_commit {
            self.log.sync()?;
        }
        Ok(())
    }
}

pub(crate) fn encode_record(changes: &[Change]) -> CoreResult<Vec<u8>> {
    let mut payload = Vec::new();
    ciborium::into_writer(changes, &mut payload)
        .map_err(|e| CoreError::encoding(format!("{e:?}")))?;

    let len = u32::try_from(payload.len())
        .map_err(|_| CoreError::invalid_operation("journal record payload too large"))?;

    let mut data = Vec::with_capacity(HEADER_SIZE + payload.len() + CRC_SIZE);
    data.extend_from_slice(&JOURNAL_MAGIC);
    data.extend_from_slice(&JOURNAL_VERSION.to_le_bytes());
    data.extend_from_slice(&len.to_le_bytes());
    data.extend_from_slice(&payload);
    let crc = compute_crc32(&data);
    data.extend_from_slice(&crc.to_le_bytes());
    Ok(data)
}

/// Decodes whole records, returning them with the length they occupy.
fn decode_records(data: &[u8]) -> CoreResult<(Vec<Vec<Change>>, usize)> {
    let mut batches = Vec::new();
    let mut offset = 0;

    while offset < data.len() {
        let rest = &data[offset..];
        if rest.len() < HEADER_SIZE {
            break;
        }

        if rest[0..4] != JOURNAL_MAGIC {
            return Err(CoreError::journal_corruption(format!(
                "invalid magic at offset {offset}"
            )));
        }
        let version = u16::from_le_bytes([rest[4], rest[5]]);
        if version == 0 || version > JOURNAL_VERSION {
            return Err(CoreError::journal_corruption(format!(
                "unsupported version {version} at offset {offset}"
            )));
        }
        let payload_len = u32::from_le_bytes([rest[6], rest[7], rest[8], rest[9]]) as usize;

        let total_len = HEADER_SIZE + payload_len + CRC_SIZE;
        if rest.len() < total_len {
            break;
        }

        let payload_end = HEADER_SIZE + payload_len;
        let stored = u32::from_le_bytes([
            rest[payload_end],
            rest[payload_end + 1],
            rest[payload_end + 2],
            rest[payload_end + 3],
        ]);
        let computed = compute_crc32(&rest[..payload_end]);
        if stored != computed {
            return Err(CoreError::ChecksumMismatch {
                expected: stored,
                actual: computed,
            });
        }

        let changes: Vec<Change> = ciborium::from_reader(&rest[HEADER_SIZE..payload_end])
            .map_err(|e| {
                CoreError::journal_corruption(format!(
                    "undecodable record at offset {offset}: {e:?}"
                ))
            })?;
        batches.push(changes);
        offset += total_len;
    }

    Ok((batches, offset))
}

/// CRC32 (IEEE polynomial).
pub(crate) fn compute_crc32(data: &[u8]) -> u32 {
    const CRC32_TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ 0xEDB8_8320;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        let index = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    !crc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocId, Fields, Value};
    use blobstate_storage::MemoryLog;

    fn change(id: &str, value: Option<&str>) -> Change {
        Change {
            collection: "resources".into(),
            id: DocId::new(id),
            fields: value.map(|v| {
                let mut fields = Fields::new();
                fields.insert("blobpath".into(), Value::from(v));
                fields
            }),
        }
    }

    #[test]
    fn crc32_check_value() {
        assert_eq!(compute_crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn append_then_replay() {
        let mut journal = Journal::new(Box::new(MemoryLog::new()), false);
        journal.append(&[change("a", Some("p1"))]).unwrap();
        journal
            .append(&[change("a", None), change("b", Some("p2"))])
            .unwrap();

        let batches = journal.replay().unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1], vec![change("a", None), change("b", Some("p2"))]);
    }

    #[test]
    fn torn_tail_is_dropped() {
        let mut data = encode_record(&[change("a", Some("p1"))]).unwrap();
        let whole = data.len();
        let second = encode_record(&[change("b", Some("p2"))]).unwrap();
        data.extend_from_slice(&second[..second.len() - 3]);

        let mut journal = Journal::new(Box::new(MemoryLog::with_data(data)), false);
        let batches = journal.replay().unwrap();
        assert_eq!(batches, vec![vec![change("a", Some("p1"))]]);
        assert_eq!(journal.log.size().unwrap(), whole as u64);
    }

    #[test]
    fn short_header_is_torn() {
        let mut data = encode_record(&[change("a", Some("p1"))]).unwrap();
        data.extend_from_slice(&JOURNAL_MAGIC);
        let (batches, valid) = decode_records(&data).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(valid, data.len() - JOURNAL_MAGIC.len());
    }

    #[test]
    fn flipped_payload_bit_is_checksum_mismatch() {
        let mut data = encode_record(&[change("a", Some("p1"))]).unwrap();
        data[HEADER_SIZE + 2] ^= 0x01;
        assert!(matches!(
            decode_records(&data),
            Err(CoreError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn bad_magic_is_corruption() {
        let mut data = encode_record(&[change("a", Some("p1"))]).unwrap();
        data[0] = b'X';
        assert!(matches!(
            decode_records(&data),
            Err(CoreError::JournalCorruption { .. })
        ));
    }

    #[test]
    fn future_version_is_corruption() {
        let mut data = encode_record(&[change("a", Some("p1"))]).unwrap();
        data[4..6].copy_from_slice(&(JOURNAL_VERSION + 1).to_le_bytes());
        assert!(matches!(
            decode_records(&data),
            Err(CoreError::JournalCorruption { .. })
        ));
    }
}
