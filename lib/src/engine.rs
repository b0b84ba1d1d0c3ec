// Copyright 2026 The odbcopy Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The copy engine: the core algorithm. Drives a destination's
//! two-phase commit from a source's transaction iterator, preserving
//! TIDs when the restore path is available, staging and transferring
//! blobs, and maintaining a previous-serial index on the fallback path.

use crate::backend::{DestinationStorage, SourceStorage, Storage};
use crate::capabilities::Capabilities;
use crate::error::EngineError;
use crate::progress::Progress;
use crate::record::{Preindex, TransactionEntry};
use crate::stage::StagedBlob;
use crate::tid::Tid;

/// Result counters returned by [`copy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CopyStats {
    pub txn_count: usize,
    pub obj_count: usize,
    pub blob_count: usize,
}

/// Default blob-record classifier: treats a record as a blob pointer iff
/// its payload starts with this marker. Backends that encode blob
/// pointers differently should pass their own predicate to [`copy`].
pub const DEFAULT_BLOB_MARKER: &[u8] = b"\0blob-ptr\0";

pub fn default_is_blob_record(data: &[u8]) -> bool {
    data.starts_with(DEFAULT_BLOB_MARKER)
}

/// Copies every transaction with tid >= `start_tid` (or all, if `None`)
/// from `source` to `destination`.
///
/// `is_blob_record` classifies a record's payload as a blob pointer;
/// pass [`default_is_blob_record`] unless the backends in use encode
/// blobs differently. `progress`, if given, is notified once per source
/// transaction (including dry-run ones).
pub fn copy(
    source: &dyn SourceStorage,
    destination: &mut dyn DestinationStorage,
    start_tid: Option<Tid>,
    dry_run: bool,
    is_blob_record: impl Fn(&[u8]) -> bool,
    mut progress: Option<&mut dyn Progress>,
) -> Result<CopyStats, EngineError> {
    let caps = Capabilities::probe(source, destination);
    if !caps.source_iterates {
        return Err(EngineError::UnsupportedSource);
    }

    if let Some(start) = start_tid {
        if let Some(last) = destination.last_transaction().map_err(EngineError::Commit)? {
            if start <= last {
                return Err(EngineError::NonExtendingHistory { start, last });
            }
        }
    }

    let mut iterator = source
        .iterator(start_tid)
        .map_err(EngineError::Iteration)?;

    let mut stats = CopyStats::default();
    let mut preindex = Preindex::new();

    loop {
        let txn = match iterator.next_transaction() {
            Ok(Some(txn)) => txn,
            Ok(None) => break,
            Err(err) => {
                let _ = iterator.close();
                return Err(EngineError::Iteration(err));
            }
        };

        if dry_run {
            let byte_size = txn.byte_size() as u64;
            if let Some(p) = progress.as_deref_mut() {
                p.on_transaction(&txn.tid.to_string(), txn.records.len(), byte_size, 0);
            }
            stats.txn_count += 1;
            stats.obj_count += txn.records.len();
            continue;
        }

        match copy_one_transaction(destination, &caps, &txn, &is_blob_record, source, &mut preindex) {
            Ok((obj_count, blob_count, byte_size)) => {
                stats.txn_count += 1;
                stats.obj_count += obj_count;
                stats.blob_count += blob_count;
                if let Some(p) = progress.as_deref_mut() {
                    p.on_transaction(&txn.tid.to_string(), obj_count, byte_size, blob_count);
                }
            }
            Err(err) => {
                let _ = destination.tpc_abort(&txn);
                let _ = iterator.close();
                return Err(err);
            }
        }
    }

    let _ = iterator.close();
    if let Some(p) = progress.as_deref_mut() {
        p.log_summary(stats.txn_count, stats.obj_count, stats.blob_count);
    }
    Ok(stats)
}

fn copy_one_transaction(
    destination: &mut dyn DestinationStorage,
    caps: &Capabilities,
    txn: &TransactionEntry,
    is_blob_record: &impl Fn(&[u8]) -> bool,
    source: &dyn SourceStorage,
    preindex: &mut Preindex,
) -> Result<(usize, usize, u64), EngineError> {
    let tid_and_status = caps
        .dest_restores
        .then_some((txn.tid, txn.status.as_byte()));
    destination
        .tpc_begin(txn, tid_and_status)
        .map_err(EngineError::Commit)?;

    let provisional_tid = destination.current_tid_hint().unwrap_or(txn.tid);
    let mut byte_size: u64 = 0;
    let mut blob_count = 0usize;

    for record in &txn.records {
        let treat_as_blob =
            caps.source_has_blobs && caps.dest_has_blobs && is_blob_record(&record.data);

        if treat_as_blob {
            let source_blobs = source
                .as_supports_blobs()
                .expect("source_has_blobs implies SupportsBlobs");
            match source_blobs.load_blob(record.oid, record.tid) {
                Ok(source_blob_path) => {
                    let size = write_blob_record(
                        destination,
                        caps,
                        &source_blob_path,
                        txn,
                        record,
                        provisional_tid,
                        preindex,
                    )
                    .map_err(EngineError::Commit)?;
                    byte_size += size;
                    blob_count += 1;
                    continue;
                }
                Err(err) => {
                    tracing::warn!(
                        oid = %record.oid,
                        tid = %record.tid,
                        %err,
                        "failed to load blob, falling back to plain record"
                    );
                }
            }
        }

        write_plain_record(destination, caps, txn, record, provisional_tid, preindex)
            .map_err(EngineError::Commit)?;
        byte_size += record.data.len() as u64;
    }

    destination.tpc_vote(txn).map_err(EngineError::Commit)?;
    let committed_tid = destination.tpc_finish(txn).map_err(EngineError::Commit)?;
    if !caps.dest_restores {
        preindex.promote(provisional_tid, committed_tid);
    }

    Ok((txn.records.len(), blob_count, byte_size))
}

fn write_plain_record(
    destination: &mut dyn DestinationStorage,
    caps: &Capabilities,
    txn: &TransactionEntry,
    record: &crate::record::Record,
    provisional_tid: Tid,
    preindex: &mut Preindex,
) -> Result<(), crate::error::BackendError> {
    if caps.dest_restores {
        let restore = destination
            .as_supports_restore()
            .expect("dest_restores implies SupportsRestore");
        restore.restore(record.oid, record.tid, &record.data, record.data_txn, txn)
    } else {
        let prev_serial = preindex.get(&record.oid);
        destination.store(record.oid, prev_serial, &record.data, txn)?;
        preindex.set(record.oid, provisional_tid);
        Ok(())
    }
}

fn write_blob_record(
    destination: &mut dyn DestinationStorage,
    caps: &Capabilities,
    source_blob_path: &std::path::Path,
    txn: &TransactionEntry,
    record: &crate::record::Record,
    provisional_tid: Tid,
    preindex: &mut Preindex,
) -> Result<u64, crate::error::BackendError> {
    let byte_size = std::fs::metadata(source_blob_path)
        .map(|m| m.len())
        .unwrap_or(0);

    let dest_blobs = destination
        .as_supports_blobs_mut()
        .expect("dest_has_blobs implies SupportsBlobs");
    let staging_dir = dest_blobs.temporary_directory()?;
    let staged = StagedBlob::copy_from(&staging_dir, source_blob_path)?;
    let staged_path = staged.path().to_path_buf();

    if caps.dest_restores_blobs {
        let dest_blobs = destination
            .as_supports_blobs_mut()
            .and_then(|b| b.as_supports_blob_restore())
            .expect("dest_restores_blobs implies SupportsBlobRestore");
        dest_blobs.restore_blob(
            record.oid,
            record.tid,
            &record.data,
            &staged_path,
            record.data_txn,
            txn,
        )?;
    } else {
        let prev_serial = preindex.get(&record.oid);
        let dest_blobs = destination
            .as_supports_blobs_mut()
            .expect("dest_has_blobs implies SupportsBlobs");
        dest_blobs.store_blob(record.oid, prev_serial, &record.data, &staged_path, txn)?;
        preindex.set(record.oid, provisional_tid);
    }
    // The destination call above is expected to have consumed (renamed
    // away) the staged file on success; forget it so `StagedBlob`'s drop
    // doesn't try to unlink a path the backend already moved. On error
    // the `?` above already returned, so this line never runs and the
    // drop below cleans up the still-present staging file.
    staged.forget();

    Ok(byte_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::file::FileStorage;
    use crate::backends::memory::MemoryStorage;
    use crate::record::{Record, TxnStatus};

    fn txn(tid: u64, user: &[u8], records: Vec<Record>) -> TransactionEntry {
        TransactionEntry {
            tid: Tid::from(tid),
            status: TxnStatus::Normal,
            user: user.to_vec(),
            description: Vec::new(),
            extension: Vec::new(),
            records,
        }
    }

    fn seed(source: &mut FileStorage, tid: u64, oid: u64, data: &[u8]) {
        let t = txn(tid, b"seed", vec![Record {
            oid: crate::oid::Oid::from(oid),
            tid: Tid::from(tid),
            data: data.to_vec(),
            data_txn: None,
        }]);
        source
            .tpc_begin(&t, Some((Tid::from(tid), TxnStatus::Normal.as_byte())))
            .unwrap();
        source
            .restore(crate::oid::Oid::from(oid), Tid::from(tid), data, None, &t)
            .unwrap();
        source.tpc_vote(&t).unwrap();
        source.tpc_finish(&t).unwrap();
    }

    #[test]
    fn empty_source_copies_nothing() {
        let source = MemoryStorage::new();
        let mut dest = MemoryStorage::new();
        let stats = copy(&source, &mut dest, None, false, default_is_blob_record, None).unwrap();
        assert_eq!(stats, CopyStats::default());
    }

    #[test]
    fn restore_path_preserves_source_tids() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = FileStorage::open(dir.path().join("src")).unwrap();
        seed(&mut source, 10, 1, b"value1");
        seed(&mut source, 11, 2, b"value2");

        let dest_dir = tempfile::tempdir().unwrap();
        let mut dest = FileStorage::open(dest_dir.path()).unwrap();

        let stats = copy(&source, &mut dest, None, false, default_is_blob_record, None).unwrap();
        assert_eq!(stats.txn_count, 2);
        assert_eq!(dest.last_transaction().unwrap(), Some(Tid::from(11u64)));
    }

    #[test]
    fn dry_run_leaves_destination_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = FileStorage::open(dir.path().join("src")).unwrap();
        seed(&mut source, 1, 1, b"value1");

        let dest_dir = tempfile::tempdir().unwrap();
        let mut dest = FileStorage::open(dest_dir.path()).unwrap();

        let stats = copy(&source, &mut dest, None, true, default_is_blob_record, None).unwrap();
        assert_eq!(stats.txn_count, 1);
        assert_eq!(dest.last_transaction().unwrap(), None);
    }

    #[test]
    fn store_path_used_when_destination_lacks_restore() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = FileStorage::open(dir.path().join("src")).unwrap();
        seed(&mut source, 1, 1, b"value1");
        seed(&mut source, 2, 2, b"value2");

        let mut dest = MemoryStorage::new();
        let stats = copy(&source, &mut dest, None, false, default_is_blob_record, None).unwrap();
        assert_eq!(stats.txn_count, 2);
        assert_eq!(dest.read(crate::oid::Oid::from(1u64)), Some(b"value1".to_vec()));
        assert_eq!(dest.read(crate::oid::Oid::from(2u64)), Some(b"value2".to_vec()));
    }

    #[test]
    fn incremental_copy_only_adds_new_transactions() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = FileStorage::open(dir.path().join("src")).unwrap();
        seed(&mut source, 1, 1, b"value1");
        seed(&mut source, 2, 2, b"value2");

        let dest_dir = tempfile::tempdir().unwrap();
        let mut dest = FileStorage::open(dest_dir.path()).unwrap();
        copy(&source, &mut dest, None, false, default_is_blob_record, None).unwrap();

        seed(&mut source, 3, 3, b"value3");
        let start = crate::cursor::incremental_start(&dest).unwrap();
        let stats = copy(&source, &mut dest, start, false, default_is_blob_record, None).unwrap();
        assert_eq!(stats.txn_count, 1);
        assert_eq!(dest.last_transaction().unwrap(), Some(Tid::from(3u64)));
    }
}
