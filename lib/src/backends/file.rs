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

//! A file-backed reference backend with full restore and blob-restore
//! capability, analogous to a simple append-only file storage with a
//! side directory for blobs.
//!
//! Layout on disk, rooted at the path given to [`FileStorage::open`]:
//! `txns/<tid-hex>/meta` and `txns/<tid-hex>/records/<n>.rec` hold
//! transaction metadata and record payloads; `blobs/<oid-hex>-<tid-hex>`
//! holds blob contents; `stage/` is the staging directory handed out by
//! [`SupportsBlobs::temporary_directory`]. Each transaction is written to
//! a `txns/.tmp-<tid-hex>` staging directory during two-phase commit and
//! renamed into place atomically on `tpc_finish`, the same
//! stage-then-rename shape the library uses for blob staging.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::backend::{
    DestinationStorage, SourceStorage, Storage, SupportsBlobRestore, SupportsBlobs,
    SupportsRestore, TransactionIterator,
};
use crate::error::BackendError;
use crate::oid::Oid;
use crate::record::{Record, TransactionEntry, TxnStatus};
use crate::tid::Tid;

#[derive(Debug)]
pub struct FileStorage {
    root: PathBuf,
    pending: Mutex<Option<PendingTxn>>,
}

#[derive(Debug)]
struct PendingTxn {
    tid: Tid,
    status: TxnStatus,
    user: Vec<u8>,
    description: Vec<u8>,
    extension: Vec<u8>,
    stage_dir: PathBuf,
    record_count: usize,
}

fn io_err(path: &Path, source: std::io::Error) -> BackendError {
    BackendError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn tid_hex(tid: Tid) -> String {
    tid.to_string()
}

fn oid_hex(oid: Oid) -> String {
    oid.to_string()
}

fn write_len_prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u64).to_be_bytes());
    out.extend_from_slice(bytes);
}

fn read_len_prefixed(cursor: &mut &[u8]) -> Option<Vec<u8>> {
    if cursor.len() < 8 {
        return None;
    }
    let (len_bytes, rest) = cursor.split_at(8);
    let len = u64::from_be_bytes(len_bytes.try_into().ok()?) as usize;
    if rest.len() < len {
        return None;
    }
    let (data, rest) = rest.split_at(len);
    *cursor = rest;
    Some(data.to_vec())
}

impl FileStorage {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let root = root.into();
        for dir in ["txns", "blobs", "stage"] {
            let path = root.join(dir);
            fs::create_dir_all(&path).map_err(|e| io_err(&path, e))?;
        }
        Ok(Self {
            root,
            pending: Mutex::new(None),
        })
    }

    fn txns_dir(&self) -> PathBuf {
        self.root.join("txns")
    }

    fn txn_dir(&self, tid: Tid) -> PathBuf {
        self.txns_dir().join(tid_hex(tid))
    }

    fn blob_path(&self, oid: Oid, tid: Tid) -> PathBuf {
        self.root
            .join("blobs")
            .join(format!("{}-{}", oid_hex(oid), tid_hex(tid)))
    }

    fn committed_tids(&self) -> Result<Vec<Tid>, BackendError> {
        let dir = self.txns_dir();
        let mut tids = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| io_err(&dir, e))? {
            let entry = entry.map_err(|e| io_err(&dir, e))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') {
                continue;
            }
            if let Some(bytes) = hex_to_bytes8(&name) {
                tids.push(Tid::new(bytes));
            }
        }
        tids.sort();
        Ok(tids)
    }

    fn read_transaction(&self, tid: Tid) -> Result<TransactionEntry, BackendError> {
        let dir = self.txn_dir(tid);
        let meta_path = dir.join("meta");
        let mut buf = Vec::new();
        fs::File::open(&meta_path)
            .and_then(|mut f| f.read_to_end(&mut buf))
            .map_err(|e| io_err(&meta_path, e))?;
        let mut cursor: &[u8] = &buf;
        let status = cursor.first().copied().unwrap_or(b' ');
        cursor = &cursor[1..];
        let user = read_len_prefixed(&mut cursor).unwrap_or_default();
        let description = read_len_prefixed(&mut cursor).unwrap_or_default();
        let extension = read_len_prefixed(&mut cursor).unwrap_or_default();

        let records_dir = dir.join("records");
        let mut record_files: Vec<PathBuf> = fs::read_dir(&records_dir)
            .map_err(|e| io_err(&records_dir, e))?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .collect();
        record_files.sort();

        let mut records = Vec::with_capacity(record_files.len());
        for path in record_files {
            let mut bytes = Vec::new();
            fs::File::open(&path)
                .and_then(|mut f| f.read_to_end(&mut bytes))
                .map_err(|e| io_err(&path, e))?;
            let mut cursor: &[u8] = &bytes;
            let oid_bytes = read_len_prefixed(&mut cursor).ok_or_else(|| {
                BackendError::Commit(format!("corrupt record file {}", path.display()))
            })?;
            let oid = Oid::from_bytes(&oid_bytes).ok_or_else(|| {
                BackendError::Commit(format!("corrupt oid in {}", path.display()))
            })?;
            let data_txn_bytes = read_len_prefixed(&mut cursor).unwrap_or_default();
            let data_txn = Tid::from_bytes(&data_txn_bytes);
            let data = read_len_prefixed(&mut cursor).unwrap_or_default();
            records.push(Record {
                oid,
                tid,
                data,
                data_txn,
            });
        }

        Ok(TransactionEntry {
            tid,
            status: TxnStatus::from_byte(status),
            user,
            description,
            extension,
            records,
        })
    }

    fn pending_tid(&self) -> Tid {
        self.pending
            .lock()
            .unwrap()
            .as_ref()
            .expect("store/restore called outside tpc_begin/tpc_finish")
            .tid
    }

    fn write_record(&self, oid: Oid, data_txn: Option<Tid>, data: &[u8]) -> Result<(), BackendError> {
        let mut pending = self.pending.lock().unwrap();
        let pending = pending.as_mut().expect("write outside tpc_begin/tpc_finish");
        let records_dir = pending.stage_dir.join("records");
        let path = records_dir.join(format!("{:08}.rec", pending.record_count));
        pending.record_count += 1;

        let mut buf = Vec::new();
        write_len_prefixed(&mut buf, oid.as_bytes());
        write_len_prefixed(&mut buf, data_txn.map(|t| *t.as_bytes()).unwrap_or_default().as_slice());
        write_len_prefixed(&mut buf, data);
        fs::write(&path, buf).map_err(|e| io_err(&path, e))
    }
}

fn hex_to_bytes8(s: &str) -> Option<[u8; 8]> {
    if s.len() != 16 {
        return None;
    }
    let mut out = [0u8; 8];
    for i in 0..8 {
        out[i] = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(out)
}

struct FileIterator {
    storage_root: PathBuf,
    remaining: std::vec::IntoIter<Tid>,
}

impl TransactionIterator for FileIterator {
    fn next_transaction(&mut self) -> Result<Option<TransactionEntry>, BackendError> {
        let Some(tid) = self.remaining.next() else {
            return Ok(None);
        };
        let storage = FileStorage {
            root: self.storage_root.clone(),
            pending: Mutex::new(None),
        };
        storage.read_transaction(tid).map(Some)
    }

    fn close(&mut self) -> Result<(), BackendError> {
        Ok(())
    }
}

impl Storage for FileStorage {
    fn last_transaction(&self) -> Result<Option<Tid>, BackendError> {
        Ok(self.committed_tids()?.last().copied())
    }

    fn close(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

impl SourceStorage for FileStorage {
    fn iterator(
        &self,
        start: Option<Tid>,
    ) -> Result<Box<dyn TransactionIterator + '_>, BackendError> {
        let tids = self.committed_tids()?;
        let filtered: Vec<Tid> = tids
            .into_iter()
            .filter(|t| start.is_none_or(|s| *t >= s))
            .collect();
        Ok(Box::new(FileIterator {
            storage_root: self.root.clone(),
            remaining: filtered.into_iter(),
        }))
    }

    fn as_supports_blobs(&self) -> Option<&dyn SupportsBlobs> {
        Some(self)
    }
}

impl DestinationStorage for FileStorage {
    fn tpc_begin(
        &mut self,
        txn: &TransactionEntry,
        tid_and_status: Option<(Tid, u8)>,
    ) -> Result<(), BackendError> {
        let (tid, status) = match tid_and_status {
            Some((tid, status)) => (tid, status),
            None => {
                let next = self
                    .committed_tids()?
                    .last()
                    .map(|t| t.successor())
                    .unwrap_or_else(|| Tid::from(1u64));
                (next, txn.status.as_byte())
            }
        };
        let stage_dir = self.txns_dir().join(format!(".tmp-{}", tid_hex(tid)));
        if stage_dir.exists() {
            fs::remove_dir_all(&stage_dir).map_err(|e| io_err(&stage_dir, e))?;
        }
        fs::create_dir_all(stage_dir.join("records")).map_err(|e| io_err(&stage_dir, e))?;

        let mut meta = Vec::new();
        meta.push(status);
        write_len_prefixed(&mut meta, &txn.user);
        write_len_prefixed(&mut meta, &txn.description);
        write_len_prefixed(&mut meta, &txn.extension);
        fs::write(stage_dir.join("meta"), meta).map_err(|e| io_err(&stage_dir, e))?;

        *self.pending.lock().unwrap() = Some(PendingTxn {
            tid,
            status: TxnStatus::from_byte(status),
            user: txn.user.clone(),
            description: txn.description.clone(),
            extension: txn.extension.clone(),
            stage_dir,
            record_count: 0,
        });
        Ok(())
    }

    fn store(
        &mut self,
        oid: Oid,
        _prev_serial: Option<Tid>,
        data: &[u8],
        _txn: &TransactionEntry,
    ) -> Result<(), BackendError> {
        self.write_record(oid, None, data)
    }

    fn tpc_vote(&mut self, _txn: &TransactionEntry) -> Result<(), BackendError> {
        Ok(())
    }

    fn tpc_finish(&mut self, _txn: &TransactionEntry) -> Result<Tid, BackendError> {
        let pending = self
            .pending
            .lock()
            .unwrap()
            .take()
            .expect("tpc_finish called outside tpc_begin");
        let final_dir = self.txn_dir(pending.tid);
        fs::rename(&pending.stage_dir, &final_dir).map_err(|e| io_err(&final_dir, e))?;
        Ok(pending.tid)
    }

    fn tpc_abort(&mut self, _txn: &TransactionEntry) -> Result<(), BackendError> {
        if let Some(pending) = self.pending.lock().unwrap().take() {
            let _ = fs::remove_dir_all(&pending.stage_dir);
        }
        Ok(())
    }

    fn as_supports_blobs_mut(&mut self) -> Option<&mut dyn SupportsBlobs> {
        Some(self)
    }

    fn as_supports_restore(&mut self) -> Option<&mut dyn SupportsRestore> {
        Some(self)
    }

    fn current_tid_hint(&self) -> Option<Tid> {
        self.pending.lock().unwrap().as_ref().map(|p| p.tid)
    }
}

impl SupportsRestore for FileStorage {
    fn restore(
        &mut self,
        oid: Oid,
        tid: Tid,
        data: &[u8],
        data_txn: Option<Tid>,
        _txn: &TransactionEntry,
    ) -> Result<(), BackendError> {
        debug_assert_eq!(tid, self.pending_tid());
        self.write_record(oid, data_txn, data)
    }
}

impl SupportsBlobs for FileStorage {
    fn load_blob(&self, oid: Oid, tid: Tid) -> Result<PathBuf, BackendError> {
        let path = self.blob_path(oid, tid);
        if !path.exists() {
            return Err(BackendError::ObjectNotFound {
                oid: oid.to_string(),
                tid,
            });
        }
        Ok(path)
    }

    fn temporary_directory(&self) -> Result<PathBuf, BackendError> {
        let dir = self.root.join("stage");
        fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        Ok(dir)
    }

    fn store_blob(
        &mut self,
        oid: Oid,
        _prev_serial: Option<Tid>,
        data: &[u8],
        blob_path: &Path,
        _txn: &TransactionEntry,
    ) -> Result<(), BackendError> {
        let tid = self.pending_tid();
        let dest = self.blob_path(oid, tid);
        fs::rename(blob_path, &dest).map_err(|e| io_err(&dest, e))?;
        self.write_record(oid, None, data)
    }

    fn as_supports_blob_restore(&mut self) -> Option<&mut dyn SupportsBlobRestore> {
        Some(self)
    }
}

impl SupportsBlobRestore for FileStorage {
    fn restore_blob(
        &mut self,
        oid: Oid,
        tid: Tid,
        data: &[u8],
        blob_path: &Path,
        data_txn: Option<Tid>,
        _txn: &TransactionEntry,
    ) -> Result<(), BackendError> {
        debug_assert_eq!(tid, self.pending_tid());
        let dest = self.blob_path(oid, tid);
        fs::rename(blob_path, &dest).map_err(|e| io_err(&dest, e))?;
        self.write_record(oid, data_txn, data)
    }
}
