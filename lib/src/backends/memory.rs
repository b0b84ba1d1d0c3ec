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

//! An in-process reference backend with no restore or blob capability,
//! analogous to a plain in-memory mapping storage: useful as a minimal
//! source/destination for tests and as the simplest worked example of
//! the storage traits.

use std::sync::Mutex;

use crate::backend::{DestinationStorage, SourceStorage, Storage, TransactionIterator};
use crate::error::BackendError;
use crate::oid::Oid;
use crate::record::{Record, TransactionEntry, TxnStatus};
use crate::tid::Tid;

#[derive(Debug, Default)]
pub struct MemoryStorage {
    transactions: Mutex<Vec<TransactionEntry>>,
    next_tid: Mutex<u64>,
    pending: Mutex<Option<PendingTxn>>,
}

#[derive(Debug)]
struct PendingTxn {
    tid: Tid,
    status: TxnStatus,
    user: Vec<u8>,
    description: Vec<u8>,
    extension: Vec<u8>,
    records: Vec<Record>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test-only helper: makes this storage behave as though a
    /// transaction with the given TID was already committed, without
    /// going through the commit protocol.
    #[cfg(test)]
    pub fn seed_committed_tid(&mut self, tid: Tid) {
        self.transactions.get_mut().unwrap().push(TransactionEntry {
            tid,
            status: TxnStatus::Normal,
            user: Vec::new(),
            description: Vec::new(),
            extension: Vec::new(),
            records: Vec::new(),
        });
    }

    /// Returns the data most recently stored for `oid`, if any.
    pub fn read(&self, oid: Oid) -> Option<Vec<u8>> {
        let txns = self.transactions.lock().unwrap();
        txns.iter()
            .rev()
            .flat_map(|t| t.records.iter())
            .find(|r| r.oid == oid)
            .map(|r| r.data.clone())
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.lock().unwrap().len()
    }
}

struct MemoryIterator {
    remaining: std::vec::IntoIter<TransactionEntry>,
}

impl TransactionIterator for MemoryIterator {
    fn next_transaction(&mut self) -> Result<Option<TransactionEntry>, BackendError> {
        Ok(self.remaining.next())
    }

    fn close(&mut self) -> Result<(), BackendError> {
        Ok(())
    }
}

impl Storage for MemoryStorage {
    fn last_transaction(&self) -> Result<Option<Tid>, BackendError> {
        Ok(self.transactions.lock().unwrap().last().map(|t| t.tid))
    }

    fn close(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

impl SourceStorage for MemoryStorage {
    fn iterator(
        &self,
        start: Option<Tid>,
    ) -> Result<Box<dyn TransactionIterator + '_>, BackendError> {
        let txns = self.transactions.lock().unwrap();
        let filtered: Vec<TransactionEntry> = txns
            .iter()
            .filter(|t| start.is_none_or(|s| t.tid >= s))
            .cloned()
            .collect();
        Ok(Box::new(MemoryIterator {
            remaining: filtered.into_iter(),
        }))
    }
}

impl DestinationStorage for MemoryStorage {
    fn tpc_begin(
        &mut self,
        txn: &TransactionEntry,
        _tid_and_status: Option<(Tid, u8)>,
    ) -> Result<(), BackendError> {
        let mut next_tid = self.next_tid.lock().unwrap();
        if *next_tid == 0 {
            *next_tid = self
                .transactions
                .lock()
                .unwrap()
                .last()
                .map(|t| t.tid.successor().to_u64())
                .unwrap_or(1);
        }
        let tid = Tid::from(*next_tid);
        *next_tid += 1;
        *self.pending.lock().unwrap() = Some(PendingTxn {
            tid,
            status: txn.status,
            user: txn.user.clone(),
            description: txn.description.clone(),
            extension: txn.extension.clone(),
            records: Vec::new(),
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
        let mut pending = self.pending.lock().unwrap();
        let pending = pending.as_mut().expect("store called outside tpc_begin/tpc_finish");
        pending.records.push(Record {
            oid,
            tid: pending.tid,
            data: data.to_vec(),
            data_txn: None,
        });
        Ok(())
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
        let tid = pending.tid;
        self.transactions.lock().unwrap().push(TransactionEntry {
            tid,
            status: pending.status,
            user: pending.user,
            description: pending.description,
            extension: pending.extension,
            records: pending.records,
        });
        Ok(tid)
    }

    fn tpc_abort(&mut self, _txn: &TransactionEntry) -> Result<(), BackendError> {
        *self.pending.lock().unwrap() = None;
        Ok(())
    }

    fn current_tid_hint(&self) -> Option<Tid> {
        self.pending.lock().unwrap().as_ref().map(|p| p.tid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TransactionEntry;

    fn entry(records: Vec<Record>) -> TransactionEntry {
        TransactionEntry {
            tid: Tid::ZERO,
            status: TxnStatus::Normal,
            user: b"tester".to_vec(),
            description: b"desc".to_vec(),
            extension: Vec::new(),
            records,
        }
    }

    #[test]
    fn store_path_assigns_destination_tids_and_is_readable() {
        let mut dest = MemoryStorage::new();
        let oid = Oid::from(1u64);
        let txn = entry(vec![Record {
            oid,
            tid: Tid::from(99u64),
            data: b"value".to_vec(),
            data_txn: None,
        }]);
        dest.tpc_begin(&txn, None).unwrap();
        dest.store(oid, None, b"value", &txn).unwrap();
        dest.tpc_vote(&txn).unwrap();
        let committed = dest.tpc_finish(&txn).unwrap();
        assert_eq!(dest.last_transaction().unwrap(), Some(committed));
        assert_eq!(dest.read(oid), Some(b"value".to_vec()));
    }

    #[test]
    fn iterator_respects_start_tid() {
        let mut storage = MemoryStorage::new();
        for _ in 1..=3u64 {
            let txn = entry(vec![]);
            storage.tpc_begin(&txn, None).unwrap();
            storage.tpc_vote(&txn).unwrap();
            storage.tpc_finish(&txn).unwrap();
        }
        let mut it = storage.iterator(Some(Tid::from(2u64))).unwrap();
        let mut count = 0;
        while it.next_transaction().unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 2);
    }
}
