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

//! Transaction and record types copied between storages.

use std::collections::HashMap;

use crate::oid::Oid;
use crate::tid::Tid;

/// Status of a transaction, mirroring the source storage's own marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnStatus {
    /// Normal, fully committed transaction.
    Normal,
    /// Transaction packed away (data no longer available).
    Packed,
    /// Checkpoint transaction.
    Checkpoint,
}

impl TxnStatus {
    pub fn as_byte(&self) -> u8 {
        match self {
            Self::Normal => b' ',
            Self::Packed => b'p',
            Self::Checkpoint => b'c',
        }
    }

    pub fn from_byte(b: u8) -> Self {
        match b {
            b'p' => Self::Packed,
            b'c' => Self::Checkpoint,
            _ => Self::Normal,
        }
    }
}

/// A single object revision within a transaction.
#[derive(Debug, Clone)]
pub struct Record {
    pub oid: Oid,
    pub tid: Tid,
    pub data: Vec<u8>,
    /// Cross-reference TID for undo metadata, copied verbatim.
    pub data_txn: Option<Tid>,
}

impl Record {
    /// Whether this record's payload marks it as a blob pointer rather than
    /// plain object data. Backends encode this however they like; the
    /// engine treats the predicate as opaque.
    pub fn is_blob_record(&self, is_blob: impl Fn(&[u8]) -> bool) -> bool {
        is_blob(&self.data)
    }
}

/// One committed (or in-progress, on the source side, never surfaced)
/// transaction: metadata plus its ordered records.
#[derive(Debug, Clone)]
pub struct TransactionEntry {
    pub tid: Tid,
    pub status: TxnStatus,
    pub user: Vec<u8>,
    pub description: Vec<u8>,
    pub extension: Vec<u8>,
    pub records: Vec<Record>,
}

impl TransactionEntry {
    pub fn byte_size(&self) -> usize {
        self.records.iter().map(|r| r.data.len()).sum()
    }
}

/// Per-run `OID -> TID` map used on the non-restore path to satisfy the
/// destination's `prev_serial` concurrency check.
#[derive(Debug, Default)]
pub struct Preindex {
    entries: HashMap<Oid, Tid>,
}

impl Preindex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, oid: &Oid) -> Option<Tid> {
        self.entries.get(oid).copied()
    }

    pub fn set(&mut self, oid: Oid, tid: Tid) {
        self.entries.insert(oid, tid);
    }

    /// Rewrites every entry currently holding `provisional` to `committed`.
    /// Called once per transaction, after `tpc_finish` returns the real
    /// committed TID on the non-restore path.
    pub fn promote(&mut self, provisional: Tid, committed: Tid) {
        for tid in self.entries.values_mut() {
            if *tid == provisional {
                *tid = committed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preindex_promotes_matching_provisional_entries() {
        let mut idx = Preindex::new();
        idx.set(Oid::from(1u64), Tid::from(100u64));
        idx.set(Oid::from(2u64), Tid::from(200u64));
        idx.promote(Tid::from(100u64), Tid::from(101u64));
        assert_eq!(idx.get(&Oid::from(1u64)), Some(Tid::from(101u64)));
        assert_eq!(idx.get(&Oid::from(2u64)), Some(Tid::from(200u64)));
    }

    #[test]
    fn txn_status_round_trips_through_byte() {
        for s in [TxnStatus::Normal, TxnStatus::Packed, TxnStatus::Checkpoint] {
            assert_eq!(TxnStatus::from_byte(s.as_byte()), s);
        }
    }
}
