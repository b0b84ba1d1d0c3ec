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

//! End-to-end scenarios from SPEC_FULL.md §8.

use std::fs;

use odbcopy_lib::backend::{
    DestinationStorage, SourceStorage, Storage, SupportsBlobRestore, SupportsBlobs,
    SupportsRestore,
};
use odbcopy_lib::backends::file::FileStorage;
use odbcopy_lib::backends::memory::MemoryStorage;
use odbcopy_lib::engine::{copy, default_is_blob_record, DEFAULT_BLOB_MARKER};
use odbcopy_lib::record::{Record, TransactionEntry, TxnStatus};
use odbcopy_lib::stage::StagedBlob;
use odbcopy_lib::{Oid, Tid};

fn plain_txn(tid: u64, user: &[u8], oid: u64, data: &[u8]) -> TransactionEntry {
    TransactionEntry {
        tid: Tid::from(tid),
        status: TxnStatus::Normal,
        user: user.to_vec(),
        description: Vec::new(),
        extension: Vec::new(),
        records: vec![Record {
            oid: Oid::from(oid),
            tid: Tid::from(tid),
            data: data.to_vec(),
            data_txn: None,
        }],
    }
}

fn seed_plain(storage: &mut FileStorage, tid: u64, user: &[u8], oid: u64, data: &[u8]) {
    let txn = plain_txn(tid, user, oid, data);
    storage
        .tpc_begin(&txn, Some((Tid::from(tid), TxnStatus::Normal.as_byte())))
        .unwrap();
    storage
        .restore(Oid::from(oid), Tid::from(tid), data, None, &txn)
        .unwrap();
    storage.tpc_vote(&txn).unwrap();
    storage.tpc_finish(&txn).unwrap();
}

fn seed_blob(storage: &mut FileStorage, tid: u64, user: &[u8], oid: u64, blob_bytes: &[u8]) {
    let mut data = DEFAULT_BLOB_MARKER.to_vec();
    data.extend_from_slice(b"blob-record");
    let txn = plain_txn(tid, user, oid, &data);
    storage
        .tpc_begin(&txn, Some((Tid::from(tid), TxnStatus::Normal.as_byte())))
        .unwrap();

    let staging_dir = storage.temporary_directory().unwrap();
    let source_file = staging_dir.join("seed-source");
    fs::write(&source_file, blob_bytes).unwrap();
    let staged = StagedBlob::copy_from(&staging_dir, &source_file).unwrap();
    let staged_path = staged.path().to_path_buf();
    storage
        .restore_blob(Oid::from(oid), Tid::from(tid), &data, &staged_path, None, &txn)
        .unwrap();
    staged.forget();
    fs::remove_file(&source_file).ok();

    storage.tpc_vote(&txn).unwrap();
    storage.tpc_finish(&txn).unwrap();
}

#[test]
fn scenario_empty_source_copies_nothing() {
    let source = MemoryStorage::new();
    let mut dest = MemoryStorage::new();
    let stats = copy(&source, &mut dest, None, false, default_is_blob_record, None).unwrap();
    assert_eq!(stats.txn_count, 0);
    assert_eq!(stats.obj_count, 0);
    assert_eq!(stats.blob_count, 0);
}

#[test]
fn scenario_three_transactions_with_blob_copy_bit_exact() {
    let src_dir = tempfile::tempdir().unwrap();
    let mut source = FileStorage::open(src_dir.path().join("src")).unwrap();
    seed_plain(&mut source, 1, b"user1", 1, b"value1");
    seed_plain(&mut source, 2, b"user2", 3, b"nested-value");
    seed_blob(&mut source, 3, b"user3", 99, b"Hello, blob world!");

    let dest_dir = tempfile::tempdir().unwrap();
    let mut dest = FileStorage::open(dest_dir.path()).unwrap();

    let stats = copy(&source, &mut dest, None, false, default_is_blob_record, None).unwrap();
    assert_eq!(stats.txn_count, 3);
    assert_eq!(stats.blob_count, 1);
    assert_eq!(dest.last_transaction().unwrap(), Some(Tid::from(3u64)));

    let blob_path = dest.load_blob(Oid::from(99u64), Tid::from(3u64)).unwrap();
    assert_eq!(fs::read(blob_path).unwrap(), b"Hello, blob world!");
}

#[test]
fn scenario_dry_run_counts_without_writing() {
    let src_dir = tempfile::tempdir().unwrap();
    let mut source = FileStorage::open(src_dir.path().join("src")).unwrap();
    seed_plain(&mut source, 1, b"user1", 1, b"value1");
    seed_plain(&mut source, 2, b"user2", 2, b"value2");
    seed_blob(&mut source, 3, b"user3", 99, b"Hello, blob world!");

    let dest_dir = tempfile::tempdir().unwrap();
    let mut dest = FileStorage::open(dest_dir.path()).unwrap();

    let stats = copy(&source, &mut dest, None, true, default_is_blob_record, None).unwrap();
    assert_eq!(stats.txn_count, 3);
    assert_eq!(dest.last_transaction().unwrap(), None);
}

#[test]
fn scenario_incremental_copy_adds_only_new_transaction() {
    let src_dir = tempfile::tempdir().unwrap();
    let mut source = FileStorage::open(src_dir.path().join("src")).unwrap();
    seed_plain(&mut source, 1, b"user1", 1, b"value1");
    seed_plain(&mut source, 2, b"user2", 2, b"value2");

    let dest_dir = tempfile::tempdir().unwrap();
    let mut dest = FileStorage::open(dest_dir.path()).unwrap();
    copy(&source, &mut dest, None, false, default_is_blob_record, None).unwrap();

    seed_plain(&mut source, 3, b"user3", 3, b"value3");
    let start = odbcopy_lib::cursor::incremental_start(&dest).unwrap();
    let stats = copy(&source, &mut dest, start, false, default_is_blob_record, None).unwrap();
    assert_eq!(stats.txn_count, 1);
    assert_eq!(dest.last_transaction().unwrap(), Some(Tid::from(3u64)));
}

#[test]
fn scenario_no_restore_no_blobs_between_memory_backends() {
    let mut source = MemoryStorage::new();
    let txn = plain_txn(1, b"user1", 1, b"value");
    source.tpc_begin(&txn, None).unwrap();
    source.store(Oid::from(1u64), None, b"value", &txn).unwrap();
    source.tpc_vote(&txn).unwrap();
    source.tpc_finish(&txn).unwrap();

    let mut dest = MemoryStorage::new();
    let stats = copy(&source, &mut dest, None, false, default_is_blob_record, None).unwrap();
    assert_eq!(stats.txn_count, 1);
    assert_eq!(dest.read(Oid::from(1u64)), Some(b"value".to_vec()));
}

#[test]
fn scenario_dest_without_blob_capability_drops_blob_transfer() {
    let src_dir = tempfile::tempdir().unwrap();
    let mut source = FileStorage::open(src_dir.path().join("src")).unwrap();
    seed_plain(&mut source, 1, b"user1", 1, b"value1");
    seed_blob(&mut source, 2, b"user2", 99, b"blob bytes");

    let mut dest = MemoryStorage::new();
    let stats = copy(&source, &mut dest, None, false, default_is_blob_record, None).unwrap();
    assert_eq!(stats.txn_count, 2);
    assert_eq!(stats.blob_count, 0);
    assert_eq!(dest.read(Oid::from(1u64)), Some(b"value1".to_vec()));
}
