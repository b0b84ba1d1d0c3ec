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

//! End-to-end CLI tests: drive the `odbcopy` binary the way an operator
//! would, via `assert_cmd`, against declarative config files pointing at
//! real [`FileStorage`] directories.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use odbcopy_lib::backend::{DestinationStorage, Storage, SupportsRestore};
use odbcopy_lib::backends::file::FileStorage;
use odbcopy_lib::record::{Record, TransactionEntry, TxnStatus};
use odbcopy_lib::{Oid, Tid};

fn odbcopy() -> Command {
    Command::cargo_bin("odbcopy").unwrap()
}

fn write_config(dir: &Path, source_path: &Path, dest_path: &Path) -> std::path::PathBuf {
    let config_path = dir.join("odbcopy.conf");
    fs::write(
        &config_path,
        format!(
            "<source>\n  <filestorage>\n    path {}\n  </filestorage>\n</source>\n\n<destination>\n  <filestorage>\n    path {}\n  </filestorage>\n</destination>\n",
            source_path.display(),
            dest_path.display(),
        ),
    )
    .unwrap();
    config_path
}

fn seed(storage: &mut FileStorage, tid: u64, oid: u64, data: &[u8]) {
    let txn = TransactionEntry {
        tid: Tid::from(tid),
        status: TxnStatus::Normal,
        user: b"seeder".to_vec(),
        description: Vec::new(),
        extension: Vec::new(),
        records: vec![Record {
            oid: Oid::from(oid),
            tid: Tid::from(tid),
            data: data.to_vec(),
            data_txn: None,
        }],
    };
    storage
        .tpc_begin(&txn, Some((Tid::from(tid), TxnStatus::Normal.as_byte())))
        .unwrap();
    storage
        .restore(Oid::from(oid), Tid::from(tid), data, None, &txn)
        .unwrap();
    storage.tpc_vote(&txn).unwrap();
    storage.tpc_finish(&txn).unwrap();
}

#[test]
fn copies_every_transaction_from_source_to_destination() {
    let workdir = tempfile::tempdir().unwrap();
    let source_path = workdir.path().join("source");
    let dest_path = workdir.path().join("dest");

    let mut source = FileStorage::open(&source_path).unwrap();
    seed(&mut source, 1, 1, b"value1");
    seed(&mut source, 2, 2, b"value2");
    source.close().unwrap();

    let config_path = write_config(workdir.path(), &source_path, &dest_path);

    odbcopy()
        .arg(&config_path)
        .assert()
        .success();

    let dest = FileStorage::open(&dest_path).unwrap();
    assert_eq!(dest.last_transaction().unwrap(), Some(Tid::from(2u64)));
}

#[test]
fn dry_run_leaves_destination_directory_empty_of_transactions() {
    let workdir = tempfile::tempdir().unwrap();
    let source_path = workdir.path().join("source");
    let dest_path = workdir.path().join("dest");

    let mut source = FileStorage::open(&source_path).unwrap();
    seed(&mut source, 1, 1, b"value1");
    source.close().unwrap();

    let config_path = write_config(workdir.path(), &source_path, &dest_path);

    odbcopy()
        .arg(&config_path)
        .arg("--dry-run")
        .assert()
        .success();

    let dest = FileStorage::open(&dest_path).unwrap();
    assert_eq!(dest.last_transaction().unwrap(), None);
}

#[test]
fn incremental_flag_only_copies_transactions_committed_since_last_run() {
    let workdir = tempfile::tempdir().unwrap();
    let source_path = workdir.path().join("source");
    let dest_path = workdir.path().join("dest");

    let mut source = FileStorage::open(&source_path).unwrap();
    seed(&mut source, 1, 1, b"value1");
    source.close().unwrap();

    let config_path = write_config(workdir.path(), &source_path, &dest_path);
    odbcopy().arg(&config_path).assert().success();

    let mut source = FileStorage::open(&source_path).unwrap();
    seed(&mut source, 2, 2, b"value2");
    source.close().unwrap();

    odbcopy()
        .arg(&config_path)
        .arg("--incremental")
        .assert()
        .success();

    let dest = FileStorage::open(&dest_path).unwrap();
    assert_eq!(dest.last_transaction().unwrap(), Some(Tid::from(2u64)));
}

#[test]
fn verbose_flag_emits_per_transaction_log_lines_on_stderr() {
    let workdir = tempfile::tempdir().unwrap();
    let source_path = workdir.path().join("source");
    let dest_path = workdir.path().join("dest");

    let mut source = FileStorage::open(&source_path).unwrap();
    seed(&mut source, 1, 1, b"value1");
    source.close().unwrap();

    let config_path = write_config(workdir.path(), &source_path, &dest_path);

    let output = odbcopy()
        .arg(&config_path)
        .arg("-v")
        .assert()
        .success()
        .get_output()
        .clone();
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("tid"), "expected per-transaction logging, got: {stderr}");
}

#[test]
fn missing_source_and_destination_exits_with_config_error_code() {
    let workdir = tempfile::tempdir().unwrap();
    let config_path = workdir.path().join("odbcopy.conf");
    fs::write(&config_path, "").unwrap();

    odbcopy()
        .arg(&config_path)
        .assert()
        .failure()
        .code(1);
}

#[test]
fn nonexistent_config_file_exits_with_config_error_code() {
    odbcopy()
        .arg("/nonexistent/odbcopy.conf")
        .assert()
        .failure()
        .code(1);
}
