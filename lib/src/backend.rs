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

//! Storage interface: the capability-gated contract every backend
//! implements, and the narrow optional sub-traits reached through
//! accessor methods.
//!
//! Backends are identified by *capability*, never by concrete type: the
//! engine only ever calls [`SourceStorage`]/[`DestinationStorage`] plus
//! whichever of [`SupportsRestore`], [`SupportsBlobs`], and
//! [`SupportsBlobRestore`] the `as_supports_*` accessors return. Each
//! accessor defaults to `None` and is overridden to `Some(self)` by the
//! backends that implement the corresponding sub-trait; see
//! [`crate::capabilities`] for the probe that exercises it.

use std::any::Any;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

use crate::error::BackendError;
use crate::oid::Oid;
use crate::record::TransactionEntry;
use crate::tid::Tid;

/// A lazy, self-closing sequence of committed transactions in ascending
/// TID order. Implementations may hold open file handles or cursors;
/// [`close`](Self::close) must release them.
pub trait TransactionIterator {
    fn next_transaction(&mut self) -> Result<Option<TransactionEntry>, BackendError>;
    fn close(&mut self) -> Result<(), BackendError>;
}

/// Shared surface every storage exposes regardless of which role
/// (source or destination) it is used in. Split out of
/// [`SourceStorage`]/[`DestinationStorage`] so a backend implementing
/// both roles (as the reference backends do) defines `last_transaction`
/// and `close` exactly once instead of twice under the same name.
pub trait Storage: Any + Debug {
    /// The largest tid ever committed, or `None` if the storage is empty.
    fn last_transaction(&self) -> Result<Option<Tid>, BackendError>;

    fn close(&self) -> Result<(), BackendError>;
}

/// Mandatory read side of a storage used as a copy source.
pub trait SourceStorage: Storage {
    /// Transactions with tid >= `start` (or all, if `start` is `None`), in
    /// ascending order.
    fn iterator(
        &self,
        start: Option<Tid>,
    ) -> Result<Box<dyn TransactionIterator + '_>, BackendError>;

    /// Exposes the blob sub-contract, if this backend implements it.
    ///
    /// Backends that implement [`SupportsBlobs`] override this to return
    /// `Some(self)`; the default `None` means "no blob capability". The
    /// engine decides which code path to take purely from this (and the
    /// analogous destination accessors), never from the backend's
    /// concrete type.
    fn as_supports_blobs(&self) -> Option<&dyn SupportsBlobs> {
        None
    }
}

/// Mandatory write side of a storage used as a copy destination: the
/// two-phase commit protocol.
pub trait DestinationStorage: Storage {
    fn tpc_begin(
        &mut self,
        txn: &TransactionEntry,
        tid_and_status: Option<(Tid, u8)>,
    ) -> Result<(), BackendError>;

    /// Regular write, subject to a concurrency check against `prev_serial`.
    fn store(
        &mut self,
        oid: Oid,
        prev_serial: Option<Tid>,
        data: &[u8],
        txn: &TransactionEntry,
    ) -> Result<(), BackendError>;

    fn tpc_vote(&mut self, txn: &TransactionEntry) -> Result<(), BackendError>;

    /// Finalizes the transaction, returning the TID actually committed.
    fn tpc_finish(&mut self, txn: &TransactionEntry) -> Result<Tid, BackendError>;

    fn tpc_abort(&mut self, txn: &TransactionEntry) -> Result<(), BackendError>;

    /// The TID this backend has provisionally assigned to the
    /// transaction currently open between `tpc_begin` and `tpc_finish`,
    /// if it assigns its own (i.e. on the non-restore path). Used by the
    /// engine to key the preindex before the real committed TID is known.
    fn current_tid_hint(&self) -> Option<Tid> {
        None
    }

    /// See [`SourceStorage::as_supports_blobs`].
    fn as_supports_blobs_mut(&mut self) -> Option<&mut dyn SupportsBlobs> {
        None
    }

    /// Exposes the restore sub-contract, if this backend implements it.
    fn as_supports_restore(&mut self) -> Option<&mut dyn SupportsRestore> {
        None
    }
}

/// Optional capability: destination accepts a caller-chosen TID bit-exactly.
pub trait SupportsRestore: DestinationStorage {
    fn restore(
        &mut self,
        oid: Oid,
        tid: Tid,
        data: &[u8],
        data_txn: Option<Tid>,
        txn: &TransactionEntry,
    ) -> Result<(), BackendError>;
}

/// Optional capability: storage can read/stage blob payloads.
pub trait SupportsBlobs {
    /// Path to a file whose bytes are the blob payload for `(oid, tid)` on
    /// a source, or a writable staging directory on a destination.
    fn load_blob(&self, oid: Oid, tid: Tid) -> Result<PathBuf, BackendError>;

    fn temporary_directory(&self) -> Result<PathBuf, BackendError>;

    /// Fallback blob write path, subject to the same concurrency check as
    /// [`DestinationStorage::store`].
    fn store_blob(
        &mut self,
        oid: Oid,
        prev_serial: Option<Tid>,
        data: &[u8],
        blob_path: &Path,
        txn: &TransactionEntry,
    ) -> Result<(), BackendError>;

    /// Exposes the blob-restore sub-contract, if implemented.
    fn as_supports_blob_restore(&mut self) -> Option<&mut dyn SupportsBlobRestore> {
        None
    }
}

/// Optional capability: destination accepts a caller-chosen TID for a blob
/// write bit-exactly.
pub trait SupportsBlobRestore: SupportsBlobs {
    fn restore_blob(
        &mut self,
        oid: Oid,
        tid: Tid,
        data: &[u8],
        blob_path: &Path,
        data_txn: Option<Tid>,
        txn: &TransactionEntry,
    ) -> Result<(), BackendError>;
}
