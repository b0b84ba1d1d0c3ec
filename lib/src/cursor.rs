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

//! Incremental-copy cursor: picks up from where a previous copy run left
//! off.

use crate::backend::{DestinationStorage, Storage};
use crate::error::BackendError;
use crate::tid::Tid;

/// Returns the TID to resume copying from, or `None` for a full copy.
///
/// `None` when `destination` has no committed transactions yet; otherwise
/// the successor of its last committed TID, so the next copy run never
/// re-attempts a TID the destination already holds.
pub fn incremental_start(destination: &dyn DestinationStorage) -> Result<Option<Tid>, BackendError> {
    Ok(destination.last_transaction()?.map(|tid| tid.successor()))
}
