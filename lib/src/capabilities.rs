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

//! Capability probe: flattens a `(source, destination)` pair into the
//! booleans the copy engine branches on. The engine never inspects a
//! backend's concrete type directly, only these flags.

use crate::backend::{DestinationStorage, SourceStorage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub source_iterates: bool,
    pub source_has_blobs: bool,
    pub dest_restores: bool,
    pub dest_restores_blobs: bool,
    pub dest_has_blobs: bool,
}

impl Capabilities {
    /// Source iteration is assumed mandatory (every [`SourceStorage`]
    /// implements it); `source_iterates` is always `true` here but is kept
    /// as an explicit field so callers can refuse to run when it's absent,
    /// matching the reasoning in SPEC_FULL §4.2 (the field exists for
    /// clarity at call sites, not because this crate's source trait can
    /// omit iteration).
    pub fn probe(source: &dyn SourceStorage, destination: &mut dyn DestinationStorage) -> Self {
        let source_has_blobs = source.as_supports_blobs().is_some();
        let dest_restores = {
            // Restore support doesn't require mutable access to check, but
            // the accessor is `&mut` because `restore` itself mutates; a
            // second accessor isn't needed since probing happens once,
            // up front, before any commits begin.
            let had = destination.as_supports_restore().is_some();
            had
        };
        let dest_has_blobs = destination.as_supports_blobs_mut().is_some();
        let dest_restores_blobs = destination
            .as_supports_blobs_mut()
            .and_then(|b| b.as_supports_blob_restore())
            .is_some();

        Self {
            source_iterates: true,
            source_has_blobs,
            dest_restores,
            dest_restores_blobs,
            dest_has_blobs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memory::MemoryStorage;

    #[test]
    fn memory_backend_has_no_optional_capabilities() {
        let source = MemoryStorage::new();
        let mut dest = MemoryStorage::new();
        let caps = Capabilities::probe(&source, &mut dest);
        assert!(caps.source_iterates);
        assert!(!caps.source_has_blobs);
        assert!(!caps.dest_restores);
        assert!(!caps.dest_restores_blobs);
        assert!(!caps.dest_has_blobs);
    }
}
