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

//! Blob staging: materialize a source blob into a temporary file inside
//! the destination's staging directory before handing it to the
//! destination's restore/store path.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::BackendError;

/// Owns a staged blob file from creation until the destination consumes
/// it (typically by renaming it away). Cleans up on drop if the file is
/// still present, tolerating the "already gone" case since the
/// destination may have moved it.
pub struct StagedBlob {
    path: Option<PathBuf>,
}

impl StagedBlob {
    /// Copies `source_path`'s contents (and metadata, matching the source
    /// backend's `copy2`-equivalent semantics) into a new named temporary
    /// file inside `staging_dir`.
    pub fn copy_from(staging_dir: &Path, source_path: &Path) -> Result<Self, BackendError> {
        let temp = NamedTempFile::new_in(staging_dir).map_err(|source| BackendError::Io {
            path: staging_dir.to_path_buf(),
            source,
        })?;
        fs::copy(source_path, temp.path()).map_err(|source| BackendError::Io {
            path: source_path.to_path_buf(),
            source,
        })?;
        if let Ok(metadata) = fs::metadata(source_path) {
            let permissions = metadata.permissions();
            let _ = fs::set_permissions(temp.path(), permissions);
        }
        let path = temp.into_temp_path();
        let path = path
            .keep()
            .map_err(|e| BackendError::Io {
                path: staging_dir.to_path_buf(),
                source: e.error,
            })?;
        Ok(Self { path: Some(path) })
    }

    pub fn path(&self) -> &Path {
        self.path.as_deref().expect("staged blob path already taken")
    }

    /// Marks the staged file as consumed, e.g. because the destination
    /// renamed it away. Skips the unlink attempt on drop.
    pub fn forget(mut self) {
        self.path = None;
    }
}

impl Drop for StagedBlob {
    fn drop(&mut self) {
        if let Some(path) = &self.path {
            if let Err(err) = fs::remove_file(path) {
                if err.kind() != std::io::ErrorKind::NotFound {
                    tracing::debug!(?path, %err, "failed to clean up staged blob file");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn copies_bytes_and_cleans_up_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = NamedTempFile::new_in(dir.path()).unwrap();
        source.write_all(b"hello blob").unwrap();

        let staged_path = {
            let staged = StagedBlob::copy_from(dir.path(), source.path()).unwrap();
            let bytes = fs::read(staged.path()).unwrap();
            assert_eq!(bytes, b"hello blob");
            staged.path().to_path_buf()
        };
        assert!(!staged_path.exists());
    }

    #[test]
    fn forget_leaves_file_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = NamedTempFile::new_in(dir.path()).unwrap();
        source.write_all(b"abc").unwrap();

        let staged = StagedBlob::copy_from(dir.path(), source.path()).unwrap();
        let path = staged.path().to_path_buf();
        staged.forget();
        assert!(path.exists());
        fs::remove_file(path).unwrap();
    }
}
