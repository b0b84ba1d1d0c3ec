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

//! Error types, composed at module boundaries into one top-level error
//! that knows its own process exit code.

use std::path::PathBuf;

use thiserror::Error;

use crate::tid::Tid;

/// Errors surfaced by a storage backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("object {oid} not found at or before tid {tid}")]
    ObjectNotFound { oid: String, tid: Tid },
    #[error("concurrency conflict storing {oid}: expected previous serial {expected:?}, storage reports {actual:?}")]
    ConcurrentUpdate {
        oid: String,
        expected: Option<Tid>,
        actual: Option<Tid>,
    },
    #[error("failed to read blob for oid {oid} at tid {tid}: {source}")]
    BlobRead {
        oid: String,
        tid: Tid,
        #[source]
        source: std::io::Error,
    },
    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("two-phase commit failed: {0}")]
    Commit(String),
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    #[error("no {side} storage was specified")]
    MissingSpecification { side: &'static str },
    #[error("{side} storage was specified more than once (both a config file and a host-application config target it)")]
    DuplicateSpecification { side: &'static str },
    #[error("database {name:?} not found in host-application configuration")]
    SectionNotFound { name: String },
    #[error("unknown storage section type {0:?}")]
    UnknownSectionType(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors surfaced by the copy engine itself.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("source storage does not support iteration")]
    UnsupportedSource,
    #[error("source iteration failed: {0}")]
    Iteration(#[source] BackendError),
    #[error("destination commit failed: {0}")]
    Commit(#[source] BackendError),
    #[error("requested start tid {start} is not strictly after the destination's last committed tid {last}")]
    NonExtendingHistory { start: Tid, last: Tid },
}

/// Top-level error the CLI maps to a process exit code.
#[derive(Debug, Error)]
pub enum CopyError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl CopyError {
    /// `0` is reserved for success and is never returned here.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(ConfigError::MissingSpecification { .. })
            | Self::Config(ConfigError::DuplicateSpecification { .. })
            | Self::Config(ConfigError::SectionNotFound { .. })
            | Self::Config(ConfigError::Parse(_))
            | Self::Config(ConfigError::UnknownSectionType(_))
            | Self::Config(ConfigError::Read { .. }) => 1,
            _ => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_exit_one_operational_errors_exit_two() {
        let e: CopyError = ConfigError::MissingSpecification { side: "source" }.into();
        assert_eq!(e.exit_code(), 1);

        let e: CopyError = EngineError::UnsupportedSource.into();
        assert_eq!(e.exit_code(), 2);
    }
}
