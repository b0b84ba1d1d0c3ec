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

//! Transaction-preserving storage copier core: storage traits, the copy
//! engine, incremental-copy cursor, progress reporting, and declarative
//! configuration loading.

pub mod backend;
pub mod backends;
pub mod capabilities;
pub mod config;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod oid;
pub mod progress;
pub mod record;
pub mod stage;
pub mod tid;

pub use capabilities::Capabilities;
pub use engine::{copy, default_is_blob_record, CopyStats};
pub use error::{BackendError, ConfigError, CopyError, EngineError};
pub use oid::Oid;
pub use record::{Preindex, Record, TransactionEntry, TxnStatus};
pub use tid::Tid;
