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

//! Declarative configuration loading: a small nested-tag grammar
//! (`parser`), extraction of a single database's storage section out of
//! a host-application configuration file (`host_conf`), the storage
//! factory registry backends register with (`registry`), and the
//! top-level resolution logic (`loader`).

pub mod host_conf;
pub mod loader;
pub mod parser;
pub mod registry;

pub use loader::{load, ConfigInputs, HostConfTarget, LoadedStorages};
pub use registry::{OpenedStorage, StorageRegistry};
