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

//! Reference storage backends exercising the [`crate::backend`] traits.
//!
//! These aren't part of the core copier contract. They exist so the
//! engine has at least one backend on each end of the capability
//! spectrum to copy between, and so the test suite can exercise every
//! path in [`crate::engine`] without a real external database.

pub mod file;
pub mod memory;
