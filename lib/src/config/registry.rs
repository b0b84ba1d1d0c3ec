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

//! Storage factory registry: maps a section's tag name to the backend
//! that opens it. New backends register a factory here instead of the
//! loader hard-coding a match on concrete types.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::backend::{DestinationStorage, SourceStorage};
use crate::backends::file::FileStorage;
use crate::backends::memory::MemoryStorage;
use crate::config::parser::Section;
use crate::error::ConfigError;

/// A concrete backend opened from a config section, type-erased just
/// enough that the loader can use it as either a source or a
/// destination without knowing which concrete backend it is.
#[derive(Debug)]
pub enum OpenedStorage {
    Memory(MemoryStorage),
    File(FileStorage),
}

impl OpenedStorage {
    pub fn as_source(&self) -> &dyn SourceStorage {
        match self {
            Self::Memory(s) => s,
            Self::File(s) => s,
        }
    }

    pub fn as_destination_mut(&mut self) -> &mut dyn DestinationStorage {
        match self {
            Self::Memory(s) => s,
            Self::File(s) => s,
        }
    }
}

type Factory = fn(&Section) -> Result<OpenedStorage, ConfigError>;

pub struct StorageRegistry {
    factories: HashMap<&'static str, Factory>,
}

impl StorageRegistry {
    /// The registry pre-populated with this crate's reference backends.
    /// Extra backends (e.g. a real external database driver) register
    /// their own factory under their section's tag name the same way.
    pub fn with_defaults() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register("filestorage", open_file_storage);
        registry.register("mappingstorage", open_mapping_storage);
        registry
    }

    pub fn register(&mut self, tag: &'static str, factory: Factory) {
        self.factories.insert(tag, factory);
    }

    pub fn open(&self, section: &Section) -> Result<OpenedStorage, ConfigError> {
        // A named wrapper tag (e.g. `filestorage`) may itself be nested
        // one level inside another section (`source`/`destination`); if
        // `section` isn't directly a known storage tag but has exactly
        // one child that is, open that child instead.
        if let Some(factory) = self.factories.get(section.tag.as_str()) {
            return factory(section);
        }
        if section.children.len() == 1 {
            return self.open(&section.children[0]);
        }
        Err(ConfigError::UnknownSectionType(section.tag.clone()))
    }
}

fn open_file_storage(section: &Section) -> Result<OpenedStorage, ConfigError> {
    let path = section
        .get("path")
        .ok_or_else(|| ConfigError::Parse("filestorage section missing 'path' key".to_string()))?;
    let storage = FileStorage::open(PathBuf::from(path))?;
    Ok(OpenedStorage::File(storage))
}

fn open_mapping_storage(_section: &Section) -> Result<OpenedStorage, ConfigError> {
    Ok(OpenedStorage::Memory(MemoryStorage::new()))
}
