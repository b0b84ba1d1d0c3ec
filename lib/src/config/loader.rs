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

//! Resolves `(source, destination)` storages from a declarative config
//! file and/or a host-application configuration, per SPEC_FULL §4.6.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::host_conf;
use crate::config::parser::{self, Directive, Document, Section};
use crate::config::registry::{OpenedStorage, StorageRegistry};
use crate::error::ConfigError;

/// A database selector against a host-application configuration file.
#[derive(Debug, Clone)]
pub struct HostConfTarget {
    pub path: PathBuf,
    pub db_name: String,
}

/// Everything the CLI gathered about where source/destination should
/// come from.
#[derive(Debug, Clone, Default)]
pub struct ConfigInputs {
    pub config_file: Option<PathBuf>,
    pub source_host_conf: Option<HostConfTarget>,
    pub dest_host_conf: Option<HostConfTarget>,
}

pub struct LoadedStorages {
    pub source: OpenedStorage,
    pub destination: OpenedStorage,
}

pub fn load(inputs: &ConfigInputs) -> Result<LoadedStorages, ConfigError> {
    let registry = StorageRegistry::with_defaults();

    let config_doc = match &inputs.config_file {
        Some(path) => Some(parse_file(path)?),
        None => None,
    };

    let source = resolve_side(
        "source",
        config_doc.as_ref().and_then(|d| find_section(d, "source")),
        inputs.source_host_conf.as_ref(),
        &registry,
    )?;
    let destination = resolve_side(
        "destination",
        config_doc.as_ref().and_then(|d| find_section(d, "destination")),
        inputs.dest_host_conf.as_ref(),
        &registry,
    )?;

    Ok(LoadedStorages {
        source,
        destination,
    })
}

fn find_section<'a>(doc: &'a Document, tag: &str) -> Option<&'a Section> {
    doc.sections.iter().find(|s| s.tag == tag)
}

fn resolve_side(
    side: &'static str,
    from_config: Option<&Section>,
    from_host_conf: Option<&HostConfTarget>,
    registry: &StorageRegistry,
) -> Result<OpenedStorage, ConfigError> {
    match (from_config, from_host_conf) {
        (Some(_), Some(_)) => Err(ConfigError::DuplicateSpecification { side }),
        (None, None) => Err(ConfigError::MissingSpecification { side }),
        (Some(section), None) => registry.open(section),
        (None, Some(target)) => open_from_host_conf(target, registry),
    }
}

fn open_from_host_conf(
    target: &HostConfTarget,
    registry: &StorageRegistry,
) -> Result<OpenedStorage, ConfigError> {
    let text = fs::read_to_string(&target.path).map_err(|source| ConfigError::Read {
        path: target.path.clone(),
        source,
    })?;
    let extracted = host_conf::extract_database_section(&text, &target.db_name)?;
    let mut doc = parser::parse(&extracted)?;
    let defines: Vec<(String, String)> = doc
        .directives
        .iter()
        .filter_map(|d| match d {
            Directive::Define(name, value) => Some((name.clone(), value.clone())),
            Directive::Import(_) => None,
        })
        .collect();
    let section = doc
        .sections
        .pop()
        .ok_or_else(|| ConfigError::Parse(format!("no storage section for database {:?}", target.db_name)))?;
    let section = apply_defines(section, &defines);
    registry.open(&section)
}

fn apply_defines(mut section: Section, defines: &[(String, String)]) -> Section {
    for (_, value) in section.keys.iter_mut() {
        *value = substitute(value, defines);
    }
    section.children = section
        .children
        .into_iter()
        .map(|c| apply_defines(c, defines))
        .collect();
    section
}

fn substitute(value: &str, defines: &[(String, String)]) -> String {
    let mut out = value.to_string();
    for (name, replacement) in defines {
        out = out.replace(&format!("${name}"), replacement);
    }
    out
}

fn parse_file(path: &Path) -> Result<Document, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parser::parse(&text)
}
