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

//! Extraction of a single storage section from a host-application
//! configuration file: locates a named `<zodb_db NAME>` block, strips
//! host-specific keys, preserves global directives, and pulls out the
//! innermost storage section (handling a blob wrapper nested around the
//! underlying storage).
//!
//! This is a direct text-surgery port of the original tool's
//! regex-based extractor: the host format isn't re-parsed into the
//! section grammar here, because the original keys off of the literal
//! text it finds (preserving comments/whitespace verbatim in anything
//! it hoists), and this module matches that rather than normalizing
//! through a structural AST.

use crate::error::ConfigError;

/// Host-specific keys that have no meaning once a storage section is
/// opened directly (without the host's database-object wrapper).
const HOST_SPECIFIC_KEYS: &[&str] = &[
    "mount-point",
    "connection-class",
    "class-factory",
    "container-class",
];

/// Extracts database block `name`'s inner storage section text, plus any
/// global `%import`/`%define` lines that precede it, from `conf_text`.
pub fn extract_database_section(conf_text: &str, name: &str) -> Result<String, ConfigError> {
    let global_directives = collect_global_directives(conf_text);

    let open_needle = format!("<zodb_db {name}>");
    let open_needle_alt = format!("<zodb_db {name} ");
    let start = conf_text
        .find(&open_needle)
        .or_else(|| conf_text.find(&open_needle_alt))
        .ok_or_else(|| ConfigError::SectionNotFound {
            name: name.to_string(),
        })?;
    let body_start = conf_text[start..]
        .find('>')
        .map(|i| start + i + 1)
        .ok_or_else(|| ConfigError::Parse(format!("unterminated <zodb_db {name}> tag")))?;
    let close_needle = "</zodb_db>";
    let body_end = conf_text[body_start..]
        .find(close_needle)
        .map(|i| body_start + i)
        .ok_or_else(|| ConfigError::Parse(format!("missing </zodb_db> for database {name:?}")))?;

    let body = &conf_text[body_start..body_end];
    let stripped = strip_host_specific_keys(body);

    let inner = extract_inner_storage(&stripped).ok_or_else(|| {
        ConfigError::Parse(format!(
            "database {name:?} has no inner storage section"
        ))
    })?;

    let mut out = String::new();
    for directive in &global_directives {
        out.push_str(directive);
        out.push('\n');
    }
    out.push_str(&inner);
    out.push('\n');
    Ok(out)
}

fn collect_global_directives(conf_text: &str) -> Vec<String> {
    conf_text
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("%import") || line.starts_with("%define"))
        .map(str::to_string)
        .collect()
}

fn strip_host_specific_keys(body: &str) -> String {
    body.lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            !HOST_SPECIFIC_KEYS
                .iter()
                .any(|key| trimmed.starts_with(key) && is_key_boundary(trimmed, key))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_key_boundary(line: &str, key: &str) -> bool {
    line[key.len()..]
        .chars()
        .next()
        .is_none_or(|c| c.is_whitespace())
}

/// Finds the outermost tag in `text` whose name is neither `zodb_db` nor
/// `zodb` (i.e. not a database-object wrapper), and returns the text
/// spanning from its opening tag through the *last* matching closing
/// tag found in `text`, so a wrapper-inside-wrapper (`<outer><inner>
/// ...</inner></outer>`) is captured whole rather than truncated at the
/// first, innermost close.
fn extract_inner_storage(text: &str) -> Option<String> {
    let mut search_from = 0;
    loop {
        let rel_lt = text[search_from..].find('<')?;
        let lt = search_from + rel_lt;
        if text[lt..].starts_with("</") {
            search_from = lt + 2;
            continue;
        }
        let rel_gt = text[lt..].find('>')?;
        let gt = lt + rel_gt;
        let tag_token = text[lt + 1..gt].split_whitespace().next()?;
        if tag_token.eq_ignore_ascii_case("zodb_db") || tag_token.eq_ignore_ascii_case("zodb") {
            search_from = gt + 1;
            continue;
        }

        let close_tag = format!("</{tag_token}>");
        let close_at = text.rfind(&close_tag)?;
        return Some(text[lt..close_at + close_tag.len()].trim().to_string());
    }
}
