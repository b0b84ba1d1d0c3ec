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

//! Process-wide logging, initialized once at CLI entry.

use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::EnvFilter;

/// Environment variable consulted for an additional filter override.
/// Verbosity flags always win over this when given explicitly.
pub const ENV_VAR_NAME: &str = "ODBCOPY_LOG";

/// Initializes the global `tracing` subscriber from a verbosity count
/// (`0` = warn, `1` = info, `2+` = debug), writing to stderr.
///
/// Returns the reload handle so callers (or tests) can adjust the filter
/// later if needed; the CLI itself only uses it once, at startup.
pub fn init(verbosity: u8) -> tracing_subscriber::reload::Handle<EnvFilter, tracing_subscriber::Registry> {
    let default_directive = match verbosity {
        0 => "warn",
        1 => "odbcopy=info,odbcopy_lib=info",
        _ => "odbcopy=debug,odbcopy_lib=debug",
    };

    let filter = if verbosity == 0 {
        EnvFilter::try_from_env(ENV_VAR_NAME).unwrap_or_else(|_| EnvFilter::new(default_directive))
    } else {
        EnvFilter::new(default_directive)
    };

    let (filter, reload_handle) = tracing_subscriber::reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    reload_handle
}
