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

//! Argument parsing, mirroring the original tool's flag surface
//! (SPEC_FULL §4.7 / §6).

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "odbcopy", about = "Copy a transactional object storage, preserving its history.")]
pub struct Args {
    /// Path to a declarative config file with `<source>`/`<destination>` sections.
    pub config_file: Option<PathBuf>,

    /// Host-application config file to read the source storage from.
    #[arg(long, value_name = "FILE")]
    pub source_zope_conf: Option<PathBuf>,

    /// Database name within --source-zope-conf.
    #[arg(long, value_name = "NAME", default_value = "main")]
    pub source_db: String,

    /// Host-application config file to read the destination storage from.
    #[arg(long, value_name = "FILE")]
    pub dest_zope_conf: Option<PathBuf>,

    /// Database name within --dest-zope-conf.
    #[arg(long, value_name = "NAME", default_value = "main")]
    pub dest_db: String,

    /// Count records and transactions without writing to the destination.
    #[arg(long)]
    pub dry_run: bool,

    /// Resume from the destination's last committed transaction.
    #[arg(long)]
    pub incremental: bool,

    /// Increase verbosity (-v for info, -vv for debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
