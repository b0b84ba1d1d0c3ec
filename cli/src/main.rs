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

mod cli;
mod logging;

use clap::Parser as _;
use odbcopy_lib::backend::Storage as _;
use odbcopy_lib::config::{self, ConfigInputs, HostConfTarget};
use odbcopy_lib::error::CopyError;
use odbcopy_lib::progress::ProgressReporter;
use odbcopy_lib::{cursor, engine};

fn main() {
    let args = cli::Args::parse();
    let _reload_handle = logging::init(args.verbose);

    match run(&args) {
        Ok(()) => {}
        Err(err) => {
            tracing::error!(error = %err, "odbcopy failed");
            std::process::exit(err.exit_code());
        }
    }
}

fn run(args: &cli::Args) -> Result<(), CopyError> {
    let inputs = ConfigInputs {
        config_file: args.config_file.clone(),
        source_host_conf: args.source_zope_conf.as_ref().map(|path| HostConfTarget {
            path: path.clone(),
            db_name: args.source_db.clone(),
        }),
        dest_host_conf: args.dest_zope_conf.as_ref().map(|path| HostConfTarget {
            path: path.clone(),
            db_name: args.dest_db.clone(),
        }),
    };

    let mut loaded = config::load(&inputs)?;

    let start_tid = if args.incremental {
        cursor::incremental_start(loaded.destination.as_destination_mut())?
    } else {
        None
    };

    let total_txns = count_total_transactions(loaded.source.as_source(), start_tid);
    let mut progress = ProgressReporter::new(total_txns, args.verbose > 0);

    let result = engine::copy(
        loaded.source.as_source(),
        loaded.destination.as_destination_mut(),
        start_tid,
        args.dry_run,
        engine::default_is_blob_record,
        Some(&mut progress),
    );

    if let Err(err) = loaded.source.as_source().close() {
        tracing::warn!(error = %err, "failed to close source storage");
    }
    if let Err(err) = loaded.destination.as_destination_mut().close() {
        tracing::warn!(error = %err, "failed to close destination storage");
    }

    let stats = result?;
    tracing::info!(
        txn_count = stats.txn_count,
        obj_count = stats.obj_count,
        blob_count = stats.blob_count,
        "done"
    );

    Ok(())
}

/// Best-effort pre-count used only to size the progress reporter; a
/// failure here must not prevent the copy itself from running.
fn count_total_transactions(
    source: &dyn odbcopy_lib::backend::SourceStorage,
    start_tid: Option<odbcopy_lib::Tid>,
) -> Option<usize> {
    let mut iterator = match source.iterator(start_tid) {
        Ok(iterator) => iterator,
        Err(err) => {
            tracing::warn!(error = %err, "failed to pre-count source transactions");
            return None;
        }
    };
    let mut count = 0;
    loop {
        match iterator.next_transaction() {
            Ok(Some(_)) => count += 1,
            Ok(None) => break,
            Err(err) => {
                tracing::warn!(error = %err, "failed to pre-count source transactions");
                let _ = iterator.close();
                return None;
            }
        }
    }
    let _ = iterator.close();
    Some(count)
}
