// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `buzz snapshot` command: one sampling cycle, pretty JSON out.

use anyhow::Context;
use resource_monitor::{default_snapshot_filename, SamplingConfig, SamplingSession};
use std::path::PathBuf;
use std::process::ExitCode;

pub async fn execute(
    config: SamplingConfig,
    output: Option<PathBuf>,
    save: bool,
) -> anyhow::Result<ExitCode> {
    let session = SamplingSession::new(config);
    let (_, snapshot) = super::collect(session).await?;

    let target = match (output, save) {
        (Some(path), _) => Some(path),
        (None, true) => Some(PathBuf::from(default_snapshot_filename(chrono::Utc::now()))),
        (None, false) => None,
    };

    match target {
        Some(path) => {
            snapshot
                .save_to(&path)
                .with_context(|| format!("saving snapshot to {}", path.display()))?;
            eprintln!("Saved snapshot: {}", path.display());
        }
        None => println!("{}", snapshot.to_json_pretty()?),
    }
    Ok(ExitCode::SUCCESS)
}
