// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Debug artifact written at the end of a diagnostic run.
///
/// Captures the run configuration, gateway counters and every collected
/// activity record as pretty-printed JSON, timestamped so consecutive runs in
/// the same directory never collide.
use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::{
    activity::{DeveloperActivity, Thresholds},
    error::{Error, artifact_io_error},
    github::ApiStats,
};

/// Threshold settings echoed into the artifact.
#[derive(Debug, Clone, Copy, Serialize,)]
pub struct ArtifactSettings
{
    /// Inactivity window in days.
    pub inactivity_threshold_days: i64,
    /// No-assigned-issues window in days.
    pub no_issues_threshold_days:  i64,
}

impl From<Thresholds,> for ArtifactSettings
{
    fn from(thresholds: Thresholds,) -> Self
    {
        Self {
            inactivity_threshold_days: thresholds.inactivity_days,
            no_issues_threshold_days:  thresholds.no_issues_days,
        }
    }
}

/// Full diagnostic state of one run.
#[derive(Debug, Serialize,)]
pub struct DebugArtifact<'run,>
{
    /// Repository the run evaluated.
    pub repository:   &'run str,
    /// Timestamp the run anchored its windows to.
    #[serde(with = "crate::dates::iso")]
    pub generated_at: DateTime<Utc,>,
    /// Threshold settings of the run.
    pub settings:     ArtifactSettings,
    /// Gateway request and rate-limit counters at the end of the run.
    pub api_stats:    ApiStats,
    /// Every collected activity record.
    pub developers:   &'run [DeveloperActivity],
}

/// Writes the artifact as pretty JSON into `directory`.
///
/// The filename embeds the run timestamp as
/// `devpulse_debug_{YYYYmmdd_HHMMSS}.json`. Returns the path of the written
/// file.
///
/// # Errors
///
/// Returns [`Error::Serialize`] when encoding fails and [`Error::ArtifactIo`]
/// when the file cannot be written.
pub fn write_debug_artifact(
    artifact: &DebugArtifact<'_,>,
    directory: &Path,
) -> Result<PathBuf, Error,>
{
    let filename =
        format!("devpulse_debug_{}.json", artifact.generated_at.format("%Y%m%d_%H%M%S"));
    let path = directory.join(filename,);

    let contents = serde_json::to_string_pretty(artifact,)?;
    fs::write(&path, contents,).map_err(|source| artifact_io_error(&path, source,),)?;

    info!("Debug information saved to {}", path.display());
    Ok(path,)
}
