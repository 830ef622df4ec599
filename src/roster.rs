// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Roster resolution for a tracking run.
///
/// A configured allowlist short-circuits discovery. Without one, the roster
/// is the union of contributors, team members and collaborators, deduplicated
/// and sorted alphabetically for a stable processing order.
use std::collections::HashSet;

use tracing::info;

use crate::github::ActivitySource;

/// Resolves the developers to evaluate.
///
/// A non-empty `allowlist` is used verbatim, without further normalization or
/// reordering. Otherwise contributor, team member and collaborator listings
/// are merged, deduplicated by login and sorted.
pub async fn resolve_roster(source: &impl ActivitySource, allowlist: &[String],) -> Vec<String,>
{
    if !allowlist.is_empty() {
        info!("Using provided list of {} developers to track", allowlist.len());
        return allowlist.to_vec();
    }

    let groups = [
        source.contributors().await,
        source.team_members().await,
        source.collaborators().await,
    ];

    let mut roster = Vec::new();
    let mut seen = HashSet::new();
    for login in groups.into_iter().flatten() {
        if seen.insert(login.clone(),) {
            roster.push(login,);
        }
    }
    roster.sort();

    info!("Found {} developers to track", roster.len());
    roster
}
