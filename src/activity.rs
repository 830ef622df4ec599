// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Activity classification for a single developer.
///
/// The classifier combines gateway queries into one [`DeveloperActivity`]
/// record per developer: a short-circuiting recent-activity probe, grace
/// periods anchored to issue assignment timestamps, counters over a fixed
/// statistics window, last-activity resolution and the inactivity and
/// no-assigned-issues verdicts with human readable reasons.
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    dates::{self, relative_display},
    error::Error,
    github::{ActivitySource, IssueItem, PullItem},
};

/// Width of the statistics window in days, independent of the thresholds.
pub const STATS_WINDOW_DAYS: i64 = 30;

/// Lookback windows configured for a run, in days.
#[derive(Debug, Clone, Copy,)]
pub struct Thresholds
{
    /// Days without qualifying activity before a developer is inactive.
    pub inactivity_days: i64,
    /// Days without an issue assignment before a developer lacks work.
    pub no_issues_days:  i64,
}

/// Kind of signal behind the most recent qualifying activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,)]
pub enum LastActivityKind
{
    /// The newest signal came from a pull request.
    #[serde(rename = "PR")]
    PullRequest,
    /// The newest signal came from a comment.
    #[serde(rename = "comment")]
    Comment,
}

impl LastActivityKind
{
    /// Returns the wire label used in serialized records and log lines.
    pub fn as_str(self,) -> &'static str
    {
        match self {
            Self::PullRequest => "PR",
            Self::Comment => "comment",
        }
    }
}

/// Evidence returned by the recent-activity probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub enum RecentActivity
{
    /// A pull request was created inside the probed window.
    CreatedPullRequest,
    /// An open pull request was updated inside the probed window.
    UpdatedOpenPullRequest,
    /// A comment landed inside the probed window.
    Commented,
}

impl RecentActivity
{
    /// Describes the evidence for log lines.
    pub fn describe(self,) -> &'static str
    {
        match self {
            Self::CreatedPullRequest => "created a pull request",
            Self::UpdatedOpenPullRequest => "has active pull requests",
            Self::Commented => "commented on issues",
        }
    }
}

/// Counters and last-activity summary over the statistics window.
#[derive(Debug, Clone, Serialize, Deserialize,)]
pub struct ActivityStats
{
    /// Pull requests created inside the window, author-verified.
    pub prs_created:           u64,
    /// Pull requests merged inside the window, from the search total.
    pub prs_merged:            u64,
    /// Open issues currently assigned to the developer.
    pub issues_assigned:       u64,
    /// Issues and pull requests the developer commented on inside the window.
    pub comments:              u64,
    /// Timestamp of the newest qualifying activity, when any exists.
    #[serde(with = "crate::dates::iso_option")]
    pub last_activity_date:    Option<DateTime<Utc,>,>,
    /// Kind of the newest qualifying activity.
    pub last_activity_type:    Option<LastActivityKind,>,
    /// Human readable rendering of the newest qualifying activity.
    pub last_activity_display: String,
}

/// One developer's classification for a run.
///
/// The record upholds two invariants: `inactivity_reason` is present exactly
/// when `is_inactive` is set, and `last_assigned_date` is only resolved for
/// developers without currently assigned issues.
#[derive(Debug, Clone, Serialize, Deserialize,)]
pub struct DeveloperActivity
{
    /// Developer login the record describes.
    pub username:            String,
    /// Counters and last-activity summary.
    pub stats:               ActivityStats,
    /// Whether any open issue is currently assigned to the developer.
    pub has_assigned_issues: bool,
    /// Inactivity verdict.
    pub is_inactive:         bool,
    /// Reason accompanying the inactivity verdict.
    pub inactivity_reason:   Option<String,>,
    /// Whether the developer has lacked assignments beyond the threshold.
    pub has_no_issues:       bool,
    /// Most recent assignment timestamp, resolved only when no issue is
    /// currently assigned.
    #[serde(with = "crate::dates::iso_option")]
    pub last_assigned_date:  Option<DateTime<Utc,>,>,
}

/// Builds the activity record for one developer.
///
/// The classification proceeds in a fixed order: assigned issues are listed
/// first, the recent-activity probe runs against the inactivity window, the
/// verdict consults assignment grace periods when the probe found nothing,
/// counters are collected over the statistics window, the last activity is
/// resolved chronologically and the no-assigned-issues verdict closes the
/// record. Given identical gateway responses and the same `now`, the result
/// is byte-for-byte deterministic.
///
/// # Errors
///
/// Returns [`Error::Classification`] when date arithmetic leaves the
/// supported range, for example with a pathological threshold. Callers map
/// such failures to [`fallback_record`].
///
/// # Example
///
/// ```no_run
/// use chrono::Utc;
/// use devpulse::{GitHubGateway, Thresholds, collect_developer_activity};
///
/// # async fn example() -> Result<(), devpulse::Error> {
/// let gateway = GitHubGateway::new("ghp_example", "octocat/hello-world",)?;
/// let thresholds = Thresholds {
///     inactivity_days: 7,
///     no_issues_days:  3,
/// };
/// let record = collect_developer_activity(&gateway, "octocat", thresholds, Utc::now(),).await?;
/// println!("{} inactive: {}", record.username, record.is_inactive);
/// # Ok(())
/// # }
/// ```
pub async fn collect_developer_activity(
    source: &impl ActivitySource,
    username: &str,
    thresholds: Thresholds,
    now: DateTime<Utc,>,
) -> Result<DeveloperActivity, Error,>
{
    debug!("Collecting activity for {username}");

    let assigned = source.assigned_issues(username,).await;
    let has_assigned_issues = !assigned.is_empty();

    let inactivity_cutoff = window_start(now, thresholds.inactivity_days, "inactivity",)?;
    let recent = check_recent_activity(source, username, inactivity_cutoff,).await;

    let (is_inactive, mut inactivity_reason,) = match recent {
        Some(evidence,) => {
            debug!("{username} {} within the inactivity window", evidence.describe());
            (false, None,)
        }
        None if has_assigned_issues => {
            let mut active_since_assignment = false;
            for issue in &assigned {
                let Some(assigned_at,) =
                    source.issue_assignment_date(issue.number, username,).await
                else {
                    continue;
                };

                if probe_after_assignment(
                    source,
                    username,
                    assigned_at,
                    thresholds.inactivity_days,
                    now,
                )
                .await?
                {
                    active_since_assignment = true;
                    break;
                }
            }

            if active_since_assignment {
                (false, None,)
            } else {
                (true, Some("no activity since issue assignment".to_owned(),),)
            }
        }
        None => (true, Some("no recent activity and no assigned issues".to_owned(),),),
    };

    let stats_cutoff = dates::cutoff(now, STATS_WINDOW_DAYS,);
    let (created, _,) = source.pull_requests(username, Some(stats_cutoff,), false, false,).await;
    let created = verified_search_pulls(created, username,);
    let (_, merged_count,) = source.pull_requests(username, Some(stats_cutoff,), false, true,).await;
    let comments = source.comments(username, Some(stats_cutoff,), false,).await;
    let open_pulls = verified_open_pulls(source.open_pull_requests(username,).await, username,);

    debug!(
        "Activity summary for {username}: {} created PRs, {} open PRs, {} comment threads, {} \
         assigned issues",
        created.len(),
        open_pulls.len(),
        comments.len(),
        assigned.len()
    );

    let (last_activity_date, last_activity_type,) =
        resolve_last_activity(&created, &open_pulls, &comments,);
    let last_activity_display = match last_activity_date {
        Some(date,) => relative_display(Some(&date,), now,),
        None => "never".to_owned(),
    };

    if is_inactive && inactivity_reason.is_none() {
        inactivity_reason = Some(refined_reason(
            &created,
            &open_pulls,
            merged_count,
            &comments,
            thresholds.inactivity_days,
        ),);
    }

    let (has_no_issues, last_assigned_date,) = if has_assigned_issues {
        (false, None,)
    } else {
        let last_assigned = source.last_assigned_date(username,).await;
        let no_issues_cutoff = window_start(now, thresholds.no_issues_days, "no-issues",)?;
        (last_assigned.is_none_or(|date| date <= no_issues_cutoff,), last_assigned,)
    };

    Ok(DeveloperActivity {
        username: username.to_owned(),
        stats: ActivityStats {
            prs_created: created.len() as u64,
            prs_merged: merged_count,
            issues_assigned: assigned.len() as u64,
            comments: comments.len() as u64,
            last_activity_date,
            last_activity_type,
            last_activity_display,
        },
        has_assigned_issues,
        is_inactive,
        inactivity_reason,
        has_no_issues,
        last_assigned_date,
    },)
}

/// Probes for qualifying activity on or after `cutoff`.
///
/// Signals are checked from cheapest to broadest and the probe short-circuits
/// on the first hit: pull requests created inside the window, open pull
/// requests updated inside the window, then comments inside the window.
pub async fn check_recent_activity(
    source: &impl ActivitySource,
    username: &str,
    cutoff: DateTime<Utc,>,
) -> Option<RecentActivity,>
{
    let (created, _,) = source.pull_requests(username, Some(cutoff,), true, false,).await;
    if !created.is_empty() {
        return Some(RecentActivity::CreatedPullRequest,);
    }

    let open_pulls = source.open_pull_requests(username,).await;
    if open_pulls
        .iter()
        .any(|pull| pull.updated_at.is_some_and(|updated| updated >= cutoff,),)
    {
        return Some(RecentActivity::UpdatedOpenPullRequest,);
    }

    let comments = source.comments(username, Some(cutoff,), true,).await;
    if !comments.is_empty() {
        return Some(RecentActivity::Commented,);
    }

    None
}

/// Deterministic substitute for a developer whose classification failed.
///
/// The record carries zeroed counters, marks the developer inactive with the
/// error text as the reason and sets `has_no_issues`, so a failure is visible
/// in the report instead of silently dropping the developer.
pub fn fallback_record(username: &str, error: &Error,) -> DeveloperActivity
{
    DeveloperActivity {
        username: username.to_owned(),
        stats: ActivityStats {
            prs_created:           0,
            prs_merged:            0,
            issues_assigned:       0,
            comments:              0,
            last_activity_date:    None,
            last_activity_type:    None,
            last_activity_display: "error collecting data".to_owned(),
        },
        has_assigned_issues: false,
        is_inactive: true,
        inactivity_reason: Some(format!("error collecting data: {error}"),),
        has_no_issues: true,
        last_assigned_date: None,
    }
}

/// Evaluates one assignment's grace period.
///
/// Returns `Ok(true)` while the grace period is still open, or when any
/// qualifying activity happened after it expired.
async fn probe_after_assignment(
    source: &impl ActivitySource,
    username: &str,
    assigned_at: DateTime<Utc,>,
    grace_days: i64,
    now: DateTime<Utc,>,
) -> Result<bool, Error,>
{
    let grace_cutoff = Duration::try_days(grace_days,)
        .and_then(|grace| assigned_at.checked_add_signed(grace,),)
        .ok_or_else(|| {
            Error::classification(format!(
                "grace cutoff {grace_days} days after {assigned_at} is out of range"
            ),)
        },)?;

    if grace_cutoff > now {
        debug!("Grace period for {username} has not expired yet");
        return Ok(true,);
    }

    let evidence = check_recent_activity(source, username, grace_cutoff,).await;
    match evidence {
        Some(evidence,) => {
            debug!("{username} {} after the assignment grace period", evidence.describe());
        }
        None => {
            debug!("{username} has shown no activity since the assignment grace period expired");
        }
    }
    Ok(evidence.is_some(),)
}

fn window_start(now: DateTime<Utc,>, days: i64, label: &str,) -> Result<DateTime<Utc,>, Error,>
{
    Duration::try_days(days,)
        .and_then(|window| now.checked_sub_signed(window,),)
        .ok_or_else(|| {
            Error::classification(format!("{label} window of {days} days is out of range"),)
        },)
}

fn verified_search_pulls(items: Vec<IssueItem,>, username: &str,) -> Vec<IssueItem,>
{
    items
        .into_iter()
        .filter(|item| {
            let author = item.user.as_ref().map(|user| user.login.as_str(),);
            if author == Some(username,) {
                true
            } else {
                warn!(
                    "Search returned PR #{} authored by {} while querying {username}; dropping",
                    item.number,
                    author.unwrap_or("unknown")
                );
                false
            }
        },)
        .collect()
}

fn verified_open_pulls(items: Vec<PullItem,>, username: &str,) -> Vec<PullItem,>
{
    items
        .into_iter()
        .filter(|pull| {
            let author = pull.user.as_ref().map(|user| user.login.as_str(),);
            if author == Some(username,) {
                true
            } else {
                warn!(
                    "Open PR #{} matched the creator filter for {username} but is authored by \
                     {}; dropping",
                    pull.number,
                    author.unwrap_or("unknown")
                );
                false
            }
        },)
        .collect()
}

fn resolve_last_activity(
    created: &[IssueItem],
    open_pulls: &[PullItem],
    comments: &[IssueItem],
) -> (Option<DateTime<Utc,>,>, Option<LastActivityKind,>,)
{
    let mut best: Option<(DateTime<Utc,>, LastActivityKind,),> = None;

    if let Some(updated,) = created.first().and_then(|item| item.updated_at,) {
        best = Some((updated, LastActivityKind::PullRequest,),);
    }

    for pull in open_pulls {
        if let Some(updated,) = pull.updated_at
            && best.is_none_or(|(current, _,)| updated > current,)
        {
            best = Some((updated, LastActivityKind::PullRequest,),);
        }
    }

    if let Some(updated,) = comments.first().and_then(|item| item.updated_at,)
        && best.is_none_or(|(current, _,)| updated > current,)
    {
        best = Some((updated, LastActivityKind::Comment,),);
    }

    match best {
        Some((date, kind,),) => (Some(date,), Some(kind,),),
        None => (None, None,),
    }
}

fn refined_reason(
    created: &[IssueItem],
    open_pulls: &[PullItem],
    merged_count: u64,
    comments: &[IssueItem],
    threshold_days: i64,
) -> String
{
    if created.is_empty() && open_pulls.is_empty() {
        "no pull requests created recently".to_owned()
    } else if merged_count == 0 {
        "no pull requests merged recently".to_owned()
    } else if comments.is_empty() {
        "no comments on issues/prs recently".to_owned()
    } else {
        format!("no activity in the past {threshold_days} days")
    }
}
