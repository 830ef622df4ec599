// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// GitHub REST and search gateway backing the roster and the classifier.
///
/// The gateway wraps an authenticated [`Octocrab`] client behind the
/// [`ActivitySource`] trait, owns the request and rate-limit bookkeeping and
/// never surfaces transport failures to callers: every query logs a warning
/// and yields an empty or absent result instead, so a flaky endpoint degrades
/// a single signal rather than the whole run.
use std::{
    sync::atomic::{AtomicI64, AtomicU64, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::{dates::format_timestamp, error::Error};

/// Remaining-quota level below which the gateway refreshes its budget and
/// considers throttling.
pub const LOW_WATER_MARK: u64 = 10;

/// Longest reset wait the gateway is willing to sleep through, in seconds.
pub const MAX_THROTTLE_WAIT_SECS: i64 = 300;

/// Remaining-quota estimate assumed before the first authoritative refresh.
const DEFAULT_RATE_BUDGET: u64 = 5000;

/// Page size requested from listing endpoints. Listings are read as a single
/// page; repositories with more entries than this contribute their first page
/// of results.
const PAGE_SIZE: u8 = 100;

/// Login reference embedded in GitHub API resources.
#[derive(Debug, Clone, Deserialize,)]
pub struct UserRef
{
    /// Account login of the referenced user.
    pub login: String,
}

/// Issue-shaped item returned by issue listings and `/search/issues`.
///
/// Pull requests travel through the same endpoints; entries carrying a
/// `pull_request` key are pull requests rather than issues.
#[derive(Debug, Clone, Deserialize,)]
pub struct IssueItem
{
    /// Issue or pull request number within the repository.
    pub number:       u64,
    /// Author of the item when the API includes one.
    pub user:         Option<UserRef,>,
    /// Creation timestamp when the API includes one.
    pub created_at:   Option<DateTime<Utc,>,>,
    /// Last update timestamp when the API includes one.
    pub updated_at:   Option<DateTime<Utc,>,>,
    /// Marker object present on pull requests surfaced via issue endpoints.
    pub pull_request: Option<serde_json::Value,>,
}

/// Pull request returned by the repository pulls listing.
#[derive(Debug, Clone, Deserialize,)]
pub struct PullItem
{
    /// Pull request number within the repository.
    pub number:     u64,
    /// Author of the pull request when the API includes one.
    pub user:       Option<UserRef,>,
    /// Last update timestamp when the API includes one.
    pub updated_at: Option<DateTime<Utc,>,>,
}

/// Commit returned by the repository commits listing.
#[derive(Debug, Clone, Deserialize,)]
pub struct CommitItem
{
    /// Commit SHA.
    pub sha:    String,
    /// GitHub account linked to the commit author, when resolvable.
    pub author: Option<UserRef,>,
}

/// Event from an issue timeline. Fields vary per event kind, so everything
/// beyond the envelope is optional.
#[derive(Debug, Clone, Deserialize,)]
pub struct TimelineEvent
{
    /// Event kind, such as `assigned` or `labeled`.
    pub event:      Option<String,>,
    /// Assignee attached to assignment events.
    pub assignee:   Option<UserRef,>,
    /// Timestamp at which the event occurred.
    pub created_at: Option<DateTime<Utc,>,>,
}

/// Request and rate-limit counters captured at a point in time.
#[derive(Debug, Clone, Copy, Serialize,)]
pub struct ApiStats
{
    /// Total requests issued by the gateway so far.
    pub request_count:        u64,
    /// Last known remaining core-quota budget.
    pub rate_limit_remaining: u64,
    /// Unix timestamp at which the core quota resets.
    pub rate_limit_reset:     i64,
}

#[derive(Debug, Deserialize,)]
struct SearchResults
{
    total_count: u64,
    items:       Vec<IssueItem,>,
}

#[derive(Debug, Deserialize,)]
struct TeamEntry
{
    slug:        String,
    members_url: String,
}

#[derive(Debug, Deserialize,)]
struct RateLimitEnvelope
{
    rate: RateBudget,
}

#[derive(Debug, Deserialize,)]
struct RateBudget
{
    remaining: u64,
    reset:     i64,
}

#[derive(Debug, Serialize,)]
struct PageQuery
{
    per_page: u8,
}

#[derive(Debug, Serialize,)]
struct SearchQuery
{
    q:        String,
    sort:     &'static str,
    order:    &'static str,
    per_page: u8,
}

#[derive(Debug, Serialize,)]
struct IssueListQuery<'a,>
{
    assignee: &'a str,
    state:    &'static str,
    per_page: u8,
}

#[derive(Debug, Serialize,)]
struct PullListQuery<'a,>
{
    creator:  &'a str,
    state:    &'static str,
    per_page: u8,
}

#[derive(Debug, Serialize,)]
struct CommitListQuery<'a,>
{
    author:   &'a str,
    per_page: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    since:    Option<String,>,
}

/// Read-only view of repository activity consumed by the roster resolver and
/// the classifier.
///
/// Implementations never signal transport failure: a method that cannot
/// produce data returns an empty collection or `None` after logging, keeping
/// classification total. The default methods derive assignment timestamps
/// from timelines, so fixtures only need to supply raw listings.
#[async_trait]
pub trait ActivitySource: Send + Sync
{
    /// Lists contributor logins for the repository.
    async fn contributors(&self,) -> Vec<String,>;

    /// Lists logins across all teams attached to the repository.
    async fn team_members(&self,) -> Vec<String,>;

    /// Lists collaborator logins for the repository.
    async fn collaborators(&self,) -> Vec<String,>;

    /// Lists commits authored by `username`, optionally bounded by `since`.
    ///
    /// With `existence_only` the listing is capped at a single entry, enough
    /// to answer "did anything happen".
    async fn commits(
        &self,
        username: &str,
        since: Option<DateTime<Utc,>,>,
        existence_only: bool,
    ) -> Vec<CommitItem,>;

    /// Searches pull requests authored by `username`.
    ///
    /// Returns the matching items together with the search `total_count`.
    /// `since` bounds creation (and merge, with `merged_only`) timestamps;
    /// `existence_only` caps the page at a single entry.
    async fn pull_requests(
        &self,
        username: &str,
        since: Option<DateTime<Utc,>,>,
        existence_only: bool,
        merged_only: bool,
    ) -> (Vec<IssueItem,>, u64,);

    /// Searches issues and pull requests commented on by `username`,
    /// optionally bounded by their `updated_at` timestamps.
    async fn comments(
        &self,
        username: &str,
        since: Option<DateTime<Utc,>,>,
        existence_only: bool,
    ) -> Vec<IssueItem,>;

    /// Lists open pull requests created by `username`, drafts included.
    async fn open_pull_requests(&self, username: &str,) -> Vec<PullItem,>;

    /// Lists open issues currently assigned to `username`, with pull requests
    /// filtered out.
    async fn assigned_issues(&self, username: &str,) -> Vec<IssueItem,>;

    /// Searches issues ever assigned to `username` across open and closed
    /// states, most recently updated first.
    async fn assigned_issue_history(&self, username: &str,) -> Vec<IssueItem,>;

    /// Fetches the timeline events of one issue.
    async fn issue_timeline(&self, issue_number: u64,) -> Vec<TimelineEvent,>;

    /// Resolves when `username` was first assigned to the given issue.
    async fn issue_assignment_date(
        &self,
        issue_number: u64,
        username: &str,
    ) -> Option<DateTime<Utc,>,>
    {
        let events = self.issue_timeline(issue_number,).await;
        let assigned = first_assignment_date(&events, username,);
        match assigned {
            Some(date,) => debug!("Issue #{issue_number} was assigned to {username} on {date}"),
            None => debug!("No assignment event found for {username} on issue #{issue_number}"),
        }
        assigned
    }

    /// Resolves the most recent assignment timestamp for `username` across
    /// the repository's history.
    async fn last_assigned_date(&self, username: &str,) -> Option<DateTime<Utc,>,>
    {
        for issue in self.assigned_issue_history(username,).await {
            let events = self.issue_timeline(issue.number,).await;
            if let Some(date,) = first_assignment_date(&events, username,) {
                return Some(date,);
            }
        }
        None
    }
}

/// Finds the first `assigned` timeline event that targets `username`.
///
/// Events missing a kind, an assignee or a timestamp are skipped.
pub fn first_assignment_date(
    events: &[TimelineEvent],
    username: &str,
) -> Option<DateTime<Utc,>,>
{
    events
        .iter()
        .find(|event| {
            event.event.as_deref() == Some("assigned",)
                && event.assignee.as_ref().is_some_and(|assignee| assignee.login == username,)
        },)
        .and_then(|event| event.created_at,)
}

#[derive(Debug,)]
struct RateLimitState
{
    request_count: AtomicU64,
    remaining:     AtomicU64,
    reset:         AtomicI64,
}

impl RateLimitState
{
    fn new() -> Self
    {
        Self {
            request_count: AtomicU64::new(0,),
            remaining:     AtomicU64::new(DEFAULT_RATE_BUDGET,),
            reset:         AtomicI64::new(0,),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
enum ThrottleAction
{
    Proceed,
    Sleep(i64,),
    Warn(i64,),
}

fn throttle_action(remaining: u64, reset: i64, now_ts: i64,) -> ThrottleAction
{
    if remaining >= LOW_WATER_MARK {
        return ThrottleAction::Proceed;
    }

    let wait_secs = reset - now_ts;
    if wait_secs <= 0 {
        return ThrottleAction::Proceed;
    }

    if wait_secs < MAX_THROTTLE_WAIT_SECS {
        ThrottleAction::Sleep(wait_secs + 1,)
    } else {
        ThrottleAction::Warn(wait_secs,)
    }
}

fn pull_request_query(
    repository: &str,
    username: &str,
    since: Option<DateTime<Utc,>,>,
    merged_only: bool,
) -> String
{
    let mut query = format!("repo:{repository} author:{username} type:pr");
    if let Some(since,) = since {
        query.push_str(&format!(" created:>={}", format_timestamp(&since)),);
    }
    if merged_only {
        query.push_str(" is:merged",);
        if let Some(since,) = since {
            query.push_str(&format!(" merged:>={}", format_timestamp(&since)),);
        }
    }
    query
}

fn comment_query(repository: &str, username: &str, since: Option<DateTime<Utc,>,>,) -> String
{
    let mut query = format!("repo:{repository} commenter:{username}");
    if let Some(since,) = since {
        query.push_str(&format!(" updated:>={}", format_timestamp(&since)),);
    }
    query
}

fn assignment_history_query(repository: &str, username: &str,) -> String
{
    format!("repo:{repository} assignee:{username} state:open state:closed")
}

fn team_members_route(members_url: &str,) -> String
{
    members_url
        .strip_prefix("https://api.github.com",)
        .unwrap_or(members_url,)
        .replace("{/member}", "",)
}

/// Authenticated gateway issuing repository, search and timeline queries.
///
/// One instance serves an entire run. All requests flow through a single
/// budget: the gateway counts them, estimates the remaining core quota and,
/// when the estimate sinks below [`LOW_WATER_MARK`], refreshes the
/// authoritative budget from `/rate_limit` and sleeps until the reset when
/// the wait stays under [`MAX_THROTTLE_WAIT_SECS`].
pub struct GitHubGateway
{
    octocrab:   Octocrab,
    repository: String,
    limits:     RateLimitState,
}

impl GitHubGateway
{
    /// Builds a gateway for the given repository using a personal token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Service`] when the underlying client cannot be
    /// constructed.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use devpulse::GitHubGateway;
    ///
    /// # fn example() -> Result<(), devpulse::Error> {
    /// let gateway = GitHubGateway::new("ghp_example", "octocat/hello-world",)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(token: &str, repository: &str,) -> Result<Self, Error,>
    {
        let octocrab = Octocrab::builder()
            .personal_token(token,)
            .build()
            .map_err(|e| Error::service(format!("failed to initialize GitHub client: {e}"),),)?;

        Ok(Self {
            octocrab,
            repository: repository.to_owned(),
            limits: RateLimitState::new(),
        },)
    }

    /// Snapshots the request and rate-limit counters for diagnostics.
    pub fn api_stats(&self,) -> ApiStats
    {
        ApiStats {
            request_count:        self.limits.request_count.load(Ordering::SeqCst,),
            rate_limit_remaining: self.limits.remaining.load(Ordering::SeqCst,),
            rate_limit_reset:     self.limits.reset.load(Ordering::SeqCst,),
        }
    }

    fn track_request(&self,)
    {
        self.limits.request_count.fetch_add(1, Ordering::SeqCst,);
        let remaining = self.limits.remaining.load(Ordering::SeqCst,);
        self.limits.remaining.store(remaining.saturating_sub(1,), Ordering::SeqCst,);
    }

    async fn refresh_budget(&self,)
    {
        match self.octocrab.get::<RateLimitEnvelope, _, _,>("/rate_limit", None::<&(),>,).await {
            Ok(envelope,) => {
                self.limits.request_count.fetch_add(1, Ordering::SeqCst,);
                self.limits.remaining.store(envelope.rate.remaining, Ordering::SeqCst,);
                self.limits.reset.store(envelope.rate.reset, Ordering::SeqCst,);
            }
            Err(error,) => {
                warn!("Failed to refresh the rate limit budget: {error}");
            }
        }
    }

    async fn throttle(&self,)
    {
        if self.limits.remaining.load(Ordering::SeqCst,) >= LOW_WATER_MARK {
            return;
        }

        self.refresh_budget().await;

        let remaining = self.limits.remaining.load(Ordering::SeqCst,);
        let reset = self.limits.reset.load(Ordering::SeqCst,);
        match throttle_action(remaining, reset, Utc::now().timestamp(),) {
            ThrottleAction::Proceed => {}
            ThrottleAction::Sleep(wait_secs,) => {
                warn!(
                    "GitHub API rate limit low ({remaining} remaining), waiting {wait_secs}s \
                     for reset"
                );
                sleep(Duration::from_secs(wait_secs as u64,),).await;
            }
            ThrottleAction::Warn(wait_secs,) => {
                warn!(
                    "GitHub API rate limit low ({remaining} remaining), reset {wait_secs}s away \
                     exceeds the wait ceiling"
                );
            }
        }
    }

    async fn fetch<T, P,>(&self, context: &str, route: &str, params: Option<&P,>,) -> Option<T,>
    where
        T: serde::de::DeserializeOwned,
        P: Serialize + ?Sized,
    {
        self.throttle().await;
        self.track_request();
        debug!("GET {route} ({context})");

        match self.octocrab.get(route, params,).await {
            Ok(value,) => Some(value,),
            Err(error,) => {
                warn!("{context} request failed: {error}");
                None
            }
        }
    }

    async fn search(&self, context: &str, query: String, per_page: u8,) -> Option<SearchResults,>
    {
        let params = SearchQuery {
            q: query,
            sort: "updated",
            order: "desc",
            per_page,
        };
        self.fetch(context, "/search/issues", Some(&params,),).await
    }
}

#[async_trait]
impl ActivitySource for GitHubGateway
{
    async fn contributors(&self,) -> Vec<String,>
    {
        let route = format!("/repos/{}/contributors", self.repository);
        let params = PageQuery {
            per_page: PAGE_SIZE,
        };
        let users: Vec<UserRef,> =
            self.fetch("contributor listing", &route, Some(&params,),).await.unwrap_or_default();
        users.into_iter().map(|user| user.login,).collect()
    }

    async fn team_members(&self,) -> Vec<String,>
    {
        let route = format!("/repos/{}/teams", self.repository);
        let teams: Vec<TeamEntry,> =
            self.fetch("team listing", &route, None::<&(),>,).await.unwrap_or_default();

        let mut members = Vec::new();
        for team in teams {
            debug!("Expanding members of team {}", team.slug);
            let members_route = team_members_route(&team.members_url,);
            let params = PageQuery {
                per_page: PAGE_SIZE,
            };
            let entries: Vec<UserRef,> = self
                .fetch("team member listing", &members_route, Some(&params,),)
                .await
                .unwrap_or_default();
            members.extend(entries.into_iter().map(|user| user.login,),);
        }
        members
    }

    async fn collaborators(&self,) -> Vec<String,>
    {
        let route = format!("/repos/{}/collaborators", self.repository);
        let params = PageQuery {
            per_page: PAGE_SIZE,
        };
        let users: Vec<UserRef,> =
            self.fetch("collaborator listing", &route, Some(&params,),).await.unwrap_or_default();
        users.into_iter().map(|user| user.login,).collect()
    }

    async fn commits(
        &self,
        username: &str,
        since: Option<DateTime<Utc,>,>,
        existence_only: bool,
    ) -> Vec<CommitItem,>
    {
        let route = format!("/repos/{}/commits", self.repository);
        let params = CommitListQuery {
            author:   username,
            per_page: if existence_only { 1 } else { PAGE_SIZE },
            since:    since.map(|bound| format_timestamp(&bound,),),
        };
        self.fetch("commit listing", &route, Some(&params,),).await.unwrap_or_default()
    }

    async fn pull_requests(
        &self,
        username: &str,
        since: Option<DateTime<Utc,>,>,
        existence_only: bool,
        merged_only: bool,
    ) -> (Vec<IssueItem,>, u64,)
    {
        let query = pull_request_query(&self.repository, username, since, merged_only,);
        let per_page = if existence_only { 1 } else { PAGE_SIZE };
        match self.search("pull request search", query, per_page,).await {
            Some(results,) => (results.items, results.total_count,),
            None => (Vec::new(), 0,),
        }
    }

    async fn comments(
        &self,
        username: &str,
        since: Option<DateTime<Utc,>,>,
        existence_only: bool,
    ) -> Vec<IssueItem,>
    {
        let query = comment_query(&self.repository, username, since,);
        let per_page = if existence_only { 1 } else { PAGE_SIZE };
        match self.search("comment search", query, per_page,).await {
            Some(results,) => results.items,
            None => Vec::new(),
        }
    }

    async fn open_pull_requests(&self, username: &str,) -> Vec<PullItem,>
    {
        let route = format!("/repos/{}/pulls", self.repository);
        let params = PullListQuery {
            creator:  username,
            state:    "open",
            per_page: PAGE_SIZE,
        };
        self.fetch("open pull request listing", &route, Some(&params,),).await.unwrap_or_default()
    }

    async fn assigned_issues(&self, username: &str,) -> Vec<IssueItem,>
    {
        let route = format!("/repos/{}/issues", self.repository);
        let params = IssueListQuery {
            assignee: username,
            state:    "open",
            per_page: PAGE_SIZE,
        };
        let entries: Vec<IssueItem,> =
            self.fetch("assigned issue listing", &route, Some(&params,),).await.unwrap_or_default();

        let issues: Vec<IssueItem,> =
            entries.into_iter().filter(|entry| entry.pull_request.is_none(),).collect();
        debug!("Found {} open issues assigned to {username}", issues.len());
        issues
    }

    async fn assigned_issue_history(&self, username: &str,) -> Vec<IssueItem,>
    {
        let query = assignment_history_query(&self.repository, username,);
        match self.search("assignment history search", query, PAGE_SIZE,).await {
            Some(results,) => results.items,
            None => Vec::new(),
        }
    }

    async fn issue_timeline(&self, issue_number: u64,) -> Vec<TimelineEvent,>
    {
        let route = format!("/repos/{}/issues/{issue_number}/timeline", self.repository);
        let params = PageQuery {
            per_page: PAGE_SIZE,
        };
        self.fetch("issue timeline", &route, Some(&params,),).await.unwrap_or_default()
    }
}
