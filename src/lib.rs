//! Developer activity tracking for a single GitHub repository.
//!
//! The crate backs a scheduled CI binary: it resolves the roster of
//! developers to watch, classifies each one through authenticated REST and
//! search queries, and reports inactive developers and developers without
//! assigned issues to a Discord webhook. The library surface exposes the
//! gateway trait, the classifier and the report builder so fixture-backed
//! tests can drive the full pipeline without network access.

mod activity;
mod artifact;
mod config;
mod dates;
mod error;
mod github;
mod report;
mod roster;

pub use activity::{
    ActivityStats, DeveloperActivity, LastActivityKind, RecentActivity, STATS_WINDOW_DAYS,
    Thresholds, check_recent_activity, collect_developer_activity, fallback_record,
};
pub use artifact::{ArtifactSettings, DebugArtifact, write_debug_artifact};
pub use config::{TrackerArgs, TrackerConfig, parse_allowlist};
pub use dates::{TIMESTAMP_FORMAT, cutoff, format_timestamp, parse_timestamp, relative_display};
pub use error::{Error, artifact_io_error};
pub use github::{
    ActivitySource, ApiStats, CommitItem, GitHubGateway, IssueItem, LOW_WATER_MARK,
    MAX_THROTTLE_WAIT_SECS, PullItem, TimelineEvent, UserRef, first_assignment_date,
};
pub use report::{
    DiscordPayload, DiscordSink, Embed, EmbedField, EmbedFooter, build_payload, log_summary,
};
pub use roster::resolve_roster;
