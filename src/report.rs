// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Discord report assembly and delivery.
//!
//! The module turns per-developer activity records into a webhook payload of
//! up to four embed cards (activity summary, inactive developers, developers
//! without assigned issues, recommendations) and posts it. Payload assembly
//! is pure and deterministic; delivery failures are logged and never abort a
//! run.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

use crate::{
    activity::{DeveloperActivity, LastActivityKind, STATS_WINDOW_DAYS, Thresholds},
    dates::format_timestamp,
    error::Error
};

/// Accent color of the summary and recommendations cards.
const SUMMARY_COLOR: u32 = 3_066_993;
/// Accent color of the inactive developers card.
const INACTIVE_COLOR: u32 = 15_105_570;
/// Accent color of the no-assigned-issues card.
const NO_ISSUES_COLOR: u32 = 15_844_367;

/// Webhook payload wrapping the embed cards.
#[derive(Debug, Serialize)]
pub struct DiscordPayload {
    /// Embed cards in presentation order.
    pub embeds: Vec<Embed>
}

/// One embed card of the report.
#[derive(Debug, Serialize)]
pub struct Embed {
    /// Card heading.
    pub title:       String,
    /// Introductory text above the fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Accent color as a decimal RGB value.
    pub color:       u32,
    /// Per-entry fields of the card.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields:      Vec<EmbedField>,
    /// Footer line below the fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer:      Option<EmbedFooter>
}

/// Labeled field inside an embed card.
#[derive(Debug, Serialize)]
pub struct EmbedField {
    /// Field heading.
    pub name:   String,
    /// Field body.
    pub value:  String,
    /// Whether the field participates in the side-by-side layout.
    pub inline: bool
}

/// Footer line of an embed card.
#[derive(Debug, Serialize)]
pub struct EmbedFooter {
    /// Footer text.
    pub text: String
}

/// Assembles the webhook payload for the given records.
///
/// Returns `None` when `records` is empty. The summary card is always first
/// and the recommendations card always last; the inactive and no-issues cards
/// appear only when at least one record qualifies, so the payload carries
/// between two and four embeds. Assembly is pure and the result depends only
/// on the inputs.
pub fn build_payload(
    records: &[DeveloperActivity],
    repository: &str,
    thresholds: Thresholds,
    now: DateTime<Utc>
) -> Option<DiscordPayload> {
    if records.is_empty() {
        return None;
    }

    let mut embeds = vec![summary_embed(records, repository, now)];

    let inactive: Vec<&DeveloperActivity> =
        records.iter().filter(|record| record.is_inactive).collect();
    if !inactive.is_empty() {
        embeds.push(inactive_embed(&inactive, thresholds.inactivity_days));
    }

    let no_issues: Vec<&DeveloperActivity> =
        records.iter().filter(|record| record.has_no_issues).collect();
    if !no_issues.is_empty() {
        embeds.push(no_issues_embed(&no_issues, thresholds.no_issues_days));
    }

    embeds.push(recommendations_embed());

    Some(DiscordPayload {
        embeds
    })
}

/// Logs the per-developer console summary used in debug mode.
pub fn log_summary(records: &[DeveloperActivity]) {
    for record in records {
        let status = if record.is_inactive {
            format!(
                "INACTIVE - {}",
                record.inactivity_reason.as_deref().unwrap_or("unknown reason")
            )
        } else if record.has_no_issues {
            "NO ISSUES ASSIGNED".to_owned()
        } else {
            "ACTIVE".to_owned()
        };
        let kind = record.stats.last_activity_type.map_or("unknown", LastActivityKind::as_str);

        info!("Developer: {}", record.username);
        info!("  PRs created: {}", record.stats.prs_created);
        info!("  PRs merged: {}", record.stats.prs_merged);
        info!("  Assigned issues: {}", record.stats.issues_assigned);
        info!("  Comments: {}", record.stats.comments);
        info!("  Status: {status}");
        info!("  Last active: {} ({kind})", record.stats.last_activity_display);
    }
}

fn summary_embed(
    records: &[DeveloperActivity],
    repository: &str,
    now: DateTime<Utc>
) -> Embed {
    let mut ranked: Vec<&DeveloperActivity> = records.iter().collect();
    ranked.sort_by(|a, b| activity_total(b).cmp(&activity_total(a)));

    let fields = ranked
        .iter()
        .map(|record| EmbedField {
            name:   format!("👤 @{}", record.username),
            value:  summary_field_value(record),
            inline: true
        })
        .collect();

    Embed {
        title:       "📊 developer activity summary".to_owned(),
        description: Some(format!("activity in the past {STATS_WINDOW_DAYS} days:")),
        color:       SUMMARY_COLOR,
        fields,
        footer:      Some(EmbedFooter {
            text: format!("{repository} | {}", format_timestamp(&now))
        })
    }
}

fn summary_field_value(record: &DeveloperActivity) -> String {
    let stats = &record.stats;
    format!(
        "{} **{}** PRs created\n{} **{}** PRs merged\n{} **{}** current issues\n{} **{}** comments\n\nLast active: **{}**",
        level_emoji(stats.prs_created, 3),
        stats.prs_created,
        level_emoji(stats.prs_merged, 3),
        stats.prs_merged,
        level_emoji(stats.issues_assigned, 2),
        stats.issues_assigned,
        level_emoji(stats.comments, 5),
        stats.comments,
        stats.last_activity_display
    )
}

fn inactive_embed(records: &[&DeveloperActivity], threshold_days: i64) -> Embed {
    let fields = records
        .iter()
        .map(|record| EmbedField {
            name:   format!("👤 @{}", record.username),
            value:  format!(
                "last active: {}\nreason: {}",
                record.stats.last_activity_display,
                record.inactivity_reason.as_deref().unwrap_or("unknown reason")
            ),
            inline: false
        })
        .collect();

    Embed {
        title:       "💤 inactive developers".to_owned(),
        description: Some(format!(
            "these developers have had no activity in the past **{threshold_days} days**."
        )),
        color:       INACTIVE_COLOR,
        fields,
        footer:      None
    }
}

fn no_issues_embed(records: &[&DeveloperActivity], threshold_days: i64) -> Embed {
    let fields = records
        .iter()
        .map(|record| EmbedField {
            name:   format!("👤 @{}", record.username),
            value:  format!("last assigned: {}", record.stats.last_activity_display),
            inline: false
        })
        .collect();

    Embed {
        title:       "📝 developers without assigned issues".to_owned(),
        description: Some(format!(
            "these developers have not had issues assigned for **{threshold_days}+ days**."
        )),
        color:       NO_ISSUES_COLOR,
        fields,
        footer:      None
    }
}

fn recommendations_embed() -> Embed {
    Embed {
        title:       "💡 recommendations".to_owned(),
        description: None,
        color:       SUMMARY_COLOR,
        fields:      vec![
            EmbedField {
                name:   "for inactive developers".to_owned(),
                value:  "- provide status updates on discord\n- create and review pull requests"
                    .to_owned(),
                inline: false
            },
            EmbedField {
                name:   "for developers without issues".to_owned(),
                value:  "- pick up new issues from the backlog\n- help review open prs".to_owned(),
                inline: false
            },
        ],
        footer:      None
    }
}

fn activity_total(record: &DeveloperActivity) -> u64 {
    record.stats.prs_created + record.stats.prs_merged + record.stats.comments
}

fn level_emoji(count: u64, hot: u64) -> &'static str {
    if count > hot {
        "🔥"
    } else if count > 0 {
        "✅"
    } else {
        "⬜"
    }
}

/// Posts assembled payloads to a Discord webhook.
///
/// Delivery is best-effort: [`DiscordSink::send`] reports the outcome through
/// logging and never propagates transport or status failures to the caller.
#[derive(Debug)]
pub struct DiscordSink {
    client:      Client,
    webhook_url: String
}

impl DiscordSink {
    /// Creates a sink posting to the given webhook URL.
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            client:      Client::new(),
            webhook_url: webhook_url.into()
        }
    }

    /// Posts the payload, logging success or failure.
    pub async fn send(&self, payload: &DiscordPayload) {
        match self.post(payload).await {
            Ok(()) => info!("Discord notification sent successfully"),
            Err(error) => error!("Failed to send discord notification: {error}")
        }
    }

    async fn post(&self, payload: &DiscordPayload) -> Result<(), Error> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(payload)
            .send()
            .await
            .map_err(|e| Error::service(format!("failed to reach discord webhook: {e}")))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(Error::service(format!("discord webhook returned {status}: {body}")))
        }
    }
}
