//! Command-line entry point for the devpulse activity tracker.
//!
//! The binary resolves the roster of developers for one repository, runs the
//! activity classifier for each of them through the GitHub gateway, and
//! reports the outcome to a Discord webhook. Configuration failures exit
//! non-zero before any network call; per-developer and delivery failures are
//! logged and leave the exit status untouched.

use std::{path::Path, process};

use chrono::Utc;
use clap::Parser;
use devpulse::{
    DebugArtifact, DiscordSink, Error, GitHubGateway, TrackerArgs, TrackerConfig, build_payload,
    collect_developer_activity, fallback_record, log_summary, resolve_roster,
    write_debug_artifact,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main()
{
    let args = TrackerArgs::parse();
    init_tracing(args.debug,);

    let config = match TrackerConfig::from_args(args,) {
        Ok(config,) => config,
        Err(error,) => {
            eprintln!("{}", error.to_display_string());
            process::exit(1,);
        }
    };

    tokio::select! {
        outcome = run(&config,) => {
            if let Err(error,) = outcome {
                error!("Run aborted: {error}");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted by user, exiting");
        }
    }
}

fn init_tracing(debug: bool,)
{
    let level = if debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into(),),)
        .init();
}

/// Executes one tracking run end to end.
///
/// # Errors
///
/// Returns an [`Error`] only when the GitHub client cannot be constructed.
/// Everything past that point degrades to logging.
async fn run(config: &TrackerConfig,) -> Result<(), Error,>
{
    info!("Tracking developer activity for {}", config.repository);
    info!(
        "Inactivity threshold: {} days, no-issues threshold: {} days",
        config.thresholds.inactivity_days, config.thresholds.no_issues_days
    );

    let gateway = GitHubGateway::new(&config.token, &config.repository,)?;
    let roster = resolve_roster(&gateway, &config.active_devs,).await;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.yellow} [{elapsed_precise}] {msg}",)
            .expect("valid template",),
    );

    let now = Utc::now();
    let mut records = Vec::with_capacity(roster.len(),);
    for username in &roster {
        spinner.set_message(format!("collecting activity for {username}..."),);
        let record =
            match collect_developer_activity(&gateway, username, config.thresholds, now,).await {
                Ok(record,) => record,
                Err(error,) => {
                    error!("Failed to collect activity for {username}: {error}");
                    fallback_record(username, &error,)
                }
            };
        records.push(record,);
    }
    spinner.finish_with_message(format!("collected activity for {} developers", records.len()),);

    if records.is_empty() {
        error!("No developer data collected");
        return Ok((),);
    }

    let inactive_count = records.iter().filter(|record| record.is_inactive,).count();
    let no_issues_count = records.iter().filter(|record| record.has_no_issues,).count();
    info!("Found {inactive_count} inactive developers");
    info!("Found {no_issues_count} developers without assigned issues");
    info!("Gathered stats for {} developers", records.len());

    if config.debug {
        log_summary(&records,);
        let artifact = DebugArtifact {
            repository:   &config.repository,
            generated_at: now,
            settings:     config.thresholds.into(),
            api_stats:    gateway.api_stats(),
            developers:   &records,
        };
        if let Err(error,) = write_debug_artifact(&artifact, Path::new(".",),) {
            error!("Failed to save debug info: {error}");
        }
    }

    if config.dry_run {
        info!("Dry run mode - skipping discord notification");
    } else if let Some(webhook_url,) = config.webhook_url.as_deref() {
        match build_payload(&records, &config.repository, config.thresholds, now,) {
            Some(payload,) => DiscordSink::new(webhook_url,).send(&payload,).await,
            None => info!("No developers to notify"),
        }
    }

    Ok((),)
}
