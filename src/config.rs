//! Runtime configuration for activity tracking runs.
//!
//! Configuration values arrive through CLI flags or the environment variables
//! used by the scheduled workflow. The types in this module separate raw
//! argument parsing from validation so that every invariant is checked before
//! the first API call is made.

use clap::{ArgAction, Parser};
use regex::Regex;

use crate::{activity::Thresholds, error::Error};

/// Inclusive range accepted for both day thresholds.
const THRESHOLD_MIN_DAYS: i64 = 1;
const THRESHOLD_MAX_DAYS: i64 = 3650;

/// Shape expected for the `owner/name` repository identifier.
const REPOSITORY_PATTERN: &str = r"^[A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+$";

/// Raw command-line and environment arguments accepted by the tracker.
///
/// Values are optional at this stage; [`TrackerConfig::from_args`] enforces
/// which combinations are required for a run.
#[derive(Debug, Parser,)]
#[command(
    name = "devpulse",
    version,
    about = "Track developer activity on a GitHub repository and report to Discord"
)]
pub struct TrackerArgs
{
    /// GitHub API token used for repository and search queries.
    #[arg(long, env = "GH_TOKEN", hide_env_values = true)]
    pub token: Option<String,>,

    /// Discord webhook URL receiving the activity report.
    #[arg(long = "webhook-url", env = "DISCORD_WEBHOOK_URL", hide_env_values = true)]
    pub webhook_url: Option<String,>,

    /// Repository to inspect, in `owner/name` form.
    #[arg(long, env = "GH_REPOSITORY", value_name = "OWNER/NAME")]
    pub repository: Option<String,>,

    /// Days without qualifying activity before a developer counts as inactive.
    #[arg(
        long = "inactivity-threshold-days",
        env = "INACTIVITY_THRESHOLD_DAYS",
        value_name = "DAYS",
        default_value_t = 7
    )]
    pub inactivity_threshold_days: i64,

    /// Days without an issue assignment before a developer counts as lacking
    /// work.
    #[arg(
        long = "no-issues-threshold-days",
        env = "NO_ISSUES_THRESHOLD_DAYS",
        value_name = "DAYS",
        default_value_t = 3
    )]
    pub no_issues_threshold_days: i64,

    /// Comma-separated developer logins tracked instead of the discovered
    /// roster.
    #[arg(long = "active-devs", env = "ACTIVE_DEVS", value_name = "LOGINS")]
    pub active_devs: Option<String,>,

    /// Enables debug logging, the console summary and the debug artifact.
    #[arg(long, action = ArgAction::SetTrue)]
    pub debug: bool,

    /// Collects and logs activity without posting the Discord notification.
    #[arg(long = "dry-run", action = ArgAction::SetTrue)]
    pub dry_run: bool,
}

/// Validated configuration driving a tracking run.
///
/// Instances are only obtainable through [`TrackerConfig::from_args`], which
/// guarantees that the token, repository and webhook requirements hold and
/// that both thresholds fall within the supported range.
#[derive(Debug, Clone,)]
pub struct TrackerConfig
{
    /// GitHub API token forwarded to the gateway.
    pub token:       String,
    /// Discord webhook URL; absent only when `dry_run` is set.
    pub webhook_url: Option<String,>,
    /// Repository identifier in `owner/name` form.
    pub repository:  String,
    /// Day thresholds applied by the classifier.
    pub thresholds:  Thresholds,
    /// Explicit roster override; empty means discover the roster.
    pub active_devs: Vec<String,>,
    /// Debug mode flag.
    pub debug:       bool,
    /// Dry-run flag suppressing the Discord notification.
    pub dry_run:     bool,
}

impl TrackerConfig
{
    /// Validates parsed arguments into a runnable configuration.
    ///
    /// Validation happens before any network access: the token and repository
    /// must be present and non-blank, the webhook is required unless
    /// `--dry-run` is set, the repository must use `owner/name` form, and the
    /// thresholds must stay within `1..=3650` days.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] describing the first violated rule.
    ///
    /// # Example
    ///
    /// ```
    /// use clap::Parser;
    /// use devpulse::{TrackerArgs, TrackerConfig};
    ///
    /// let args = TrackerArgs::try_parse_from([
    ///     "devpulse",
    ///     "--token",
    ///     "ghp_example",
    ///     "--repository",
    ///     "octocat/hello-world",
    ///     "--dry-run",
    /// ],)
    /// .expect("arguments parse",);
    /// let config = TrackerConfig::from_args(args,).expect("configuration is valid",);
    /// assert_eq!(config.repository, "octocat/hello-world");
    /// ```
    pub fn from_args(args: TrackerArgs,) -> Result<Self, Error,>
    {
        let token =
            required(args.token, "missing GitHub token (set GH_TOKEN or pass --token)",)?;

        let webhook_url = normalized(args.webhook_url,);
        if webhook_url.is_none() && !args.dry_run {
            return Err(Error::validation(
                "missing Discord webhook (set DISCORD_WEBHOOK_URL or pass --webhook-url, or use \
                 --dry-run)",
            ),);
        }

        let repository = required(
            args.repository,
            "missing repository (set GH_REPOSITORY or pass --repository)",
        )?;
        validate_repository(&repository,)?;

        let inactivity_days = validate_threshold(args.inactivity_threshold_days, "inactivity",)?;
        let no_issues_days = validate_threshold(args.no_issues_threshold_days, "no-issues",)?;

        let active_devs = args.active_devs.as_deref().map(parse_allowlist,).unwrap_or_default();

        Ok(Self {
            token,
            webhook_url,
            repository,
            thresholds: Thresholds {
                inactivity_days,
                no_issues_days,
            },
            active_devs,
            debug: args.debug,
            dry_run: args.dry_run,
        },)
    }
}

/// Splits a comma-separated allowlist into trimmed, non-empty logins.
///
/// Order and duplicates are preserved so that an explicit roster is used
/// verbatim.
///
/// # Example
///
/// ```
/// use devpulse::parse_allowlist;
///
/// let devs = parse_allowlist(" alice, bob ,,carol ",);
/// assert_eq!(devs, vec!["alice".to_string(), "bob".to_string(), "carol".to_string()]);
/// ```
pub fn parse_allowlist(raw: &str,) -> Vec<String,>
{
    raw.split(',',)
        .map(str::trim,)
        .filter(|login| !login.is_empty(),)
        .map(ToOwned::to_owned,)
        .collect()
}

fn required(value: Option<String,>, message: &str,) -> Result<String, Error,>
{
    value
        .map(|raw| raw.trim().to_owned(),)
        .filter(|trimmed| !trimmed.is_empty(),)
        .ok_or_else(|| Error::validation(message,),)
}

fn normalized(value: Option<String,>,) -> Option<String,>
{
    value.map(|raw| raw.trim().to_owned(),).filter(|trimmed| !trimmed.is_empty(),)
}

fn validate_repository(repository: &str,) -> Result<(), Error,>
{
    let pattern = Regex::new(REPOSITORY_PATTERN,)
        .map_err(|e| Error::validation(format!("invalid repository pattern: {e}"),),)?;

    if pattern.is_match(repository,) {
        Ok((),)
    } else {
        Err(Error::validation(format!(
            "repository must use the owner/name form, got {repository:?}"
        ),),)
    }
}

fn validate_threshold(days: i64, label: &str,) -> Result<i64, Error,>
{
    if (THRESHOLD_MIN_DAYS..=THRESHOLD_MAX_DAYS).contains(&days,) {
        Ok(days,)
    } else {
        Err(Error::validation(format!(
            "{label} threshold must be between {THRESHOLD_MIN_DAYS} and {THRESHOLD_MAX_DAYS} \
             days, got {days}"
        ),),)
    }
}

#[cfg(test)]
mod tests
{
    use clap::Parser;

    use super::{TrackerArgs, TrackerConfig, parse_allowlist};
    use crate::error::Error;

    fn args() -> TrackerArgs
    {
        TrackerArgs {
            token:                     Some("ghp_example".to_owned(),),
            webhook_url:               Some("https://discord.com/api/webhooks/1/abc".to_owned(),),
            repository:                Some("octocat/hello-world".to_owned(),),
            inactivity_threshold_days: 7,
            no_issues_threshold_days:  3,
            active_devs:               None,
            debug:                     false,
            dry_run:                   false,
        }
    }

    fn expect_validation(result: Result<TrackerConfig, Error,>,) -> String
    {
        match result {
            Err(Error::Validation {
                message,
            },) => message,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn from_args_accepts_complete_configuration()
    {
        let config = TrackerConfig::from_args(args(),).expect("configuration is valid",);

        assert_eq!(config.token, "ghp_example");
        assert_eq!(config.repository, "octocat/hello-world");
        assert_eq!(config.thresholds.inactivity_days, 7);
        assert_eq!(config.thresholds.no_issues_days, 3);
        assert!(config.active_devs.is_empty());
        assert!(!config.dry_run);
    }

    #[test]
    fn from_args_rejects_missing_token()
    {
        let mut incomplete = args();
        incomplete.token = None;

        let message = expect_validation(TrackerConfig::from_args(incomplete,),);
        assert!(message.contains("GH_TOKEN"));
    }

    #[test]
    fn from_args_rejects_blank_token()
    {
        let mut incomplete = args();
        incomplete.token = Some("   ".to_owned(),);

        let message = expect_validation(TrackerConfig::from_args(incomplete,),);
        assert!(message.contains("GH_TOKEN"));
    }

    #[test]
    fn from_args_requires_webhook_without_dry_run()
    {
        let mut incomplete = args();
        incomplete.webhook_url = None;

        let message = expect_validation(TrackerConfig::from_args(incomplete,),);
        assert!(message.contains("DISCORD_WEBHOOK_URL"));
    }

    #[test]
    fn from_args_allows_missing_webhook_in_dry_run()
    {
        let mut relaxed = args();
        relaxed.webhook_url = None;
        relaxed.dry_run = true;

        let config = TrackerConfig::from_args(relaxed,).expect("dry run skips the webhook",);
        assert!(config.webhook_url.is_none());
        assert!(config.dry_run);
    }

    #[test]
    fn from_args_rejects_missing_repository()
    {
        let mut incomplete = args();
        incomplete.repository = None;

        let message = expect_validation(TrackerConfig::from_args(incomplete,),);
        assert!(message.contains("GH_REPOSITORY"));
    }

    #[test]
    fn from_args_rejects_malformed_repositories()
    {
        for malformed in ["noslash", "owner/", "/name", "a/b/c", "owner/na me"] {
            let mut invalid = args();
            invalid.repository = Some(malformed.to_owned(),);

            let message = expect_validation(TrackerConfig::from_args(invalid,),);
            assert!(message.contains("owner/name"), "{malformed} should be rejected");
        }
    }

    #[test]
    fn from_args_rejects_out_of_range_thresholds()
    {
        for days in [0, -1, 3651] {
            let mut invalid = args();
            invalid.inactivity_threshold_days = days;

            let message = expect_validation(TrackerConfig::from_args(invalid,),);
            assert!(message.contains("inactivity threshold"), "{days} should be rejected");
        }

        let mut invalid = args();
        invalid.no_issues_threshold_days = 0;
        let message = expect_validation(TrackerConfig::from_args(invalid,),);
        assert!(message.contains("no-issues threshold"));
    }

    #[test]
    fn from_args_parses_allowlist_into_roster_override()
    {
        let mut with_allowlist = args();
        with_allowlist.active_devs = Some(" alice, bob ,,carol ".to_owned(),);

        let config = TrackerConfig::from_args(with_allowlist,).expect("configuration is valid",);
        assert_eq!(config.active_devs, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn parse_allowlist_preserves_order_and_duplicates()
    {
        let devs = parse_allowlist("bob,alice,bob",);
        assert_eq!(devs, vec!["bob", "alice", "bob"]);
    }

    #[test]
    fn parse_allowlist_handles_empty_input()
    {
        assert!(parse_allowlist("",).is_empty());
        assert!(parse_allowlist(" , , ",).is_empty());
    }

    #[test]
    fn cli_parses_flags_with_defaults()
    {
        let parsed = TrackerArgs::try_parse_from([
            "devpulse",
            "--token",
            "ghp_example",
            "--repository",
            "octocat/hello-world",
            "--dry-run",
        ],)
        .expect("arguments parse",);

        assert_eq!(parsed.inactivity_threshold_days, 7);
        assert_eq!(parsed.no_issues_threshold_days, 3);
        assert!(parsed.dry_run);
        assert!(!parsed.debug);
    }

    #[test]
    fn cli_accepts_threshold_overrides()
    {
        let parsed = TrackerArgs::try_parse_from([
            "devpulse",
            "--token",
            "ghp_example",
            "--repository",
            "octocat/hello-world",
            "--inactivity-threshold-days",
            "14",
            "--no-issues-threshold-days",
            "5",
            "--debug",
            "--dry-run",
        ],)
        .expect("arguments parse",);

        let config = TrackerConfig::from_args(parsed,).expect("configuration is valid",);
        assert_eq!(config.thresholds.inactivity_days, 14);
        assert_eq!(config.thresholds.no_issues_days, 5);
        assert!(config.debug);
    }
}
