//! # CLI Module
//!
//! Command-line interface for Tubelens.
//!
//! Each subcommand is a public `cmd_*` function writing its output to a
//! caller-supplied writer, so commands can be exercised directly in tests.

use crate::config::{AppConfig, ConfigOverrides};
use crate::error::{AppError, Result};
use crate::rotation::{RotationController, WordRotation};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tubelens_core::{
    AccessDecision, AccessQuery, LoadingWord, LocalStore, PlanCatalog, PlanId, WidgetPosition,
    resolve, upgrade_options, usage_report,
};

// =============================================================================
// ARGUMENTS
// =============================================================================

#[derive(Debug, Parser)]
#[command(name = "tubelens", version, about = "Tubelens client utilities")]
pub struct Cli {
    /// Backend base URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Local store file
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Display language (en, ko)
    #[arg(long, global = true)]
    pub lang: Option<String>,

    /// Plan catalog JSON file
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List plans with their features and limits
    Plans {
        #[arg(long)]
        json: bool,
    },

    /// Check one access query against a plan
    Access {
        /// User plan (aliases accepted, unknown = free)
        #[arg(long, default_value = "free")]
        plan: String,
        /// Feature flag to check
        #[arg(long, conflicts_with_all = ["limit", "required_plan"])]
        feature: Option<String>,
        /// Limit to check against --usage
        #[arg(long, conflicts_with = "required_plan")]
        limit: Option<String>,
        /// Units already consumed
        #[arg(long, default_value_t = 0)]
        usage: u64,
        /// Minimum plan required
        #[arg(long)]
        required_plan: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Report every limit of a plan
    Usage {
        #[arg(long, default_value = "free")]
        plan: String,
        /// Consumption as NAME=COUNT, repeatable
        #[arg(long = "used", value_parser = parse_usage)]
        used: Vec<(String, u64)>,
        #[arg(long)]
        json: bool,
    },

    /// Show one loading word
    Word {
        #[arg(long)]
        json: bool,
    },

    /// Run the loading-word rotation
    Rotate {
        /// Words to show before exiting
        #[arg(long, default_value_t = 3)]
        ticks: usize,
        /// Seconds between refreshes
        #[arg(long)]
        interval_secs: Option<u64>,
        /// Also run the external timer
        #[arg(long)]
        with_timer: bool,
    },

    /// Manage the stored bearer token
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Manage dismissed promos
    Promo {
        #[command(subcommand)]
        action: PromoAction,
    },

    /// Manage widget positions
    Widget {
        #[command(subcommand)]
        action: WidgetAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum TokenAction {
    Set { token: String },
    Show,
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum PromoAction {
    Dismiss { name: String },
    Status { name: Option<String> },
}

#[derive(Debug, Subcommand)]
pub enum WidgetAction {
    Set {
        name: String,
        #[arg(allow_negative_numbers = true)]
        x: i32,
        #[arg(allow_negative_numbers = true)]
        y: i32,
    },
    Get {
        name: String,
    },
}

fn parse_usage(raw: &str) -> std::result::Result<(String, u64), String> {
    let (name, count) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=COUNT, got '{}'", raw))?;
    let count = count
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("invalid count in '{}': {}", raw, e))?;
    Ok((name.trim().to_string(), count))
}

/// Build an access query from the mutually exclusive CLI options.
pub fn query_from_args(
    feature: Option<&str>,
    limit: Option<&str>,
    usage: u64,
    required_plan: Option<&str>,
) -> Result<AccessQuery> {
    match (feature, limit, required_plan) {
        (None, None, None) => Ok(AccessQuery::Unrestricted),
        (Some(name), None, None) => Ok(AccessQuery::feature(name)),
        (None, Some(name), None) => Ok(AccessQuery::limit(name, usage)),
        (None, None, Some(raw)) => PlanId::parse(raw)
            .map(AccessQuery::plan)
            .ok_or_else(|| AppError::InvalidInput(format!("unknown plan '{}'", raw))),
        _ => Err(AppError::InvalidInput(
            "use only one of --feature, --limit, --required-plan".to_string(),
        )),
    }
}

// =============================================================================
// PLAN COMMANDS
// =============================================================================

pub fn cmd_plans(catalog: &PlanCatalog, json: bool, out: &mut dyn Write) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(catalog)?)?;
        return Ok(());
    }

    for plan in catalog.plans() {
        writeln!(out, "{} (rank {})", plan.display_name, plan.id.rank())?;
        let features: Vec<&str> = plan.features.iter().map(String::as_str).collect();
        if features.is_empty() {
            writeln!(out, "  features: (none)")?;
        } else {
            writeln!(out, "  features: {}", features.join(", "))?;
        }
        for (name, limit) in &plan.limits {
            writeln!(out, "  {}: {}", name, limit)?;
        }
    }
    Ok(())
}

pub fn cmd_access(
    catalog: &PlanCatalog,
    plan: &str,
    query: &AccessQuery,
    json: bool,
    out: &mut dyn Write,
) -> Result<AccessDecision> {
    let decision = resolve(catalog, plan, query);

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&decision)?)?;
        return Ok(decision);
    }

    let verdict = if decision.granted { "GRANTED" } else { "DENIED" };
    writeln!(out, "{} for plan '{}'", verdict, decision.current_plan)?;
    if let Some(limit) = decision.limit {
        writeln!(out, "  limit: {}", limit)?;
    }
    if let Some(remaining) = decision.remaining_usage {
        writeln!(out, "  remaining: {}", remaining)?;
    }
    if let Some(required) = decision.required_plan {
        writeln!(out, "  upgrade to: {}", catalog.plan(required).display_name)?;
    } else if !decision.granted {
        writeln!(out, "  no plan includes this")?;
    }
    Ok(decision)
}

pub fn cmd_usage(
    catalog: &PlanCatalog,
    plan: &str,
    used: &[(String, u64)],
    json: bool,
    out: &mut dyn Write,
) -> Result<BTreeMap<String, AccessDecision>> {
    let usage: BTreeMap<String, u64> = used.iter().cloned().collect();
    let report = usage_report(catalog, plan, &usage);

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(report);
    }

    for (name, decision) in &report {
        let used = usage.get(name).copied().unwrap_or(0);
        let limit = decision
            .limit
            .map(|l| l.to_string())
            .unwrap_or_else(|| "-".to_string());
        let mark = if decision.granted { "ok" } else { "blocked" };
        writeln!(out, "{:<24} {:>6} / {:<9} {}", name, used, limit, mark)?;
    }

    let upgrades: Vec<&str> = upgrade_options(catalog, plan)
        .iter()
        .map(|p| p.display_name.as_str())
        .collect();
    if !upgrades.is_empty() {
        writeln!(out, "upgrades: {}", upgrades.join(", "))?;
    }
    Ok(report)
}

// =============================================================================
// WORD COMMANDS
// =============================================================================

fn write_word(word: &LoadingWord, json: bool, out: &mut dyn Write) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string(word)?)?;
        return Ok(());
    }

    writeln!(out, "{} - {}", word.term, word.short_definition)?;
    writeln!(out, "  {}", word.definition)?;
    if let Some(record) = word.record_id.as_ref().filter(|_| word.is_clickable()) {
        writeln!(out, "  from analysis {}", record)?;
    }
    Ok(())
}

/// Pick and print a single loading word.
pub async fn cmd_word(
    config: &AppConfig,
    store: &LocalStore,
    json: bool,
    out: &mut dyn Write,
) -> Result<Option<LoadingWord>> {
    let client = config.history_client(store.auth_token()?);
    let mut rotation = WordRotation::new(client, config.rotation);

    let word = rotation.refresh().await;
    if let Some(word) = &word {
        write_word(word, json, out)?;
    }
    Ok(word)
}

/// Mount a rotation and print `ticks` words as they are published.
///
/// Stops early on Ctrl-C.
pub async fn cmd_rotate(
    config: &AppConfig,
    store: &LocalStore,
    ticks: usize,
    with_timer: bool,
    out: &mut dyn Write,
) -> Result<usize> {
    let client = config.history_client(store.auth_token()?);
    let mut controller = RotationController::new(WordRotation::new(client, config.rotation));
    let mut rx = controller.subscribe();

    controller.mount();
    if with_timer {
        controller.start_timer();
    }

    let mut shown = 0;
    while shown < ticks {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let word = rx.borrow_and_update().clone();
                if let Some(word) = word {
                    write_word(&word, false, out)?;
                    shown += 1;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }

    controller.unmount();
    Ok(shown)
}

// =============================================================================
// STORAGE COMMANDS
// =============================================================================

pub fn cmd_token(store: &LocalStore, action: &TokenAction, out: &mut dyn Write) -> Result<()> {
    match action {
        TokenAction::Set { token } => {
            if token.trim().is_empty() {
                return Err(AppError::InvalidInput("token is empty".to_string()));
            }
            store.set_auth_token(token.trim())?;
            writeln!(out, "token saved")?;
        }
        TokenAction::Show => match store.auth_token()? {
            Some(token) => writeln!(out, "{}", mask_token(&token))?,
            None => writeln!(out, "not signed in")?,
        },
        TokenAction::Clear => {
            if store.clear_auth_token()? {
                writeln!(out, "token cleared")?;
            } else {
                writeln!(out, "no token stored")?;
            }
        }
    }
    Ok(())
}

/// Show only the first four characters of a token.
pub fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    format!("{}****", visible)
}

pub fn cmd_promo(store: &LocalStore, action: &PromoAction, out: &mut dyn Write) -> Result<()> {
    match action {
        PromoAction::Dismiss { name } => {
            store.dismiss_promo(name)?;
            writeln!(out, "promo '{}' dismissed", name)?;
        }
        PromoAction::Status { name: Some(name) } => {
            let state = if store.is_promo_dismissed(name)? {
                "dismissed"
            } else {
                "active"
            };
            writeln!(out, "{}: {}", name, state)?;
        }
        PromoAction::Status { name: None } => {
            for name in store.dismissed_promos()? {
                writeln!(out, "{}: dismissed", name)?;
            }
        }
    }
    Ok(())
}

pub fn cmd_widget(store: &LocalStore, action: &WidgetAction, out: &mut dyn Write) -> Result<()> {
    match action {
        WidgetAction::Set { name, x, y } => {
            store.set_widget_position(name, WidgetPosition::new(*x, *y))?;
            writeln!(out, "{} at ({}, {})", name, x, y)?;
        }
        WidgetAction::Get { name } => match store.widget_position(name)? {
            Some(pos) => writeln!(out, "{} at ({}, {})", name, pos.x, pos.y)?,
            None => writeln!(out, "{}: default position", name)?,
        },
    }
    Ok(())
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Resolve configuration and run the selected command against stdout.
pub async fn run(cli: Cli) -> Result<()> {
    let interval = match &cli.command {
        Command::Rotate {
            interval_secs: Some(secs),
            ..
        } => Some(Duration::from_secs(*secs)),
        _ => None,
    };
    let overrides = ConfigOverrides {
        api_url: cli.api_url.clone(),
        store: cli.store.clone(),
        lang: cli.lang.clone(),
        catalog: cli.catalog.clone(),
        refresh_interval: interval,
    };
    let config = AppConfig::resolve(&overrides)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Command::Plans { json } => cmd_plans(&config.load_catalog()?, *json, &mut out),
        Command::Access {
            plan,
            feature,
            limit,
            usage,
            required_plan,
            json,
        } => {
            let query = query_from_args(
                feature.as_deref(),
                limit.as_deref(),
                *usage,
                required_plan.as_deref(),
            )?;
            cmd_access(&config.load_catalog()?, plan, &query, *json, &mut out).map(|_| ())
        }
        Command::Usage { plan, used, json } => {
            cmd_usage(&config.load_catalog()?, plan, used, *json, &mut out).map(|_| ())
        }
        Command::Word { json } => {
            let store = LocalStore::open(&config.store_path)?;
            cmd_word(&config, &store, *json, &mut out).await.map(|_| ())
        }
        Command::Rotate {
            ticks, with_timer, ..
        } => {
            let store = LocalStore::open(&config.store_path)?;
            cmd_rotate(&config, &store, *ticks, *with_timer, &mut out)
                .await
                .map(|_| ())
        }
        Command::Token { action } => {
            cmd_token(&LocalStore::open(&config.store_path)?, action, &mut out)
        }
        Command::Promo { action } => {
            cmd_promo(&LocalStore::open(&config.store_path)?, action, &mut out)
        }
        Command::Widget { action } => {
            cmd_widget(&LocalStore::open(&config.store_path)?, action, &mut out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_usage_accepts_name_equals_count() {
        assert_eq!(
            parse_usage("monthly_analyses=12"),
            Ok(("monthly_analyses".to_string(), 12))
        );
        assert!(parse_usage("monthly_analyses").is_err());
        assert!(parse_usage("monthly_analyses=-3").is_err());
    }

    #[test]
    fn cli_parses_access_flags() {
        let cli = Cli::try_parse_from([
            "tubelens", "access", "--plan", "pro", "--limit", "monthly_analyses", "--usage", "40",
        ])
        .unwrap();
        match cli.command {
            Command::Access { plan, limit, usage, .. } => {
                assert_eq!(plan, "pro");
                assert_eq!(limit.as_deref(), Some("monthly_analyses"));
                assert_eq!(usage, 40);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn cli_rejects_conflicting_queries() {
        let result = Cli::try_parse_from([
            "tubelens", "access", "--feature", "corpus_chat", "--limit", "monthly_analyses",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_accepts_negative_widget_coordinates() {
        let cli = Cli::try_parse_from(["tubelens", "widget", "set", "loading_word", "-15", "300"])
            .unwrap();
        match cli.command {
            Command::Widget {
                action: WidgetAction::Set { x, y, .. },
            } => assert_eq!((x, y), (-15, 300)),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn mask_token_hides_tail() {
        assert_eq!(mask_token("abcdef123"), "abcd****");
        assert_eq!(mask_token("ab"), "ab****");
    }
}
