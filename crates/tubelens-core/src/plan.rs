//! # Plan Module
//!
//! Subscription plans and the static plan catalog.
//!
//! Plans form a closed, totally ordered set. The catalog is configuration:
//! built once (from [`PlanCatalog::builtin`] or a JSON document) and never
//! mutated afterwards.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// =============================================================================
// PLAN IDENTIFIER
// =============================================================================

/// Subscription plan identifier.
///
/// Variant order is the rank order; the derived `Ord` is relied upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanId {
    Free,
    Student,
    Starter,
    Pro,
    Team,
}

impl PlanId {
    /// All plans, lowest rank first.
    pub const ALL: [PlanId; 5] = [
        PlanId::Free,
        PlanId::Student,
        PlanId::Starter,
        PlanId::Pro,
        PlanId::Team,
    ];

    /// Ordinal rank (0 = lowest privilege).
    #[must_use]
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Canonical lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PlanId::Free => "free",
            PlanId::Student => "student",
            PlanId::Starter => "starter",
            PlanId::Pro => "pro",
            PlanId::Team => "team",
        }
    }

    /// Parse a canonical name or a legacy alias.
    ///
    /// Returns `None` for anything unrecognized.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "free" => Some(PlanId::Free),
            "student" | "edu" | "education" => Some(PlanId::Student),
            "starter" | "basic" | "plus" => Some(PlanId::Starter),
            "pro" | "premium" | "professional" => Some(PlanId::Pro),
            "team" | "business" | "enterprise" => Some(PlanId::Team),
            _ => None,
        }
    }

    /// Normalize a raw plan string, falling back to [`PlanId::Free`].
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        Self::parse(raw).unwrap_or(PlanId::Free)
    }

    /// Plans ranked strictly above this one, nearest first.
    pub fn above(self) -> impl Iterator<Item = PlanId> {
        Self::ALL.into_iter().filter(move |p| *p > self)
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// LIMIT
// =============================================================================

/// A numeric usage ceiling.
///
/// On the wire a limit is a signed integer where `-1` means unlimited.
/// Variant order makes `Unlimited` compare greater than any cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Limit {
    Capped(u64),
    Unlimited,
}

impl Limit {
    /// Wire value meaning "unlimited".
    pub const UNLIMITED_SENTINEL: i64 = -1;

    /// Whether `usage` more units of consumption are still allowed.
    #[must_use]
    pub fn admits(self, usage: u64) -> bool {
        match self {
            Limit::Unlimited => true,
            Limit::Capped(max) => usage < max,
        }
    }

    /// Units left before the cap, `None` when unlimited.
    #[must_use]
    pub fn remaining(self, usage: u64) -> Option<u64> {
        match self {
            Limit::Unlimited => None,
            Limit::Capped(max) => Some(max.saturating_sub(usage)),
        }
    }
}

impl TryFrom<i64> for Limit {
    type Error = String;

    fn try_from(raw: i64) -> std::result::Result<Self, Self::Error> {
        if raw == Self::UNLIMITED_SENTINEL {
            Ok(Limit::Unlimited)
        } else if raw < 0 {
            Err(format!("limit {} is negative and not the -1 sentinel", raw))
        } else {
            Ok(Limit::Capped(raw as u64))
        }
    }
}

impl From<Limit> for i64 {
    fn from(limit: Limit) -> Self {
        match limit {
            Limit::Unlimited => Limit::UNLIMITED_SENTINEL,
            Limit::Capped(max) => i64::try_from(max).unwrap_or(i64::MAX),
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Unlimited => f.write_str("unlimited"),
            Limit::Capped(max) => write!(f, "{}", max),
        }
    }
}

// =============================================================================
// PLAN
// =============================================================================

/// A subscription tier: feature flags plus named limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub display_name: String,
    #[serde(default)]
    pub features: BTreeSet<String>,
    #[serde(default)]
    pub limits: BTreeMap<String, Limit>,
}

impl Plan {
    /// Create a plan with no features and no limits.
    #[must_use]
    pub fn new(id: PlanId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            features: BTreeSet::new(),
            limits: BTreeMap::new(),
        }
    }

    /// Builder: add feature flags.
    #[must_use]
    pub fn with_features(mut self, features: &[&str]) -> Self {
        self.features
            .extend(features.iter().map(|f| (*f).to_string()));
        self
    }

    /// Builder: set a limit.
    #[must_use]
    pub fn with_limit(mut self, name: &str, limit: Limit) -> Self {
        self.limits.insert(name.to_string(), limit);
        self
    }

    #[must_use]
    pub fn has_feature(&self, name: &str) -> bool {
        self.features.contains(name)
    }

    /// Configured limit, `None` if the plan does not name it.
    #[must_use]
    pub fn limit(&self, name: &str) -> Option<Limit> {
        self.limits.get(name).copied()
    }
}

// =============================================================================
// CATALOG
// =============================================================================

/// Built-in feature flag names.
pub mod features {
    pub const PLAYLIST_ANALYSIS: &str = "playlist_analysis";
    pub const RELIABILITY_SCORE: &str = "reliability_score";
    pub const EXPORT_PDF: &str = "export_pdf";
    pub const CORPUS_CHAT: &str = "corpus_chat";
    pub const PRIORITY_PROCESSING: &str = "priority_processing";
    pub const API_ACCESS: &str = "api_access";
    pub const TEAM_WORKSPACE: &str = "team_workspace";
}

/// Built-in limit names.
pub mod limits {
    pub const MONTHLY_ANALYSES: &str = "monthly_analyses";
    pub const PLAYLIST_MAX_VIDEOS: &str = "playlist_max_videos";
    pub const CORPUS_CHAT_MESSAGES: &str = "corpus_chat_messages";
    pub const MAX_VIDEO_MINUTES: &str = "max_video_minutes";
    pub const TEAM_SEATS: &str = "team_seats";
}

#[derive(Deserialize)]
struct CatalogDocument {
    plans: Vec<Plan>,
}

/// The full set of plans, one per [`PlanId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanCatalog {
    /// Indexed by rank; always holds exactly one plan per `PlanId`.
    plans: Vec<Plan>,
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PlanCatalog {
    /// Build a catalog from plans, requiring every `PlanId` exactly once.
    pub fn from_plans(plans: Vec<Plan>) -> Result<Self> {
        let mut by_id: BTreeMap<PlanId, Plan> = BTreeMap::new();
        for plan in plans {
            let id = plan.id;
            if by_id.insert(id, plan).is_some() {
                return Err(CoreError::InvalidCatalog(format!(
                    "plan '{}' is defined more than once",
                    id
                )));
            }
        }

        if let Some(missing) = PlanId::ALL.iter().find(|id| !by_id.contains_key(id)) {
            return Err(CoreError::InvalidCatalog(format!(
                "plan '{}' is missing",
                missing
            )));
        }

        // BTreeMap iterates in rank order.
        Ok(Self {
            plans: by_id.into_values().collect(),
        })
    }

    /// Parse a catalog from JSON of the form `{"plans": [...]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: CatalogDocument = serde_json::from_str(json)?;
        Self::from_plans(doc.plans)
    }

    /// The catalog shipped with the client.
    #[must_use]
    pub fn builtin() -> Self {
        use features::*;
        use limits::*;

        let plans = vec![
            Plan::new(PlanId::Free, "Free")
                .with_limit(MONTHLY_ANALYSES, Limit::Capped(20))
                .with_limit(PLAYLIST_MAX_VIDEOS, Limit::Capped(0))
                .with_limit(CORPUS_CHAT_MESSAGES, Limit::Capped(0))
                .with_limit(MAX_VIDEO_MINUTES, Limit::Capped(30))
                .with_limit(TEAM_SEATS, Limit::Capped(1)),
            Plan::new(PlanId::Student, "Student")
                .with_features(&[PLAYLIST_ANALYSIS, RELIABILITY_SCORE])
                .with_limit(MONTHLY_ANALYSES, Limit::Capped(60))
                .with_limit(PLAYLIST_MAX_VIDEOS, Limit::Capped(10))
                .with_limit(CORPUS_CHAT_MESSAGES, Limit::Capped(50))
                .with_limit(MAX_VIDEO_MINUTES, Limit::Capped(90))
                .with_limit(TEAM_SEATS, Limit::Capped(1)),
            Plan::new(PlanId::Starter, "Starter")
                .with_features(&[PLAYLIST_ANALYSIS, RELIABILITY_SCORE, EXPORT_PDF])
                .with_limit(MONTHLY_ANALYSES, Limit::Capped(100))
                .with_limit(PLAYLIST_MAX_VIDEOS, Limit::Capped(25))
                .with_limit(CORPUS_CHAT_MESSAGES, Limit::Capped(200))
                .with_limit(MAX_VIDEO_MINUTES, Limit::Capped(120))
                .with_limit(TEAM_SEATS, Limit::Capped(1)),
            Plan::new(PlanId::Pro, "Pro")
                .with_features(&[
                    PLAYLIST_ANALYSIS,
                    RELIABILITY_SCORE,
                    EXPORT_PDF,
                    CORPUS_CHAT,
                    PRIORITY_PROCESSING,
                ])
                .with_limit(MONTHLY_ANALYSES, Limit::Unlimited)
                .with_limit(PLAYLIST_MAX_VIDEOS, Limit::Capped(100))
                .with_limit(CORPUS_CHAT_MESSAGES, Limit::Unlimited)
                .with_limit(MAX_VIDEO_MINUTES, Limit::Capped(240))
                .with_limit(TEAM_SEATS, Limit::Capped(1)),
            Plan::new(PlanId::Team, "Team")
                .with_features(&[
                    PLAYLIST_ANALYSIS,
                    RELIABILITY_SCORE,
                    EXPORT_PDF,
                    CORPUS_CHAT,
                    PRIORITY_PROCESSING,
                    API_ACCESS,
                    TEAM_WORKSPACE,
                ])
                .with_limit(MONTHLY_ANALYSES, Limit::Unlimited)
                .with_limit(PLAYLIST_MAX_VIDEOS, Limit::Unlimited)
                .with_limit(CORPUS_CHAT_MESSAGES, Limit::Unlimited)
                .with_limit(MAX_VIDEO_MINUTES, Limit::Unlimited)
                .with_limit(TEAM_SEATS, Limit::Capped(10)),
        ];

        Self { plans }
    }

    /// Look up a plan.
    #[must_use]
    pub fn plan(&self, id: PlanId) -> &Plan {
        &self.plans[id.rank() as usize]
    }

    /// All plans, lowest rank first.
    pub fn plans(&self) -> impl Iterator<Item = &Plan> {
        self.plans.iter()
    }

    /// Lowest-ranked plan that has `feature`.
    #[must_use]
    pub fn min_plan_for_feature(&self, feature: &str) -> Option<PlanId> {
        self.plans
            .iter()
            .find(|p| p.has_feature(feature))
            .map(|p| p.id)
    }

    /// Nearest plan ranked above `from` that has `feature`.
    #[must_use]
    pub fn upgrade_for_feature(&self, feature: &str, from: PlanId) -> Option<PlanId> {
        self.plans
            .iter()
            .filter(|p| p.id > from)
            .find(|p| p.has_feature(feature))
            .map(|p| p.id)
    }

    /// Nearest plan at or above `from` whose `limit` admits `usage`.
    #[must_use]
    pub fn min_plan_for_usage(&self, limit: &str, usage: u64, from: PlanId) -> Option<PlanId> {
        self.plans
            .iter()
            .filter(|p| p.id >= from)
            .find(|p| p.limit(limit).is_some_and(|l| l.admits(usage)))
            .map(|p| p.id)
    }

    /// Check that every feature and limit of a plan is also available,
    /// at least as generously, to every higher plan.
    ///
    /// Returns one message per violation; empty means monotonic.
    #[must_use]
    pub fn validate_monotonic(&self) -> Vec<String> {
        let mut violations = Vec::new();

        for pair in self.plans.windows(2) {
            let (lower, higher) = (&pair[0], &pair[1]);

            for feature in lower.features.difference(&higher.features) {
                violations.push(format!(
                    "feature '{}' is in '{}' but not in '{}'",
                    feature, lower.id, higher.id
                ));
            }

            for (name, low_limit) in &lower.limits {
                let high_limit = higher.limit(name).unwrap_or(Limit::Capped(0));
                if high_limit < *low_limit {
                    violations.push(format!(
                        "limit '{}' drops from {} in '{}' to {} in '{}'",
                        name, low_limit, lower.id, high_limit, higher.id
                    ));
                }
            }
        }

        violations
    }
}

// =============================================================================
// TESTS
// =============================================================================
