//! # Access Module
//!
//! Feature access resolution against the plan catalog.
//!
//! Resolution is a pure function of `(catalog, plan, query)`. Acting on a
//! denial (showing an upgrade prompt, navigating to billing) is the caller's
//! business.

use crate::plan::{Limit, Plan, PlanCatalog, PlanId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// QUERY
// =============================================================================

/// What the caller wants to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccessQuery {
    /// No gate at all.
    Unrestricted,
    /// Requires a boolean feature flag.
    Feature { name: String },
    /// Consumes one more unit of a numeric limit; `usage` is the amount
    /// already consumed.
    Limit { name: String, usage: u64 },
    /// Requires a plan at or above `required`.
    Plan { required: PlanId },
}

impl AccessQuery {
    pub fn feature(name: impl Into<String>) -> Self {
        AccessQuery::Feature { name: name.into() }
    }

    pub fn limit(name: impl Into<String>, usage: u64) -> Self {
        AccessQuery::Limit {
            name: name.into(),
            usage,
        }
    }

    pub fn plan(required: PlanId) -> Self {
        AccessQuery::Plan { required }
    }
}

// =============================================================================
// DECISION
// =============================================================================

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    pub granted: bool,
    /// The user's plan after normalization.
    pub current_plan: PlanId,
    /// Lowest plan that would grant a denied request, if any does.
    pub required_plan: Option<PlanId>,
    /// Units left under a capped limit.
    pub remaining_usage: Option<u64>,
    /// The configured limit for limit queries (`None` if unconfigured).
    pub limit: Option<Limit>,
}

impl AccessDecision {
    fn granted(current_plan: PlanId) -> Self {
        Self {
            granted: true,
            current_plan,
            required_plan: None,
            remaining_usage: None,
            limit: None,
        }
    }

    fn denied(current_plan: PlanId, required_plan: Option<PlanId>) -> Self {
        Self {
            granted: false,
            current_plan,
            required_plan,
            remaining_usage: None,
            limit: None,
        }
    }

    /// Whether the caller should show an upgrade prompt.
    #[must_use]
    pub fn needs_upgrade(&self) -> bool {
        !self.granted && self.required_plan.is_some()
    }
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Resolve `query` for a user whose plan is given as a raw string.
///
/// The plan string is normalized first; unknown plans resolve as `free`.
#[must_use]
pub fn resolve(catalog: &PlanCatalog, user_plan: &str, query: &AccessQuery) -> AccessDecision {
    resolve_for(catalog, PlanId::normalize(user_plan), query)
}

/// Resolve `query` for an already-normalized plan.
#[must_use]
pub fn resolve_for(catalog: &PlanCatalog, current: PlanId, query: &AccessQuery) -> AccessDecision {
    let plan = catalog.plan(current);

    match query {
        AccessQuery::Unrestricted => AccessDecision::granted(current),

        AccessQuery::Feature { name } => {
            if plan.has_feature(name) {
                AccessDecision::granted(current)
            } else {
                AccessDecision::denied(current, catalog.upgrade_for_feature(name, current))
            }
        }

        AccessQuery::Limit { name, usage } => resolve_limit(catalog, plan, name, *usage),

        AccessQuery::Plan { required } => {
            if current.rank() >= required.rank() {
                AccessDecision::granted(current)
            } else {
                AccessDecision::denied(current, Some(*required))
            }
        }
    }
}

fn resolve_limit(catalog: &PlanCatalog, plan: &Plan, name: &str, usage: u64) -> AccessDecision {
    let current = plan.id;

    // Unconfigured limits deny like a zero cap.
    let Some(limit) = plan.limit(name) else {
        let mut decision =
            AccessDecision::denied(current, catalog.min_plan_for_usage(name, usage, current));
        decision.remaining_usage = Some(0);
        return decision;
    };

    let mut decision = if limit.admits(usage) {
        AccessDecision::granted(current)
    } else {
        AccessDecision::denied(current, catalog.min_plan_for_usage(name, usage, current))
    };
    decision.remaining_usage = limit.remaining(usage);
    decision.limit = Some(limit);
    decision
}

/// One decision per limit configured on the user's plan.
///
/// Limits missing from `usage` count as zero consumption.
#[must_use]
pub fn usage_report(
    catalog: &PlanCatalog,
    user_plan: &str,
    usage: &BTreeMap<String, u64>,
) -> BTreeMap<String, AccessDecision> {
    let current = PlanId::normalize(user_plan);
    catalog
        .plan(current)
        .limits
        .keys()
        .map(|name| {
            let used = usage.get(name).copied().unwrap_or(0);
            (
                name.clone(),
                resolve_for(catalog, current, &AccessQuery::limit(name.as_str(), used)),
            )
        })
        .collect()
}

/// Plans a user could upgrade to, nearest first.
#[must_use]
pub fn upgrade_options<'a>(catalog: &'a PlanCatalog, user_plan: &str) -> Vec<&'a Plan> {
    PlanId::normalize(user_plan)
        .above()
        .map(|id| catalog.plan(id))
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{features, limits};
    use proptest::prelude::*;

    fn single_limit_catalog(limit: Limit) -> PlanCatalog {
        let plans = PlanId::ALL
            .iter()
            .map(|id| Plan::new(*id, id.as_str()).with_limit("quota", limit))
            .collect();
        PlanCatalog::from_plans(plans).unwrap()
    }

    #[test]
    fn free_plan_at_monthly_cap_is_denied() {
        let catalog = PlanCatalog::builtin();
        let decision = resolve(
            &catalog,
            "free",
            &AccessQuery::limit(limits::MONTHLY_ANALYSES, 20),
        );

        assert!(!decision.granted);
        assert_eq!(decision.remaining_usage, Some(0));
        assert_eq!(decision.limit, Some(Limit::Capped(20)));
        assert_eq!(decision.required_plan, Some(PlanId::Student));
    }

    #[test]
    fn pro_plan_is_unlimited() {
        let catalog = PlanCatalog::builtin();
        let decision = resolve(
            &catalog,
            "pro",
            &AccessQuery::limit(limits::MONTHLY_ANALYSES, 5000),
        );

        assert!(decision.granted);
        assert_eq!(decision.remaining_usage, None);
        assert_eq!(decision.limit, Some(Limit::Unlimited));
    }

    #[test]
    fn under_cap_reports_remaining() {
        let catalog = PlanCatalog::builtin();
        let decision = resolve(
            &catalog,
            "free",
            &AccessQuery::limit(limits::MONTHLY_ANALYSES, 15),
        );
        assert!(decision.granted);
        assert_eq!(decision.remaining_usage, Some(5));
    }

    #[test]
    fn zero_limit_denies_even_without_usage() {
        let catalog = PlanCatalog::builtin();
        let decision = resolve(
            &catalog,
            "free",
            &AccessQuery::limit(limits::CORPUS_CHAT_MESSAGES, 0),
        );
        assert!(!decision.granted);
        assert_eq!(decision.required_plan, Some(PlanId::Student));
    }

    #[test]
    fn unknown_limit_is_denied() {
        let catalog = PlanCatalog::builtin();
        let decision = resolve(&catalog, "team", &AccessQuery::limit("warp_drives", 0));
        assert!(!decision.granted);
        assert_eq!(decision.limit, None);
        assert_eq!(decision.required_plan, None);
    }

    #[test]
    fn feature_denial_names_lowest_plan_with_feature() {
        let catalog = PlanCatalog::builtin();
        let decision = resolve(&catalog, "student", &AccessQuery::feature(features::CORPUS_CHAT));

        assert!(!decision.granted);
        assert!(decision.needs_upgrade());
        assert_eq!(decision.required_plan, Some(PlanId::Pro));
    }

    #[test]
    fn feature_upgrade_skips_lower_plans_in_uneven_catalog() {
        // Free and Starter+ carry "x"; Student does not.
        let plans = PlanId::ALL
            .iter()
            .map(|id| {
                let plan = Plan::new(*id, id.as_str());
                if *id == PlanId::Student {
                    plan
                } else {
                    plan.with_features(&["x"])
                }
            })
            .collect();
        let catalog = PlanCatalog::from_plans(plans).unwrap();

        let decision = resolve(&catalog, "student", &AccessQuery::feature("x"));
        assert!(!decision.granted);
        assert_eq!(decision.required_plan, Some(PlanId::Starter));
        assert!(decision.needs_upgrade());
    }

    #[test]
    fn feature_missing_above_current_plan_has_no_upgrade() {
        let plans = PlanId::ALL
            .iter()
            .map(|id| {
                let plan = Plan::new(*id, id.as_str());
                if *id == PlanId::Free {
                    plan.with_features(&["legacy"])
                } else {
                    plan
                }
            })
            .collect();
        let catalog = PlanCatalog::from_plans(plans).unwrap();

        let decision = resolve(&catalog, "pro", &AccessQuery::feature("legacy"));
        assert!(!decision.granted);
        assert_eq!(decision.required_plan, None);
        assert!(!decision.needs_upgrade());
    }

    #[test]
    fn feature_granted_when_present() {
        let catalog = PlanCatalog::builtin();
        let decision = resolve(&catalog, "premium", &AccessQuery::feature(features::EXPORT_PDF));
        assert!(decision.granted);
        assert_eq!(decision.current_plan, PlanId::Pro);
    }

    #[test]
    fn unknown_feature_has_no_upgrade_path() {
        let catalog = PlanCatalog::builtin();
        let decision = resolve(&catalog, "free", &AccessQuery::feature("teleport"));
        assert!(!decision.granted);
        assert!(!decision.needs_upgrade());
    }

    #[test]
    fn explicit_plan_compares_ranks() {
        let catalog = PlanCatalog::builtin();
        assert!(resolve(&catalog, "team", &AccessQuery::plan(PlanId::Pro)).granted);
        assert!(resolve(&catalog, "pro", &AccessQuery::plan(PlanId::Pro)).granted);

        let denied = resolve(&catalog, "starter", &AccessQuery::plan(PlanId::Pro));
        assert!(!denied.granted);
        assert_eq!(denied.required_plan, Some(PlanId::Pro));
    }

    #[test]
    fn unrestricted_is_always_granted() {
        let catalog = PlanCatalog::builtin();
        assert!(resolve(&catalog, "", &AccessQuery::Unrestricted).granted);
    }

    #[test]
    fn unknown_plan_resolves_as_free() {
        let catalog = PlanCatalog::builtin();
        let decision = resolve(&catalog, "diamond", &AccessQuery::plan(PlanId::Student));
        assert_eq!(decision.current_plan, PlanId::Free);
        assert!(!decision.granted);
    }

    #[test]
    fn usage_report_covers_every_limit() {
        let catalog = PlanCatalog::builtin();
        let mut usage = BTreeMap::new();
        usage.insert(limits::MONTHLY_ANALYSES.to_string(), 18);

        let report = usage_report(&catalog, "free", &usage);
        assert_eq!(report.len(), catalog.plan(PlanId::Free).limits.len());
        assert_eq!(report[limits::MONTHLY_ANALYSES].remaining_usage, Some(2));
        assert!(!report[limits::PLAYLIST_MAX_VIDEOS].granted);
    }

    #[test]
    fn upgrade_options_are_nearest_first() {
        let catalog = PlanCatalog::builtin();
        let ids: Vec<PlanId> = upgrade_options(&catalog, "starter")
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![PlanId::Pro, PlanId::Team]);
    }

    #[test]
    fn query_serializes_tagged() {
        let json = serde_json::to_string(&AccessQuery::limit("monthly_analyses", 3)).unwrap();
        assert!(json.contains("\"type\":\"limit\""));
        assert!(json.contains("\"usage\":3"));
    }

    proptest! {
        #[test]
        fn capped_limit_grants_iff_usage_below(cap in 1u64..10_000, usage in 0u64..20_000) {
            let catalog = single_limit_catalog(Limit::Capped(cap));
            let decision = resolve(&catalog, "free", &AccessQuery::limit("quota", usage));
            prop_assert_eq!(decision.granted, usage < cap);
            prop_assert_eq!(decision.remaining_usage, Some(cap.saturating_sub(usage)));
        }

        #[test]
        fn unlimited_always_grants(usage in any::<u64>()) {
            let catalog = single_limit_catalog(Limit::Unlimited);
            let decision = resolve(&catalog, "free", &AccessQuery::limit("quota", usage));
            prop_assert!(decision.granted);
        }

        #[test]
        fn zero_limit_never_grants(usage in any::<u64>()) {
            let catalog = single_limit_catalog(Limit::Capped(0));
            let decision = resolve(&catalog, "team", &AccessQuery::limit("quota", usage));
            prop_assert!(!decision.granted);
        }

        #[test]
        fn builtin_features_granted_exactly_from_min_plan(
            plan_idx in 0usize..5,
            feature_idx in 0usize..7,
        ) {
            let catalog = PlanCatalog::builtin();
            let all = [
                features::PLAYLIST_ANALYSIS,
                features::RELIABILITY_SCORE,
                features::EXPORT_PDF,
                features::CORPUS_CHAT,
                features::PRIORITY_PROCESSING,
                features::API_ACCESS,
                features::TEAM_WORKSPACE,
            ];
            let plan = PlanId::ALL[plan_idx];
            let feature = all[feature_idx];
            let min = catalog.min_plan_for_feature(feature);
            prop_assert!(min.is_some());

            let decision = resolve_for(&catalog, plan, &AccessQuery::feature(feature));
            prop_assert_eq!(decision.granted, min.is_some_and(|m| plan >= m));
        }

        #[test]
        fn higher_plans_never_lose_access(
            low in 0usize..5,
            high in 0usize..5,
            usage in 0u64..500,
        ) {
            prop_assume!(low <= high);
            let catalog = PlanCatalog::builtin();
            let (low, high) = (PlanId::ALL[low], PlanId::ALL[high]);
            for name in catalog.plan(low).limits.keys() {
                let q = AccessQuery::limit(name.as_str(), usage);
                if resolve_for(&catalog, low, &q).granted {
                    prop_assert!(resolve_for(&catalog, high, &q).granted);
                }
            }
        }
    }
}
