//! # Tubelens Core
//!
//! The pure logic behind the Tubelens client.
//!
//! Two independent pieces live here:
//!
//! - **Access gating** ([`plan`], [`access`]): given a subscription plan and an
//!   [`AccessQuery`], decide whether access is granted and which plan would
//!   satisfy a denied request.
//! - **Loading words** ([`word`], [`exclusion`], [`select`]): the trivia terms
//!   shown while an analysis runs, their conversion from history records or the
//!   built-in table, and the non-repeating selection policy.
//!
//! [`storage`] holds the small local key/value store (bearer token, dismissed
//! promos, widget positions). Nothing in this crate is async or touches the
//! network; the app layer owns timers and HTTP.

pub mod access;
pub mod error;
pub mod exclusion;
pub mod plan;
pub mod select;
pub mod storage;
pub mod word;

pub use access::{AccessDecision, AccessQuery, resolve, upgrade_options, usage_report};
pub use error::{CoreError, Result};
pub use exclusion::{DEFAULT_EXCLUSION_CAPACITY, ExclusionSet};
pub use plan::{Limit, Plan, PlanCatalog, PlanId};
pub use select::{pick_history_word, pick_static_word, select_candidate};
pub use storage::{LocalStore, WidgetPosition};
pub use word::{HistoryKeyword, Language, LoadingWord, StaticWord, WordSource, static_words};
