//! # Storage Module
//!
//! Local persistent key/value storage using redb.
//!
//! Holds the small amount of client state that must survive restarts:
//! - the cached bearer token
//! - dismissed promo flags
//! - draggable widget positions

mod local_store;

pub use local_store::{LocalStore, WidgetPosition};
