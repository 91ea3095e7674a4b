//! # Tubelens Library
//!
//! This library exposes the Tubelens application modules for testing and
//! integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod rotation;

pub use error::{AppError, Result};

// Re-export the lower layers for convenience
pub use tubelens_core;
pub use tubelens_sdk;
