//! # Utility Functions and Helpers
//!
//! - [`formatting`]: Display helpers for durations and counts
//! - [`logging`]: Tracing subscriber and color setup
//! - [`settings`]: Config resolution and cache construction from CLI flags

pub mod formatting;
pub mod logging;
pub mod settings;
