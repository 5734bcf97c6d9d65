//! Command implementations for the `vidpage` CLI.

pub mod clear;
pub mod config;
pub mod fetch;
pub mod sweep;
