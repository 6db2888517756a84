//! Shared library surface for the trail server, used by the binary and tests.

pub mod api;
pub mod config;
pub mod pipeline;
pub mod providers;
pub mod state;
