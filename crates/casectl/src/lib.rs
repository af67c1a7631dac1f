//! Run individual cases of delimiter-structured system-test files.
//!
//! Test files hold multiple cases separated by a `----` delimiter line; the
//! pipeline here scans a file into addressable segments, derives a
//! per-case run configuration from a base one, and launches it, rebuilding
//! project dependencies first when the base configuration is missing.

pub mod app;
pub mod domain;
pub mod infra;

/// Initialize logging for binaries; call once at startup.
pub fn init() {
    tracing_subscriber::fmt::init();
}
