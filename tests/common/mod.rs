//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use std::time::Duration;

/// Upper bound for anything that crosses a thread boundary
pub fn test_timeout() -> Duration {
    Duration::from_secs(2)
}

/// Runtime settings that keep threaded tests fast
pub fn fast_runtime() -> multiterm_rs::config::RuntimeConfig {
    multiterm_rs::config::RuntimeConfig {
        poll_idle_us: 100,
        dispatch_timeout_ms: 2,
        ..Default::default()
    }
}
