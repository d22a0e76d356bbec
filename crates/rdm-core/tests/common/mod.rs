//! Shared helpers for engine integration tests.

#![allow(dead_code)]

pub mod fake_transfer;
pub mod recorder;

use std::time::Duration;

/// Poll `check` until it returns true or two seconds pass.
pub async fn eventually<F: FnMut() -> bool>(what: &str, mut check: F) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !check() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
