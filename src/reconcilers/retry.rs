// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Conflict-retried writes.
//!
//! All mutations of objects the operator does not own go through
//! [`update_with_conflict_retry`]: fetch the current version, apply the
//! intended mutation, submit, and on an optimistic-concurrency rejection
//! (HTTP 409) re-fetch and re-apply over the new version. The loop is bounded
//! by a small fixed attempt cap, with jittered exponential delays between
//! attempts.

use anyhow::Result;
use kube::api::PostParams;
use kube::{Api, Resource};
use rand::RngExt;
use std::time::Duration;
use tracing::{debug, warn};

/// Maximum number of attempts for a conflict-retried write
const CONFLICT_RETRY_ATTEMPTS: u32 = 5;

/// Delay before the first retry
const FIRST_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Ceiling for the retry delay
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Fraction of the delay randomized away to spread concurrent retriers
const JITTER_FRACTION: f64 = 0.1;

/// Doubling delay sequence between conflict retries: 100ms, 200ms, 400ms, ...
/// capped at [`MAX_RETRY_DELAY`], each step jittered by ±10%.
pub struct ConflictBackoff {
    delay: Duration,
}

impl ConflictBackoff {
    #[must_use]
    pub fn new() -> Self {
        Self {
            delay: FIRST_RETRY_DELAY,
        }
    }

    /// The delay to sleep before the next attempt.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.delay;
        self.delay = (delay * 2).min(MAX_RETRY_DELAY);
        jittered(delay)
    }
}

impl Default for ConflictBackoff {
    fn default() -> Self {
        Self::new()
    }
}

/// Randomize a delay within ±[`JITTER_FRACTION`] of its value.
fn jittered(delay: Duration) -> Duration {
    let spread = delay.mul_f64(JITTER_FRACTION);
    let floor = delay - spread;
    let window = spread * 2;
    floor + window.mul_f64(rand::rng().random_range(0.0..=1.0))
}

/// Determine whether a Kubernetes error is an optimistic-concurrency conflict.
#[must_use]
pub fn is_conflict(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(api_err) if api_err.code == 409)
}

/// Fetch, mutate and replace an object, retrying on version conflicts.
///
/// The mutation closure is re-applied to a freshly fetched object on every
/// attempt, so it must be idempotent over the object state. Non-conflict
/// errors fail immediately.
///
/// # Arguments
///
/// * `api` - Typed API scoped to the object's namespace
/// * `name` - Object name
/// * `mutate` - Mutation applied to the fetched object before submitting
///
/// # Returns
///
/// The object as accepted by the API server.
///
/// # Errors
///
/// Returns an error if the fetch fails, a non-conflict error occurs on
/// submit, or the attempt cap is reached.
pub async fn update_with_conflict_retry<T, F>(api: &Api<T>, name: &str, mut mutate: F) -> Result<T>
where
    T: Resource<DynamicType = ()>
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
    F: FnMut(&mut T),
{
    let mut backoff = ConflictBackoff::new();
    let mut attempt = 0;

    loop {
        attempt += 1;

        let mut obj = api.get(name).await?;
        mutate(&mut obj);

        match api.replace(name, &PostParams::default(), &obj).await {
            Ok(updated) => {
                if attempt > 1 {
                    debug!(
                        name = %name,
                        kind = %T::kind(&()),
                        attempt = attempt,
                        "update succeeded after conflict retries"
                    );
                }
                return Ok(updated);
            }
            Err(e) if is_conflict(&e) && attempt < CONFLICT_RETRY_ATTEMPTS => {
                let delay = backoff.next_delay();
                warn!(
                    name = %name,
                    kind = %T::kind(&()),
                    attempt = attempt,
                    retry_after = ?delay,
                    "conflict on update, retrying over the new version"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod retry_tests;
