// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bounded retry with exponential backoff for storage connectivity.
//!
//! Wraps opening the database and the liveness ping. Request-path store
//! operations are never retried here.

use std::fmt::Display;
use std::time::Duration;

use tracing::{error, info, warn};

/// Default number of attempts (first try included).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Default growth factor applied to the delay after each retry.
pub const DEFAULT_MULTIPLIER: f64 = 1.5;

/// Upper bound on any single backoff sleep.
pub const MAX_DELAY: Duration = Duration::from_secs(5 * 60);

/// Retry schedule: `max_attempts` tries, sleeping
/// `initial_delay * multiplier^n` before retry `n`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: DEFAULT_INITIAL_DELAY,
            multiplier: DEFAULT_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    /// Build a policy. At least one attempt is always made and the delay
    /// never shrinks between retries.
    pub fn new(max_attempts: u32, initial_delay: Duration, multiplier: f64) -> Self {
        let multiplier = if multiplier.is_finite() && multiplier >= 1.0 {
            multiplier
        } else {
            1.0
        };
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            multiplier,
        }
    }

    /// A policy that tries exactly once.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, 1.0)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay slept before retry number `retry` (zero-based), capped at
    /// [`MAX_DELAY`].
    pub fn delay_for(&self, retry: u32) -> Duration {
        if self.initial_delay.is_zero() {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(MAX_DELAY)
            .min(MAX_DELAY)
    }

    /// Run `op` until it succeeds or the attempt budget is spent.
    ///
    /// Returns the last error when every attempt fails.
    pub async fn run<T, E, F>(&self, operation: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            let err = match op() {
                Ok(value) => {
                    if attempt > 1 {
                        info!(operation, attempt, "Storage operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if attempt >= self.max_attempts {
                error!(
                    operation,
                    attempts = attempt,
                    error = %err,
                    "Storage operation failed, retries exhausted"
                );
                return Err(err);
            }

            let delay = self.delay_for(attempt - 1);
            warn!(
                operation,
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Storage operation failed, retrying"
            );
            drop(err);

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
