/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

//! Per-actor restart budget with exponential backoff.
//!
//! A [`RestartLimiter`] counts failures inside a fixed window that opens at the
//! first counted failure. While the count is below `max_restarts` each failure
//! earns a [`RestartAttempt`]; the failure after that exhausts the budget
//! permanently. Only an owner-initiated restart resets it.
//!
//! ```rust,ignore
//! use acton_machine::prelude::*;
//!
//! let supervision = Supervision::restart_on_failure().with_limits(RestartLimiterConfig {
//!     max_restarts: 3,
//!     restart_window_ms: 30_000,
//!     initial_backoff_ms: 100,
//!     ..Default::default()
//! });
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Configuration for restart limiting and backoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestartLimiterConfig {
    /// Whether the restart budget is enforced.
    ///
    /// When disabled, every failure is restarted.
    pub enabled: bool,

    /// Restarts granted within one window. The next failure exhausts the budget.
    pub max_restarts: u32,

    /// Length of the counting window in milliseconds, measured from the first
    /// counted failure.
    pub restart_window_ms: u64,

    /// Delay before the first restart of a window, in milliseconds.
    pub initial_backoff_ms: u64,

    /// Upper bound on the restart delay in milliseconds.
    pub max_backoff_ms: u64,

    /// Factor applied to the delay for each consecutive restart.
    pub backoff_multiplier: f64,
}

impl Default for RestartLimiterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_restarts: 3,
            restart_window_ms: 60_000,
            initial_backoff_ms: 0,
            max_backoff_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RestartLimiterConfig {
    /// A configuration that restarts without limit or delay.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            max_restarts: 0,
            restart_window_ms: 0,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
            backoff_multiplier: 0.0,
        }
    }

    /// The counting window.
    #[must_use]
    pub const fn restart_window(&self) -> Duration {
        Duration::from_millis(self.restart_window_ms)
    }

    /// The delay before the first restart.
    #[must_use]
    pub const fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    /// The delay cap.
    #[must_use]
    pub const fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

/// A granted restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartAttempt {
    /// 1-based attempt number within the current window.
    pub attempt: u32,
    /// Delay to wait before restarting.
    pub backoff: Duration,
}

/// The supervisor record of one actor.
#[derive(Debug)]
pub struct RestartLimiter {
    config: RestartLimiterConfig,
    failure_count: u32,
    window_start: Option<Instant>,
    consecutive_restarts: u32,
    exhausted: bool,
}

impl RestartLimiter {
    /// Creates an empty record.
    #[must_use]
    pub const fn new(config: RestartLimiterConfig) -> Self {
        Self {
            config,
            failure_count: 0,
            window_start: None,
            consecutive_restarts: 0,
            exhausted: false,
        }
    }

    /// Counts one failure and decides whether it may be restarted.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisionExhausted`] once the budget is spent inside the
    /// window, and on every call after that until [`reset`](Self::reset).
    pub fn record_failure(&mut self) -> Result<RestartAttempt, SupervisionExhausted> {
        if self.exhausted {
            return Err(self.exhausted_error());
        }

        if !self.config.enabled {
            self.failure_count = self.failure_count.saturating_add(1);
            return Ok(RestartAttempt {
                attempt: self.failure_count,
                backoff: Duration::ZERO,
            });
        }

        let now = Instant::now();
        let window_open = self
            .window_start
            .is_some_and(|start| now.duration_since(start) < self.config.restart_window());
        if !window_open {
            self.window_start = Some(now);
            self.failure_count = 0;
            self.consecutive_restarts = 0;
        }

        if self.failure_count >= self.config.max_restarts {
            self.exhausted = true;
            return Err(self.exhausted_error());
        }

        self.failure_count += 1;
        let backoff = self.peek_backoff();
        self.consecutive_restarts += 1;

        Ok(RestartAttempt {
            attempt: self.failure_count,
            backoff,
        })
    }

    /// Forgets all counted failures and lifts exhaustion.
    pub fn reset(&mut self) {
        self.failure_count = 0;
        self.window_start = None;
        self.consecutive_restarts = 0;
        self.exhausted = false;
    }

    /// Whether the budget has been spent.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// The delay the next granted restart would wait, without recording anything.
    #[must_use]
    pub fn peek_backoff(&self) -> Duration {
        #[allow(clippy::cast_precision_loss)]
        let backoff_ms = self.config.initial_backoff_ms as f64
            * self
                .config
                .backoff_multiplier
                .powi(i32::try_from(self.consecutive_restarts).unwrap_or(i32::MAX));
        #[allow(
            clippy::cast_sign_loss,
            clippy::cast_possible_truncation,
            clippy::cast_precision_loss
        )]
        let capped_backoff_ms = (backoff_ms.min(self.config.max_backoff_ms as f64).max(0.0)) as u64;

        Duration::from_millis(capped_backoff_ms)
    }

    /// Counters for monitoring and logging.
    #[must_use]
    pub const fn stats(&self) -> RestartStats {
        RestartStats {
            failures_in_window: self.failure_count,
            consecutive_restarts: self.consecutive_restarts,
            max_restarts: self.config.max_restarts,
            restart_window_ms: self.config.restart_window_ms,
            exhausted: self.exhausted,
        }
    }

    const fn exhausted_error(&self) -> SupervisionExhausted {
        SupervisionExhausted {
            failures: self.failure_count.saturating_add(1),
            max_restarts: self.config.max_restarts,
            restart_window_ms: self.config.restart_window_ms,
        }
    }
}

impl Default for RestartLimiter {
    fn default() -> Self {
        Self::new(RestartLimiterConfig::default())
    }
}

/// The restart budget was spent inside the window.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("restart budget exhausted: {failures} failures (max {max_restarts} restarts) within {restart_window_ms} ms")]
pub struct SupervisionExhausted {
    /// Failures observed in the window, including the one that exhausted it.
    pub failures: u32,
    /// Restarts granted per window.
    pub max_restarts: u32,
    /// Window length in milliseconds.
    pub restart_window_ms: u64,
}

/// Snapshot of a [`RestartLimiter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartStats {
    /// Restarts granted in the current window.
    pub failures_in_window: u32,
    /// Consecutive restarts, which drive the backoff.
    pub consecutive_restarts: u32,
    /// Restarts granted per window.
    pub max_restarts: u32,
    /// Window length in milliseconds.
    pub restart_window_ms: u64,
    /// Whether the budget is spent.
    pub exhausted: bool,
}
