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

//! Supervision policies.
//!
//! A [`Supervision`] decides what happens when an actor's execution unit
//! fails:
//!
//! - [`SupervisionStrategy::RestartOnFailure`]: restart the actor in place while
//!   its [`RestartLimiter`](crate::actor::RestartLimiter) budget lasts, then give
//!   up and invoke the `on_failure` hook once.
//! - [`SupervisionStrategy::Escalate`]: leave the actor in `error` and deliver a
//!   [`ChildFailure`](crate::message::ChildFailure) to its parent.
//!
//! Children inherit their parent's supervision unless the spawn config
//! overrides it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::actor::{ActorFault, RestartLimiterConfig};
use crate::common::{FailureHook, RestartHook};
use crate::message::ActorError;
use crate::traits::ActorRef;

/// What to do when a unit fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupervisionStrategy {
    /// Restart the failed actor while the restart budget lasts.
    #[default]
    RestartOnFailure,
    /// Hand the failure to the parent.
    Escalate,
}

impl fmt::Display for SupervisionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RestartOnFailure => write!(f, "restart_on_failure"),
            Self::Escalate => write!(f, "escalate"),
        }
    }
}

/// A strategy plus its restart limits and observation hooks.
#[derive(Clone, Default)]
pub struct Supervision {
    strategy: SupervisionStrategy,
    limits: RestartLimiterConfig,
    on_restart: Option<RestartHook>,
    on_failure: Option<FailureHook>,
}

impl Supervision {
    /// Restart on failure with the default budget.
    #[must_use]
    pub fn restart_on_failure() -> Self {
        Self::default()
    }

    /// Escalate failures to the parent.
    #[must_use]
    pub fn escalate() -> Self {
        Self {
            strategy: SupervisionStrategy::Escalate,
            ..Self::default()
        }
    }

    /// Replaces the restart limits wholesale.
    #[must_use]
    pub fn with_limits(mut self, limits: RestartLimiterConfig) -> Self {
        self.limits = limits;
        self
    }

    /// Sets how many restarts a window grants.
    #[must_use]
    pub fn with_max_restarts(mut self, max_restarts: u32) -> Self {
        self.limits.max_restarts = max_restarts;
        self
    }

    /// Sets the counting window.
    #[must_use]
    pub fn with_restart_window(mut self, window: Duration) -> Self {
        self.limits.restart_window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the initial restart delay, its cap and growth factor.
    #[must_use]
    pub fn with_backoff(mut self, initial: Duration, max: Duration, multiplier: f64) -> Self {
        self.limits.initial_backoff_ms = u64::try_from(initial.as_millis()).unwrap_or(u64::MAX);
        self.limits.max_backoff_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
        self.limits.backoff_multiplier = multiplier;
        self
    }

    /// Called with the actor, the triggering fault, and the 1-based attempt
    /// number just before each supervised restart.
    #[must_use]
    pub fn on_restart<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn ActorRef, &ActorFault, u32) + Send + Sync + 'static,
    {
        self.on_restart = Some(Arc::new(hook));
        self
    }

    /// Called once when the restart budget is exhausted.
    #[must_use]
    pub fn on_failure<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn ActorRef, &ActorError) + Send + Sync + 'static,
    {
        self.on_failure = Some(Arc::new(hook));
        self
    }

    /// The strategy.
    #[must_use]
    pub const fn strategy(&self) -> SupervisionStrategy {
        self.strategy
    }

    /// The restart limits.
    #[must_use]
    pub const fn limits(&self) -> &RestartLimiterConfig {
        &self.limits
    }

    pub(crate) fn notify_restart(&self, actor: &dyn ActorRef, fault: &ActorFault, attempt: u32) {
        if let Some(hook) = &self.on_restart {
            hook(actor, fault, attempt);
        }
    }

    pub(crate) fn notify_failure(&self, actor: &dyn ActorRef, error: &ActorError) {
        if let Some(hook) = &self.on_failure {
            hook(actor, error);
        }
    }
}

impl fmt::Debug for Supervision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervision")
            .field("strategy", &self.strategy)
            .field("limits", &self.limits)
            .field("on_restart", &self.on_restart.is_some())
            .field("on_failure", &self.on_failure.is_some())
            .finish()
    }
}
