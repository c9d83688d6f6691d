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

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of an actor.
///
/// ```text
/// idle --start()--> active --stop()--> stopped
///                     |  ^
///             failure |  | supervised restart
///                     v  |
///                    error
/// ```
///
/// `stopped` is terminal for `send` and `ask`, but `stop()` and `restart()`
/// stay callable. An `error` actor whose supervision budget is spent remains in
/// `error` until its owner restarts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorStatus {
    /// Created but not yet started.
    #[default]
    Idle,
    /// Accepting events and requests.
    Active,
    /// Shut down.
    Stopped,
    /// The execution unit failed.
    Error,
}

impl ActorStatus {
    /// Whether the actor currently processes events.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for ActorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Active => write!(f, "active"),
            Self::Stopped => write!(f, "stopped"),
            Self::Error => write!(f, "error"),
        }
    }
}
