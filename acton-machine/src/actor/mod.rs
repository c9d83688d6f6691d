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

// Re-export key types for easier access within the crate and the prelude.
pub use actor_config::ActorConfig;
pub use actor_id::ActorId;
pub(crate) use actor_core::ActorCore;
pub(crate) use children::{Admission, ChildRegistry};
pub(crate) use fault::guarded;
pub use fault::{ActorFault, FaultKind};
pub use restart_limiter::{
    RestartAttempt, RestartLimiter, RestartLimiterConfig, RestartStats, SupervisionExhausted,
};
pub use status::ActorStatus;
pub use supervision::{Supervision, SupervisionStrategy};

/// Contains the shared core behind every actor handle.
mod actor_core;

/// Contains `ActorConfig`, the options for creating and spawning actors.
mod actor_config;

/// Contains the actor id type.
mod actor_id;

/// Contains the child registry.
mod children;

/// Contains unit fault capture.
mod fault;

/// Contains the per-actor restart budget.
mod restart_limiter;

/// Contains the lifecycle status enum.
mod status;

/// Contains supervision strategies and hooks.
mod supervision;
