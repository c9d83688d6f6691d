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

use std::time::Duration;

use thiserror::Error;

use crate::actor::{ActorId, ActorStatus, SupervisionExhausted};
use crate::message::CorrelationId;

/// Errors surfaced by actor operations.
///
/// Cloneable so a single value can reject every pending request of a stopping
/// actor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActorError {
    /// The actor is stopped.
    #[error("actor {id} is stopped")]
    Stopped {
        /// The stopped actor.
        id: ActorId,
    },

    /// The actor is idle or failed and cannot answer requests.
    #[error("actor {id} is {status} and cannot accept requests")]
    Unavailable {
        /// The target actor.
        id: ActorId,
        /// Its status when the request was made or dequeued.
        status: ActorStatus,
    },

    /// No response arrived before the deadline.
    #[error("ask {correlation_id} to actor {id} timed out after {timeout:?}")]
    AskTimeout {
        /// The asked actor.
        id: ActorId,
        /// The abandoned request.
        correlation_id: CorrelationId,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The restart budget is spent; the actor stays in `error`.
    #[error("actor {id} is permanently failed: {source}")]
    SupervisionExhausted {
        /// The failed actor.
        id: ActorId,
        /// The exhausted budget.
        source: SupervisionExhausted,
    },

    /// The unit definition failed while spawning a child.
    #[error("failed to spawn actor {id}: {reason}")]
    ChildSpawn {
        /// The id the child would have had.
        id: ActorId,
        /// Why construction failed.
        reason: String,
    },

    /// The id is already taken by a sibling or another root.
    #[error("actor id {id} is already registered")]
    DuplicateId {
        /// The contested id.
        id: ActorId,
    },

    /// The unit definition failed while restarting.
    #[error("failed to restart actor {id}: {reason}")]
    RestartFailed {
        /// The restarting actor.
        id: ActorId,
        /// Why construction failed.
        reason: String,
    },
}

impl ActorError {
    /// The actor the error concerns.
    #[must_use]
    pub const fn actor_id(&self) -> &ActorId {
        match self {
            Self::Stopped { id }
            | Self::Unavailable { id, .. }
            | Self::AskTimeout { id, .. }
            | Self::SupervisionExhausted { id, .. }
            | Self::ChildSpawn { id, .. }
            | Self::DuplicateId { id }
            | Self::RestartFailed { id, .. } => id,
        }
    }

    /// Whether the error reports a stopped actor.
    #[must_use]
    pub const fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped { .. })
    }

    /// Whether the error reports an elapsed ask timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::AskTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_actor() {
        let id = ActorId::from("actor-1/2");
        let err = ActorError::AskTimeout {
            id: id.clone(),
            correlation_id: CorrelationId::new(3),
            timeout: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "ask #3 to actor actor-1/2 timed out after 250ms");
        assert!(err.is_timeout());
        assert_eq!(err.actor_id(), &id);

        let err = ActorError::Unavailable {
            id,
            status: ActorStatus::Idle,
        };
        assert_eq!(
            err.to_string(),
            "actor actor-1/2 is idle and cannot accept requests"
        );
    }

    #[test]
    fn exhausted_error_exposes_source() {
        let err = ActorError::SupervisionExhausted {
            id: ActorId::from("worker"),
            source: SupervisionExhausted {
                failures: 4,
                max_restarts: 3,
                restart_window_ms: 1_000,
            },
        };
        let source = std::error::Error::source(&err).expect("source should be set");
        assert!(source.to_string().contains("4 failures"));
    }
}
