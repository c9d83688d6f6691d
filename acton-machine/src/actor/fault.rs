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

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

/// How an execution unit failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultKind {
    /// A unit callback returned `Err`.
    Error,
    /// A unit callback panicked.
    Panic,
    /// The unit reported an error status in one of its own transitions.
    Reported,
    /// The unit definition failed to produce a fresh unit.
    Construction,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Panic => write!(f, "panic"),
            Self::Reported => write!(f, "reported"),
            Self::Construction => write!(f, "construction"),
        }
    }
}

/// The failure that moved an actor into the `error` status.
///
/// Faults are plain data so they can be stored in snapshots, handed to
/// supervision hooks, and forwarded to parents on escalation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorFault {
    kind: FaultKind,
    message: String,
}

impl ActorFault {
    /// Creates a fault of the given kind.
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Captures an error returned by a unit callback, including its cause chain.
    #[must_use]
    pub fn from_error(err: &anyhow::Error) -> Self {
        Self::new(FaultKind::Error, format!("{err:#}"))
    }

    /// Captures a panic payload.
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic with non-string payload".to_string());
        Self::new(FaultKind::Panic, message)
    }

    /// The failure category.
    #[must_use]
    pub const fn kind(&self) -> FaultKind {
        self.kind
    }

    /// Human-readable description of the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn into_kind(self, kind: FaultKind) -> Self {
        Self { kind, ..self }
    }
}

impl fmt::Display for ActorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ActorFault {}

/// Runs user code at the unit boundary, turning both `Err` and panics into a fault.
pub(crate) fn guarded<R>(f: impl FnOnce() -> anyhow::Result<R>) -> Result<R, ActorFault> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(ActorFault::from_error(&err)),
        Err(payload) => Err(ActorFault::from_panic(payload.as_ref())),
    }
}
