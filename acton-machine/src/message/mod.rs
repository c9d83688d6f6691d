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

// Re-export message types for the prelude and the rest of the crate.
pub use child_failure::ChildFailure;
pub use envelope::{CorrelationId, Envelope, EnvelopeKind};
pub use error::ActorError;
pub(crate) use pending::{PendingGuard, PendingRequests};

/// Contains the escalation notice sent from a failed child to its parent.
mod child_failure;

/// Contains the request/response envelope and correlation ids.
mod envelope;

/// Contains the actor error taxonomy.
mod error;

/// Contains the table of outstanding `ask` calls.
mod pending;
