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

use std::fmt::Debug;

use async_trait::async_trait;

use crate::actor::{ActorFault, ActorId, ActorStatus, Supervision};
use crate::common::{ChildRef, ParentRef};
use crate::message::{ActorError, ChildFailure};

/// The type-erased part of the actor contract.
///
/// Every actor implements `ActorRef` regardless of the unit it hosts, which is
/// what lets a parent own children of arbitrary unit types and lets
/// supervision hooks receive any actor. Typed operations (`send`, `ask`,
/// `observe`, `spawn`, `get_snapshot`) live on
/// [`ActorHandle`](crate::common::ActorHandle).
#[async_trait]
pub trait ActorRef: Send + Sync + Debug + 'static {
    /// The actor's unique id.
    fn id(&self) -> ActorId;

    /// The current lifecycle status.
    fn status(&self) -> ActorStatus;

    /// The parent, if this is a child that is still alive.
    fn parent(&self) -> Option<ParentRef>;

    /// The effective supervision, inherited or explicit.
    fn supervision(&self) -> Option<Supervision>;

    /// The failure that put the actor in `error`, if any.
    fn fault(&self) -> Option<ActorFault>;

    /// The direct children, in id order.
    fn children(&self) -> Vec<ChildRef>;

    /// Looks up a direct child by id.
    ///
    /// # Returns
    ///
    /// * `Some(ChildRef)`: if this actor spawned a child with that id and has
    ///   not stopped since.
    /// * `None`: otherwise.
    fn find_child(&self, id: &str) -> Option<ChildRef>;

    /// Moves an idle actor to `active` and cascades to its children.
    ///
    /// Idempotent. Has no effect on stopped or failed actors; use
    /// [`restart`](Self::restart) for those.
    fn start(&self);

    /// Stops the children, then the unit; rejects pending requests and
    /// completes subscriptions.
    ///
    /// Idempotent: once stopped, further calls return immediately without side
    /// effects.
    async fn stop(&self);

    /// Stops the actor and replaces its unit with a fresh one from the original
    /// definition, then starts it. Resets the supervision budget.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::RestartFailed`] when the definition cannot produce
    /// a new unit; the actor is left in `error`.
    async fn restart(&self) -> Result<(), ActorError>;

    /// Delivers an escalated child failure through this actor's mailbox.
    fn notify_child_failure(&self, failure: ChildFailure);
}

static_assertions::assert_obj_safe!(ActorRef);
