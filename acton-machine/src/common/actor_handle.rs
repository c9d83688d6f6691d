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
use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use crate::actor::{ActorConfig, ActorCore, ActorFault, ActorId, ActorStatus, RestartStats, Supervision};
use crate::common::{ChildRef, MachineRuntime, ParentRef};
use crate::message::ActorError;
use crate::observe::{selector_sink, Observable};
use crate::traits::ActorRef;
use crate::unit::{ExecutionUnit, Snapshot};

/// A typed handle to an actor wrapping an execution unit `U`.
///
/// Handles are cheap to clone and all clones address the same actor. The
/// handle exposes the whole actor contract: lifecycle (`start`, `stop`,
/// `restart`), fire-and-forget `send`, correlated `ask`, snapshot projection
/// through `observe`, and child creation through `spawn`.
///
/// Dropping every handle does not stop the actor; roots stay registered with
/// their [`MachineRuntime`] and children stay in their parent's registry until
/// stopped.
pub struct ActorHandle<U: ExecutionUnit> {
    core: Arc<ActorCore<U>>,
}

impl<U: ExecutionUnit> Clone for ActorHandle<U> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<U: ExecutionUnit> fmt::Debug for ActorHandle<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.core, f)
    }
}

impl<U: ExecutionUnit> PartialEq for ActorHandle<U> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
    }
}

impl<U: ExecutionUnit> Eq for ActorHandle<U> {}

impl<U: ExecutionUnit> ActorHandle<U> {
    pub(crate) const fn from_core(core: Arc<ActorCore<U>>) -> Self {
        Self { core }
    }

    /// The actor's id.
    #[must_use]
    pub fn id(&self) -> ActorId {
        self.core.actor_id().clone()
    }

    /// The actor's current lifecycle status.
    #[must_use]
    pub fn status(&self) -> ActorStatus {
        self.core.status()
    }

    /// The parent actor, if this is a child and the parent is still alive.
    #[must_use]
    pub fn parent(&self) -> Option<ParentRef> {
        self.core.parent()
    }

    /// The supervision applied to this actor, if any.
    #[must_use]
    pub fn supervision(&self) -> Option<Supervision> {
        ActorRef::supervision(self.core.as_ref())
    }

    /// The fault that moved the actor into `error`, if it is there.
    #[must_use]
    pub fn fault(&self) -> Option<ActorFault> {
        self.core.fault()
    }

    /// The runtime this actor belongs to.
    #[must_use]
    pub fn runtime(&self) -> &MachineRuntime {
        self.core.runtime()
    }

    /// Delivers `event` to the unit.
    ///
    /// Events are processed one at a time in the order they were sent. If the
    /// actor is not `active` the event is dropped with a warning.
    pub fn send(&self, event: U::Event) {
        self.core.send(event);
    }

    /// Sends `query` as a correlated request and awaits the unit's reply,
    /// using the actor's default ask timeout.
    ///
    /// # Errors
    ///
    /// - [`ActorError::Stopped`] if the actor is stopped, or stops before replying.
    /// - [`ActorError::Unavailable`] if the actor is `idle` or in `error`.
    /// - [`ActorError::AskTimeout`] if no reply arrives in time.
    pub async fn ask(&self, query: U::Event) -> Result<U::Reply, ActorError> {
        self.ask_timeout(query, self.core.default_ask_timeout())
            .await
    }

    /// Like [`ask`](Self::ask), with an explicit timeout for this call.
    ///
    /// # Errors
    ///
    /// See [`ask`](Self::ask).
    #[instrument(skip(self, query), fields(actor = %self.core.actor_id()))]
    pub async fn ask_timeout(
        &self,
        query: U::Event,
        timeout: Duration,
    ) -> Result<U::Reply, ActorError> {
        self.core.ask(query, timeout).await
    }

    /// Projects the actor's snapshots through `selector`.
    ///
    /// Each subscriber first receives `selector(get_snapshot())` synchronously
    /// inside `subscribe`, then one value per subsequent snapshot.
    pub fn observe<T, F>(&self, selector: F) -> Observable<T>
    where
        T: Send + 'static,
        F: Fn(&Snapshot<U::Context>) -> T + Send + Sync + 'static,
    {
        self.try_observe(move |snapshot| Ok(selector(snapshot)))
    }

    /// Like [`observe`](Self::observe) with a fallible selector.
    ///
    /// A selector error (or panic) is delivered to that subscriber as
    /// [`Notification::Error`](crate::observe::Notification::Error) and closes
    /// its subscription; other subscribers are unaffected.
    pub fn try_observe<T, F>(&self, selector: F) -> Observable<T>
    where
        T: Send + 'static,
        F: Fn(&Snapshot<U::Context>) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let selector = Arc::new(selector);
        let core = Arc::clone(&self.core);
        let actor = self.id();
        Observable::new(actor.clone(), move |observer| {
            core.subscribe(selector_sink(actor.clone(), Arc::clone(&selector), observer))
        })
    }

    /// The current snapshot. Never blocks on the unit and works in every status.
    #[must_use]
    pub fn get_snapshot(&self) -> Snapshot<U::Context> {
        self.core.snapshot()
    }

    /// Creates a child actor owned by this one.
    ///
    /// The child inherits this actor's supervision and ask timeout unless
    /// `config` overrides them. Without an explicit id it is named
    /// `"{parent}/{n}"`. It starts immediately when this actor is `active`,
    /// otherwise it waits for this actor's `start`.
    ///
    /// # Errors
    ///
    /// - [`ActorError::Stopped`] if this actor is stopped.
    /// - [`ActorError::DuplicateId`] if a child with the requested id exists.
    /// - [`ActorError::ChildSpawn`] if `definition` fails or panics.
    pub fn spawn<V, F>(&self, definition: F, config: ActorConfig) -> Result<ActorHandle<V>, ActorError>
    where
        V: ExecutionUnit,
        F: Fn() -> anyhow::Result<V> + Send + Sync + 'static,
    {
        self.core
            .spawn::<V>(Arc::new(definition), config)
            .map(ActorHandle::from_core)
    }

    /// Moves an `idle` actor to `active` and starts its children.
    /// Does nothing in any other status.
    pub fn start(&self) {
        self.core.start();
    }

    /// Stops the children, then the unit. Pending asks are rejected with
    /// [`ActorError::Stopped`] and subscriptions complete. Idempotent.
    #[instrument(skip(self), fields(actor = %self.core.actor_id()))]
    pub async fn stop(&self) {
        self.core.stop().await;
    }

    /// Stops the actor and starts it again with a fresh unit from its definition.
    ///
    /// An explicit restart also clears the restart budget. Subscriptions that
    /// were still open keep receiving values.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::RestartFailed`] if the definition fails; the actor
    /// is then left in `error`.
    #[instrument(skip(self), fields(actor = %self.core.actor_id()))]
    pub async fn restart(&self) -> Result<(), ActorError> {
        self.core.restart().await
    }

    /// The actor's children, ordered by id.
    #[must_use]
    pub fn children(&self) -> Vec<ChildRef> {
        self.core.children()
    }

    /// Finds a child by id.
    #[must_use]
    pub fn find_child(&self, id: &str) -> Option<ChildRef> {
        self.core.find_child(id)
    }

    /// The number of registered children.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.core.child_count()
    }

    /// Counters of the actor's restart budget.
    #[must_use]
    pub fn restart_stats(&self) -> RestartStats {
        self.core.restart_stats()
    }

    /// The number of asks still awaiting a reply.
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.core.pending_requests()
    }

    /// The number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.core.subscriber_count()
    }

    /// A type-erased reference to this actor.
    #[must_use]
    pub fn as_actor_ref(&self) -> ChildRef {
        self.core.clone()
    }
}
