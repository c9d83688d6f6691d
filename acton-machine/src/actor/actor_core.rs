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

//! The shared core behind every [`ActorHandle`](crate::common::ActorHandle).
//!
//! # Locking
//!
//! Locks are always taken in the order `unit` → `state` and are never held
//! across an `.await` or while user callbacks other than the unit itself run.
//! Observers, supervision hooks, and parents are called with no core lock
//! held, so they may freely call back into this actor.
//!
//! # Run-to-completion
//!
//! Events, requests, and child failures go through one mailbox. Whoever finds
//! the mailbox idle becomes its drainer and processes items in FIFO order until
//! it is empty; callers arriving meanwhile only enqueue. Every item is tagged
//! with the unit generation it was sent to, so nothing sent to a failed or
//! stopped unit reaches its replacement.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::Mutex;
use tracing::{debug, error, instrument, trace, warn};

use crate::actor::{
    guarded, ActorConfig, ActorFault, ActorId, ActorStatus, Admission, ChildRegistry, FaultKind,
    RestartLimiter, RestartStats, Supervision, SupervisionStrategy,
};
use crate::common::{ChildRef, MachineRuntime, ParentRef, UnitFactory};
use crate::message::{
    ActorError, ChildFailure, Envelope, PendingGuard, PendingRequests,
};
use crate::observe::{ObserverRegistry, Sink, Subscription};
use crate::traits::ActorRef;
use crate::unit::{Effects, ExecutionUnit, Snapshot, SnapshotAdapter, UnitState, UnitStatus};

enum Inbound<U: ExecutionUnit> {
    Event(U::Event),
    Request(Envelope<U::Event>),
    ChildFailure(ChildFailure),
}

struct Mailbox<U: ExecutionUnit> {
    queue: VecDeque<(u64, Inbound<U>)>,
    draining: bool,
}

struct CoreState<S> {
    raw: S,
    status: ActorStatus,
    fault: Option<ActorFault>,
    /// Bumped whenever the unit is stopped or replaced.
    generation: u64,
    /// Sequence number of the latest published snapshot.
    seq: u64,
}

impl<S: UnitState> CoreState<S> {
    fn snapshot(&self) -> Snapshot<S::Context> {
        SnapshotAdapter::adapt(&self.raw, self.status, self.fault.as_ref())
    }

    fn next_snapshot(&mut self) -> (u64, Snapshot<S::Context>) {
        self.seq += 1;
        (self.seq, self.snapshot())
    }
}

/// State changes recorded while the unit lock was held, delivered after it is released.
struct Recorded<C> {
    published: Vec<(u64, Snapshot<C>)>,
    reported: Option<ActorFault>,
}

impl<C> Default for Recorded<C> {
    fn default() -> Self {
        Self {
            published: Vec::new(),
            reported: None,
        }
    }
}

/// Result of attempting to stop a single child actor.
enum ChildStopResult {
    /// Child stopped within the timeout
    Success,
    /// Child stop timed out
    Timeout { child_id: ActorId },
}

pub(crate) struct ActorCore<U: ExecutionUnit> {
    id: ActorId,
    runtime: MachineRuntime,
    factory: UnitFactory<U>,
    parent: Option<Weak<dyn ActorRef>>,
    self_ref: Weak<Self>,
    supervision: Option<Supervision>,
    ask_timeout: Duration,
    limiter: Mutex<RestartLimiter>,
    unit: Mutex<Option<U>>,
    state: Mutex<CoreState<U::State>>,
    mailbox: Mutex<Mailbox<U>>,
    observers: ObserverRegistry<U::Context>,
    pending: PendingRequests<U::Reply>,
    children: ChildRegistry,
    child_seq: AtomicU64,
    lifecycle: tokio::sync::Mutex<()>,
}

/// Builds a unit and reads its initial state inside the fault boundary.
fn construct<U: ExecutionUnit>(factory: &UnitFactory<U>) -> Result<(U, U::State), ActorFault> {
    guarded(|| {
        let unit = factory()?;
        let raw = unit.state();
        Ok((unit, raw))
    })
    .map_err(|fault| fault.into_kind(FaultKind::Construction))
}

impl<U: ExecutionUnit> ActorCore<U> {
    /// Builds an idle actor around a fresh unit from `factory`.
    pub(crate) fn create(
        runtime: MachineRuntime,
        id: ActorId,
        factory: UnitFactory<U>,
        parent: Option<Weak<dyn ActorRef>>,
        supervision: Option<Supervision>,
        ask_timeout: Duration,
    ) -> Result<Arc<Self>, ActorError> {
        let (unit, raw) = construct(&factory).map_err(|fault| ActorError::ChildSpawn {
            id: id.clone(),
            reason: fault.message().to_string(),
        })?;
        let limits = supervision
            .as_ref()
            .map(|supervision| supervision.limits().clone())
            .unwrap_or_default();

        trace!(actor = %id, "actor created");
        Ok(Arc::new_cyclic(|self_ref| Self {
            id,
            runtime,
            factory,
            parent,
            self_ref: self_ref.clone(),
            supervision,
            ask_timeout,
            limiter: Mutex::new(RestartLimiter::new(limits)),
            unit: Mutex::new(Some(unit)),
            state: Mutex::new(CoreState {
                raw,
                status: ActorStatus::Idle,
                fault: None,
                generation: 0,
                seq: 0,
            }),
            mailbox: Mutex::new(Mailbox {
                queue: VecDeque::new(),
                draining: false,
            }),
            observers: ObserverRegistry::default(),
            pending: PendingRequests::default(),
            children: ChildRegistry::default(),
            child_seq: AtomicU64::new(0),
            lifecycle: tokio::sync::Mutex::new(()),
        }))
    }

    pub(crate) const fn actor_id(&self) -> &ActorId {
        &self.id
    }

    pub(crate) const fn runtime(&self) -> &MachineRuntime {
        &self.runtime
    }

    pub(crate) const fn default_ask_timeout(&self) -> Duration {
        self.ask_timeout
    }

    pub(crate) fn restart_stats(&self) -> RestartStats {
        self.limiter.lock().stats()
    }

    pub(crate) fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.observers.len()
    }

    pub(crate) fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Whether a child is still registered with a live parent. Roots are always owned.
    fn is_owned(&self) -> bool {
        let Some(parent) = &self.parent else {
            return true;
        };
        parent
            .upgrade()
            .and_then(|parent| parent.find_child(self.id.as_str()))
            .is_some_and(|registered| std::ptr::addr_eq(Arc::as_ptr(&registered), std::ptr::from_ref(self)))
    }

    fn status_and_generation(&self) -> (ActorStatus, u64) {
        let state = self.state.lock();
        (state.status, state.generation)
    }

    fn current(&self) -> (u64, Snapshot<U::Context>) {
        let state = self.state.lock();
        (state.seq, state.snapshot())
    }

    pub(crate) fn snapshot(&self) -> Snapshot<U::Context> {
        self.state.lock().snapshot()
    }

    pub(crate) fn subscribe(&self, sink: Sink<U::Context>) -> Subscription {
        self.observers.subscribe(sink, || self.current())
    }

    /// Fire-and-forget delivery. Events sent to an inactive actor are dropped.
    pub(crate) fn send(&self, event: U::Event) {
        let (status, generation) = self.status_and_generation();
        if status != ActorStatus::Active {
            warn!(actor = %self.id, %status, ?event, "dropping event sent to inactive actor");
            return;
        }
        self.enqueue(generation, Inbound::Event(event));
    }

    pub(crate) async fn ask(
        &self,
        query: U::Event,
        timeout: Duration,
    ) -> Result<U::Reply, ActorError> {
        let (status, generation) = self.status_and_generation();
        match status {
            ActorStatus::Active => {}
            ActorStatus::Stopped => {
                return Err(ActorError::Stopped {
                    id: self.id.clone(),
                })
            }
            ActorStatus::Idle | ActorStatus::Error => {
                return Err(ActorError::Unavailable {
                    id: self.id.clone(),
                    status,
                })
            }
        }

        let correlation_id = self.runtime.next_correlation_id();
        let rx = self.pending.register(correlation_id, timeout);
        let _guard = PendingGuard::new(&self.pending, correlation_id);
        trace!(actor = %self.id, %correlation_id, ?timeout, "asking");
        self.enqueue(
            generation,
            Inbound::Request(Envelope::request(correlation_id, query)),
        );

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(ActorError::Stopped {
                id: self.id.clone(),
            }),
            Err(_) => {
                debug!(actor = %self.id, %correlation_id, ?timeout, "ask timed out");
                Err(ActorError::AskTimeout {
                    id: self.id.clone(),
                    correlation_id,
                    timeout,
                })
            }
        }
    }

    pub(crate) fn spawn<V: ExecutionUnit>(
        &self,
        factory: UnitFactory<V>,
        mut config: ActorConfig,
    ) -> Result<Arc<ActorCore<V>>, ActorError> {
        if self.status() == ActorStatus::Stopped || self.children.is_closed() {
            return Err(ActorError::Stopped {
                id: self.id.clone(),
            });
        }

        let id = match config.id() {
            Some(id) => id.clone(),
            None => ActorId::child_of(&self.id, self.child_seq.fetch_add(1, Ordering::SeqCst) + 1),
        };
        if self.children.contains(id.as_str()) {
            return Err(ActorError::DuplicateId { id });
        }

        let supervision = config
            .take_supervision()
            .or_else(|| self.supervision.clone());
        let ask_timeout = config.ask_timeout().unwrap_or(self.ask_timeout);
        let parent: Weak<dyn ActorRef> = self.self_ref.clone();

        let child = ActorCore::create(
            self.runtime.clone(),
            id.clone(),
            factory,
            Some(parent),
            supervision,
            ask_timeout,
        )?;
        let child_ref: ChildRef = child.clone();
        match self.children.insert(id.clone(), child_ref) {
            Admission::Admitted => {}
            Admission::Duplicate => return Err(ActorError::DuplicateId { id }),
            Admission::Closed => {
                debug!(actor = %self.id, child = %id, "parent is shutting down; child discarded");
                return Err(ActorError::Stopped {
                    id: self.id.clone(),
                });
            }
        }
        debug!(actor = %self.id, child = %id, "spawned child");

        if self.status() == ActorStatus::Active {
            ActorRef::start(child.as_ref());
        }
        Ok(child)
    }

    fn enqueue(&self, generation: u64, item: Inbound<U>) {
        {
            let mut mailbox = self.mailbox.lock();
            mailbox.queue.push_back((generation, item));
            if mailbox.draining {
                return;
            }
            mailbox.draining = true;
        }
        self.drain();
    }

    fn drain(&self) {
        loop {
            let (generation, item) = {
                let mut mailbox = self.mailbox.lock();
                if let Some(next) = mailbox.queue.pop_front() {
                    next
                } else {
                    mailbox.draining = false;
                    return;
                }
            };
            self.process(generation, item);
        }
    }

    fn process(&self, generation: u64, item: Inbound<U>) {
        let mut effects = Effects::new();
        let (outcome, recorded) = {
            let mut slot = self.unit.lock();
            let (status, current_generation) = self.status_and_generation();
            if slot.is_none() || status != ActorStatus::Active || generation != current_generation {
                drop(slot);
                self.discard(item, status);
                return;
            }
            let Some(unit) = slot.as_mut() else {
                return;
            };

            let outcome = match item {
                Inbound::Event(event) => {
                    trace!(actor = %self.id, ?event, "processing event");
                    guarded(|| unit.send(event, &mut effects))
                }
                Inbound::Request(request) => {
                    trace!(actor = %self.id, correlation_id = %request.correlation_id(), "processing request");
                    guarded(|| unit.request(request, &mut effects))
                }
                Inbound::ChildFailure(failure) => {
                    debug!(actor = %self.id, child = %failure.child_id(), fault = %failure.fault(), "handling child failure");
                    guarded(|| unit.on_child_failure(failure, &mut effects))
                }
            };
            let (transitions, replies) = effects.into_parts();
            let recorded = self.record(generation, transitions);
            (outcome.map(|()| replies), recorded)
        };
        self.settle(generation, recorded, outcome);
    }

    fn discard(&self, item: Inbound<U>, status: ActorStatus) {
        match item {
            Inbound::Event(event) => {
                trace!(actor = %self.id, ?event, %status, "discarding event for replaced unit");
            }
            Inbound::Request(request) => {
                let error = if status == ActorStatus::Stopped {
                    ActorError::Stopped {
                        id: self.id.clone(),
                    }
                } else {
                    ActorError::Unavailable {
                        id: self.id.clone(),
                        status,
                    }
                };
                self.pending.resolve(request.correlation_id(), Err(error));
            }
            Inbound::ChildFailure(failure) => {
                warn!(actor = %self.id, child = %failure.child_id(), %status, "child failure arrived after actor left active");
            }
        }
    }

    /// Applies transitions to the cached raw state. Expects the unit lock held.
    fn record(&self, generation: u64, transitions: Vec<U::State>) -> Recorded<U::Context> {
        let mut recorded = Recorded::default();
        if transitions.is_empty() {
            return recorded;
        }

        let mut state = self.state.lock();
        if state.generation != generation {
            return recorded;
        }
        for raw in transitions {
            if state.status != ActorStatus::Active {
                break;
            }
            let reported = match raw.status() {
                UnitStatus::Error(message) => Some(ActorFault::new(FaultKind::Reported, message)),
                UnitStatus::Active | UnitStatus::Done => None,
            };
            state.raw = raw;
            if let Some(fault) = reported {
                state.status = ActorStatus::Error;
                state.fault = Some(fault.clone());
                recorded.reported = Some(fault);
            }
            recorded.published.push(state.next_snapshot());
        }
        recorded
    }

    /// Publishes recorded snapshots, resolves replies, and handles failure.
    /// Runs with no lock held.
    fn settle(
        &self,
        generation: u64,
        recorded: Recorded<U::Context>,
        outcome: Result<Vec<Envelope<U::Reply>>, ActorFault>,
    ) {
        for (seq, snapshot) in &recorded.published {
            self.observers.publish(*seq, snapshot);
        }

        let outcome = outcome.map(|replies| {
            for reply in replies {
                let (correlation_id, payload) = reply.into_parts();
                if !self.pending.resolve(correlation_id, Ok(payload)) {
                    warn!(actor = %self.id, %correlation_id, "reply has no pending request");
                }
            }
        });

        if let Some(fault) = recorded.reported {
            self.supervise(generation, fault);
        } else if let Err(fault) = outcome {
            self.fail(generation, fault);
        }
    }

    /// Moves an active actor to `error` and hands it to supervision.
    fn fail(&self, generation: u64, fault: ActorFault) {
        let (seq, snapshot) = {
            let mut state = self.state.lock();
            if state.generation != generation || state.status != ActorStatus::Active {
                return;
            }
            state.status = ActorStatus::Error;
            state.fault = Some(fault.clone());
            state.next_snapshot()
        };
        self.observers.publish(seq, &snapshot);
        self.supervise(generation, fault);
    }

    fn supervise(&self, generation: u64, fault: ActorFault) {
        error!(actor = %self.id, %fault, "execution unit failed");

        let Some(supervision) = &self.supervision else {
            debug!(actor = %self.id, "no supervision; actor stays in error");
            return;
        };

        match supervision.strategy() {
            SupervisionStrategy::RestartOnFailure => {
                let decision = self.limiter.lock().record_failure();
                match decision {
                    Ok(attempt) => {
                        debug!(
                            actor = %self.id,
                            attempt = attempt.attempt,
                            backoff = ?attempt.backoff,
                            "scheduling supervised restart"
                        );
                        self.run_hook(|| supervision.notify_restart(self, &fault, attempt.attempt));
                        self.schedule_restart(generation, attempt.backoff);
                    }
                    Err(exhausted) => {
                        let error = ActorError::SupervisionExhausted {
                            id: self.id.clone(),
                            source: exhausted,
                        };
                        error!(actor = %self.id, %error, "giving up on actor");
                        self.run_hook(|| supervision.notify_failure(self, &error));
                    }
                }
            }
            SupervisionStrategy::Escalate => self.escalate(fault),
        }
    }

    fn run_hook(&self, hook: impl FnOnce()) {
        if let Err(fault) = guarded(|| {
            hook();
            Ok(())
        }) {
            error!(actor = %self.id, %fault, "supervision hook panicked");
        }
    }

    fn escalate(&self, fault: ActorFault) {
        let Some(parent) = ActorRef::parent(self) else {
            error!(actor = %self.id, %fault, "cannot escalate: actor has no live parent");
            return;
        };
        let Some(me) = self.self_ref.upgrade() else {
            return;
        };
        debug!(actor = %self.id, parent = %parent.id(), "escalating failure to parent");
        let me: ChildRef = me;
        parent.notify_child_failure(ChildFailure::new(me, fault));
    }

    fn schedule_restart(&self, generation: u64, backoff: Duration) {
        let Some(me) = self.self_ref.upgrade() else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            error!(actor = %self.id, "no Tokio runtime available; supervised restart skipped");
            return;
        };

        let token = self.runtime.cancellation_token();
        self.runtime.tracker().spawn_on(
            async move {
                tokio::select! {
                    () = token.cancelled() => {
                        trace!(actor = %me.id, "runtime shutting down; supervised restart abandoned");
                    }
                    () = tokio::time::sleep(backoff) => me.supervised_restart(generation).await,
                }
            },
            &handle,
        );
    }

    async fn supervised_restart(&self, generation: u64) {
        let _guard = self.lifecycle.lock().await;
        let (status, current_generation) = self.status_and_generation();
        if status != ActorStatus::Error || current_generation != generation {
            debug!(actor = %self.id, %status, "actor changed since failure; supervised restart skipped");
            return;
        }
        if !self.is_owned() {
            debug!(actor = %self.id, "parent no longer owns this actor; supervised restart skipped");
            return;
        }
        if self.runtime.cancellation_token().is_cancelled() {
            return;
        }
        if let Err(err) = self.restart_locked().await {
            warn!(actor = %self.id, %err, "supervised restart failed");
        }
    }

    /// Moves an idle actor to `active` and runs the unit's `start`.
    ///
    /// `announce` publishes the fresh snapshot first, which is how observers
    /// learn about a restart.
    fn activate(&self, announce: bool) -> bool {
        let mut effects = Effects::new();
        let (generation, fresh, outcome, recorded) = {
            let mut slot = self.unit.lock();
            let Some(unit) = slot.as_mut() else {
                return false;
            };
            let (generation, fresh) = {
                let mut state = self.state.lock();
                if state.status != ActorStatus::Idle {
                    return false;
                }
                state.status = ActorStatus::Active;
                let fresh = announce.then(|| state.next_snapshot());
                (state.generation, fresh)
            };

            let outcome = guarded(|| unit.start(&mut effects));
            let (transitions, replies) = effects.into_parts();
            let recorded = self.record(generation, transitions);
            (generation, fresh, outcome.map(|()| replies), recorded)
        };
        debug!(actor = %self.id, "actor active");

        if let Some((seq, snapshot)) = fresh {
            self.observers.publish(seq, &snapshot);
        }
        self.settle(generation, recorded, outcome);
        true
    }

    /// Replaces the unit with a fresh one and starts it. Expects the lifecycle lock held.
    async fn restart_locked(&self) -> Result<(), ActorError> {
        debug!(actor = %self.id, "restarting");
        self.shutdown(false).await;
        self.children.reopen();

        let (unit, raw) = match construct(&self.factory) {
            Ok(built) => built,
            Err(fault) => {
                let (generation, (seq, snapshot)) = {
                    let mut state = self.state.lock();
                    state.status = ActorStatus::Error;
                    state.fault = Some(fault.clone());
                    (state.generation, state.next_snapshot())
                };
                self.observers.publish(seq, &snapshot);
                let reason = fault.message().to_string();
                self.supervise(generation, fault);
                return Err(ActorError::RestartFailed {
                    id: self.id.clone(),
                    reason,
                });
            }
        };

        {
            let mut slot = self.unit.lock();
            *slot = Some(unit);
            let mut state = self.state.lock();
            state.raw = raw;
            state.status = ActorStatus::Idle;
            state.fault = None;
        }
        self.observers.reopen();
        if self.parent.is_none() {
            if let Some(me) = self.self_ref.upgrade() {
                self.runtime.ensure_root(me);
            }
        }

        self.activate(true);
        Ok(())
    }

    /// Stops children, then the unit. `terminal` also completes subscriptions.
    async fn shutdown(&self, terminal: bool) {
        let children = self.children.close();
        if !children.is_empty() {
            self.terminate_children(&children).await;
        }

        let unit = {
            let mut slot = self.unit.lock();
            let unit = slot.take();
            let mut state = self.state.lock();
            state.status = ActorStatus::Stopped;
            state.fault = None;
            state.generation += 1;
            unit
        };
        if let Some(mut unit) = unit {
            if let Err(fault) = guarded(|| {
                unit.stop();
                Ok(())
            }) {
                warn!(actor = %self.id, %fault, "execution unit failed while stopping");
            }
        }

        self.mailbox.lock().queue.clear();
        let rejected = self.pending.reject_all(&ActorError::Stopped {
            id: self.id.clone(),
        });
        if rejected > 0 {
            debug!(actor = %self.id, rejected, "rejected pending requests");
        }

        if terminal {
            self.observers.complete_all();
            if self.parent.is_none() {
                self.runtime.deregister_root(&self.id);
            }
        }
        debug!(actor = %self.id, "actor stopped");
    }

    /// Stops all children concurrently, each bounded by the configured child stop timeout.
    ///
    /// Timeouts are aggregated into a single log line.
    #[instrument(skip(self, children), fields(actor = %self.id))]
    async fn terminate_children(&self, children: &[ChildRef]) {
        let timeout = self.runtime.config().child_stop_timeout();
        trace!(count = children.len(), "terminating children");

        let stops = children.iter().map(|child| async move {
            match tokio::time::timeout(timeout, child.stop()).await {
                Ok(()) => ChildStopResult::Success,
                Err(_) => ChildStopResult::Timeout {
                    child_id: child.id(),
                },
            }
        });
        let results = join_all(stops).await;

        let timed_out: Vec<String> = results
            .iter()
            .filter_map(|result| match result {
                ChildStopResult::Success => None,
                ChildStopResult::Timeout { child_id } => Some(child_id.to_string()),
            })
            .collect();
        if !timed_out.is_empty() {
            error!(
                "Shutdown timeout ({} ms) for {} child(ren) of actor {}: [{}]",
                timeout.as_millis(),
                timed_out.len(),
                self.id,
                timed_out.join(", ")
            );
        }

        trace!("all children stopped");
    }
}

#[async_trait]
impl<U: ExecutionUnit> ActorRef for ActorCore<U> {
    fn id(&self) -> ActorId {
        self.id.clone()
    }

    fn status(&self) -> ActorStatus {
        self.state.lock().status
    }

    fn parent(&self) -> Option<ParentRef> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    fn supervision(&self) -> Option<Supervision> {
        self.supervision.clone()
    }

    fn fault(&self) -> Option<ActorFault> {
        self.state.lock().fault.clone()
    }

    fn children(&self) -> Vec<ChildRef> {
        self.children.snapshot()
    }

    fn find_child(&self, id: &str) -> Option<ChildRef> {
        self.children.get(id)
    }

    fn start(&self) {
        if !self.activate(false) {
            trace!(actor = %self.id, status = %self.status(), "start ignored");
            return;
        }
        for child in self.children.snapshot() {
            child.start();
        }
    }

    async fn stop(&self) {
        let _guard = self.lifecycle.lock().await;
        if self.status() == ActorStatus::Stopped {
            trace!(actor = %self.id, "already stopped");
            return;
        }
        self.shutdown(true).await;
    }

    async fn restart(&self) -> Result<(), ActorError> {
        let _guard = self.lifecycle.lock().await;
        if !self.is_owned() {
            warn!(actor = %self.id, "parent no longer owns this actor; restart refused");
            return Err(ActorError::Stopped {
                id: self.id.clone(),
            });
        }
        self.limiter.lock().reset();
        self.restart_locked().await
    }

    fn notify_child_failure(&self, failure: ChildFailure) {
        let (status, generation) = self.status_and_generation();
        if status != ActorStatus::Active {
            warn!(
                actor = %self.id,
                child = %failure.child_id(),
                %status,
                "inactive parent cannot handle child failure"
            );
            return;
        }
        self.enqueue(generation, Inbound::ChildFailure(failure));
    }
}

impl<U: ExecutionUnit> fmt::Debug for ActorCore<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorCore")
            .field("id", &self.id)
            .field("status", &self.status())
            .field("children", &self.children.len())
            .finish_non_exhaustive()
    }
}

impl<U: ExecutionUnit> Drop for ActorCore<U> {
    fn drop(&mut self) {
        trace!(actor = %self.id, "actor dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::MachineState;

    #[derive(Debug)]
    struct Quiet;

    impl ExecutionUnit for Quiet {
        type Context = ();
        type Event = ();
        type Reply = ();
        type State = MachineState<()>;

        fn send(&mut self, _event: (), _effects: &mut Effects<Self>) -> anyhow::Result<()> {
            Ok(())
        }

        fn state(&self) -> MachineState<()> {
            MachineState::new("quiet", ())
        }
    }

    fn quiet() -> UnitFactory<Quiet> {
        Arc::new(|| Ok(Quiet))
    }

    fn started_root(runtime: &MachineRuntime) -> Arc<ActorCore<Quiet>> {
        let root = ActorCore::create(
            runtime.clone(),
            ActorId::new("root"),
            quiet(),
            None,
            None,
            Duration::from_secs(1),
        )
        .unwrap();
        ActorRef::start(root.as_ref());
        root
    }

    async fn until_children_closed(parent: &ActorCore<Quiet>) {
        for _ in 0..100 {
            if parent.children.is_closed() {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("parent never began stopping its children");
    }

    #[tokio::test]
    async fn child_spawned_while_parent_stops_is_refused() {
        let runtime = MachineRuntime::default();
        let parent = started_root(&runtime);
        let busy = parent.spawn(quiet(), ActorConfig::new()).unwrap();

        // Holding the child's lifecycle lock keeps the parent mid-shutdown.
        let held = busy.lifecycle.lock().await;
        let stopping = tokio::spawn({
            let parent = Arc::clone(&parent);
            async move { ActorRef::stop(parent.as_ref()).await }
        });
        until_children_closed(&parent).await;
        assert_eq!(parent.status(), ActorStatus::Active);

        let late = parent.spawn(quiet(), ActorConfig::new());
        assert!(matches!(late, Err(ActorError::Stopped { .. })));

        drop(held);
        stopping.await.unwrap();
        assert_eq!(parent.status(), ActorStatus::Stopped);
        assert_eq!(busy.status(), ActorStatus::Stopped);
        assert_eq!(parent.child_count(), 0);
    }

    #[tokio::test]
    async fn children_are_accepted_again_after_restart() {
        let runtime = MachineRuntime::default();
        let parent = started_root(&runtime);
        let busy = parent.spawn(quiet(), ActorConfig::new()).unwrap();

        let held = busy.lifecycle.lock().await;
        let restarting = tokio::spawn({
            let parent = Arc::clone(&parent);
            async move { ActorRef::restart(parent.as_ref()).await }
        });
        until_children_closed(&parent).await;

        let late = parent.spawn(quiet(), ActorConfig::new());
        assert!(matches!(late, Err(ActorError::Stopped { .. })));

        drop(held);
        restarting.await.unwrap().unwrap();
        assert_eq!(parent.status(), ActorStatus::Active);
        assert_eq!(busy.status(), ActorStatus::Stopped);
        assert_eq!(parent.child_count(), 0);

        let fresh = parent.spawn(quiet(), ActorConfig::new()).unwrap();
        assert_eq!(fresh.status(), ActorStatus::Active);
        assert_eq!(parent.child_count(), 1);
    }
}
