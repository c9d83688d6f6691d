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

//! Push-based projections of an actor's snapshots.
//!
//! [`ActorHandle::observe`](crate::common::ActorHandle::observe) pairs a
//! selector with the actor's snapshot stream. Each subscriber receives the
//! selector applied to the current snapshot synchronously inside `subscribe`,
//! then one value per later snapshot in transition order. Subscribers never
//! see a snapshot twice or out of order, even when they subscribe while the
//! actor is publishing.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::channel::mpsc;
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use tracing::{error, trace};

use crate::actor::{guarded, ActorId};
use crate::unit::Snapshot;

/// One delivery to an observer.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification<T> {
    /// The selector's value for a new snapshot.
    Next(T),
    /// The selector failed; the subscription is closed.
    Error(ObserveError),
    /// The actor stopped; the subscription is closed.
    Complete,
}

/// A selector failed or panicked.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("selector for actor {actor} failed: {message}")]
pub struct ObserveError {
    actor: ActorId,
    message: String,
}

impl ObserveError {
    pub(crate) fn new(actor: ActorId, message: impl Into<String>) -> Self {
        Self {
            actor,
            message: message.into(),
        }
    }

    /// The observed actor.
    #[must_use]
    pub const fn actor(&self) -> &ActorId {
        &self.actor
    }

    /// Why the selector failed.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Handle to an active subscription.
///
/// Dropping a `Subscription` does not end it; call
/// [`unsubscribe`](Self::unsubscribe).
#[must_use = "a subscription stays active until `unsubscribe` is called"]
#[derive(Debug, Clone)]
pub struct Subscription {
    active: Arc<AtomicBool>,
}

impl Subscription {
    /// Stops all further deliveries. Takes effect immediately and cannot be undone.
    pub fn unsubscribe(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// Whether deliveries can still happen.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

type Observer<T> = Box<dyn FnMut(Notification<T>) + Send>;
type SubscribeFn<T> = dyn Fn(Observer<T>) -> Subscription + Send + Sync;

/// A selector bound to one actor, ready to be subscribed to.
pub struct Observable<T> {
    actor: ActorId,
    subscribe_fn: Arc<SubscribeFn<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            actor: self.actor.clone(),
            subscribe_fn: Arc::clone(&self.subscribe_fn),
        }
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("actor", &self.actor)
            .finish_non_exhaustive()
    }
}

impl<T: Send + 'static> Observable<T> {
    pub(crate) fn new(
        actor: ActorId,
        subscribe_fn: impl Fn(Observer<T>) -> Subscription + Send + Sync + 'static,
    ) -> Self {
        Self {
            actor,
            subscribe_fn: Arc::new(subscribe_fn),
        }
    }

    /// The observed actor.
    #[must_use]
    pub const fn actor(&self) -> &ActorId {
        &self.actor
    }

    /// Registers `observer`. The current value is delivered before this returns.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: FnMut(Notification<T>) + Send + 'static,
    {
        (self.subscribe_fn)(Box::new(observer))
    }

    /// Registers a callback for values only, ignoring errors and completion.
    pub fn subscribe_next<F>(&self, mut on_next: F) -> Subscription
    where
        F: FnMut(T) + Send + 'static,
    {
        self.subscribe(move |notification| {
            if let Notification::Next(value) = notification {
                on_next(value);
            }
        })
    }

    /// Adapts a new subscription into a [`Stream`]. The stream ends when the
    /// actor stops or after yielding a selector error; dropping it unsubscribes.
    pub fn stream(&self) -> ObservableStream<T> {
        let (tx, rx) = mpsc::unbounded();
        let subscription = self.subscribe(move |notification| match notification {
            Notification::Next(value) => {
                let _ = tx.unbounded_send(Ok(value));
            }
            Notification::Error(err) => {
                let _ = tx.unbounded_send(Err(err));
                tx.close_channel();
            }
            Notification::Complete => tx.close_channel(),
        });
        ObservableStream { rx, subscription }
    }
}

/// [`Stream`] of selector values produced by [`Observable::stream`].
#[derive(Debug)]
pub struct ObservableStream<T> {
    rx: mpsc::UnboundedReceiver<Result<T, ObserveError>>,
    subscription: Subscription,
}

impl<T> Stream for ObservableStream<T> {
    type Item = Result<T, ObserveError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_next_unpin(cx)
    }
}

impl<T> Drop for ObservableStream<T> {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}

/// What a registry delivers to a sink.
pub(crate) enum Signal<'a, C> {
    Snapshot(&'a Snapshot<C>),
    Complete,
}

/// Whether a sink wants further deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Close,
}

/// Receives signals along with the subscription's live flag, which may be
/// cleared by `unsubscribe` at any moment.
pub(crate) type Sink<C> = Box<dyn FnMut(Signal<'_, C>, &AtomicBool) -> Flow + Send>;

/// Builds the sink that runs `selector` and forwards its outcome to `observer`.
pub(crate) fn selector_sink<C, T, F>(
    actor: ActorId,
    selector: Arc<F>,
    mut observer: Observer<T>,
) -> Sink<C>
where
    C: 'static,
    T: Send + 'static,
    F: Fn(&Snapshot<C>) -> anyhow::Result<T> + Send + Sync + 'static,
{
    Box::new(move |signal: Signal<'_, C>, active: &AtomicBool| match signal {
        Signal::Snapshot(snapshot) => match guarded(|| (*selector)(snapshot)) {
            // An unsubscribe that raced the selector wins.
            _ if !active.load(Ordering::SeqCst) => Flow::Close,
            Ok(value) => {
                observer(Notification::Next(value));
                Flow::Continue
            }
            Err(fault) => {
                observer(Notification::Error(ObserveError::new(
                    actor.clone(),
                    fault.to_string(),
                )));
                Flow::Close
            }
        },
        Signal::Complete => {
            observer(Notification::Complete);
            Flow::Close
        }
    })
}

struct SlotState<C> {
    last_seen: u64,
    sink: Sink<C>,
}

struct ObserverSlot<C> {
    active: Arc<AtomicBool>,
    state: Mutex<SlotState<C>>,
}

impl<C> ObserverSlot<C> {
    /// Delivers `signal` unless the slot is closed. Expects the state lock held.
    fn deliver(&self, state: &mut SlotState<C>, signal: Signal<'_, C>) {
        if !self.active.load(Ordering::SeqCst) {
            return;
        }
        match catch_unwind(AssertUnwindSafe(|| (state.sink)(signal, &*self.active))) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Close) => self.active.store(false, Ordering::SeqCst),
            Err(_) => {
                error!("observer panicked; subscription closed");
                self.active.store(false, Ordering::SeqCst);
            }
        }
    }
}

/// The subscribers of one actor.
///
/// Every published snapshot carries a sequence number; a slot only accepts
/// numbers above the last one it saw.
pub(crate) struct ObserverRegistry<C> {
    slots: Mutex<Vec<Arc<ObserverSlot<C>>>>,
    closed: AtomicBool,
}

impl<C> Default for ObserverRegistry<C> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }
}

impl<C> ObserverRegistry<C> {
    /// Registers `sink` and delivers the snapshot returned by `current`.
    ///
    /// The slot is registered before `current` runs and stays locked until the
    /// initial delivery is done, so a concurrent publish either lands after it
    /// or is recognized as already seen.
    pub(crate) fn subscribe(
        &self,
        sink: Sink<C>,
        current: impl FnOnce() -> (u64, Snapshot<C>),
    ) -> Subscription {
        let active = Arc::new(AtomicBool::new(true));
        let slot = Arc::new(ObserverSlot {
            active: Arc::clone(&active),
            state: Mutex::new(SlotState { last_seen: 0, sink }),
        });

        let mut state = slot.state.lock();
        let closed = {
            let mut slots = self.slots.lock();
            let closed = self.closed.load(Ordering::SeqCst);
            if !closed {
                slots.push(Arc::clone(&slot));
            }
            closed
        };

        let (seq, snapshot) = current();
        state.last_seen = seq;
        slot.deliver(&mut state, Signal::Snapshot(&snapshot));
        if closed {
            slot.deliver(&mut state, Signal::Complete);
            active.store(false, Ordering::SeqCst);
        }
        drop(state);

        Subscription { active }
    }

    /// Delivers snapshot number `seq` to every open slot that has not seen it.
    pub(crate) fn publish(&self, seq: u64, snapshot: &Snapshot<C>) {
        let slots: Vec<_> = {
            let mut slots = self.slots.lock();
            slots.retain(|slot| slot.active.load(Ordering::SeqCst));
            slots.clone()
        };
        trace!(seq, subscribers = slots.len(), "publishing snapshot");

        for slot in slots {
            let mut state = slot.state.lock();
            if seq <= state.last_seen {
                continue;
            }
            state.last_seen = seq;
            slot.deliver(&mut state, Signal::Snapshot(snapshot));
        }
    }

    /// Sends `Complete` to every open slot and refuses new ones until reopened.
    pub(crate) fn complete_all(&self) {
        let slots = {
            let mut slots = self.slots.lock();
            self.closed.store(true, Ordering::SeqCst);
            std::mem::take(&mut *slots)
        };
        for slot in slots {
            let mut state = slot.state.lock();
            slot.deliver(&mut state, Signal::Complete);
            slot.active.store(false, Ordering::SeqCst);
        }
    }

    /// Accepts subscribers again after a stopped actor is restarted.
    pub(crate) fn reopen(&self) {
        self.closed.store(false, Ordering::SeqCst);
    }

    pub(crate) fn len(&self) -> usize {
        self.slots
            .lock()
            .iter()
            .filter(|slot| slot.active.load(Ordering::SeqCst))
            .count()
    }
}
