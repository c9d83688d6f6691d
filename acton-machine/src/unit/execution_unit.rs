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

//! The contract between the runtime and the state machines it hosts.

use std::fmt;

use tracing::{debug, warn};

use crate::message::{ChildFailure, CorrelationId, Envelope};
use crate::unit::UnitState;

/// A state machine hosted by an actor.
///
/// The runtime never calls two methods of the same unit concurrently, and it
/// processes events and requests strictly in the order they were sent. Every
/// callback runs inside a fault boundary: an `Err` return or a panic moves the
/// actor to `error` and hands it to its supervision.
///
/// Transitions are reported through the [`Effects`] passed to each call; each
/// call to [`Effects::transition`] produces exactly one snapshot for observers.
///
/// ```rust,ignore
/// use acton_machine::prelude::*;
///
/// #[machine_event]
/// enum CounterEvent {
///     Increment,
/// }
///
/// #[derive(Default)]
/// struct Counter {
///     count: u32,
/// }
///
/// impl ExecutionUnit for Counter {
///     type Context = u32;
///     type Event = CounterEvent;
///     type Reply = u32;
///     type State = MachineState<u32>;
///
///     fn send(&mut self, event: CounterEvent, effects: &mut Effects<Self>) -> anyhow::Result<()> {
///         match event {
///             CounterEvent::Increment => self.count += 1,
///         }
///         effects.transition(self.state());
///         Ok(())
///     }
///
///     fn state(&self) -> MachineState<u32> {
///         MachineState::new("counting", self.count)
///     }
/// }
/// ```
pub trait ExecutionUnit: Sized + Send + 'static {
    /// Extended state carried by snapshots.
    type Context: Clone + fmt::Debug + Send + Sync + 'static;
    /// Events accepted by `send`; also the payload of `ask` queries.
    type Event: fmt::Debug + Send + 'static;
    /// Payload of responses to `ask` queries.
    type Reply: fmt::Debug + Send + 'static;
    /// The unit's raw state representation.
    type State: UnitState<Context = Self::Context>;

    /// Called when the actor becomes active.
    fn start(&mut self, effects: &mut Effects<Self>) -> anyhow::Result<()> {
        let _ = effects;
        Ok(())
    }

    /// Called once when the actor stops or before it is replaced by a restart.
    fn stop(&mut self) {}

    /// Processes one event to completion.
    fn send(&mut self, event: Self::Event, effects: &mut Effects<Self>) -> anyhow::Result<()>;

    /// Processes one correlated query. The answer may be given now or during
    /// any later call; unanswered requests time out on the caller's side.
    fn request(
        &mut self,
        request: Envelope<Self::Event>,
        effects: &mut Effects<Self>,
    ) -> anyhow::Result<()> {
        let _ = effects;
        debug!(
            correlation_id = %request.correlation_id(),
            "unit does not answer requests"
        );
        Ok(())
    }

    /// Handles the failure of an escalating child. Returning `Err` fails this
    /// actor too, passing the failure further up the tree.
    fn on_child_failure(
        &mut self,
        failure: ChildFailure,
        effects: &mut Effects<Self>,
    ) -> anyhow::Result<()> {
        let _ = effects;
        warn!(
            child = %failure.child_id(),
            fault = %failure.fault(),
            "unhandled child failure"
        );
        Ok(())
    }

    /// The current raw state. Must be cheap; it is read on every start and restart.
    fn state(&self) -> Self::State;
}

/// Side effects collected from one unit callback.
pub struct Effects<U: ExecutionUnit> {
    transitions: Vec<U::State>,
    replies: Vec<Envelope<U::Reply>>,
}

impl<U: ExecutionUnit> Effects<U> {
    pub(crate) const fn new() -> Self {
        Self {
            transitions: Vec::new(),
            replies: Vec::new(),
        }
    }

    /// Records a transition into `state`.
    pub fn transition(&mut self, state: U::State) {
        self.transitions.push(state);
    }

    /// Answers the request carrying `correlation_id`.
    pub fn reply(&mut self, correlation_id: CorrelationId, payload: U::Reply) {
        self.replies.push(Envelope::response(correlation_id, payload));
    }

    /// Answers `request`.
    pub fn respond_to(&mut self, request: &Envelope<U::Event>, payload: U::Reply) {
        self.replies.push(request.reply_with(payload));
    }

    /// Transitions recorded so far.
    pub fn transitions(&self) -> &[U::State] {
        &self.transitions
    }

    pub(crate) fn into_parts(self) -> (Vec<U::State>, Vec<Envelope<U::Reply>>) {
        (self.transitions, self.replies)
    }
}

impl<U: ExecutionUnit> fmt::Debug for Effects<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effects")
            .field("transitions", &self.transitions)
            .field("replies", &self.replies)
            .finish()
    }
}
