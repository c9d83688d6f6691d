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

#![forbid(unsafe_code)]
#![forbid(missing_docs)]

//! # Acton Machine
//!
//! A supervised actor runtime for state-machine execution units, built on
//! Tokio. Every actor wraps one opaque [`ExecutionUnit`](prelude::ExecutionUnit)
//! behind a uniform handle offering:
//!
//! - **Lifecycle**: `start`, `stop`, and `restart`, cascading through the
//!   actor's children.
//! - **Messaging**: fire-and-forget `send`, processed one event at a time in
//!   send order.
//! - **Ask**: request/response queries correlated by id and bounded by a timeout.
//! - **Observation**: `observe(selector)` projects every snapshot through a
//!   selector to any number of independent subscribers.
//! - **Supervision**: failures (returned errors, panics, and error states
//!   reported by the unit) are caught at the unit boundary and either
//!   restarted within a budget or escalated to the parent.
//!
//! Actors live in an explicitly constructed [`MachineRuntime`](prelude::MachineRuntime).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use acton_machine::prelude::*;
//!
//! #[machine_event]
//! enum CounterEvent {
//!     Increment,
//! }
//!
//! #[machine_context]
//! struct Count {
//!     count: u64,
//! }
//!
//! #[derive(Default)]
//! struct Counter {
//!     context: Count,
//! }
//!
//! impl ExecutionUnit for Counter {
//!     type Context = Count;
//!     type Event = CounterEvent;
//!     type Reply = u64;
//!     type State = MachineState<Count>;
//!
//!     fn send(&mut self, _event: CounterEvent, effects: &mut Effects<Self>) -> anyhow::Result<()> {
//!         self.context.count += 1;
//!         effects.transition(self.state());
//!         Ok(())
//!     }
//!
//!     fn state(&self) -> MachineState<Count> {
//!         MachineState::new("counting", self.context.clone())
//!     }
//! }
//!
//! #[machine_main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = MachineRuntime::launch();
//!     let counter = runtime.new_actor(|| Ok(Counter::default()))?;
//!     let _subscription = counter
//!         .observe(|snapshot| snapshot.context().count)
//!         .subscribe_next(|count| println!("count = {count}"));
//!     counter.start();
//!     counter.send(CounterEvent::Increment);
//!     runtime.shutdown_all().await
//! }
//! ```

/// Runtime context, configuration, handles, and shared types.
pub(crate) mod common;

/// Actor internals: ids, status, faults, supervision, and the restart budget.
pub(crate) mod actor;

/// Envelopes, escalation notices, and the error taxonomy.
pub(crate) mod message;

/// Snapshot projection and subscriptions.
pub(crate) mod observe;

/// Core traits.
pub(crate) mod traits;

/// The execution unit contract and snapshot normalization.
pub(crate) mod unit;

/// A prelude module for conveniently importing the most commonly used items.
///
/// # Re-exports
///
/// ## Macros (from `acton-machine-macro`)
/// *   `machine_event`: derives the traits an event type needs.
/// *   `machine_context`: derives the traits a unit context needs.
/// *   `machine_main`: runs an async `main` on a Tokio runtime.
///
/// ## External Crates
/// *   [`async_trait::async_trait`](https://docs.rs/async-trait/latest/async_trait/attr.async_trait.html)
/// *   [`tokio`](https://docs.rs/tokio), used by `machine_main`.
///
/// ## Core Types
/// *   [`crate::common::MachineRuntime`]: The context actors are created in.
/// *   [`crate::common::ActorHandle`]: Typed handle for one actor.
/// *   [`crate::common::MachineConfig`]: TOML configuration.
/// *   [`crate::actor::ActorConfig`]: Options for new roots and children.
/// *   [`crate::actor::Supervision`]: Supervision strategy, limits, and hooks.
/// *   [`crate::unit::ExecutionUnit`]: The contract a wrapped unit implements.
/// *   [`crate::unit::Snapshot`]: The normalized view of a unit's state.
/// *   [`crate::observe::Observable`]: A selector projection of snapshots.
/// *   [`crate::message::ActorError`]: Errors returned by actor operations.
/// *   [`crate::traits::ActorRef`]: Type-erased actor interface.
pub mod prelude {
    // Macros from acton-machine-macro
    pub use acton_machine_macro::*;

    // External crate re-exports
    pub use async_trait::async_trait;
    pub use tokio;

    // Core types
    pub use crate::actor::{
        ActorConfig, ActorFault, ActorId, ActorStatus, FaultKind, RestartAttempt, RestartLimiter,
        RestartLimiterConfig, RestartStats, Supervision, SupervisionExhausted, SupervisionStrategy,
    };
    pub use crate::common::{
        ActorHandle, ChildRef, DefaultsConfig, FailureHook, MachineConfig, MachineRuntime,
        ParentRef, RestartHook, TimeoutConfig, UnitFactory,
    };
    pub use crate::message::{ActorError, ChildFailure, CorrelationId, Envelope, EnvelopeKind};
    pub use crate::observe::{
        Notification, Observable, ObservableStream, ObserveError, Subscription,
    };
    pub use crate::traits::ActorRef;
    pub use crate::unit::{
        Effects, ExecutionUnit, MachineState, Snapshot, SnapshotAdapter, StateValue, UnitState,
        UnitStatus,
    };
}
