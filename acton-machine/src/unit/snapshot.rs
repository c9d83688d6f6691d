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

//! Normalized views of an execution unit's state.
//!
//! Units keep their state in whatever representation suits them and expose it
//! through [`UnitState`]. The [`SnapshotAdapter`] combines that raw state with
//! the actor's own lifecycle status into the uniform [`Snapshot`] handed to
//! callers and observers.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::actor::{ActorFault, ActorStatus, FaultKind};

/// The logical state of a machine: a single tag or a tree of nested and parallel regions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    /// A leaf state such as `"green"`.
    Atomic(String),
    /// Active child states keyed by region, e.g. `{"red": "walk"}`.
    Compound(BTreeMap<String, StateValue>),
}

impl StateValue {
    /// A leaf state.
    pub fn atomic(name: impl Into<String>) -> Self {
        Self::Atomic(name.into())
    }

    /// A compound state built from `(region, child)` pairs.
    pub fn compound<K, V>(regions: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Self>,
    {
        Self::Compound(
            regions
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Whether the state is, or is nested inside, the dotted `path`.
    ///
    /// `{"red": "walk"}` matches `"red"` and `"red.walk"` but not `"walk"`.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let mut current = self;
        let mut segments = path.split('.');
        loop {
            let Some(segment) = segments.next() else {
                return true;
            };
            match current {
                Self::Atomic(name) => return name == segment && segments.next().is_none(),
                Self::Compound(regions) => match regions.get(segment) {
                    Some(child) => current = child,
                    None => return false,
                },
            }
        }
    }
}

impl Default for StateValue {
    fn default() -> Self {
        Self::Atomic(String::new())
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        Self::atomic(value)
    }
}

impl From<String> for StateValue {
    fn from(value: String) -> Self {
        Self::Atomic(value)
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atomic(name) => f.write_str(name),
            Self::Compound(regions) => {
                f.write_str("{")?;
                for (index, (region, child)) in regions.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{region}: {child}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Status a unit reports for itself.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnitStatus {
    /// Running normally.
    #[default]
    Active,
    /// Reached a final state.
    Done,
    /// The unit considers itself failed; the runtime treats this as a failure.
    Error(String),
}

/// Raw state exposed by an execution unit.
pub trait UnitState: Clone + fmt::Debug + Send + Sync + 'static {
    /// The extended-state payload.
    type Context: Clone + fmt::Debug + Send + Sync + 'static;

    /// Borrows the extended state.
    fn context(&self) -> &Self::Context;

    /// The current logical state.
    fn value(&self) -> StateValue;

    /// The unit's own view of its health.
    fn status(&self) -> UnitStatus {
        UnitStatus::Active
    }
}

/// A ready-made [`UnitState`] for units that track a value, a context and a status.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MachineState<C> {
    value: StateValue,
    context: C,
    status: UnitStatus,
}

impl<C> MachineState<C> {
    /// An active state.
    pub fn new(value: impl Into<StateValue>, context: C) -> Self {
        Self {
            value: value.into(),
            context,
            status: UnitStatus::Active,
        }
    }

    /// Marks the state final.
    #[must_use]
    pub fn done(mut self) -> Self {
        self.status = UnitStatus::Done;
        self
    }

    /// Marks the state failed.
    #[must_use]
    pub fn failed(mut self, message: impl Into<String>) -> Self {
        self.status = UnitStatus::Error(message.into());
        self
    }
}

impl<C> UnitState for MachineState<C>
where
    C: Clone + fmt::Debug + Send + Sync + 'static,
{
    type Context = C;

    fn context(&self) -> &C {
        &self.context
    }

    fn value(&self) -> StateValue {
        self.value.clone()
    }

    fn status(&self) -> UnitStatus {
        self.status.clone()
    }
}

/// Immutable, normalized view of an actor at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<C> {
    context: C,
    value: StateValue,
    status: ActorStatus,
    error: Option<ActorFault>,
    done: bool,
}

impl<C> Snapshot<C> {
    /// The unit's extended state.
    pub const fn context(&self) -> &C {
        &self.context
    }

    /// The unit's logical state.
    pub const fn value(&self) -> &StateValue {
        &self.value
    }

    /// Actor lifecycle status.
    pub const fn status(&self) -> ActorStatus {
        self.status
    }

    /// The failure, present only when the status is `error`.
    pub const fn error(&self) -> Option<&ActorFault> {
        self.error.as_ref()
    }

    /// Whether the unit reached a final state.
    pub const fn is_done(&self) -> bool {
        self.done
    }

    /// Shorthand for [`StateValue::matches`].
    pub fn matches(&self, path: &str) -> bool {
        self.value.matches(path)
    }

    /// Consumes the snapshot, returning the context.
    pub fn into_context(self) -> C {
        self.context
    }
}

/// Builds [`Snapshot`]s from raw unit state.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotAdapter;

impl SnapshotAdapter {
    /// Normalizes `raw` for an actor in `status`.
    ///
    /// A live actor whose unit reports an error status is shown as `error`, with
    /// `fault` when one was recorded and a [`FaultKind::Reported`] fault
    /// otherwise. Idle and stopped actors are shown as such regardless of the
    /// raw status.
    pub fn adapt<S: UnitState>(
        raw: &S,
        status: ActorStatus,
        fault: Option<&ActorFault>,
    ) -> Snapshot<S::Context> {
        let raw_status = raw.status();
        let reported = match &raw_status {
            UnitStatus::Error(message) => Some(message.as_str()),
            UnitStatus::Active | UnitStatus::Done => None,
        };
        let failed = status == ActorStatus::Error
            || (status == ActorStatus::Active && reported.is_some());

        let (status, error) = if failed {
            let error = fault.cloned().or_else(|| {
                Some(ActorFault::new(
                    FaultKind::Reported,
                    reported.unwrap_or("unknown failure"),
                ))
            });
            (ActorStatus::Error, error)
        } else {
            (status, None)
        };

        Snapshot {
            context: raw.context().clone(),
            value: raw.value(),
            status,
            error,
            done: raw_status == UnitStatus::Done,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_values_match_dotted_paths() {
        let value = StateValue::compound([("red", "walk")]);
        assert!(value.matches("red"));
        assert!(value.matches("red.walk"));
        assert!(!value.matches("walk"));
        assert!(!value.matches("red.stop"));
        assert!(!value.matches("red.walk.fast"));
        assert_eq!(value.to_string(), "{red: walk}");
    }

    #[test]
    fn parallel_regions_match_independently() {
        let value = StateValue::compound([
            ("bold", StateValue::atomic("on")),
            ("italic", StateValue::atomic("off")),
        ]);
        assert!(value.matches("bold.on"));
        assert!(value.matches("italic.off"));
        assert!(!value.matches("italic.on"));
    }

    #[test]
    fn adapter_passes_through_healthy_state() {
        let raw = MachineState::new("green", 3_u32);
        let snapshot = SnapshotAdapter::adapt(&raw, ActorStatus::Active, None);

        assert_eq!(*snapshot.context(), 3);
        assert!(snapshot.matches("green"));
        assert_eq!(snapshot.status(), ActorStatus::Active);
        assert!(snapshot.error().is_none());
        assert!(!snapshot.is_done());
    }

    #[test]
    fn adapter_surfaces_reported_errors() {
        let raw = MachineState::new("broken", ()).failed("bulb burned out");
        let snapshot = SnapshotAdapter::adapt(&raw, ActorStatus::Active, None);

        assert_eq!(snapshot.status(), ActorStatus::Error);
        let error = snapshot.error().expect("error should be present");
        assert_eq!(error.kind(), FaultKind::Reported);
        assert_eq!(error.message(), "bulb burned out");
    }

    #[test]
    fn adapter_prefers_recorded_fault() {
        let raw = MachineState::new("green", ());
        let fault = ActorFault::new(FaultKind::Panic, "boom");
        let snapshot = SnapshotAdapter::adapt(&raw, ActorStatus::Error, Some(&fault));

        assert_eq!(snapshot.status(), ActorStatus::Error);
        assert_eq!(snapshot.error(), Some(&fault));
    }

    #[test]
    fn adapter_ignores_raw_error_for_stopped_actor() {
        let raw = MachineState::new("broken", ()).failed("late");
        let snapshot = SnapshotAdapter::adapt(&raw, ActorStatus::Stopped, None);

        assert_eq!(snapshot.status(), ActorStatus::Stopped);
        assert!(snapshot.error().is_none());
    }

    #[test]
    fn adapter_flags_final_states() {
        let raw = MachineState::new("finished", ()).done();
        assert!(SnapshotAdapter::adapt(&raw, ActorStatus::Active, None).is_done());
    }
}
