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

use acton_machine::prelude::*;

#[machine_event]
pub enum OverseerEvent {
    Noop,
}

#[machine_context]
pub struct Incidents {
    pub failed_children: Vec<String>,
    pub faults: Vec<String>,
}

/// A parent that records escalated child failures in its context.
#[derive(Debug, Default)]
pub struct Overseer {
    incidents: Incidents,
    rethrow: bool,
}

impl Overseer {
    /// An overseer that records the failure and then fails itself.
    pub fn rethrowing() -> Self {
        Self {
            rethrow: true,
            ..Self::default()
        }
    }
}

impl ExecutionUnit for Overseer {
    type Context = Incidents;
    type Event = OverseerEvent;
    type Reply = ();
    type State = MachineState<Incidents>;

    fn send(&mut self, _event: OverseerEvent, _effects: &mut Effects<Self>) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_child_failure(
        &mut self,
        failure: ChildFailure,
        effects: &mut Effects<Self>,
    ) -> anyhow::Result<()> {
        self.incidents
            .failed_children
            .push(failure.child_id().to_string());
        self.incidents.faults.push(failure.fault().message().to_string());
        effects.transition(self.state());
        if self.rethrow {
            anyhow::bail!("child {} failed", failure.child_id());
        }
        Ok(())
    }

    fn state(&self) -> MachineState<Incidents> {
        MachineState::new("watching", self.incidents.clone())
    }
}
