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
pub enum CounterEvent {
    Increment,
    /// Returns an error from `send`.
    Fail,
    /// Transitions into a state the unit itself marks as failed.
    Report,
    /// Answered with the current count when asked.
    Get,
}

#[machine_context]
#[derive(PartialEq, Eq)]
pub struct Tally {
    pub count: u32,
}

/// The canonical counter: `count` starts at 0 and `Increment` adds 1.
#[derive(Debug, Default)]
pub struct Counter {
    tally: Tally,
}

impl Counter {
    pub fn starting_at(count: u32) -> Self {
        Self {
            tally: Tally { count },
        }
    }
}

impl ExecutionUnit for Counter {
    type Context = Tally;
    type Event = CounterEvent;
    type Reply = u32;
    type State = MachineState<Tally>;

    fn send(&mut self, event: CounterEvent, effects: &mut Effects<Self>) -> anyhow::Result<()> {
        match event {
            CounterEvent::Increment => {
                self.tally.count += 1;
                effects.transition(self.state());
            }
            CounterEvent::Fail => anyhow::bail!("counter asked to fail"),
            CounterEvent::Report => {
                effects.transition(self.state().failed("counter reported a failure"));
            }
            CounterEvent::Get => {}
        }
        Ok(())
    }

    fn request(
        &mut self,
        request: Envelope<CounterEvent>,
        effects: &mut Effects<Self>,
    ) -> anyhow::Result<()> {
        if matches!(request.payload(), CounterEvent::Get) {
            effects.respond_to(&request, self.tally.count);
            Ok(())
        } else {
            self.send(request.into_payload(), effects)
        }
    }

    fn state(&self) -> MachineState<Tally> {
        MachineState::new("counting", self.tally.clone())
    }
}
