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
pub enum Query {
    /// Answered immediately.
    Echo(u32),
    /// Held until a `Release` event arrives.
    Hold(String),
    /// Answers every held request, newest first.
    Release,
    /// Never answered.
    Ignore,
}

/// A unit that answers some requests immediately and others later, out of order.
#[derive(Debug, Default)]
pub struct Responder {
    held: Vec<Envelope<Query>>,
    answered: u32,
}

impl Responder {
    fn release(&mut self, effects: &mut Effects<Self>) {
        let held = std::mem::take(&mut self.held);
        for request in held.into_iter().rev() {
            if let Query::Hold(tag) = request.payload() {
                let reply = format!("held {tag}");
                effects.respond_to(&request, reply);
                self.answered += 1;
            }
        }
        effects.transition(self.state());
    }
}

impl ExecutionUnit for Responder {
    type Context = u32;
    type Event = Query;
    type Reply = String;
    type State = MachineState<u32>;

    fn send(&mut self, event: Query, effects: &mut Effects<Self>) -> anyhow::Result<()> {
        if matches!(event, Query::Release) {
            self.release(effects);
        }
        Ok(())
    }

    fn request(&mut self, request: Envelope<Query>, effects: &mut Effects<Self>) -> anyhow::Result<()> {
        match request.payload() {
            Query::Echo(value) => {
                let reply = format!("echo {value}");
                effects.respond_to(&request, reply);
                self.answered += 1;
            }
            Query::Hold(_) => self.held.push(request),
            Query::Release => self.release(effects),
            Query::Ignore => {}
        }
        Ok(())
    }

    fn state(&self) -> MachineState<u32> {
        MachineState::new("serving", self.answered)
    }
}
