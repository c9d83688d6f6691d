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

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use acton_machine::prelude::*;

#[machine_event]
pub enum FlakyEvent {
    Ping,
    Fail,
    Panic,
}

#[machine_context]
pub struct Incarnation {
    /// Which construction of the definition produced this unit, starting at 1.
    pub number: u32,
    pub pings: u32,
}

/// A unit that fails on request and remembers which incarnation it is.
#[derive(Debug)]
pub struct Flaky {
    context: Incarnation,
}

impl Flaky {
    /// A definition that numbers every unit it builds; `builds` counts constructions.
    pub fn definition(
        builds: Arc<AtomicU32>,
    ) -> impl Fn() -> anyhow::Result<Self> + Send + Sync + 'static {
        move || {
            let number = builds.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(Self {
                context: Incarnation { number, pings: 0 },
            })
        }
    }

    /// Like [`Flaky::definition`], but every construction after the first `limit` fails.
    pub fn definition_failing_after(
        builds: Arc<AtomicU32>,
        limit: u32,
    ) -> impl Fn() -> anyhow::Result<Self> + Send + Sync + 'static {
        move || {
            let number = builds.fetch_add(1, Ordering::SeqCst) + 1;
            anyhow::ensure!(number <= limit, "construction {number} refused");
            Ok(Self {
                context: Incarnation { number, pings: 0 },
            })
        }
    }
}

impl ExecutionUnit for Flaky {
    type Context = Incarnation;
    type Event = FlakyEvent;
    type Reply = u32;
    type State = MachineState<Incarnation>;

    fn send(&mut self, event: FlakyEvent, effects: &mut Effects<Self>) -> anyhow::Result<()> {
        match event {
            FlakyEvent::Ping => {
                self.context.pings += 1;
                effects.transition(self.state());
                Ok(())
            }
            FlakyEvent::Fail => anyhow::bail!("incarnation {} failed", self.context.number),
            FlakyEvent::Panic => panic!("incarnation {} panicked", self.context.number),
        }
    }

    fn state(&self) -> MachineState<Incarnation> {
        MachineState::new("running", self.context.clone())
    }
}
