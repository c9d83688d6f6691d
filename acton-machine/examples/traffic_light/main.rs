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

use std::time::Duration;

use acton_machine::prelude::*;
use futures::StreamExt;

#[machine_event]
enum LightEvent {
    Timer,
    PedestrianTimer,
    Cycles,
}

#[machine_context]
struct Counters {
    cycles: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Light {
    Green,
    Yellow,
    Red(Walk),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Walk {
    Walk,
    Wait,
    Stop,
}

// A traffic light whose red phase has its own pedestrian sub-machine.
#[derive(Debug)]
struct TrafficLight {
    light: Light,
    counters: Counters,
}

impl Default for TrafficLight {
    fn default() -> Self {
        Self {
            light: Light::Green,
            counters: Counters::default(),
        }
    }
}

impl ExecutionUnit for TrafficLight {
    type Context = Counters;
    type Event = LightEvent;
    type Reply = u32;
    type State = MachineState<Counters>;

    fn send(&mut self, event: LightEvent, effects: &mut Effects<Self>) -> anyhow::Result<()> {
        let next = match (self.light, event) {
            (Light::Green, LightEvent::Timer) => Light::Yellow,
            (Light::Yellow, LightEvent::Timer) => Light::Red(Walk::Walk),
            (Light::Red(_), LightEvent::Timer) => {
                self.counters.cycles += 1;
                Light::Green
            }
            (Light::Red(Walk::Walk), LightEvent::PedestrianTimer) => Light::Red(Walk::Wait),
            (Light::Red(Walk::Wait), LightEvent::PedestrianTimer) => Light::Red(Walk::Stop),
            _ => return Ok(()),
        };
        self.light = next;
        effects.transition(self.state());
        Ok(())
    }

    fn request(
        &mut self,
        request: Envelope<LightEvent>,
        effects: &mut Effects<Self>,
    ) -> anyhow::Result<()> {
        match request.payload() {
            LightEvent::Cycles => {
                effects.respond_to(&request, self.counters.cycles);
                Ok(())
            }
            _ => self.send(request.into_payload(), effects),
        }
    }

    fn state(&self) -> MachineState<Counters> {
        let value = match self.light {
            Light::Green => StateValue::atomic("green"),
            Light::Yellow => StateValue::atomic("yellow"),
            Light::Red(walk) => {
                let walk = match walk {
                    Walk::Walk => "walk",
                    Walk::Wait => "wait",
                    Walk::Stop => "stop",
                };
                StateValue::compound([("red", walk)])
            }
        };
        MachineState::new(value, self.counters.clone())
    }
}

#[machine_main]
async fn main() -> anyhow::Result<()> {
    let runtime = MachineRuntime::launch();
    let light = runtime.spawn_actor(
        || Ok(TrafficLight::default()),
        ActorConfig::new().with_id("intersection"),
    )?;

    let mut changes = light.observe(|snapshot| snapshot.value().to_string()).stream();
    let printer = tokio::spawn(async move {
        while let Some(Ok(value)) = changes.next().await {
            println!("light is now {value}");
        }
    });

    for _ in 0..2 {
        light.send(LightEvent::Timer);
        light.send(LightEvent::Timer);
        light.send(LightEvent::PedestrianTimer);
        light.send(LightEvent::PedestrianTimer);
        assert!(light.get_snapshot().matches("red"));
        light.send(LightEvent::Timer);
    }

    let cycles = light.ask_timeout(LightEvent::Cycles, Duration::from_secs(1)).await?;
    println!("completed {cycles} cycles");

    runtime.shutdown_all().await?;
    printer.await?;
    Ok(())
}
