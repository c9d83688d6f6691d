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
use std::time::Duration;

use acton_machine::prelude::*;

#[machine_event]
enum WorkerEvent {
    Work,
    Crash,
}

#[machine_context]
struct Shift {
    incarnation: u32,
    jobs: u32,
}

#[derive(Debug)]
struct Worker {
    shift: Shift,
}

impl ExecutionUnit for Worker {
    type Context = Shift;
    type Event = WorkerEvent;
    type Reply = ();
    type State = MachineState<Shift>;

    fn send(&mut self, event: WorkerEvent, effects: &mut Effects<Self>) -> anyhow::Result<()> {
        match event {
            WorkerEvent::Work => {
                self.shift.jobs += 1;
                effects.transition(self.state());
                Ok(())
            }
            WorkerEvent::Crash => anyhow::bail!("worker {} dropped a job", self.shift.incarnation),
        }
    }

    fn state(&self) -> MachineState<Shift> {
        MachineState::new("working", self.shift.clone())
    }
}

#[machine_event]
enum ForemanEvent {
    Check,
}

#[derive(Debug, Default)]
struct Foreman {
    failures: u32,
}

impl ExecutionUnit for Foreman {
    type Context = u32;
    type Event = ForemanEvent;
    type Reply = ();
    type State = MachineState<u32>;

    fn send(&mut self, _event: ForemanEvent, _effects: &mut Effects<Self>) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_child_failure(
        &mut self,
        failure: ChildFailure,
        effects: &mut Effects<Self>,
    ) -> anyhow::Result<()> {
        self.failures += 1;
        println!("foreman saw {} fail: {}", failure.child_id(), failure.fault());
        effects.transition(self.state());
        Ok(())
    }

    fn state(&self) -> MachineState<u32> {
        MachineState::new("overseeing", self.failures)
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[machine_main]
async fn main() -> anyhow::Result<()> {
    let runtime = MachineRuntime::launch();
    let foreman = runtime.spawn_actor(|| Ok(Foreman::default()), ActorConfig::new())?;

    let hires = Arc::new(AtomicU32::new(0));
    let definition = {
        let hires = Arc::clone(&hires);
        move || -> anyhow::Result<Worker> {
            let incarnation = hires.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(Worker {
                shift: Shift {
                    incarnation,
                    jobs: 0,
                },
            })
        }
    };

    // Two restarts inside ten seconds, then give up.
    let supervision = Supervision::restart_on_failure()
        .with_max_restarts(2)
        .with_restart_window(Duration::from_secs(10))
        .with_backoff(Duration::from_millis(5), Duration::from_millis(20), 2.0)
        .on_restart(|actor, fault, attempt| {
            println!("restarting {} (attempt {attempt}) after: {fault}", actor.id());
        })
        .on_failure(|actor, error| {
            println!("giving up on {}: {error}", actor.id());
        });
    let worker = foreman.spawn(definition, ActorConfig::new().with_supervision(supervision))?;

    for _ in 0..3 {
        worker.send(WorkerEvent::Work);
        worker.send(WorkerEvent::Crash);
        settle().await;
        let snapshot = worker.get_snapshot();
        println!(
            "{} is {} on incarnation {}",
            worker.id(),
            snapshot.status(),
            snapshot.context().incarnation
        );
    }
    println!("restart stats: {:?}", worker.restart_stats());

    // An escalating child hands its failures to the parent instead.
    let apprentice = foreman.spawn(
        || {
            Ok(Worker {
                shift: Shift::default(),
            })
        },
        ActorConfig::new().with_supervision(Supervision::escalate()),
    )?;
    apprentice.send(WorkerEvent::Crash);
    foreman.send(ForemanEvent::Check);
    println!("foreman has seen {} failures", foreman.get_snapshot().context());

    runtime.shutdown_all().await?;
    Ok(())
}
