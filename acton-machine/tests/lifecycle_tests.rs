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

#![allow(dead_code)]

use acton_machine::prelude::*;
use acton_machine_test::prelude::*;

use crate::setup::initialize_tracing;
use crate::setup::units::counter::{Counter, CounterEvent};

mod setup;

#[machine_test]
async fn snapshot_is_available_before_start() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = MachineRuntime::default();
    let counter = runtime.new_actor(|| Ok(Counter::starting_at(4)))?;

    let snapshot = counter.get_snapshot();
    assert_eq!(counter.status(), ActorStatus::Idle);
    assert_eq!(snapshot.status(), ActorStatus::Idle);
    assert_eq!(snapshot.context().count, 4);
    assert!(snapshot.matches("counting"));
    assert!(snapshot.error().is_none());
    Ok(())
}

#[machine_test]
async fn start_is_idempotent() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = MachineRuntime::default();
    let counter = runtime.new_actor(|| Ok(Counter::default()))?;

    counter.start();
    counter.send(CounterEvent::Increment);
    counter.start();

    assert_eq!(counter.status(), ActorStatus::Active);
    assert_eq!(counter.get_snapshot().context().count, 1);
    Ok(())
}

#[machine_test]
async fn events_sent_before_start_are_dropped() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = MachineRuntime::default();
    let counter = runtime.new_actor(|| Ok(Counter::default()))?;

    counter.send(CounterEvent::Increment);
    counter.start();
    counter.send(CounterEvent::Increment);

    assert_eq!(counter.get_snapshot().context().count, 1);
    Ok(())
}

#[machine_test]
async fn sends_are_processed_in_call_order() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = MachineRuntime::default();
    let counter = runtime.spawn_actor(|| Ok(Counter::default()), ActorConfig::default())?;

    for _ in 0..10 {
        counter.send(CounterEvent::Increment);
    }
    assert_eq!(counter.ask(CounterEvent::Get).await?, 10);
    Ok(())
}

#[machine_test]
async fn send_after_stop_changes_nothing() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = MachineRuntime::default();
    let counter = runtime.new_actor(|| Ok(Counter::default()))?;
    counter.start();
    counter.send(CounterEvent::Increment);
    counter.stop().await;

    let before = counter.get_snapshot();
    counter.send(CounterEvent::Increment);
    counter.send(CounterEvent::Fail);
    let after = counter.get_snapshot();

    assert_eq!(before, after);
    assert_eq!(after.status(), ActorStatus::Stopped);
    assert_eq!(after.context().count, 1);
    Ok(())
}

#[machine_test]
async fn second_stop_has_no_side_effects() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = MachineRuntime::default();
    let first = runtime.spawn_actor(|| Ok(Counter::default()), ActorConfig::default())?;
    let _second = runtime.spawn_actor(|| Ok(Counter::default()), ActorConfig::default())?;
    assert_eq!(runtime.root_count(), 2);

    first.stop().await;
    let snapshot = first.get_snapshot();
    assert_eq!(runtime.root_count(), 1);

    first.stop().await;
    assert_eq!(first.status(), ActorStatus::Stopped);
    assert_eq!(first.get_snapshot(), snapshot);
    assert_eq!(runtime.root_count(), 1);
    Ok(())
}

#[machine_test]
async fn stop_cascades_to_every_descendant() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = MachineRuntime::default();
    let parent = runtime.spawn_actor(|| Ok(Counter::default()), ActorConfig::default())?;
    let left = parent.spawn(|| Ok(Counter::default()), ActorConfig::default())?;
    let right = parent.spawn(|| Ok(Counter::default()), ActorConfig::default())?;
    let grandchild = left.spawn(|| Ok(Counter::default()), ActorConfig::default())?;
    assert_eq!(parent.child_count(), 2);

    parent.stop().await;

    for actor in [&left, &right, &grandchild] {
        assert_eq!(actor.status(), ActorStatus::Stopped);
    }
    assert_eq!(parent.status(), ActorStatus::Stopped);
    assert_eq!(parent.child_count(), 0);
    assert_eq!(left.child_count(), 0);
    Ok(())
}

#[machine_test]
async fn restart_discards_previous_context() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = MachineRuntime::default();
    let counter = runtime.spawn_actor(|| Ok(Counter::default()), ActorConfig::default())?;
    counter.send(CounterEvent::Increment);
    counter.send(CounterEvent::Increment);
    let child = counter.spawn(|| Ok(Counter::default()), ActorConfig::default())?;

    counter.restart().await?;

    assert_eq!(counter.status(), ActorStatus::Active);
    assert_eq!(counter.get_snapshot().context().count, 0);
    assert_eq!(child.status(), ActorStatus::Stopped);
    assert_eq!(counter.child_count(), 0);

    counter.send(CounterEvent::Increment);
    assert_eq!(counter.get_snapshot().context().count, 1);
    Ok(())
}

#[machine_test]
async fn stopped_actor_can_be_restarted() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = MachineRuntime::default();
    let counter = runtime.spawn_actor(|| Ok(Counter::default()), ActorConfig::default())?;
    counter.stop().await;
    assert_eq!(runtime.root_count(), 0);

    counter.restart().await?;

    assert_eq!(counter.status(), ActorStatus::Active);
    assert_eq!(runtime.root_count(), 1);
    counter.send(CounterEvent::Increment);
    assert_eq!(counter.get_snapshot().context().count, 1);
    Ok(())
}
