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

use std::time::Duration;

use acton_machine::prelude::*;
use acton_machine_test::prelude::*;

use crate::setup::initialize_tracing;
use crate::setup::units::counter::{Counter, CounterEvent};
use crate::setup::units::responder::Responder;

mod setup;

#[machine_test]
async fn child_of_active_parent_is_active_immediately() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = MachineRuntime::default();
    let parent = runtime.spawn_actor(
        || Ok(Counter::default()),
        ActorConfig::new().with_id("parent"),
    )?;

    let child = parent.spawn(|| Ok(Counter::default()), ActorConfig::default())?;

    assert_eq!(child.status(), ActorStatus::Active);
    assert_eq!(child.id(), "parent/1");
    child.send(CounterEvent::Increment);
    assert_eq!(child.get_snapshot().context().count, 1);
    Ok(())
}

#[machine_test]
async fn child_of_idle_parent_waits_for_start() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = MachineRuntime::default();
    let parent = runtime.new_actor(|| Ok(Counter::default()))?;
    let child = parent.spawn(|| Ok(Counter::default()), ActorConfig::default())?;
    let grandchild = child.spawn(|| Ok(Counter::default()), ActorConfig::default())?;

    assert_eq!(child.status(), ActorStatus::Idle);
    assert_eq!(grandchild.status(), ActorStatus::Idle);

    parent.start();

    assert_eq!(parent.status(), ActorStatus::Active);
    assert_eq!(child.status(), ActorStatus::Active);
    assert_eq!(grandchild.status(), ActorStatus::Active);
    Ok(())
}

#[machine_test]
async fn derived_ids_follow_the_spawn_sequence() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = MachineRuntime::default();
    let parent = runtime.spawn_actor(|| Ok(Counter::default()), ActorConfig::default())?;

    let first = parent.spawn(|| Ok(Counter::default()), ActorConfig::default())?;
    let named = parent.spawn(|| Ok(Counter::default()), ActorConfig::new().with_id("worker"))?;
    let second = parent.spawn(|| Ok(Responder::default()), ActorConfig::default())?;

    assert_eq!(first.id(), format!("{}/1", parent.id()).as_str());
    assert_eq!(named.id(), "worker");
    assert_eq!(second.id(), format!("{}/2", parent.id()).as_str());

    let ids: Vec<String> = parent
        .children()
        .iter()
        .map(|child| child.id().to_string())
        .collect();
    assert_eq!(ids.len(), 3);
    assert!(parent.find_child("worker").is_some());
    assert!(parent.find_child("missing").is_none());
    Ok(())
}

#[machine_test]
async fn duplicate_child_ids_are_rejected() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = MachineRuntime::default();
    let parent = runtime.spawn_actor(|| Ok(Counter::default()), ActorConfig::default())?;
    parent.spawn(|| Ok(Counter::default()), ActorConfig::new().with_id("worker"))?;

    let err = parent
        .spawn(|| Ok(Counter::default()), ActorConfig::new().with_id("worker"))
        .unwrap_err();

    assert_eq!(err, ActorError::DuplicateId { id: "worker".into() });
    assert_eq!(parent.child_count(), 1);
    Ok(())
}

#[machine_test]
async fn failing_definition_is_a_spawn_error() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = MachineRuntime::default();
    let parent = runtime.spawn_actor(|| Ok(Counter::default()), ActorConfig::default())?;

    let err = parent
        .spawn::<Counter, _>(
            || Err(anyhow::anyhow!("no database connection")),
            ActorConfig::default(),
        )
        .unwrap_err();

    let ActorError::ChildSpawn { reason, .. } = &err else {
        panic!("expected a spawn error, got {err:?}");
    };
    assert!(reason.contains("no database connection"));
    assert_eq!(parent.child_count(), 0);
    assert_eq!(parent.status(), ActorStatus::Active);
    Ok(())
}

#[machine_test]
async fn stopped_parent_refuses_to_spawn() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = MachineRuntime::default();
    let parent = runtime.spawn_actor(|| Ok(Counter::default()), ActorConfig::default())?;
    parent.stop().await;

    let err = parent
        .spawn(|| Ok(Counter::default()), ActorConfig::default())
        .unwrap_err();

    assert!(err.is_stopped());
    Ok(())
}

#[machine_test]
async fn children_inherit_supervision_and_ask_timeout() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = MachineRuntime::default();
    let parent = runtime.spawn_actor(
        || Ok(Counter::default()),
        ActorConfig::new()
            .with_supervision(Supervision::restart_on_failure().with_max_restarts(9))
            .with_ask_timeout(Duration::from_millis(1234)),
    )?;

    let inheriting = parent.spawn(|| Ok(Counter::default()), ActorConfig::default())?;
    let overriding = parent.spawn(
        || Ok(Counter::default()),
        ActorConfig::new().with_supervision(Supervision::escalate()),
    )?;

    let inherited = inheriting.supervision().expect("inherited supervision");
    assert_eq!(inherited.strategy(), SupervisionStrategy::RestartOnFailure);
    assert_eq!(inherited.limits().max_restarts, 9);
    assert_eq!(
        overriding.supervision().map(|s| s.strategy()),
        Some(SupervisionStrategy::Escalate)
    );
    Ok(())
}

#[machine_test]
async fn children_hold_only_a_weak_parent_reference() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = MachineRuntime::default();
    let parent = runtime.spawn_actor(|| Ok(Counter::default()), ActorConfig::default())?;
    let child = parent.spawn(|| Ok(Counter::default()), ActorConfig::default())?;

    let seen_parent = child.parent().expect("parent is alive");
    assert_eq!(seen_parent.id(), parent.id());
    assert!(parent.parent().is_none());

    parent.stop().await;
    runtime.shutdown_all().await?;
    drop(seen_parent);
    drop(parent);

    assert!(child.parent().is_none());
    Ok(())
}

#[machine_test]
async fn child_cannot_be_restarted_once_its_parent_stopped() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = MachineRuntime::default();
    let parent = runtime.spawn_actor(|| Ok(Counter::default()), ActorConfig::default())?;
    let child = parent.spawn(|| Ok(Counter::default()), ActorConfig::default())?;

    child.send(CounterEvent::Fail);
    child.restart().await?;
    assert_eq!(child.status(), ActorStatus::Active);

    parent.stop().await;
    assert_eq!(child.status(), ActorStatus::Stopped);

    let err = child.restart().await.unwrap_err();
    assert!(err.is_stopped());
    assert_eq!(child.status(), ActorStatus::Stopped);
    assert_eq!(parent.child_count(), 0);
    Ok(())
}
