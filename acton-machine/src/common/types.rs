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

//! Shared type aliases.

use std::sync::Arc;

use crate::actor::ActorFault;
use crate::message::ActorError;
use crate::traits::ActorRef;

/// A type-erased reference to a parent actor.
pub type ParentRef = Arc<dyn ActorRef>;

/// A type-erased reference to a child actor, owned by its parent's registry.
pub type ChildRef = Arc<dyn ActorRef>;

/// Produces fresh execution units; invoked once at creation and again on every restart.
pub type UnitFactory<U> = Arc<dyn Fn() -> anyhow::Result<U> + Send + Sync>;

/// Hook invoked before each supervised restart with the attempt number.
pub type RestartHook = Arc<dyn Fn(&dyn ActorRef, &ActorFault, u32) + Send + Sync>;

/// Hook invoked once when supervision gives up on an actor.
pub type FailureHook = Arc<dyn Fn(&dyn ActorRef, &ActorError) + Send + Sync>;
