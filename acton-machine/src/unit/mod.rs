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

// Re-export the unit contract.
pub use execution_unit::{Effects, ExecutionUnit};
pub use snapshot::{MachineState, Snapshot, SnapshotAdapter, StateValue, UnitState, UnitStatus};

/// Contains the `ExecutionUnit` trait and its `Effects` collector.
mod execution_unit;

/// Contains state values, raw unit state, and snapshot normalization.
mod snapshot;
