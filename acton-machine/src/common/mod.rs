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

// Re-export the runtime surface.
pub use actor_handle::ActorHandle;
pub use config::{DefaultsConfig, MachineConfig, TimeoutConfig};
pub use machine_runtime::MachineRuntime;
pub use types::*;

/// Contains the typed actor handle.
mod actor_handle;

/// Contains the TOML configuration and its XDG loader.
mod config;

/// Contains the runtime context that creates and shuts down root actors.
mod machine_runtime;

/// Contains shared type aliases.
mod types;
