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

use crate::actor::{ActorId, Supervision};

/// Options for creating a root actor or spawning a child.
///
/// Anything left unset is derived: the id from the parent id (or the runtime's
/// root name), supervision and ask timeout from the parent (or the runtime
/// configuration for roots).
#[derive(Debug, Clone, Default)]
pub struct ActorConfig {
    id: Option<ActorId>,
    supervision: Option<Supervision>,
    ask_timeout: Option<Duration>,
}

impl ActorConfig {
    /// An empty config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `id` verbatim instead of deriving one.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<ActorId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Overrides the inherited supervision.
    #[must_use]
    pub fn with_supervision(mut self, supervision: Supervision) -> Self {
        self.supervision = Some(supervision);
        self
    }

    /// Overrides the default `ask` timeout.
    #[must_use]
    pub const fn with_ask_timeout(mut self, timeout: Duration) -> Self {
        self.ask_timeout = Some(timeout);
        self
    }

    pub(crate) const fn id(&self) -> Option<&ActorId> {
        self.id.as_ref()
    }

    pub(crate) fn take_supervision(&mut self) -> Option<Supervision> {
        self.supervision.take()
    }

    pub(crate) const fn ask_timeout(&self) -> Option<Duration> {
        self.ask_timeout
    }
}
