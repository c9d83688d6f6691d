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

use derive_new::new;

use crate::actor::{ActorFault, ActorId};
use crate::common::ChildRef;

/// Notice delivered to a parent when a child with the `escalate` strategy fails.
///
/// The parent's unit receives it through
/// [`ExecutionUnit::on_child_failure`](crate::unit::ExecutionUnit::on_child_failure)
/// and decides what to do; the child stays in `error` until someone restarts it.
#[derive(new, Debug, Clone)]
pub struct ChildFailure {
    child: ChildRef,
    fault: ActorFault,
}

impl ChildFailure {
    /// The failed child.
    #[must_use]
    pub const fn child(&self) -> &ChildRef {
        &self.child
    }

    /// The failed child's id.
    #[must_use]
    pub fn child_id(&self) -> ActorId {
        self.child.id()
    }

    /// What went wrong.
    #[must_use]
    pub const fn fault(&self) -> &ActorFault {
        &self.fault
    }
}
