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

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::actor::ActorId;
use crate::common::ChildRef;

/// Outcome of [`ChildRegistry::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    Admitted,
    Duplicate,
    /// The owner is shutting down and takes no new children.
    Closed,
}

#[derive(Debug, Default)]
struct Registry {
    children: BTreeMap<ActorId, ChildRef>,
    closed: bool,
}

/// The children an actor spawned, keyed by id.
///
/// Ordered by id so cascades visit children deterministically. Only the owning
/// actor mutates the registry. Closing it hands every child to the caller in
/// the same step that refuses new ones, so no child can be added behind a
/// shutdown's back.
#[derive(Debug, Default)]
pub(crate) struct ChildRegistry {
    inner: Mutex<Registry>,
}

impl ChildRegistry {
    /// Registers `child` unless its id is taken or the registry is closed.
    pub(crate) fn insert(&self, id: ActorId, child: ChildRef) -> Admission {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Admission::Closed;
        }
        if inner.children.contains_key(&id) {
            return Admission::Duplicate;
        }
        inner.children.insert(id, child);
        Admission::Admitted
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.inner.lock().children.contains_key(id)
    }

    pub(crate) fn get(&self, id: &str) -> Option<ChildRef> {
        self.inner.lock().children.get(id).cloned()
    }

    /// Clones the current children out so no lock is held while they are used.
    pub(crate) fn snapshot(&self) -> Vec<ChildRef> {
        self.inner.lock().children.values().cloned().collect()
    }

    /// Refuses further children and removes all current ones, returning them in id order.
    pub(crate) fn close(&self) -> Vec<ChildRef> {
        let mut inner = self.inner.lock();
        inner.closed = true;
        std::mem::take(&mut inner.children).into_values().collect()
    }

    /// Accepts children again.
    pub(crate) fn reopen(&self) {
        self.inner.lock().closed = false;
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().children.len()
    }
}
