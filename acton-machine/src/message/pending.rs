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

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::trace;

use crate::message::{ActorError, CorrelationId};

#[derive(Debug)]
struct PendingRequest<R> {
    tx: oneshot::Sender<Result<R, ActorError>>,
    issued_at: Instant,
    timeout: Duration,
}

/// Outstanding `ask` calls of one actor, keyed by correlation id.
///
/// Every entry leaves the map exactly once: when its response arrives, when the
/// caller gives up (timeout or cancellation), or when the actor stops.
#[derive(Debug)]
pub(crate) struct PendingRequests<R> {
    requests: Mutex<HashMap<CorrelationId, PendingRequest<R>>>,
}

impl<R> Default for PendingRequests<R> {
    fn default() -> Self {
        Self {
            requests: Mutex::new(HashMap::new()),
        }
    }
}

impl<R> PendingRequests<R> {
    /// Registers a request and returns the receiver its outcome is delivered on.
    pub(crate) fn register(
        &self,
        correlation_id: CorrelationId,
        timeout: Duration,
    ) -> oneshot::Receiver<Result<R, ActorError>> {
        let (tx, rx) = oneshot::channel();
        self.requests.lock().insert(
            correlation_id,
            PendingRequest {
                tx,
                issued_at: Instant::now(),
                timeout,
            },
        );
        rx
    }

    /// Completes the matching request. Returns `false` if nothing was waiting,
    /// e.g. because the caller already timed out.
    pub(crate) fn resolve(&self, correlation_id: CorrelationId, outcome: Result<R, ActorError>) -> bool {
        let Some(request) = self.requests.lock().remove(&correlation_id) else {
            return false;
        };
        trace!(
            %correlation_id,
            elapsed = ?request.issued_at.elapsed(),
            timeout = ?request.timeout,
            "resolving pending request"
        );
        // The caller may have dropped its receiver in the meantime.
        request.tx.send(outcome).is_ok()
    }

    /// Drops the matching request without completing it.
    pub(crate) fn cancel(&self, correlation_id: CorrelationId) -> bool {
        self.requests.lock().remove(&correlation_id).is_some()
    }

    /// Fails every outstanding request with `error`.
    pub(crate) fn reject_all(&self, error: &ActorError) -> usize {
        let drained: Vec<_> = self.requests.lock().drain().collect();
        let count = drained.len();
        for (_, request) in drained {
            let _ = request.tx.send(Err(error.clone()));
        }
        count
    }

    pub(crate) fn len(&self) -> usize {
        self.requests.lock().len()
    }
}

/// Removes a request from its map when the awaiting `ask` future finishes or is dropped.
pub(crate) struct PendingGuard<'a, R> {
    pending: &'a PendingRequests<R>,
    correlation_id: CorrelationId,
}

impl<'a, R> PendingGuard<'a, R> {
    pub(crate) const fn new(pending: &'a PendingRequests<R>, correlation_id: CorrelationId) -> Self {
        Self {
            pending,
            correlation_id,
        }
    }
}

impl<R> Drop for PendingGuard<'_, R> {
    fn drop(&mut self) {
        if self.pending.cancel(self.correlation_id) {
            trace!(correlation_id = %self.correlation_id, "pending request abandoned");
        }
    }
}
