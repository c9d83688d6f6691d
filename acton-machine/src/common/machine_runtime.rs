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

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, trace};

use crate::actor::{ActorConfig, ActorCore, ActorId, Supervision};
use crate::common::{ActorHandle, ChildRef, MachineConfig};
use crate::message::{ActorError, CorrelationId};
use crate::traits::ActorRef;
use crate::unit::ExecutionUnit;

/// The explicitly constructed context every actor runs in.
///
/// A `MachineRuntime` owns the loaded [`MachineConfig`], the registry of
/// top-level (root) actors, the counters behind generated ids and correlation
/// ids, and the task tracker that runs supervised restarts. It is cheap to
/// clone; all clones share the same state.
///
/// ```rust,ignore
/// let runtime = MachineRuntime::launch();
/// let counter = runtime.new_actor(|| Ok(Counter::default()))?;
/// counter.start();
/// counter.send(CounterEvent::Increment);
/// runtime.shutdown_all().await?;
/// ```
#[derive(Clone)]
pub struct MachineRuntime(Arc<RuntimeInner>);

struct RuntimeInner {
    config: MachineConfig,
    roots: DashMap<ActorId, ChildRef>,
    tracker: TaskTracker,
    cancellation_token: CancellationToken,
    next_root: AtomicU64,
    next_correlation: AtomicU64,
}

impl MachineRuntime {
    /// Creates a runtime using [`MachineConfig::load`].
    #[must_use]
    pub fn launch() -> Self {
        Self::with_config(MachineConfig::load())
    }

    /// Creates a runtime around an explicit configuration.
    #[must_use]
    pub fn with_config(config: MachineConfig) -> Self {
        trace!(?config, "launching machine runtime");
        Self(Arc::new(RuntimeInner {
            config,
            roots: DashMap::new(),
            tracker: TaskTracker::new(),
            cancellation_token: CancellationToken::new(),
            next_root: AtomicU64::new(0),
            next_correlation: AtomicU64::new(0),
        }))
    }

    /// Creates an idle top-level actor with a generated id and no supervision.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::ChildSpawn`] if `definition` fails or panics.
    pub fn new_actor<U, F>(&self, definition: F) -> Result<ActorHandle<U>, ActorError>
    where
        U: ExecutionUnit,
        F: Fn() -> anyhow::Result<U> + Send + Sync + 'static,
    {
        self.new_actor_with(definition, ActorConfig::default())
    }

    /// Creates an idle top-level actor from `definition` and `config`.
    ///
    /// The actor is registered as a root and stays `idle` until
    /// [`ActorHandle::start`] is called.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::DuplicateId`] if a root with the requested id is
    /// already registered, or [`ActorError::ChildSpawn`] if `definition` fails.
    pub fn new_actor_with<U, F>(
        &self,
        definition: F,
        mut config: ActorConfig,
    ) -> Result<ActorHandle<U>, ActorError>
    where
        U: ExecutionUnit,
        F: Fn() -> anyhow::Result<U> + Send + Sync + 'static,
    {
        let id = match config.id() {
            Some(id) => id.clone(),
            None => ActorId::new(format!(
                "{}-{}",
                self.0.config.defaults.root_name,
                self.0.next_root.fetch_add(1, Ordering::SeqCst) + 1
            )),
        };
        if self.0.roots.contains_key(&id) {
            return Err(ActorError::DuplicateId { id });
        }

        let ask_timeout = config
            .ask_timeout()
            .unwrap_or_else(|| self.0.config.ask_timeout());
        let core = ActorCore::<U>::create(
            self.clone(),
            id.clone(),
            Arc::new(definition),
            None,
            config.take_supervision(),
            ask_timeout,
        )?;

        match self.0.roots.entry(id.clone()) {
            Entry::Occupied(_) => Err(ActorError::DuplicateId { id }),
            Entry::Vacant(slot) => {
                slot.insert(core.clone());
                debug!(actor = %id, "registered root actor");
                Ok(ActorHandle::from_core(core))
            }
        }
    }

    /// Creates a top-level actor and starts it immediately.
    ///
    /// # Errors
    ///
    /// See [`new_actor_with`](Self::new_actor_with).
    pub fn spawn_actor<U, F>(
        &self,
        definition: F,
        config: ActorConfig,
    ) -> Result<ActorHandle<U>, ActorError>
    where
        U: ExecutionUnit,
        F: Fn() -> anyhow::Result<U> + Send + Sync + 'static,
    {
        let handle = self.new_actor_with(definition, config)?;
        handle.start();
        Ok(handle)
    }

    /// Returns the number of registered root actors.
    #[must_use]
    pub fn root_count(&self) -> usize {
        self.0.roots.len()
    }

    /// Looks up a root actor by id.
    #[must_use]
    pub fn find_root(&self, id: &str) -> Option<ChildRef> {
        self.0.roots.get(id).map(|entry| entry.value().clone())
    }

    /// The configuration this runtime was launched with.
    #[must_use]
    pub fn config(&self) -> &MachineConfig {
        &self.0.config
    }

    /// `restart_on_failure` supervision with the configured restart limits.
    #[must_use]
    pub fn default_supervision(&self) -> Supervision {
        Supervision::restart_on_failure().with_limits(self.0.config.supervision.clone())
    }

    /// Stops every root actor, then cancels and awaits pending supervised restarts.
    ///
    /// Roots are stopped concurrently; each stop cascades through its children.
    ///
    /// # Errors
    ///
    /// Returns an error if the roots or the restart tasks do not finish within
    /// the configured system shutdown timeout.
    #[tracing::instrument(skip(self))]
    pub async fn shutdown_all(&self) -> anyhow::Result<()> {
        let timeout = self.0.config.system_shutdown_timeout();
        let roots: Vec<ChildRef> = self
            .0
            .roots
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        trace!(count = roots.len(), "stopping all root actors");
        let stops = roots.iter().map(|root| root.stop());
        let stopped = tokio::time::timeout(timeout, join_all(stops)).await;

        self.0.cancellation_token.cancel();
        self.0.tracker.close();
        let drained = tokio::time::timeout(timeout, self.0.tracker.wait()).await;
        self.0.roots.clear();

        if stopped.is_err() {
            error!(
                "System-wide shutdown timeout expired after {} ms",
                timeout.as_millis()
            );
            return Err(anyhow::anyhow!(
                "Timeout while stopping root actors after {} ms",
                timeout.as_millis()
            ));
        }
        if drained.is_err() {
            error!("Timeout waiting for supervised restarts to finish");
            return Err(anyhow::anyhow!(
                "Timeout while waiting for supervised restarts after {} ms",
                timeout.as_millis()
            ));
        }
        info!("machine runtime shut down");
        Ok(())
    }

    pub(crate) fn next_correlation_id(&self) -> CorrelationId {
        CorrelationId::new(self.0.next_correlation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub(crate) fn tracker(&self) -> &TaskTracker {
        &self.0.tracker
    }

    pub(crate) fn cancellation_token(&self) -> CancellationToken {
        self.0.cancellation_token.clone()
    }

    /// Registers a restarted root again after a terminal stop removed it.
    pub(crate) fn ensure_root(&self, actor: ChildRef) {
        self.0.roots.entry(actor.id()).or_insert(actor);
    }

    pub(crate) fn deregister_root(&self, id: &ActorId) {
        if self.0.roots.remove(id).is_some() {
            trace!(actor = %id, "deregistered root actor");
        }
    }
}

impl Default for MachineRuntime {
    fn default() -> Self {
        Self::with_config(MachineConfig::default())
    }
}

impl fmt::Debug for MachineRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineRuntime")
            .field("roots", &self.0.roots.len())
            .field("shutting_down", &self.0.cancellation_token.is_cancelled())
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(MachineRuntime: Send, Sync, Clone);
