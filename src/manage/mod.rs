// Copyright (C) 2025 Huawei Device Co., Ltd.
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The process-wide task queue.
//!
//! [`TaskQueue`] holds the set of pending and running tasks, enforces the
//! concurrency limit, registers the base URL, and exposes the last pushed
//! reachability status. Admission is handled by a single loop draining a
//! FIFO channel, so two submissions racing for the last slot can never both
//! pass the capacity check.

pub(crate) mod dispatcher;
pub mod network;

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex, OnceLock, RwLock};

use log::{error, info, warn};
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::{oneshot, Semaphore};
use url::Url;

use crate::error::{ConfigError, TaskError};
use crate::manage::dispatcher::Dispatcher;
use crate::manage::network::{ReachabilityInner, ReachabilityNotifier};
use crate::task::request_task::{ExecContext, RequestTask};
use crate::transport::{Reachability, Transport};

/// Worker thread name of the queue runtime.
const WORKER_THREAD: &str = "request-center-worker";

/// Process-wide queue instance.
static QUEUE: OnceLock<TaskQueue> = OnceLock::new();

/// State shared between the queue handle and running tasks.
pub(crate) struct QueueShared {
    /// Tasks admitted and not yet finished, keyed by task id. Mutated only
    /// by enqueue and by each task's own finish transition.
    active: Mutex<HashMap<u64, Arc<RequestTask>>>,
    /// Base URL for requests carrying only an action path.
    base_url: RwLock<Option<Url>>,
    /// Last reachability status pushed by the transport integration.
    reachability: ReachabilityInner,
}

impl QueueShared {
    /// Removes one finished task from the active set.
    pub(crate) fn remove_task(&self, task_id: u64) {
        // `unwrap` for propagating panics among threads.
        self.active.lock().unwrap().remove(&task_id);
    }
}

/// Process-wide queue and registry for [`RequestTask`]s.
///
/// The queue owns its own multi-thread runtime, so the caller-facing API is
/// fully synchronous. A queue is expected to live for the process lifetime
/// (see [`TaskQueue::init`]); when constructed explicitly it must be dropped
/// from a non-async context.
pub struct TaskQueue {
    shared: Arc<QueueShared>,
    transport: Arc<dyn Transport>,
    dispatcher: Dispatcher,
    admission_tx: UnboundedSender<Arc<RequestTask>>,
    // Never read after construction; holds the worker threads alive.
    _runtime: Runtime,
}

impl TaskQueue {
    /// Builds a queue around the given transport collaborator.
    ///
    /// `max_concurrent` bounds the number of simultaneously running tasks;
    /// `None` means effectively unbounded. Tasks beyond the bound wait in
    /// FIFO submission order.
    pub fn new(
        transport: Arc<dyn Transport>,
        max_concurrent: Option<usize>,
    ) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .thread_name(WORKER_THREAD)
            .enable_all()
            .build()?;

        let shared = Arc::new(QueueShared {
            active: Mutex::new(HashMap::new()),
            base_url: RwLock::new(None),
            reachability: ReachabilityInner::new(),
        });
        let dispatcher = Dispatcher::new();

        let permits = match max_concurrent {
            Some(0) => {
                warn!("max_concurrent 0 is not runnable, clamping to 1");
                1
            }
            Some(n) => n.min(Semaphore::MAX_PERMITS),
            None => Semaphore::MAX_PERMITS,
        };
        let semaphore = Arc::new(Semaphore::new(permits));

        let (admission_tx, admission_rx) = unbounded_channel();
        let ctx = ExecContext {
            transport: transport.clone(),
            dispatcher: dispatcher.clone(),
            queue: Arc::downgrade(&shared),
        };
        runtime.spawn(admission_loop(admission_rx, ctx, semaphore));

        Ok(Self {
            shared,
            transport,
            dispatcher,
            admission_tx,
            _runtime: runtime,
        })
    }

    /// Initializes the process-wide instance. The first successful call
    /// wins; later calls return the existing instance.
    pub fn init(
        transport: Arc<dyn Transport>,
        max_concurrent: Option<usize>,
    ) -> io::Result<&'static TaskQueue> {
        if let Some(queue) = QUEUE.get() {
            return Ok(queue);
        }
        let queue = TaskQueue::new(transport, max_concurrent)?;
        Ok(QUEUE.get_or_init(|| queue))
    }

    /// The process-wide instance, if `init` has run.
    pub fn get_instance() -> Option<&'static TaskQueue> {
        QUEUE.get()
    }

    /// Registers or replaces the base URL used to resolve action-only
    /// requests. Changeable at any time; tasks already submitted keep the
    /// URL they resolved at enqueue.
    pub fn set_base_url(&self, base_url: &str) -> Result<(), ConfigError> {
        let url = Url::parse(base_url).map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;
        info!("base url registered: {url}");
        *self.shared.base_url.write().unwrap() = Some(url);
        Ok(())
    }

    /// The currently registered base URL.
    pub fn base_url(&self) -> Option<Url> {
        self.shared.base_url.read().unwrap().clone()
    }

    /// Submits a task for execution.
    ///
    /// Validation happens here: a request that cannot resolve a URL fails
    /// with a configuration error, never starts, and still receives its one
    /// terminal callback carrying that error. A task can be submitted only
    /// once.
    pub fn enqueue(&self, task: Arc<RequestTask>) -> Result<(), TaskError> {
        let base = self.base_url();
        let url = match task.config().resolve_url(base.as_ref()) {
            Ok(url) => url,
            Err(e) => {
                error!("task {} rejected: {e}", task.task_id());
                task.fail_before_start(TaskError::Config(e.clone()), &self.exec_context());
                return Err(TaskError::Config(e));
            }
        };
        if !task.lifecycle().mark_queued() {
            return Err(TaskError::Config(ConfigError::AlreadySubmitted));
        }
        task.set_resolved_url(url);
        self.shared
            .active
            .lock()
            .unwrap()
            .insert(task.task_id(), task.clone());
        info!("task {} enqueued", task.task_id());

        if self.admission_tx.send(task.clone()).is_err() {
            // The admission loop only stops when the runtime is torn down.
            error!("admission loop is gone, failing task {}", task.task_id());
            task.finish_cancelled(&self.exec_context());
        }
        Ok(())
    }

    /// Requests cancellation of one task. The task leaves the active set
    /// only through its own finish transition.
    pub fn cancel(&self, task: &RequestTask) {
        task.cancel();
    }

    /// Requests cancellation of every pending and running task.
    pub fn cancel_all(&self) {
        let active = self.shared.active.lock().unwrap();
        info!("cancelling {} active tasks", active.len());
        for task in active.values() {
            task.cancel();
        }
    }

    /// Number of tasks admitted and not yet finished.
    pub fn active_count(&self) -> usize {
        self.shared.active.lock().unwrap().len()
    }

    /// Last reachability status pushed by the transport integration.
    /// Never blocks, never probes the network.
    pub fn reachability(&self) -> Reachability {
        self.shared.reachability.status()
    }

    /// `true` when the last pushed status can carry traffic.
    pub fn is_internet_reachable(&self) -> bool {
        self.reachability().is_reachable()
    }

    /// Push handle for the transport integration's reachability sensing.
    pub fn reachability_notifier(&self) -> ReachabilityNotifier {
        ReachabilityNotifier {
            inner: self.shared.reachability.clone(),
        }
    }

    fn exec_context(&self) -> ExecContext {
        ExecContext {
            transport: self.transport.clone(),
            dispatcher: self.dispatcher.clone(),
            queue: Arc::downgrade(&self.shared),
        }
    }
}

/// One task parked in the admission line, paired with a guard that stops
/// its cancellation watcher once the task leaves the line.
struct Waiter {
    task: Arc<RequestTask>,
    _left_line: oneshot::Sender<()>,
}

impl Waiter {
    /// Parks a task and spawns its cancellation watcher. The watcher exits
    /// as soon as the task leaves the line, admitted or cancelled.
    fn watch(task: Arc<RequestTask>, cancel_tx: UnboundedSender<u64>) -> Self {
        let (left_tx, left_rx) = oneshot::channel::<()>();
        let watched = task.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = watched.lifecycle().cancelled() => {
                    let _ = cancel_tx.send(watched.task_id());
                }
                _ = left_rx => {}
            }
        });
        Self {
            task,
            _left_line: left_tx,
        }
    }

    fn into_task(self) -> Arc<RequestTask> {
        self.task
    }
}

/// Grants execution slots in strict submission order.
///
/// Every waiting task carries its own cancellation watcher, so a cancel
/// finishes the task immediately wherever it sits in the line, even while
/// the head is blocked on a saturated slot count. A cancelled waiter never
/// consumes a slot and its work body never runs.
async fn admission_loop(
    mut rx: UnboundedReceiver<Arc<RequestTask>>,
    ctx: ExecContext,
    semaphore: Arc<Semaphore>,
) {
    let (cancel_tx, mut cancel_rx) = unbounded_channel::<u64>();
    let mut waiting: VecDeque<Waiter> = VecDeque::new();
    let mut submissions_open = true;

    while submissions_open || !waiting.is_empty() {
        tokio::select! {
            biased;
            Some(task_id) = cancel_rx.recv() => {
                if let Some(pos) = waiting.iter().position(|w| w.task.task_id() == task_id) {
                    if let Some(waiter) = waiting.remove(pos) {
                        waiter.into_task().finish_cancelled(&ctx);
                    }
                }
            }
            task = rx.recv(), if submissions_open => match task {
                Some(task) => waiting.push_back(Waiter::watch(task, cancel_tx.clone())),
                None => submissions_open = false,
            },
            permit = semaphore.clone().acquire_owned(), if !waiting.is_empty() => {
                let Ok(permit) = permit else {
                    break;
                };
                let Some(waiter) = waiting.pop_front() else {
                    continue;
                };
                let task = waiter.into_task();
                // A cancel that raced the admission releases the slot right
                // away; the stale watcher signal finds no waiter and is
                // ignored.
                if task.lifecycle().is_cancelled() {
                    task.finish_cancelled(&ctx);
                    continue;
                }
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    let _permit = permit;
                    task.run(ctx).await;
                });
            }
        }
    }
}
