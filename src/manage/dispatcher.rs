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

//! Callback affinity dispatch.
//!
//! User-facing callbacks run on exactly one of two contexts, chosen per
//! task at construction: the queue's dedicated main-affinity thread, or the
//! worker that ran the task. The main-affinity context is a single thread
//! draining a FIFO channel, which also preserves the
//! progress-before-terminal delivery order.

use std::thread;

use log::{debug, error};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

/// Name of the main-affinity callback thread.
const CALLBACK_THREAD: &str = "request-center-cb";

/// Where a task's callbacks are delivered.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum CallbackAffinity {
    /// The queue's dedicated callback thread.
    Main,
    /// Inline on the worker that ran the task.
    Worker,
}

/// A unit of callback work.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Handle to the main-affinity callback thread.
///
/// Cloneable sender; the thread exits when the last handle is dropped.
#[derive(Clone)]
pub(crate) struct Dispatcher {
    tx: UnboundedSender<Job>,
}

impl Dispatcher {
    /// Spawns the callback thread and returns a handle to it.
    pub(crate) fn new() -> Self {
        let (tx, mut rx) = unbounded_channel::<Job>();
        let spawned = thread::Builder::new()
            .name(CALLBACK_THREAD.to_string())
            .spawn(move || {
                debug!("callback thread started");
                while let Some(job) = rx.blocking_recv() {
                    job();
                }
                debug!("callback thread stopped");
            });
        if let Err(e) = spawned {
            // Jobs posted later are dropped with a log; the process keeps
            // running without a main-affinity context.
            error!("failed to spawn callback thread: {e}");
        }
        Self { tx }
    }

    /// Queues one job in FIFO order.
    pub(crate) fn post(&self, job: Job) {
        if self.tx.send(job).is_err() {
            error!("callback thread is gone, dropping job");
        }
    }
}
