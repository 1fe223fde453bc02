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

//! Task lifecycle state machine.
//!
//! One tagged state replaces the executing/finished/cancelled flag triplet:
//! illegal combinations such as finished-and-executing cannot be
//! represented. Cancellation intent is tracked separately because it may
//! arrive at any point before the terminal transition, including while the
//! task is executing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use log::debug;
use tokio::sync::Notify;

/// Why a task reached its terminal state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FinishKind {
    /// The response was delivered to the caller.
    Success,
    /// The request never validated; no network call was made.
    Config,
    /// The transport collaborator reported a failure.
    TransportError,
    /// A custom parse hook rejected the response.
    ParseError,
    /// The task was cancelled.
    Cancelled,
}

/// The lifecycle of one task.
///
/// All `Finished` states are terminal and mutually exclusive; no transition
/// re-enters `Queued` or `Executing`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum State {
    /// Built, not yet submitted.
    Created,
    /// Submitted and waiting for admission.
    Queued,
    /// The work body is running.
    Executing,
    /// Terminal, with the reason it got there.
    Finished(FinishKind),
}

/// State holder shared between the queue, the worker and cancellers.
pub(crate) struct Lifecycle {
    state: Mutex<State>,
    cancelled: AtomicBool,
    cancel_notify: Notify,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State::Created),
            cancelled: AtomicBool::new(false),
            cancel_notify: Notify::new(),
        }
    }

    /// Current state snapshot.
    pub(crate) fn state(&self) -> State {
        // `unwrap` for propagating panics among threads.
        *self.state.lock().unwrap()
    }

    /// `Created -> Queued`. Fails when the task was already submitted or
    /// has moved on, making tasks single-use by construction.
    pub(crate) fn mark_queued(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        if *state == State::Created {
            *state = State::Queued;
            true
        } else {
            false
        }
    }

    /// `Created | Queued -> Executing`, unless cancellation intent is
    /// already set. A cancelled-before-start task never runs its work body.
    pub(crate) fn try_start(&self) -> bool {
        if self.is_cancelled() {
            return false;
        }
        let mut state = self.state.lock().unwrap();
        match *state {
            State::Created | State::Queued => {
                *state = State::Executing;
                true
            }
            _ => false,
        }
    }

    /// Terminal transition; only the first caller wins. Every code path of
    /// a task must reach exactly one winning `try_finish`.
    pub(crate) fn try_finish(&self, kind: FinishKind) -> bool {
        let mut state = self.state.lock().unwrap();
        if matches!(*state, State::Finished(_)) {
            return false;
        }
        debug!("task finished: {:?} -> {:?}", *state, kind);
        *state = State::Finished(kind);
        true
    }

    /// Sets cancellation intent and wakes any in-flight await. Cooperative:
    /// an executing task observes the flag and aborts promptly; a task that
    /// has not started never runs.
    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.cancel_notify.notify_waiters();
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Resolves once cancellation intent is set. Registers with the notify
    /// before re-checking the flag so a concurrent `cancel` cannot slip
    /// between the check and the await.
    pub(crate) async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        let notified = self.cancel_notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}
