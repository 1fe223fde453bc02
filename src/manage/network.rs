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

//! Reachability state.
//!
//! The transport collaborator senses connectivity and pushes status changes
//! through a [`ReachabilityNotifier`] handed out by the queue. Reads are a
//! plain lock on the last pushed value and never trigger or wait on network
//! activity.

use std::sync::{Arc, RwLock};

use log::info;

use crate::transport::Reachability;

/// Shared reachability cell.
#[derive(Clone)]
pub(crate) struct ReachabilityInner {
    state: Arc<RwLock<Reachability>>,
}

impl ReachabilityInner {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(Reachability::Unknown)),
        }
    }

    /// Last pushed status.
    pub(crate) fn status(&self) -> Reachability {
        // `unwrap` for propagating panics among threads.
        *self.state.read().unwrap()
    }

    /// Stores a new status, logging only on change.
    pub(crate) fn notify(&self, status: Reachability) {
        let mut state = self.state.write().unwrap();
        if *state != status {
            info!("reachability changed: {:?} -> {:?}", *state, status);
            *state = status;
        }
    }
}

/// Push handle for the transport integration.
///
/// Cloneable; updating through any clone is visible to every reader of the
/// owning queue immediately.
#[derive(Clone)]
pub struct ReachabilityNotifier {
    pub(crate) inner: ReachabilityInner,
}

impl ReachabilityNotifier {
    /// Pushes the latest reachability status.
    pub fn notify(&self, status: Reachability) {
        self.inner.notify(status);
    }
}
