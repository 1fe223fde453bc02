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

//! Error taxonomy for the request framework.
//!
//! Every failure of a submitted task funnels into a single terminal callback
//! carrying a [`TaskError`]. Cancellation is a distinguished kind rather than
//! a fault, so callers can tell "user cancelled" from "network failed".

use crate::transport::TransportError;

/// Errors detected before any network call is attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// No base URL is registered on the queue and the request carries no
    /// explicit URL either.
    #[error("no base url registered and no explicit url set")]
    UnregisteredUrl,

    /// The explicit URL or the base-URL-plus-action combination did not
    /// parse into a valid URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The task has already been submitted to a queue; a task is a
    /// single-use unit of work.
    #[error("task already submitted")]
    AlreadySubmitted,

    /// `TaskQueue::get_instance` was used before `TaskQueue::init`.
    #[error("task queue not initialized")]
    QueueNotInitialized,
}

/// Terminal error delivered through a task's response callback.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TaskError {
    /// The request could not be validated; no network call was made.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The transport collaborator reported a failure, including non-2xx
    /// statuses.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A custom parse hook rejected the response body. The default JSON
    /// parser never produces this; it falls back to the raw body instead.
    #[error("response parsing failed: {0}")]
    Parse(String),

    /// The task was cancelled before it could complete.
    #[error("task cancelled")]
    Cancelled,
}

impl TaskError {
    /// Returns `true` for the cancellation kind.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TaskError::Cancelled)
    }

    /// Returns the HTTP status carried by a transport status error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            TaskError::Transport(TransportError::Status { code, .. }) => Some(*code),
            _ => None,
        }
    }
}
