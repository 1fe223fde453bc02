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

//! The HTTP-flavored unit of work.
//!
//! A [`RequestTask`] binds one frozen [`RequestConfig`] to one transport
//! invocation and one terminal callback. Progress events are forwarded in
//! order and strictly before the terminal callback, on the callback affinity
//! fixed at construction. Every path through execution — configuration
//! error, transport error, parse result, cancellation, success — reaches
//! exactly one terminal transition and exactly one callback invocation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use log::{debug, error, info};
use tokio::sync::mpsc::unbounded_channel;
use url::Url;

use crate::error::{ConfigError, TaskError};
use crate::manage::dispatcher::{CallbackAffinity, Dispatcher};
use crate::manage::QueueShared;
use crate::task::config::{RequestConfig, ResponseSerializer};
use crate::task::lifecycle::{FinishKind, Lifecycle, State};
use crate::transport::{ProgressEvent, RawResponse, Transport, WireRequest, UploadSpec};

/// Monotonic task id source, process-wide.
static TASK_ID_SEED: AtomicU64 = AtomicU64::new(1);

/// Parsed response value delivered to the terminal callback.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Decoded JSON document.
    Json(serde_json::Value),
    /// Raw body bytes, either by serializer choice or by the lenient JSON
    /// fallback.
    Raw(Vec<u8>),
}

impl Value {
    /// The decoded JSON document, if this is a JSON value.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Json(value) => Some(value),
            Value::Raw(_) => None,
        }
    }

    /// The raw bytes, if this value was passed through undecoded.
    pub fn as_raw(&self) -> Option<&[u8]> {
        match self {
            Value::Raw(bytes) => Some(bytes),
            Value::Json(_) => None,
        }
    }

    /// Best-effort string view: a JSON string, or raw bytes as UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Json(value) => value.as_str(),
            Value::Raw(bytes) => std::str::from_utf8(bytes).ok(),
        }
    }
}

/// Terminal callback: called exactly once per submitted task.
pub type ResponseCallback = Box<dyn FnOnce(Result<Value, TaskError>) + Send + 'static>;

/// Progress callback: called any number of times, always before the
/// terminal callback, on the same affinity.
pub type ProgressCallback = Box<dyn FnMut(ProgressEvent) + Send + 'static>;

/// Parse override: turns the raw response into a value or an error.
pub type ParseHook = Box<dyn Fn(&RawResponse) -> Result<Value, TaskError> + Send + Sync + 'static>;

/// Caller extension points run by the fixed lifecycle pipeline.
///
/// Each hook is invoked by the framework after its own bookkeeping for the
/// same step, so the queue accounting cannot be skipped by an override.
#[derive(Default)]
pub struct TaskHooks {
    /// Runs when the work body starts.
    pub on_start: Option<Box<dyn Fn() + Send + Sync + 'static>>,
    /// Runs on the terminal transition, any kind.
    pub on_finish: Option<Box<dyn Fn(FinishKind) + Send + Sync + 'static>>,
    /// Runs when the terminal transition is a cancellation.
    pub on_cancel: Option<Box<dyn Fn() + Send + Sync + 'static>>,
    /// Replaces the default serializer-dependent response parsing.
    pub parse: Option<ParseHook>,
}

/// Execution context handed to a task by the queue.
#[derive(Clone)]
pub(crate) struct ExecContext {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) queue: Weak<QueueShared>,
}

/// One cancellable HTTP unit of work.
pub struct RequestTask {
    task_id: u64,
    config: RequestConfig,
    lifecycle: Lifecycle,
    resolved_url: Mutex<Option<Url>>,
    on_response: Mutex<Option<ResponseCallback>>,
    on_progress: Mutex<Option<ProgressCallback>>,
    hooks: TaskHooks,
    affinity: CallbackAffinity,
}

impl RequestTask {
    /// Creates a task from a frozen configuration and a terminal callback.
    pub fn new(
        config: RequestConfig,
        on_response: impl FnOnce(Result<Value, TaskError>) + Send + 'static,
    ) -> Arc<Self> {
        Self::with_callbacks(config, Box::new(on_response), None, TaskHooks::default())
    }

    /// Creates a task with a progress callback and lifecycle hooks.
    pub fn with_callbacks(
        config: RequestConfig,
        on_response: ResponseCallback,
        on_progress: Option<ProgressCallback>,
        hooks: TaskHooks,
    ) -> Arc<Self> {
        let affinity = if config.complete_on_main {
            CallbackAffinity::Main
        } else {
            CallbackAffinity::Worker
        };
        Arc::new(Self {
            task_id: TASK_ID_SEED.fetch_add(1, Ordering::Relaxed),
            config,
            lifecycle: Lifecycle::new(),
            resolved_url: Mutex::new(None),
            on_response: Mutex::new(Some(on_response)),
            on_progress: Mutex::new(on_progress),
            hooks,
            affinity,
        })
    }

    /// Process-unique task id.
    pub fn task_id(&self) -> u64 {
        self.task_id
    }

    /// The frozen request description.
    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        self.lifecycle.state()
    }

    /// Sets cancellation intent. Cooperative: an executing task aborts its
    /// transport call promptly; a task that has not started never runs its
    /// work body. The terminal callback still fires, with a cancellation
    /// error.
    pub fn cancel(&self) {
        info!("task {} cancel requested", self.task_id);
        self.lifecycle.cancel();
    }

    /// Enqueues this task on the process-wide queue.
    ///
    /// Fails when [`crate::TaskQueue::init`] has not run yet or when the
    /// request cannot resolve a URL.
    pub fn send(self: &Arc<Self>) -> Result<(), TaskError> {
        match crate::manage::TaskQueue::get_instance() {
            Some(queue) => queue.enqueue(self.clone()),
            None => Err(TaskError::Config(ConfigError::QueueNotInitialized)),
        }
    }

    pub(crate) fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Freezes the resolved target URL at submission time. Later base-URL
    /// changes have no effect on this task.
    pub(crate) fn set_resolved_url(&self, url: Url) {
        *self.resolved_url.lock().unwrap() = Some(url);
    }

    /// Builds the wire-level request for the transport collaborator.
    fn wire_request(&self, url: Url) -> WireRequest {
        WireRequest {
            url,
            method: self.config.method,
            headers: self.config.headers.clone(),
            parameters: self.config.parameters.clone(),
            serializer: self.config.request_serializer,
            authorization_token: self.config.authorization_token.clone(),
            basic_auth: self.config.basic_auth.clone(),
            timeout: self.config.timeout,
            allows_invalid_certificates: self.config.allows_invalid_certificates,
            continue_as_background_task: self.config.continue_as_background_task,
            upload: self.config.input_file.as_ref().map(|path| UploadSpec {
                path: path.clone(),
                filename: self.config.filename.clone(),
            }),
            output_path: self.config.output_path.clone(),
        }
    }

    /// Work body. Runs on a queue worker once admitted.
    pub(crate) async fn run(self: Arc<Self>, ctx: ExecContext) {
        if !self.lifecycle.try_start() {
            // Cancelled before start: straight to finished, no side effects.
            self.finish_with(Err(TaskError::Cancelled), &ctx);
            return;
        }
        self.operation_did_start();

        let url = match self.resolved_url.lock().unwrap().clone() {
            Some(url) => url,
            None => {
                error!("task {} started without a resolved url", self.task_id);
                self.finish_with(Err(TaskError::Config(ConfigError::UnregisteredUrl)), &ctx);
                return;
            }
        };

        let (progress_tx, mut progress_rx) = unbounded_channel();
        let exec = ctx.transport.execute(self.wire_request(url), progress_tx);
        tokio::pin!(exec);

        let mut progress_open = true;
        let result = loop {
            tokio::select! {
                biased;
                _ = self.lifecycle.cancelled() => {
                    // The transport future is dropped here; any eventual
                    // result of the abandoned call is ignored.
                    break Err(TaskError::Cancelled);
                }
                event = progress_rx.recv(), if progress_open => match event {
                    Some(event) => self.deliver_progress(event, &ctx),
                    None => progress_open = false,
                },
                res = &mut exec => {
                    // Flush progress events that were queued before the
                    // terminal outcome so ordering holds.
                    while let Ok(event) = progress_rx.try_recv() {
                        self.deliver_progress(event, &ctx);
                    }
                    break match res {
                        Ok(raw) => self.parse_response(&raw),
                        Err(e) => Err(TaskError::Transport(e)),
                    };
                }
            }
        };
        self.finish_with(result, &ctx);
    }

    /// Used by the queue when validation fails before the task ever starts.
    pub(crate) fn fail_before_start(self: &Arc<Self>, error: TaskError, ctx: &ExecContext) {
        self.finish_with(Err(error), ctx);
    }

    /// Used by the admission loop for tasks cancelled while waiting.
    pub(crate) fn finish_cancelled(self: &Arc<Self>, ctx: &ExecContext) {
        self.finish_with(Err(TaskError::Cancelled), ctx);
    }

    /// Serializer-dependent response parsing, overridable via the parse
    /// hook. The default JSON path is deliberately lenient: a body that
    /// fails to decode is returned raw with no error, preserving
    /// compatibility with endpoints that answer plain text.
    fn parse_response(&self, raw: &RawResponse) -> Result<Value, TaskError> {
        if let Some(parse) = &self.hooks.parse {
            return parse(raw);
        }
        match self.config.response_serializer {
            ResponseSerializer::Json => match serde_json::from_slice(&raw.body) {
                Ok(value) => Ok(Value::Json(value)),
                Err(e) => {
                    debug!("task {} json decode failed ({e}), returning raw body", self.task_id);
                    Ok(Value::Raw(raw.body.clone()))
                }
            },
            _ => Ok(Value::Raw(raw.body.clone())),
        }
    }

    /// Forwards one progress event on the configured affinity.
    fn deliver_progress(self: &Arc<Self>, event: ProgressEvent, ctx: &ExecContext) {
        match self.affinity {
            CallbackAffinity::Worker => {
                if let Some(callback) = self.on_progress.lock().unwrap().as_mut() {
                    callback(event);
                }
            }
            CallbackAffinity::Main => {
                let task = Arc::clone(self);
                ctx.dispatcher.post(Box::new(move || {
                    if let Some(callback) = task.on_progress.lock().unwrap().as_mut() {
                        callback(event);
                    }
                }));
            }
        }
    }

    /// Single terminal funnel. The lifecycle guard makes the transition —
    /// and therefore the callback — exactly-once no matter how many paths
    /// race into it.
    fn finish_with(self: &Arc<Self>, result: Result<Value, TaskError>, ctx: &ExecContext) {
        let kind = match &result {
            Ok(_) => FinishKind::Success,
            Err(TaskError::Cancelled) => FinishKind::Cancelled,
            Err(TaskError::Config(_)) => FinishKind::Config,
            Err(TaskError::Transport(_)) => FinishKind::TransportError,
            Err(TaskError::Parse(_)) => FinishKind::ParseError,
        };
        if !self.lifecycle.try_finish(kind) {
            return;
        }
        if kind == FinishKind::Cancelled {
            self.operation_did_cancel();
        }
        self.operation_did_finish(kind, ctx);

        let Some(callback) = self.on_response.lock().unwrap().take() else {
            return;
        };
        match self.affinity {
            CallbackAffinity::Worker => callback(result),
            CallbackAffinity::Main => ctx.dispatcher.post(Box::new(move || callback(result))),
        }
    }

    /// Start bookkeeping, then the caller hook.
    fn operation_did_start(&self) {
        debug!("task {} executing", self.task_id);
        if let Some(hook) = &self.hooks.on_start {
            hook();
        }
    }

    /// Finish bookkeeping (queue removal), then the caller hook.
    fn operation_did_finish(&self, kind: FinishKind, ctx: &ExecContext) {
        info!("task {} finished: {:?}", self.task_id, kind);
        if let Some(queue) = ctx.queue.upgrade() {
            queue.remove_task(self.task_id);
        }
        if let Some(hook) = &self.hooks.on_finish {
            hook(kind);
        }
    }

    /// Cancel bookkeeping, then the caller hook.
    fn operation_did_cancel(&self) {
        debug!("task {} cancelled", self.task_id);
        if let Some(hook) = &self.hooks.on_cancel {
            hook();
        }
    }
}
