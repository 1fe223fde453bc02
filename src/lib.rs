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

//! Client-side HTTP request framework.
//!
//! Callers describe a network action as a [`RequestConfig`], wrap it in a
//! [`RequestTask`] with a terminal callback, and submit it to the shared
//! [`TaskQueue`]. The queue admits tasks under a concurrency bound in FIFO
//! submission order; each task drives one [`Transport`] invocation, forwards
//! progress, parses the response, and delivers exactly one callback on the
//! configured thread affinity.
//!
//! The crate ships no HTTP client: transport, TLS, body encoding and
//! reachability sensing are injected behind the [`Transport`] trait.
//!
//! ```no_run
//! use std::sync::Arc;
//! use request_center::{RequestConfig, RequestTask, TaskQueue};
//! # fn transport() -> Arc<dyn request_center::Transport> { unimplemented!() }
//!
//! let queue = TaskQueue::init(transport(), None).unwrap();
//! queue.set_base_url("http://example.com/api/").unwrap();
//!
//! let config = RequestConfig::builder()
//!     .action("login.php")
//!     .parameter("username", "mike")
//!     .build();
//! let task = RequestTask::new(config, |result| match result {
//!     Ok(value) => println!("logged in: {value:?}"),
//!     Err(e) => println!("login failed: {e}"),
//! });
//! queue.enqueue(task).unwrap();
//! ```

#![warn(
    missing_docs,
    clippy::redundant_static_lifetimes,
    clippy::enum_variant_names,
    clippy::clone_on_copy,
    clippy::unused_async
)]

mod error;
pub mod manage;
pub mod task;
pub mod transport;

pub use error::{ConfigError, TaskError};
pub use manage::network::ReachabilityNotifier;
pub use manage::TaskQueue;
pub use task::config::{
    Method, RequestConfig, RequestConfigBuilder, RequestSerializer, ResponseSerializer,
};
pub use task::lifecycle::{FinishKind, State};
pub use task::request_task::{
    ParseHook, ProgressCallback, RequestTask, ResponseCallback, TaskHooks, Value,
};
pub use transport::{
    ProgressEvent, RawResponse, Reachability, Transport, TransportError, UploadSpec, WireRequest,
};
