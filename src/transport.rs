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

//! The transport collaborator seam.
//!
//! The framework owns the operation lifecycle, not the wire. Actual HTTP
//! I/O, TLS, timeout enforcement, body encoding (form, JSON, property-list,
//! multipart) and reachability sensing live behind the [`Transport`] trait.
//! A [`WireRequest`] hands the collaborator everything it needs to build and
//! run the call; progress flows back through an unbounded channel and the
//! final outcome through the returned `Result`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use url::Url;

use crate::task::config::{Method, RequestSerializer};

/// Coarse connectivity classification pushed by the transport collaborator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reachability {
    /// Connectivity has not been determined yet.
    Unknown,
    /// No route to the internet.
    NotReachable,
    /// Reachable over a cellular interface.
    ReachableViaCellular,
    /// Reachable over WiFi.
    ReachableViaWifi,
}

impl Reachability {
    /// `true` for any state that can carry traffic.
    pub fn is_reachable(&self) -> bool {
        matches!(
            self,
            Reachability::ReachableViaCellular | Reachability::ReachableViaWifi
        )
    }
}

/// Multipart upload source for a request built around an input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSpec {
    /// Local file to stream as the multipart body.
    pub path: PathBuf,
    /// Form field filename, `"filename"` unless the caller overrides it.
    pub filename: String,
}

/// Everything the transport needs to execute one request.
///
/// The URL is already resolved and frozen; parameters and the serializer
/// choice are passed through verbatim so the collaborator performs the body
/// encoding. Both auth fields may be set at once; the transport decides
/// precedence.
#[derive(Debug, Clone)]
pub struct WireRequest {
    /// Fully resolved target URL.
    pub url: Url,
    /// HTTP method.
    pub method: Method,
    /// Caller-supplied header values.
    pub headers: HashMap<String, String>,
    /// Request parameters to encode according to `serializer`.
    pub parameters: HashMap<String, serde_json::Value>,
    /// Body encoding strategy for `parameters`.
    pub serializer: RequestSerializer,
    /// Bearer-style authorization token, if any.
    pub authorization_token: Option<String>,
    /// Basic-auth username/password pair, if any.
    pub basic_auth: Option<(String, String)>,
    /// Per-request timeout the transport must enforce.
    pub timeout: Duration,
    /// Accept untrusted TLS certificates.
    pub allows_invalid_certificates: bool,
    /// Advisory: keep the call alive when the app moves to the background.
    pub continue_as_background_task: bool,
    /// Multipart upload source, if this is an upload.
    pub upload: Option<UploadSpec>,
    /// Stream the response body to this path instead of memory.
    pub output_path: Option<PathBuf>,
}

/// Raw result of a successful transport execution.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    /// HTTP status code (2xx; anything else surfaces as
    /// [`TransportError::Status`]).
    pub status: u16,
    /// Response body bytes. Empty when the body was streamed to disk.
    pub body: Vec<u8>,
    /// Response headers, lowercase keys.
    pub headers: HashMap<String, String>,
}

/// One progress notification, forwarded verbatim to the caller.
///
/// The byte triples mirror the upload/download progress callbacks of the
/// underlying HTTP stack: the delta since the previous event, the running
/// total, and the expected total (`-1` when unknown).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressEvent {
    /// Bytes written to the wire.
    Upload {
        /// Bytes sent since the previous event.
        bytes_sent: u64,
        /// Total bytes sent so far.
        total_sent: u64,
        /// Expected total, `-1` when unknown.
        total_expected: i64,
    },
    /// Bytes read from the wire.
    Download {
        /// Bytes read since the previous event.
        bytes_read: u64,
        /// Total bytes read so far.
        total_read: u64,
        /// Expected total, `-1` when unknown.
        total_expected: i64,
    },
}

/// Transport-level failure.
///
/// Non-2xx statuses are surfaced as an error object carrying status and
/// body, never as a panic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum TransportError {
    /// Connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),
    /// The request exceeded its timeout interval.
    #[error("request timed out")]
    Timeout,
    /// TLS negotiation or certificate validation failed.
    #[error("tls failure: {0}")]
    Tls(String),
    /// The server answered with a non-2xx status.
    #[error("http status {code}")]
    Status {
        /// HTTP status code.
        code: u16,
        /// Response body as delivered by the server.
        body: Vec<u8>,
    },
    /// The underlying call was torn down before completing.
    #[error("transport aborted")]
    Aborted,
    /// Anything else the collaborator wants to report.
    #[error("{0}")]
    Other(String),
}

/// The injected network collaborator.
///
/// `execute` is expected to be cancel-safe: the framework drops the future
/// when the task is cancelled mid-flight and ignores any eventual result.
/// Progress events sent after the drop go nowhere.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Executes one wire request, streaming progress events through
    /// `progress` and returning the raw body and status on completion.
    async fn execute(
        &self,
        request: WireRequest,
        progress: UnboundedSender<ProgressEvent>,
    ) -> Result<RawResponse, TransportError>;
}
