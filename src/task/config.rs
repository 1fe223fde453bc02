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

//! Request configuration.
//!
//! A [`RequestConfig`] describes one HTTP call: target (explicit URL or
//! base-URL-relative action), method, parameters, serializer choices, auth,
//! headers, timeout and file-transfer options. It is built once through
//! [`RequestConfigBuilder`] and frozen when the task takes ownership at
//! submission; nothing can mutate it afterwards.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default multipart form filename field.
const DEFAULT_FILENAME: &str = "filename";

/// HTTP method of a request. Defaults to `Post`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    /// HTTP GET.
    Get,
    /// HTTP POST.
    #[default]
    Post,
    /// HTTP PUT.
    Put,
    /// HTTP DELETE.
    Delete,
}

impl Method {
    /// Wire-level method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// Body encoding strategy applied by the transport to the parameter map.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestSerializer {
    /// Form/query encoding.
    #[default]
    Http,
    /// JSON body.
    Json,
    /// Property-list body.
    PropertyList,
}

/// Decoding strategy expected for the response body.
///
/// Only `Json` is decoded by the framework itself (with a lenient raw
/// fallback); the other choices are passed to the caller as raw bytes and
/// exist so a custom parse hook or the transport can act on them.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseSerializer {
    /// Raw bytes, no decoding.
    Http,
    /// JSON decoding with raw fallback.
    #[default]
    Json,
    /// XML document.
    Xml,
    /// Property-list document.
    PropertyList,
    /// Image data.
    Image,
    /// First matching of a compound set.
    Compound,
}

/// Immutable-once-built description of one HTTP call.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub(crate) action: Option<String>,
    pub(crate) explicit_url: Option<String>,
    pub(crate) method: Method,
    pub(crate) parameters: HashMap<String, serde_json::Value>,
    pub(crate) request_serializer: RequestSerializer,
    pub(crate) response_serializer: ResponseSerializer,
    pub(crate) authorization_token: Option<String>,
    pub(crate) basic_auth: Option<(String, String)>,
    pub(crate) headers: HashMap<String, String>,
    pub(crate) timeout: Duration,
    pub(crate) input_file: Option<PathBuf>,
    pub(crate) filename: String,
    pub(crate) output_path: Option<PathBuf>,
    pub(crate) allows_invalid_certificates: bool,
    pub(crate) continue_as_background_task: bool,
    pub(crate) complete_on_main: bool,
}

impl RequestConfig {
    /// Starts a builder with the defaults described in the field docs.
    pub fn builder() -> RequestConfigBuilder {
        RequestConfigBuilder {
            config: RequestConfig {
                action: None,
                explicit_url: None,
                method: Method::default(),
                parameters: HashMap::new(),
                request_serializer: RequestSerializer::default(),
                response_serializer: ResponseSerializer::default(),
                authorization_token: None,
                basic_auth: None,
                headers: HashMap::new(),
                timeout: DEFAULT_TIMEOUT,
                input_file: None,
                filename: DEFAULT_FILENAME.to_string(),
                output_path: None,
                allows_invalid_certificates: false,
                continue_as_background_task: false,
                complete_on_main: true,
            },
        }
    }

    /// HTTP method of the call.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Relative action path, when no explicit URL is set.
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    /// Per-request timeout handed to the transport.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether callbacks run on the main-affinity context.
    pub fn completes_on_main(&self) -> bool {
        self.complete_on_main
    }

    /// Resolves the target URL against the registered base URL.
    ///
    /// An explicit URL takes precedence over `base + action`. Fails when
    /// neither an explicit URL nor a base-plus-action pair resolves.
    pub(crate) fn resolve_url(&self, base: Option<&Url>) -> Result<Url, ConfigError> {
        if let Some(explicit) = &self.explicit_url {
            return Url::parse(explicit).map_err(|e| ConfigError::InvalidUrl(e.to_string()));
        }
        match (base, &self.action) {
            (Some(base), Some(action)) => base
                .join(action)
                .map_err(|e| ConfigError::InvalidUrl(e.to_string())),
            _ => Err(ConfigError::UnregisteredUrl),
        }
    }
}

/// Fluent builder for [`RequestConfig`].
///
/// Construction never fails; URL validation happens at submission so the
/// error reaches the caller through the same channel as every other
/// configuration problem.
#[derive(Debug)]
pub struct RequestConfigBuilder {
    config: RequestConfig,
}

impl RequestConfigBuilder {
    /// Sets the relative action path, e.g. `"login.php"`.
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.config.action = Some(action.into());
        self
    }

    /// Sets an explicit request URL, overriding base URL + action entirely.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.explicit_url = Some(url.into());
        self
    }

    /// Sets the HTTP method. Default is `Post`.
    pub fn method(mut self, method: Method) -> Self {
        self.config.method = method;
        self
    }

    /// Adds one request parameter.
    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.config.parameters.insert(key.into(), value.into());
        self
    }

    /// Replaces the whole parameter map.
    pub fn parameters(mut self, parameters: HashMap<String, serde_json::Value>) -> Self {
        self.config.parameters = parameters;
        self
    }

    /// Chooses the request body encoding. Default is `Http`.
    pub fn request_serializer(mut self, serializer: RequestSerializer) -> Self {
        self.config.request_serializer = serializer;
        self
    }

    /// Chooses the response decoding. Default is `Json`.
    pub fn response_serializer(mut self, serializer: ResponseSerializer) -> Self {
        self.config.response_serializer = serializer;
        self
    }

    /// Sets a bearer-style authorization token. Independent of basic auth;
    /// the transport decides precedence when both are present.
    pub fn authorization_token(mut self, token: impl Into<String>) -> Self {
        self.config.authorization_token = Some(token.into());
        self
    }

    /// Sets a basic-auth username/password pair.
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.basic_auth = Some((username.into(), password.into()));
        self
    }

    /// Adds one header value.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.insert(key.into(), value.into());
        self
    }

    /// Sets the per-request timeout. Default is 60 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Sets the multipart upload source file.
    pub fn input_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.input_file = Some(path.into());
        self
    }

    /// Sets the multipart filename field. Default is `"filename"`. Only
    /// meaningful together with an input file.
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.config.filename = filename.into();
        self
    }

    /// Streams the response body to this path instead of memory.
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_path = Some(path.into());
        self
    }

    /// Accepts untrusted TLS certificates. Default is `false`.
    pub fn allows_invalid_certificates(mut self, allows: bool) -> Self {
        self.config.allows_invalid_certificates = allows;
        self
    }

    /// Advisory to the execution environment to keep the call alive in the
    /// background. Fixed at submission time; default is `false`.
    pub fn continue_as_background_task(mut self, continue_in_background: bool) -> Self {
        self.config.continue_as_background_task = continue_in_background;
        self
    }

    /// Chooses the callback affinity: `true` delivers progress and terminal
    /// callbacks on the queue's main-affinity thread, `false` on the worker
    /// that ran the task. Default is `true`.
    pub fn complete_on_main(mut self, on_main: bool) -> Self {
        self.config.complete_on_main = on_main;
        self
    }

    /// Finalizes the configuration.
    pub fn build(self) -> RequestConfig {
        self.config
    }
}
