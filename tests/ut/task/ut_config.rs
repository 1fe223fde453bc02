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

use super::*;

// @tc.name: ut_config_defaults
// @tc.desc: Test the default values of a freshly built RequestConfig
// @tc.precon: NA
// @tc.step: 1. Build a config without touching any setter
//           2. Check every defaulted field
// @tc.expect: POST, Http/Json serializers, 60s timeout, "filename",
//             main-affinity callbacks, all flags off
// @tc.type: FUNC
// @tc.require: NA
#[test]
fn ut_config_defaults() {
    let config = RequestConfig::builder().build();
    assert_eq!(config.method(), Method::Post);
    assert_eq!(config.request_serializer, RequestSerializer::Http);
    assert_eq!(config.response_serializer, ResponseSerializer::Json);
    assert_eq!(config.timeout(), Duration::from_secs(60));
    assert_eq!(config.filename, "filename");
    assert!(config.completes_on_main());
    assert!(!config.allows_invalid_certificates);
    assert!(!config.continue_as_background_task);
    assert!(config.action().is_none());
    assert!(config.explicit_url.is_none());
    assert!(config.parameters.is_empty());
    assert!(config.headers.is_empty());
    assert!(config.authorization_token.is_none());
    assert!(config.basic_auth.is_none());
    assert!(config.input_file.is_none());
    assert!(config.output_path.is_none());
}

// @tc.name: ut_config_method_as_str
// @tc.desc: Test the wire-level names of Method variants
// @tc.precon: NA
// @tc.step: 1. Call as_str on each Method variant
// @tc.expect: Each variant yields its upper-case HTTP name
// @tc.type: FUNC
// @tc.require: NA
#[test]
fn ut_config_method_as_str() {
    assert_eq!(Method::Get.as_str(), "GET");
    assert_eq!(Method::Post.as_str(), "POST");
    assert_eq!(Method::Put.as_str(), "PUT");
    assert_eq!(Method::Delete.as_str(), "DELETE");
}

// @tc.name: ut_config_builder_setters
// @tc.desc: Test that builder setters land in the built config
// @tc.precon: NA
// @tc.step: 1. Build a config exercising every setter
//           2. Check the frozen fields
// @tc.expect: Every field carries the value the builder was given
// @tc.type: FUNC
// @tc.require: NA
#[test]
fn ut_config_builder_setters() {
    let config = RequestConfig::builder()
        .action("upload.php")
        .method(Method::Put)
        .parameter("username", "mike")
        .parameter("retries", 3)
        .request_serializer(RequestSerializer::Json)
        .response_serializer(ResponseSerializer::Http)
        .authorization_token("token-123")
        .basic_auth("mike", "secret")
        .header("X-Client", "demo")
        .timeout(Duration::from_secs(5))
        .input_file("/tmp/avatar.png")
        .filename("avatar")
        .output_path("/tmp/out.bin")
        .allows_invalid_certificates(true)
        .continue_as_background_task(true)
        .complete_on_main(false)
        .build();

    assert_eq!(config.action(), Some("upload.php"));
    assert_eq!(config.method(), Method::Put);
    assert_eq!(config.parameters.get("username").and_then(|v| v.as_str()), Some("mike"));
    assert_eq!(config.parameters.get("retries").and_then(|v| v.as_i64()), Some(3));
    assert_eq!(config.request_serializer, RequestSerializer::Json);
    assert_eq!(config.response_serializer, ResponseSerializer::Http);
    assert_eq!(config.authorization_token.as_deref(), Some("token-123"));
    assert_eq!(
        config.basic_auth,
        Some(("mike".to_string(), "secret".to_string()))
    );
    assert_eq!(config.headers.get("X-Client").map(String::as_str), Some("demo"));
    assert_eq!(config.timeout(), Duration::from_secs(5));
    assert_eq!(config.input_file, Some(PathBuf::from("/tmp/avatar.png")));
    assert_eq!(config.filename, "avatar");
    assert_eq!(config.output_path, Some(PathBuf::from("/tmp/out.bin")));
    assert!(config.allows_invalid_certificates);
    assert!(config.continue_as_background_task);
    assert!(!config.completes_on_main());
}

// @tc.name: ut_config_resolve_url_with_base
// @tc.desc: Test action resolution against a registered base URL
// @tc.precon: NA
// @tc.step: 1. Build a config with only an action path
//           2. Resolve it against a trailing-slash base URL
// @tc.expect: The action is joined onto the base path
// @tc.type: FUNC
// @tc.require: NA
#[test]
fn ut_config_resolve_url_with_base() {
    let base = Url::parse("http://example.com/api/").unwrap();
    let config = RequestConfig::builder().action("login.php").build();
    let url = config.resolve_url(Some(&base)).unwrap();
    assert_eq!(url.as_str(), "http://example.com/api/login.php");
}

// @tc.name: ut_config_resolve_url_explicit_precedence
// @tc.desc: Test that an explicit URL overrides base plus action
// @tc.precon: NA
// @tc.step: 1. Build a config with both an explicit URL and an action
//           2. Resolve it against a base URL
// @tc.expect: The explicit URL wins; the base and action are ignored
// @tc.type: FUNC
// @tc.require: NA
#[test]
fn ut_config_resolve_url_explicit_precedence() {
    let base = Url::parse("http://example.com/api/").unwrap();
    let config = RequestConfig::builder()
        .action("login.php")
        .url("https://other.example.net/v2/session")
        .build();
    let url = config.resolve_url(Some(&base)).unwrap();
    assert_eq!(url.as_str(), "https://other.example.net/v2/session");
}

// @tc.name: ut_config_resolve_url_unregistered
// @tc.desc: Test resolution failure when no URL source is available
// @tc.precon: NA
// @tc.step: 1. Resolve an action-only config without a base URL
//           2. Resolve an empty config with a base URL
// @tc.expect: Both fail with UnregisteredUrl
// @tc.type: FUNC
// @tc.require: NA
#[test]
fn ut_config_resolve_url_unregistered() {
    let config = RequestConfig::builder().action("login.php").build();
    assert_eq!(config.resolve_url(None), Err(ConfigError::UnregisteredUrl));

    let base = Url::parse("http://example.com/api/").unwrap();
    let config = RequestConfig::builder().build();
    assert_eq!(
        config.resolve_url(Some(&base)),
        Err(ConfigError::UnregisteredUrl)
    );
}

// @tc.name: ut_config_resolve_url_invalid_explicit
// @tc.desc: Test resolution failure on a malformed explicit URL
// @tc.precon: NA
// @tc.step: 1. Build a config with an unparsable explicit URL
//           2. Resolve it
// @tc.expect: Resolution fails with InvalidUrl
// @tc.type: FUNC
// @tc.require: NA
#[test]
fn ut_config_resolve_url_invalid_explicit() {
    let config = RequestConfig::builder().url("not a url at all").build();
    assert!(matches!(
        config.resolve_url(None),
        Err(ConfigError::InvalidUrl(_))
    ));
}
