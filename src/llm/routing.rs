// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Provider routing
//!
//! Turns the active [`ProviderConfig`] plus a message list into transport
//! parameters. Two credential classes exist: managed-proxy credentials (known
//! prefix) are sent through the operator's proxy endpoint, everything else goes
//! straight to the vendor.

use std::collections::BTreeMap;

use crate::llm::content::{ContentPart, UserTurn};
use crate::llm::message::MessageEntry;
use crate::llm::provider::CompletionRequest;

/// Default provider for new sessions
pub const DEFAULT_PROVIDER: &str = "openai";

/// Default model for new sessions
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Credentials with this prefix route through the managed proxy
pub const PROXY_KEY_PREFIX: &str = "sk-emergent-";

/// Proxy endpoint used when nothing overrides it
pub const DEFAULT_PROXY_URL: &str = "https://integrations.emergentagent.com";

/// Environment variable overriding the proxy endpoint
pub const PROXY_URL_ENV: &str = "INTEGRATION_PROXY_URL";

/// The only provider that accepts arbitrary file attachments
pub const FILE_CAPABLE_PROVIDER: &str = "gemini";

/// Wire protocol the proxy speaks
const PROXY_PROTOCOL: &str = "openai";

/// Param keys that map onto typed request fields and never reach the body
const RESERVED_PARAMS: [&str; 6] = [
    "model",
    "api_key",
    "api_base",
    "custom_llm_provider",
    "extra_headers",
    "messages",
];

/// The active provider, model and credential plus caller extras
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub provider: String,
    pub model: String,
    pub api_key: String,
    pub extra_params: BTreeMap<String, serde_json::Value>,
    pub custom_headers: BTreeMap<String, String>,
}

impl ProviderConfig {
    /// Create a config with the default provider and model
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.into(),
            extra_params: BTreeMap::new(),
            custom_headers: BTreeMap::new(),
        }
    }

    /// Switch provider and model
    pub fn set_model(&mut self, provider: impl Into<String>, model: impl Into<String>) {
        self.provider = provider.into();
        self.model = model.into();
    }

    /// Merge extra params; later values win per key
    pub fn merge_params(&mut self, params: impl IntoIterator<Item = (String, serde_json::Value)>) {
        self.extra_params.extend(params);
    }
}

/// Operator-level routing knobs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingPolicy {
    /// Proxy base URL, without the `/llm` suffix
    pub proxy_url: String,
    /// Prefix identifying managed-proxy credentials
    pub proxy_key_prefix: String,
    /// Provider allowed to receive file attachments
    pub file_capable_provider: String,
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self {
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            proxy_key_prefix: PROXY_KEY_PREFIX.to_string(),
            file_capable_provider: FILE_CAPABLE_PROVIDER.to_string(),
        }
    }
}

impl RoutingPolicy {
    /// Defaults with the proxy URL taken from the environment when set
    pub fn from_env() -> Self {
        let mut policy = Self::default();
        if let Some(url) = std::env::var(PROXY_URL_ENV).ok().filter(|u| !u.is_empty()) {
            policy.proxy_url = url;
        }
        policy
    }

    /// Whether `api_key` is a managed-proxy credential
    pub fn is_proxy_key(&self, api_key: &str) -> bool {
        api_key.starts_with(&self.proxy_key_prefix)
    }

    /// Whether `provider` may receive `part`
    pub fn supports(&self, provider: &str, part: &ContentPart) -> bool {
        match part {
            ContentPart::Text(_) | ContentPart::Image(_) => true,
            ContentPart::File(_) => provider == self.file_capable_provider,
        }
    }

    /// First part of `turn` that `provider` cannot take
    pub fn first_unsupported<'a>(&self, provider: &str, turn: &'a UserTurn) -> Option<&'a ContentPart> {
        turn.parts.iter().find(|part| !self.supports(provider, part))
    }

    /// Build transport parameters. Pure; never fails.
    pub fn build_request(&self, config: &ProviderConfig, messages: Vec<MessageEntry>) -> CompletionRequest {
        let mut request = CompletionRequest {
            model: format!("{}/{}", config.provider, config.model),
            messages,
            api_key: config.api_key.clone(),
            api_base: None,
            custom_llm_provider: None,
            extra_headers: None,
            extra_params: BTreeMap::new(),
        };

        if self.is_proxy_key(&config.api_key) {
            request.api_base = Some(format!("{}/llm", self.proxy_url));
            request.custom_llm_provider = Some(PROXY_PROTOCOL.to_string());
            // Only gemini keeps a prefix behind the proxy.
            request.model = if config.provider == "gemini" {
                format!("gemini/{}", config.model)
            } else {
                config.model.clone()
            };
            if !config.custom_headers.is_empty() {
                request.extra_headers = Some(config.custom_headers.clone());
            }
        }

        for (key, value) in &config.extra_params {
            apply_param(&mut request, key, value);
        }

        request
    }
}

/// Caller params override the typed fields they name; the rest pass through.
fn apply_param(request: &mut CompletionRequest, key: &str, value: &serde_json::Value) {
    match (key, value) {
        ("model", serde_json::Value::String(v)) => request.model = v.clone(),
        ("api_key", serde_json::Value::String(v)) => request.api_key = v.clone(),
        ("api_base", serde_json::Value::String(v)) => request.api_base = Some(v.clone()),
        ("api_base", serde_json::Value::Null) => request.api_base = None,
        ("custom_llm_provider", serde_json::Value::String(v)) => {
            request.custom_llm_provider = Some(v.clone())
        }
        ("custom_llm_provider", serde_json::Value::Null) => request.custom_llm_provider = None,
        ("extra_headers", serde_json::Value::Object(map)) => {
            request.extra_headers = Some(
                map.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect(),
            );
        }
        ("extra_headers", serde_json::Value::Null) => request.extra_headers = None,
        ("messages", serde_json::Value::Array(_)) => {
            match serde_json::from_value::<Vec<MessageEntry>>(value.clone()) {
                Ok(messages) => request.messages = messages,
                Err(e) => {
                    tracing::warn!("Ignoring malformed messages override: {}", e);
                }
            }
        }
        (reserved, _) if RESERVED_PARAMS.contains(&reserved) => {
            tracing::warn!("Ignoring {} override with unsupported value: {}", reserved, value);
        }
        _ => {
            request.extra_params.insert(key.to_string(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PROXY_KEY: &str = "sk-emergent-abc123";
    const DIRECT_KEY: &str = "sk-proj-xyz";

    fn config(provider: &str, model: &str, key: &str) -> ProviderConfig {
        let mut config = ProviderConfig::new(key);
        config.set_model(provider, model);
        config
    }

    fn policy() -> RoutingPolicy {
        RoutingPolicy::default()
    }

    #[test]
    fn test_classification() {
        let policy = policy();
        assert!(policy.is_proxy_key(PROXY_KEY));
        assert!(!policy.is_proxy_key(DIRECT_KEY));
        assert!(!policy.is_proxy_key(""));
        assert!(!policy.is_proxy_key("SK-EMERGENT-upper"));
    }

    #[test]
    fn test_direct_keeps_prefixed_model() {
        let request = policy().build_request(&config("openai", "pro", DIRECT_KEY), vec![]);
        assert_eq!(request.model, "openai/pro");
        assert_eq!(request.api_key, DIRECT_KEY);
        assert!(request.api_base.is_none());
        assert!(request.custom_llm_provider.is_none());
    }

    #[test]
    fn test_direct_never_attaches_headers() {
        let mut cfg = config("openai", "pro", DIRECT_KEY);
        cfg.custom_headers.insert("X-App-ID".into(), "app".into());

        let request = policy().build_request(&cfg, vec![]);
        assert!(request.extra_headers.is_none());
    }

    #[test]
    fn test_proxy_gemini_keeps_prefix() {
        let request = policy().build_request(&config("gemini", "pro", PROXY_KEY), vec![]);
        assert_eq!(request.model, "gemini/pro");
        assert_eq!(
            request.api_base.as_deref(),
            Some("https://integrations.emergentagent.com/llm")
        );
        assert_eq!(request.custom_llm_provider.as_deref(), Some("openai"));
    }

    #[test]
    fn test_proxy_other_provider_drops_prefix() {
        let request = policy().build_request(&config("openai", "pro", PROXY_KEY), vec![]);
        assert_eq!(request.model, "pro");

        let request = policy().build_request(&config("anthropic", "claude-x", PROXY_KEY), vec![]);
        assert_eq!(request.model, "claude-x");
    }

    #[test]
    fn test_proxy_attaches_headers_only_when_present() {
        let request = policy().build_request(&config("openai", "pro", PROXY_KEY), vec![]);
        assert!(request.extra_headers.is_none());

        let mut cfg = config("openai", "pro", PROXY_KEY);
        cfg.custom_headers.insert("X-App-ID".into(), "my-app".into());
        let request = policy().build_request(&cfg, vec![]);
        assert_eq!(
            request.extra_headers.unwrap().get("X-App-ID").map(String::as_str),
            Some("my-app")
        );
    }

    #[test]
    fn test_custom_proxy_url() {
        let policy = RoutingPolicy {
            proxy_url: "http://localhost:9000".into(),
            ..Default::default()
        };
        let request = policy.build_request(&config("openai", "pro", PROXY_KEY), vec![]);
        assert_eq!(request.api_base.as_deref(), Some("http://localhost:9000/llm"));
    }

    #[test]
    fn test_extra_params_pass_through() {
        let mut cfg = config("openai", "gpt-4o", DIRECT_KEY);
        cfg.merge_params([("temperature".to_string(), json!(0.1))]);

        let request = policy().build_request(&cfg, vec![]);
        assert_eq!(request.extra_params.get("temperature"), Some(&json!(0.1)));
    }

    #[test]
    fn test_extra_params_override_routed_fields() {
        let mut cfg = config("gemini", "pro", PROXY_KEY);
        cfg.merge_params([
            ("model".to_string(), json!("custom/model")),
            ("api_base".to_string(), json!("http://elsewhere")),
        ]);

        let request = policy().build_request(&cfg, vec![]);
        assert_eq!(request.model, "custom/model");
        assert_eq!(request.api_base.as_deref(), Some("http://elsewhere"));
        assert!(request.extra_params.is_empty());
    }

    #[test]
    fn test_extra_headers_param_overrides() {
        let mut cfg = config("openai", "pro", DIRECT_KEY);
        cfg.merge_params([("extra_headers".to_string(), json!({"X-Trace": "1"}))]);

        let request = policy().build_request(&cfg, vec![]);
        assert_eq!(
            request.extra_headers.unwrap().get("X-Trace").map(String::as_str),
            Some("1")
        );
    }

    #[test]
    fn test_reserved_params_with_wrong_type_ignored() {
        let mut cfg = config("gemini", "pro", PROXY_KEY);
        cfg.merge_params([
            ("model".to_string(), json!(5)),
            ("api_key".to_string(), json!(null)),
            ("messages".to_string(), json!("not a list")),
            ("extra_headers".to_string(), json!(["x"])),
            ("top_p".to_string(), json!(0.5)),
        ]);

        let request = policy().build_request(&cfg, vec![]);
        assert_eq!(request.model, "gemini/pro");
        assert_eq!(request.api_key, PROXY_KEY);
        assert!(request.extra_headers.is_none());
        assert_eq!(request.extra_params.len(), 1);
        assert_eq!(request.extra_params.get("top_p"), Some(&json!(0.5)));
    }

    #[test]
    fn test_merge_params_later_wins() {
        let mut cfg = ProviderConfig::new(DIRECT_KEY);
        cfg.merge_params([("temperature".to_string(), json!(0.1))]);
        cfg.merge_params([("temperature".to_string(), json!(0.9))]);
        assert_eq!(cfg.extra_params.get("temperature"), Some(&json!(0.9)));
    }

    #[test]
    fn test_messages_passed_through() {
        let messages = vec![MessageEntry::system("s"), MessageEntry::user("u")];
        let request = policy().build_request(&ProviderConfig::new(DIRECT_KEY), messages.clone());
        assert_eq!(request.messages, messages);
    }

    #[test]
    fn test_file_capability() {
        let policy = policy();
        let fixture = file_fixture();
        let file = ContentPart::file_with_mime_type("text/plain", fixture.path()).unwrap();
        assert!(policy.supports("gemini", &file));
        assert!(!policy.supports("openai", &file));
        assert!(policy.supports("openai", &ContentPart::image("AAA")));
        assert!(policy.supports("anthropic", &ContentPart::text("t")));

        let turn = UserTurn::text("x").with_part(file);
        assert!(policy.first_unsupported("openai", &turn).is_some());
        assert!(policy.first_unsupported("gemini", &turn).is_none());
    }

    fn file_fixture() -> tempfile::NamedTempFile {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"data").unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let cfg = ProviderConfig::new("k");
        assert_eq!(cfg.provider, "openai");
        assert_eq!(cfg.model, "gpt-4o");
        let policy = RoutingPolicy::default();
        assert_eq!(policy.file_capable_provider, "gemini");
        assert_eq!(policy.proxy_key_prefix, "sk-emergent-");
    }
}
