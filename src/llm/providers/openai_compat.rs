// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! OpenAI-compatible chat completions transport
//!
//! Sends routed requests to `{base}/chat/completions`. When a
//! `custom_llm_provider` is set the model id goes out verbatim (the managed
//! proxy resolves it); otherwise the `vendor/` prefix is stripped. Without an
//! `api_base` the vendor picks one of the public endpoints.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{ApiError, ConfabError, Result};
use crate::llm::provider::{CompletionRequest, CompletionResponse, CompletionTransport};

const OPENAI_API_URL: &str = "https://api.openai.com/v1";
const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";

/// HTTP transport speaking the OpenAI chat completions protocol
pub struct OpenAiCompatTransport {
    client: Client,
    vendor_urls: HashMap<String, String>,
}

impl Default for OpenAiCompatTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenAiCompatTransport {
    /// Create a transport with the public vendor endpoints
    pub fn new() -> Self {
        let vendor_urls = [
            ("openai", OPENAI_API_URL),
            ("gemini", GEMINI_API_URL),
            ("anthropic", ANTHROPIC_API_URL),
        ]
        .into_iter()
        .map(|(vendor, url)| (vendor.to_string(), url.to_string()))
        .collect();

        Self {
            client: Client::new(),
            vendor_urls,
        }
    }

    /// Point a vendor at a different base URL
    pub fn with_vendor_url(mut self, vendor: impl Into<String>, base_url: impl Into<String>) -> Self {
        self.vendor_urls.insert(vendor.into(), base_url.into());
        self
    }

    /// Resolve the endpoint URL and the model id to put on the wire
    fn resolve_target(&self, request: &CompletionRequest) -> Result<(String, String)> {
        let prefixed = request.model.split_once('/');

        let model = match (&request.custom_llm_provider, prefixed) {
            (Some(_), _) | (None, None) => request.model.clone(),
            (None, Some((_, bare))) => bare.to_string(),
        };

        if let Some(ref base) = request.api_base {
            return Ok((chat_url(base), model));
        }

        let vendor = request
            .custom_llm_provider
            .as_deref()
            .or(prefixed.map(|(vendor, _)| vendor))
            .ok_or_else(|| {
                ConfabError::Config(format!(
                    "Model '{}' has no provider prefix and no api_base is set",
                    request.model
                ))
            })?;

        let base = self.vendor_urls.get(vendor).ok_or_else(|| {
            ConfabError::Config(format!(
                "No endpoint known for provider '{}'; set api_base",
                vendor
            ))
        })?;

        Ok((chat_url(base), model))
    }

    fn build_body(&self, request: &CompletionRequest, model: &str) -> Result<serde_json::Value> {
        let mut body = serde_json::Map::new();
        body.insert("model".to_string(), serde_json::Value::String(model.to_string()));
        body.insert("messages".to_string(), serde_json::to_value(&request.messages)?);
        for (key, value) in &request.extra_params {
            body.insert(key.clone(), value.clone());
        }
        Ok(serde_json::Value::Object(body))
    }

    /// Parse an error response
    fn parse_error(&self, status: u16, body: &str) -> ConfabError {
        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string());

        let api_error = match status {
            401 | 403 => ApiError::AuthenticationFailed,
            429 => ApiError::RateLimited(60),
            404 => ApiError::ModelNotFound(message),
            _ => ApiError::ServerError { status, message },
        };
        ConfabError::Api(api_error)
    }
}

fn chat_url(base: &str) -> String {
    format!("{}/chat/completions", base.trim_end_matches('/'))
}

#[async_trait]
impl CompletionTransport for OpenAiCompatTransport {
    fn name(&self) -> &str {
        "openai-compat"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let (url, model) = self.resolve_target(&request)?;
        let body = self.build_body(&request, &model)?;

        tracing::debug!(
            url = %url,
            model = %model,
            messages = request.messages.len(),
            "Sending chat completion"
        );

        let mut req = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", &request.api_key))
            .header("Content-Type", "application/json");

        if let Some(ref headers) = request.extra_headers {
            for (name, value) in headers {
                req = req.header(name.as_str(), value.as_str());
            }
        }

        let response = req.json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                ConfabError::Api(ApiError::Timeout)
            } else if e.is_connect() {
                ConfabError::Api(ApiError::Network(e.to_string()))
            } else {
                ConfabError::Http(e)
            }
        })?;

        let status = response.status().as_u16();
        tracing::debug!(status, "Chat completion returned");

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status, &body));
        }

        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ConfabError::Api(ApiError::InvalidResponse(e.to_string())))
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::message::MessageEntry;
    use std::collections::BTreeMap;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(model: &str, api_base: Option<String>) -> CompletionRequest {
        CompletionRequest {
            model: model.to_string(),
            messages: vec![MessageEntry::system("sys"), MessageEntry::user("hi")],
            api_key: "test-key".to_string(),
            api_base,
            custom_llm_provider: None,
            extra_headers: None,
            extra_params: BTreeMap::new(),
        }
    }

    fn ok_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-1",
            "model": "gpt-4o",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}]
        })
    }

    #[test]
    fn test_resolve_direct_vendor() {
        let transport = OpenAiCompatTransport::new();
        let (url, model) = transport.resolve_target(&request("openai/gpt-4o", None)).unwrap();
        assert_eq!(url, "https://api.openai.com/v1/chat/completions");
        assert_eq!(model, "gpt-4o");

        let (url, model) = transport.resolve_target(&request("gemini/gemini-2.0-flash", None)).unwrap();
        assert!(url.starts_with(GEMINI_API_URL));
        assert_eq!(model, "gemini-2.0-flash");
    }

    #[test]
    fn test_resolve_proxy_keeps_model() {
        let transport = OpenAiCompatTransport::new();
        let mut req = request("gemini/pro", Some("https://proxy.example/llm/".to_string()));
        req.custom_llm_provider = Some("openai".to_string());
        let (url, model) = transport.resolve_target(&req).unwrap();
        assert_eq!(url, "https://proxy.example/llm/chat/completions");
        assert_eq!(model, "gemini/pro");
    }

    #[test]
    fn test_resolve_api_base_override_strips_prefix() {
        let transport = OpenAiCompatTransport::new();
        let req = request("openai/gpt-4o", Some("http://localhost:8080/v1".to_string()));
        let (url, model) = transport.resolve_target(&req).unwrap();
        assert_eq!(url, "http://localhost:8080/v1/chat/completions");
        assert_eq!(model, "gpt-4o");
    }

    #[test]
    fn test_resolve_unknown_vendor_fails() {
        let transport = OpenAiCompatTransport::new();
        assert!(transport.resolve_target(&request("mystery/m", None)).is_err());
        assert!(transport.resolve_target(&request("bare-model", None)).is_err());
    }

    #[test]
    fn test_build_body_merges_params() {
        let transport = OpenAiCompatTransport::new();
        let mut req = request("openai/gpt-4o", None);
        req.extra_params.insert("temperature".into(), serde_json::json!(0.3));

        let body = transport.build_body(&req, "gpt-4o").unwrap();
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["temperature"], serde_json::json!(0.3));
        assert_eq!(body["messages"][0]["role"], "system");
    }

    #[test]
    fn test_parse_error_mapping() {
        let transport = OpenAiCompatTransport::new();
        let body = r#"{"error":{"message":"bad key"}}"#;
        assert!(matches!(
            transport.parse_error(401, body),
            ConfabError::Api(ApiError::AuthenticationFailed)
        ));
        assert!(matches!(
            transport.parse_error(429, body),
            ConfabError::Api(ApiError::RateLimited(_))
        ));
        match transport.parse_error(500, "oops") {
            ConfabError::Api(ApiError::ServerError { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "oops");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_complete_direct_with_mock_server() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-4o"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("hello there")))
            .mount(&mock_server)
            .await;

        let transport = OpenAiCompatTransport::new()
            .with_vendor_url("openai", format!("{}/v1", mock_server.uri()));
        let response = transport.complete(request("openai/gpt-4o", None)).await.unwrap();
        assert_eq!(response.first_content(), Some("hello there"));
    }

    #[tokio::test]
    async fn test_complete_via_api_base_sends_headers() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/llm/chat/completions"))
            .and(header("X-App-ID", "my-app"))
            .and(body_partial_json(serde_json::json!({"model": "gemini/pro"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("proxied")))
            .mount(&mock_server)
            .await;

        let transport = OpenAiCompatTransport::new();
        let mut req = request("gemini/pro", Some(format!("{}/llm", mock_server.uri())));
        req.custom_llm_provider = Some("openai".to_string());
        let mut headers = BTreeMap::new();
        headers.insert("X-App-ID".to_string(), "my-app".to_string());
        req.extra_headers = Some(headers);

        let response = transport.complete(req).await.unwrap();
        assert_eq!(response.first_content(), Some("proxied"));
    }

    #[tokio::test]
    async fn test_complete_maps_http_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"error": {"message": "invalid key"}})),
            )
            .mount(&mock_server)
            .await;

        let transport = OpenAiCompatTransport::new();
        let err = transport
            .complete(request("openai/gpt-4o", Some(mock_server.uri())))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfabError::Api(ApiError::AuthenticationFailed)));
    }

    #[tokio::test]
    async fn test_complete_rejects_garbage_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let transport = OpenAiCompatTransport::new();
        let err = transport
            .complete(request("openai/gpt-4o", Some(mock_server.uri())))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfabError::Api(ApiError::InvalidResponse(_))));
    }
}
