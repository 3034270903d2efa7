// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use crate::chat::APP_URL_ENV;
use crate::llm::routing::{RoutingPolicy, PROXY_URL_ENV};

use super::Settings;

impl Settings {
    /// Get the API key, checking the configured env var first.
    pub fn get_api_key(&self) -> Option<String> {
        // Priority: env var > config file.
        pick(
            env_var(&self.credentials.api_key_env),
            self.credentials.api_key.as_deref(),
        )
    }

    /// Get the proxy base URL, checking `INTEGRATION_PROXY_URL` first.
    pub fn get_proxy_url(&self) -> String {
        env_var(PROXY_URL_ENV).unwrap_or_else(|| self.routing.proxy_url.clone())
    }

    /// Get the application identifier, checking `APP_URL` first.
    pub fn get_app_id(&self) -> Option<String> {
        pick(env_var(APP_URL_ENV), self.app_id.as_deref())
    }

    /// Routing policy described by these settings.
    pub fn routing_policy(&self) -> RoutingPolicy {
        RoutingPolicy {
            proxy_url: self.get_proxy_url(),
            proxy_key_prefix: self.routing.proxy_key_prefix.clone(),
            file_capable_provider: self.routing.file_capable_provider.clone(),
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn pick(env: Option<String>, file: Option<&str>) -> Option<String> {
    env.or_else(|| file.filter(|v| !v.is_empty()).map(str::to_string))
}
