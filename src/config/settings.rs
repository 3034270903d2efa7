// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Settings management for confab
//!
//! Handles loading and saving settings from ~/.confab/settings.json

use serde::{Deserialize, Serialize};

use crate::llm::routing::{
    DEFAULT_MODEL, DEFAULT_PROVIDER, DEFAULT_PROXY_URL, FILE_CAPABLE_PROVIDER, PROXY_KEY_PREFIX,
};

mod io;
mod validation;

/// Environment variable read for the credential unless overridden
pub const DEFAULT_API_KEY_ENV: &str = "CONFAB_API_KEY";

/// Main settings structure, stored in ~/.confab/settings.json
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Settings {
    /// Default settings for new sessions
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Proxy routing and capability rules
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Credential lookup
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// Application identifier sent as `X-App-ID` through the proxy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
}

/// Default session settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DefaultsConfig {
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            system_prompt: default_system_prompt(),
        }
    }
}

/// Routing settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutingConfig {
    /// Managed proxy base URL (`/llm` is appended per request)
    #[serde(default = "default_proxy_url")]
    pub proxy_url: String,

    /// Credential prefix marking managed-proxy keys
    #[serde(default = "default_proxy_key_prefix")]
    pub proxy_key_prefix: String,

    /// Provider allowed to receive file attachments
    #[serde(default = "default_file_capable_provider")]
    pub file_capable_provider: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            proxy_url: default_proxy_url(),
            proxy_key_prefix: default_proxy_key_prefix(),
            file_capable_provider: default_file_capable_provider(),
        }
    }
}

/// Credential settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CredentialsConfig {
    /// API key stored in the file (prefer the environment variable)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_system_prompt() -> String {
    "You are a helpful assistant.".to_string()
}

fn default_proxy_url() -> String {
    DEFAULT_PROXY_URL.to_string()
}

fn default_proxy_key_prefix() -> String {
    PROXY_KEY_PREFIX.to_string()
}

fn default_file_capable_provider() -> String {
    FILE_CAPABLE_PROVIDER.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}
