// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! CLI argument definitions using Clap
//!
//! Defines all command-line arguments and subcommands for confab.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::error::{ConfabError, Result};

/// confab - talk to any LLM backend from your terminal
#[derive(Parser, Debug)]
#[command(name = "confab")]
#[command(version, about = "Provider-agnostic LLM conversations from your terminal")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Settings file path (defaults to ~/.confab/settings.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a single turn and print the reply
    Ask(AskArgs),
}

/// Arguments for the ask subcommand
#[derive(clap::Args, Debug)]
pub struct AskArgs {
    /// The prompt text
    pub prompt: String,

    /// LLM provider to use (openai, gemini, anthropic, ...)
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Model to use
    #[arg(short, long)]
    pub model: Option<String>,

    /// System prompt
    #[arg(short, long)]
    pub system: Option<String>,

    /// Attach a file as MIME=PATH (gemini only)
    #[arg(long = "attach", value_name = "MIME=PATH")]
    pub attachments: Vec<String>,

    /// Attach an image file
    #[arg(long = "image", value_name = "PATH")]
    pub images: Vec<PathBuf>,

    /// Extra request parameter as KEY=JSON (e.g. temperature=0.2)
    #[arg(long = "param", value_name = "KEY=JSON")]
    pub params: Vec<String>,

    /// Split the reply into text and inline images
    #[arg(long)]
    pub multimodal: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Directory to write decoded reply images into
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

/// Parse a `MIME=PATH` attachment argument
pub fn parse_attachment(raw: &str) -> Result<(String, PathBuf)> {
    match raw.split_once('=') {
        Some((mime, path)) if !mime.is_empty() && !path.is_empty() => {
            Ok((mime.to_string(), PathBuf::from(path)))
        }
        _ => Err(ConfabError::Config(format!(
            "Invalid attachment '{}': expected MIME=PATH",
            raw
        ))),
    }
}

/// Parse a `KEY=JSON` parameter argument. Values that are not valid JSON are
/// taken as plain strings.
pub fn parse_param(raw: &str) -> Result<(String, serde_json::Value)> {
    let (key, value) = raw
        .split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| {
            ConfabError::Config(format!("Invalid parameter '{}': expected KEY=JSON", raw))
        })?;

    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
