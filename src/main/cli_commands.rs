// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine;

use confab::chat::ChatSession;
use confab::cli::{parse_attachment, parse_param, AskArgs};
use confab::config::Settings;
use confab::error::{ConfabError, Result};
use confab::llm::providers::OpenAiCompatTransport;
use confab::llm::{CompletionTransport, ContentPart, ImageData, UserTurn};

pub(super) async fn run_ask(args: AskArgs, settings: Settings) -> Result<()> {
    let api_key = settings.get_api_key().ok_or_else(|| {
        ConfabError::Config(format!(
            "No API key found. Set {} or credentials.api_key in {}",
            settings.credentials.api_key_env,
            Settings::default_path().display()
        ))
    })?;

    let provider = args
        .provider
        .clone()
        .unwrap_or_else(|| settings.defaults.provider.clone());
    let model = args
        .model
        .clone()
        .unwrap_or_else(|| settings.defaults.model.clone());
    let system = args
        .system
        .clone()
        .unwrap_or_else(|| settings.defaults.system_prompt.clone());

    let transport: Arc<dyn CompletionTransport> = Arc::new(OpenAiCompatTransport::new());
    let mut session = ChatSession::builder(api_key)
        .with_system_message(system)
        .with_model(provider, model)
        .with_app_id(settings.get_app_id())
        .with_routing(settings.routing_policy())
        .with_transport(transport)
        .build()?;

    let params = args
        .params
        .iter()
        .map(|raw| parse_param(raw))
        .collect::<Result<Vec<_>>>()?;
    session.with_params(params);

    let turn = build_turn(&args)?;

    if !args.multimodal {
        let text = session.send(turn).await?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "text": text }))?);
        } else {
            println!("{}", text);
        }
        return Ok(());
    }

    let (text, images) = session.send_multimodal(turn).await?;
    let written = match args.out_dir {
        Some(ref dir) => write_images(dir, &images)?,
        None => Vec::new(),
    };

    if args.json {
        let output = serde_json::json!({
            "text": text,
            "images": images,
            "files": written,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if let Some(text) = text {
        println!("{}", text);
    }
    if written.is_empty() {
        for image in &images {
            println!("[image {} ({} base64 chars)]", image.mime_type, image.data.len());
        }
    } else {
        for path in &written {
            println!("[image saved to {}]", path.display());
        }
    }
    Ok(())
}

/// Assemble the user turn from the prompt and attachment flags.
fn build_turn(args: &AskArgs) -> Result<UserTurn> {
    let mut turn = UserTurn::text(args.prompt.clone());
    for raw in &args.attachments {
        let (mime, path) = parse_attachment(raw)?;
        turn = turn.with_part(ContentPart::file_with_mime_type(mime, path)?);
    }
    for path in &args.images {
        turn = turn.with_part(ContentPart::image_from_path(path)?);
    }
    Ok(turn)
}

/// Decode and write images as `image-{n}.{ext}` under `dir`.
fn write_images(dir: &Path, images: &[ImageData]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    images
        .iter()
        .enumerate()
        .map(|(index, image)| {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(image.data.trim())
                .map_err(|e| {
                    ConfabError::Chat(format!("Image {} is not valid base64: {}", index + 1, e))
                })?;
            let path = dir.join(format!("image-{}.{}", index + 1, extension_for(&image.mime_type)));
            std::fs::write(&path, bytes)?;
            tracing::debug!(path = %path.display(), "Wrote reply image");
            Ok(path)
        })
        .collect()
}

fn extension_for(mime_type: &str) -> &str {
    match mime_type.strip_prefix("image/") {
        Some("jpeg") => "jpg",
        Some("svg+xml") => "svg",
        Some(subtype) if !subtype.is_empty() && subtype.chars().all(|c| c.is_ascii_alphanumeric()) => {
            subtype
        }
        _ => "bin",
    }
}
