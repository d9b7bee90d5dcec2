use std::path::Path;

use anyhow::{Context, Result};
use karma_core::api::upload;
use karma_core::config::Config;

/// Uploads `file` with the configured key and returns the public URL.
pub async fn upload_media(config: &Config, file: &Path) -> Result<String> {
    upload::upload_file(&config.upload_url, config.upload_api_key.as_deref(), file)
        .await
        .with_context(|| format!("upload {}", file.display()))
}

pub async fn run(config: &Config, file: &Path) -> Result<()> {
    let url = upload_media(config, file).await?;
    println!("{url}");
    Ok(())
}
