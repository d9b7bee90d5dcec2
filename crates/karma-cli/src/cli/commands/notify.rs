use std::path::PathBuf;

use anyhow::{Context, Result};
use karma_core::api::ApiClient;
use karma_core::api::notifications::{self, Notification};
use karma_core::config::Config;

use super::upload::upload_media;

pub struct NotifyInput {
    pub user: String,
    pub title: String,
    pub description: String,
    pub media: Option<PathBuf>,
    pub event_type: String,
}

pub async fn run(api: &ApiClient, config: &Config, input: NotifyInput) -> Result<()> {
    let mut notification = Notification::for_user(input.user, input.title, input.description)
        .with_event_type(input.event_type);

    if let Some(file) = input.media.as_deref() {
        let url = upload_media(config, file).await?;
        println!("Uploaded media: {url}");
        notification = notification.with_media(url);
    }

    notifications::send(api, &notification)
        .await
        .context("send notification")?;
    println!(
        "✓ Notification {} sent to {}",
        notification.notification_id, notification.notified_to
    );
    Ok(())
}
