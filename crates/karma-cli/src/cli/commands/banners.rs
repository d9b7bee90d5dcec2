use anyhow::{Context, Result};
use karma_core::api::ApiClient;
use karma_core::api::banners::{self, BannerDraft, BannerPatch, BannerStatus};
use karma_core::display::{format_date, parse_datetime_input};
use karma_core::listing::StatusFilter;

use super::render_table;

pub async fn list(api: &ApiClient, query: &str, status: StatusFilter<BannerStatus>) -> Result<()> {
    let all = banners::list(api).await.context("fetch banners")?;
    let shown = banners::filter(&all, query, status);
    if shown.is_empty() {
        println!("No banners found.");
        return Ok(());
    }

    let rows = shown
        .iter()
        .map(|b| {
            [
                b.banner_id.clone(),
                b.name.clone(),
                b.status().to_string(),
                format_date(&b.start_time),
                format_date(&b.end_time),
                format_date(&b.timestamp),
                b.redirect_url.clone(),
            ]
        })
        .collect();
    println!(
        "{}",
        render_table(
            ["ID", "Name", "Status", "Start", "End", "Added", "Redirect"],
            rows
        )
    );
    println!("{} of {} banners", shown.len(), all.len());
    Ok(())
}

pub struct CreateInput {
    pub name: String,
    pub image: String,
    pub redirect_url: String,
    pub start: String,
    pub end: String,
    pub active: bool,
}

pub async fn create(api: &ApiClient, input: CreateInput) -> Result<()> {
    let mut draft = BannerDraft::new(
        input.name,
        input.image,
        input.redirect_url,
        parse_datetime_input(&input.start)?,
        parse_datetime_input(&input.end)?,
    );
    draft.active = input.active;

    let banner = banners::create(api, &draft)
        .await
        .context("create banner")?;
    println!("✓ Banner created ({})", banner.banner_id);
    Ok(())
}

pub struct UpdateInput {
    pub name: Option<String>,
    pub image: Option<String>,
    pub redirect_url: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

pub async fn update(api: &ApiClient, banner_id: &str, input: UpdateInput) -> Result<()> {
    let patch = BannerPatch {
        name: input.name,
        banner_image: input.image,
        redirect_url: input.redirect_url,
        start_time: input.start.as_deref().map(parse_datetime_input).transpose()?,
        end_time: input.end.as_deref().map(parse_datetime_input).transpose()?,
        active: None,
    };
    if patch.is_empty() {
        anyhow::bail!(
            "Nothing to update: pass at least one of --name, --image, --redirect-url, --start or --end"
        );
    }

    let current = banners::find(api, banner_id)
        .await
        .context("fetch banner")?;
    let updated = patch.apply(current);
    banners::update(api, &updated)
        .await
        .context("update banner")?;
    println!("✓ Banner updated ({banner_id})");
    println!(
        "  Runs {} to {}",
        format_date(&updated.start_time),
        format_date(&updated.end_time)
    );
    Ok(())
}

pub async fn toggle(api: &ApiClient, banner_id: &str) -> Result<()> {
    let banner = banners::toggle(api, banner_id)
        .await
        .context("toggle banner")?;
    println!("✓ Banner {} is now {}", banner.banner_id, banner.status());
    Ok(())
}

pub async fn delete(api: &ApiClient, banner_id: &str) -> Result<()> {
    banners::delete(api, banner_id)
        .await
        .context("delete banner")?;
    println!("✓ Banner deleted ({banner_id})");
    Ok(())
}
