use anyhow::{Context, Result};
use chrono::Local;
use karma_core::api::ApiClient;
use karma_core::api::help::{self, HelpStats, HelpStatus};
use karma_core::display::{format_day, format_time};
use karma_core::listing::{StatusFilter, paginate};

use super::render_table;

pub async fn list(
    api: &ApiClient,
    status: StatusFilter<HelpStatus>,
    query: &str,
    page: usize,
    per_page: usize,
) -> Result<()> {
    let requests = help::list(api).await.context("fetch help requests")?;
    let matching = help::filter(&requests, query, status);
    if matching.is_empty() {
        println!("No help requests found.");
        return Ok(());
    }

    let now = Local::now();
    let page = paginate(matching, page, per_page);
    let rows = page
        .items
        .iter()
        .map(|r| {
            [
                r.id.clone(),
                r.user_id.clone(),
                r.title.clone(),
                if r.is_callback { "callback" } else { "message" }.to_string(),
                r.status.to_string(),
                format!(
                    "{} {}",
                    format_day(&r.created_at, &now),
                    format_time(&r.created_at, &now)
                )
                .trim()
                .to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        render_table(["ID", "User", "Title", "Type", "Status", "Created"], rows)
    );
    println!(
        "{} (page {}/{})",
        page.summary("requests"),
        page.page,
        page.total_pages
    );
    Ok(())
}

pub async fn stats(api: &ApiClient) -> Result<()> {
    let requests = help::list(api).await.context("fetch help requests")?;
    let stats = HelpStats::compute(&requests);
    println!("Total requests:   {}", stats.total);
    println!("Pending:          {}", stats.pending);
    println!("Resolved:         {}", stats.resolved);
    Ok(())
}

pub async fn delete(api: &ApiClient, request_id: &str) -> Result<()> {
    help::delete(api, request_id)
        .await
        .context("delete help request")?;
    println!("✓ Help request deleted ({request_id})");
    Ok(())
}
