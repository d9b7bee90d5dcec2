use anyhow::{Context, Result};
use chrono::Local;
use karma_core::api::ApiClient;
use karma_core::api::withdrawals::{self, Decision, WithdrawalStats, WithdrawalStatus};
use karma_core::display::{format_day, format_time};
use karma_core::listing::{StatusFilter, paginate};

use super::{amount, render_table};

pub async fn list(
    api: &ApiClient,
    status: StatusFilter<WithdrawalStatus>,
    query: &str,
    page: usize,
    per_page: usize,
) -> Result<()> {
    let requests = withdrawals::list(api)
        .await
        .context("fetch withdrawal requests")?;
    let matching = withdrawals::filter(&requests, query, status);
    if matching.is_empty() {
        println!("No withdrawal requests found.");
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
                amount(r.amount),
                format_day(&r.timestamp, &now),
                format_time(&r.timestamp, &now),
                r.status.to_string(),
                r.payment_method.clone().unwrap_or_default(),
            ]
        })
        .collect();
    println!(
        "{}",
        render_table(
            ["ID", "User", "Amount", "Date", "Time", "Status", "Method"],
            rows
        )
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
    let requests = withdrawals::list(api)
        .await
        .context("fetch withdrawal requests")?;
    let stats = WithdrawalStats::compute(&requests, &Local::now());
    println!("Pending:          {}", stats.pending);
    println!(
        "Approved today:   {} ({} total)",
        stats.approved_today,
        amount(stats.approved_today_amount)
    );
    println!(
        "Rejected today:   {} ({} total)",
        stats.rejected_today,
        amount(stats.rejected_today_amount)
    );
    Ok(())
}

pub async fn decide(api: &ApiClient, request_id: &str, decision: Decision) -> Result<()> {
    let updated = withdrawals::decide(api, request_id, decision)
        .await
        .context("update withdrawal request")?;
    println!(
        "✓ Withdrawal {} {} ({})",
        updated.id,
        updated.status,
        amount(updated.amount)
    );
    Ok(())
}
