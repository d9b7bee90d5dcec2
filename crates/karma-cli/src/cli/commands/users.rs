use anyhow::{Context, Result};
use karma_core::api::ApiClient;
use karma_core::api::users;
use karma_core::listing::{paginate, search};

use super::{amount, render_table};

pub async fn list(api: &ApiClient, query: &str, page: usize, per_page: usize) -> Result<()> {
    let stats = users::fetch_stats(api).await.context("fetch users")?;
    let matching = search(&stats.users, query);
    if matching.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    let page = paginate(matching, page, per_page);
    let rows = page
        .items
        .iter()
        .map(|u| {
            [
                u.id.clone(),
                u.username.clone(),
                u.email.clone(),
                u.phone.clone(),
                amount(u.wallet_balance),
                amount(u.total_cashback),
            ]
        })
        .collect();
    println!(
        "{}",
        render_table(
            ["ID", "Username", "Email", "Phone", "Wallet", "Cashback"],
            rows
        )
    );
    println!(
        "{} (page {}/{})",
        page.summary("users"),
        page.page,
        page.total_pages
    );
    Ok(())
}

pub async fn stats(api: &ApiClient) -> Result<()> {
    let stats = users::fetch_stats(api).await.context("fetch user stats")?;
    println!("Total users:      {}", stats.total_users);
    println!("Active users:     {}", stats.active_users);
    println!("Withdrawals:      {}", stats.total_withdrawals);
    println!("Cashback paid:    {}", amount(stats.total_cashback_amount));
    Ok(())
}
