use anyhow::{Context, Result};
use karma_core::api::{ApiClient, products};

pub async fn add(api: &ApiClient, url: &str) -> Result<()> {
    products::add_product_url(api, url)
        .await
        .context("add product url")?;
    println!("✓ Product URL added successfully!");
    Ok(())
}
