use serde_json::json;
use tracing::info;

use super::ApiClient;
use crate::error::AdminError;

const PRODUCTS_PATH: &str = "/v1/admin/products";

/// Registers a product URL with the backend.
///
/// # Errors
/// `Validation` for an empty URL, otherwise `Network`, `Service` or `Decode`.
pub async fn add_product_url(api: &ApiClient, product_url: &str) -> Result<(), AdminError> {
    let product_url = product_url.trim();
    if product_url.is_empty() {
        return Err(AdminError::validation("Please enter a product URL"));
    }

    api.post_ack(
        PRODUCTS_PATH,
        &json!({ "productUrl": product_url }),
        "Failed to add product URL",
    )
    .await?;
    info!(%product_url, "product url added");
    Ok(())
}
