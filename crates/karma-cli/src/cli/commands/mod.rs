//! CLI command handlers.

pub mod auth;
pub mod banners;
pub mod config;
pub mod help;
pub mod notify;
pub mod products;
pub mod upload;
pub mod users;
pub mod withdrawals;

use anyhow::{Context, Result};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use karma_core::api::ApiClient;
use karma_core::config::Config;
use karma_core::session::SessionManager;

/// Returns a backend client carrying the session token.
///
/// Fails with "Not logged in" when no session is held.
pub fn authorized_api(session: &SessionManager, config: &Config) -> Result<ApiClient> {
    if !session.is_authenticated() {
        anyhow::bail!("Not logged in. Run `karma login --phone <PHONE>` first.");
    }
    session
        .api_client(&config.api_base_url)
        .context("create api client")
}

/// Renders rows as a table sized to the content.
pub fn render_table<const N: usize>(header: [&str; N], rows: Vec<[String; N]>) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    for row in rows {
        table.add_row(row);
    }
    table.to_string()
}

/// Formats a currency amount with two decimals.
pub fn amount(value: f64) -> String {
    format!("₹{value:.2}")
}
