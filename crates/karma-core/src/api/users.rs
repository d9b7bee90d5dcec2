use serde::{Deserialize, Serialize};

use super::ApiClient;
use crate::error::AdminError;
use crate::listing::{Searchable, contains_ci};

const USERS_PATH: &str = "/v1/admin/users";

/// A consumer account as listed on the users screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub dob: Option<String>,
    pub referral_code: Option<String>,
    pub region: Option<String>,
    pub wallet_balance: f64,
    pub completed_cashback: Option<f64>,
    pub pending_cashback: Option<f64>,
    pub total_cashback: f64,
}

impl Searchable for User {
    fn matches(&self, query: &str) -> bool {
        contains_ci(&self.username, query)
            || contains_ci(&self.email, query)
            || self.id.contains(query)
    }
}

/// Aggregate counts plus the full user list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserStats {
    pub total_users: u64,
    pub active_users: u64,
    pub total_withdrawals: u64,
    pub total_cashback_amount: f64,
    pub users: Vec<User>,
}

/// Fetches user statistics.
///
/// # Errors
/// `Network`, `Service` or `Decode` per [`ApiClient::send`].
pub async fn fetch_stats(api: &ApiClient) -> Result<UserStats, AdminError> {
    api.get_data(USERS_PATH, "Failed to fetch user stats").await
}
