//! Help and callback requests.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::ApiClient;
use crate::error::AdminError;
use crate::listing::{Searchable, StatusFilter, contains_ci, search};

const HELP_PATH: &str = "/v1/admin/help";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HelpStatus {
    #[default]
    Pending,
    InProgress,
    Resolved,
}

impl HelpStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            HelpStatus::Pending => "pending",
            HelpStatus::InProgress => "in_progress",
            HelpStatus::Resolved => "resolved",
        }
    }
}

impl FromStr for HelpStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "pending" => Ok(HelpStatus::Pending),
            "in_progress" => Ok(HelpStatus::InProgress),
            "resolved" => Ok(HelpStatus::Resolved),
            other => Err(format!(
                "Unknown help status '{other}' (expected all, pending, in_progress or resolved)"
            )),
        }
    }
}

impl fmt::Display for HelpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelpRequest {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub is_callback: bool,
    pub status: HelpStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl Searchable for HelpRequest {
    fn matches(&self, query: &str) -> bool {
        contains_ci(&self.title, query) || contains_ci(&self.description, query)
    }
}

/// Counts shown above the help request table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HelpStats {
    pub total: usize,
    pub pending: usize,
    pub resolved: usize,
}

impl HelpStats {
    pub fn compute(requests: &[HelpRequest]) -> Self {
        let count = |status| requests.iter().filter(|r| r.status == status).count();
        Self {
            total: requests.len(),
            pending: count(HelpStatus::Pending),
            resolved: count(HelpStatus::Resolved),
        }
    }
}

/// Filters by status, then by title/description text.
pub fn filter<'a>(
    requests: &'a [HelpRequest],
    query: &str,
    status: StatusFilter<HelpStatus>,
) -> Vec<&'a HelpRequest> {
    search(requests, query)
        .into_iter()
        .filter(|r| status.accepts(&r.status))
        .collect()
}

/// # Errors
/// `Network`, `Service` or `Decode`.
pub async fn list(api: &ApiClient) -> Result<Vec<HelpRequest>, AdminError> {
    api.get_data(HELP_PATH, "Failed to fetch help requests")
        .await
}

/// # Errors
/// `Network`, `Service` or `Decode`.
pub async fn delete(api: &ApiClient, request_id: &str) -> Result<(), AdminError> {
    api.delete_ack(
        &format!("{HELP_PATH}/{request_id}"),
        "Failed to delete help request",
    )
    .await?;
    info!(%request_id, "help request deleted");
    Ok(())
}
