//! Withdrawal requests and their approval.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::ApiClient;
use crate::display::is_same_day;
use crate::error::AdminError;
use crate::listing::{Searchable, StatusFilter};

const WITHDRAWALS_PATH: &str = "/v1/admin/withdrawals";
const UPDATE_WITHDRAWAL_PATH: &str = "/v1/admin/withdrawals/update";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl WithdrawalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Approved => "approved",
            WithdrawalStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for WithdrawalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(WithdrawalStatus::Pending),
            "approved" => Ok(WithdrawalStatus::Approved),
            "rejected" => Ok(WithdrawalStatus::Rejected),
            other => Err(format!(
                "Unknown withdrawal status '{other}' (expected all, pending, approved or rejected)"
            )),
        }
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WithdrawalRequest {
    pub id: String,
    pub user_id: String,
    pub amount: f64,
    pub timestamp: String,
    /// Missing on the wire means pending.
    pub status: WithdrawalStatus,
    pub payment_method: Option<String>,
    pub payment_details: Option<String>,
}

impl Searchable for WithdrawalRequest {
    fn matches(&self, query: &str) -> bool {
        self.user_id.to_lowercase().contains(query) || self.amount.to_string().contains(query)
    }
}

/// Daily counters shown above the withdrawals table.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WithdrawalStats {
    pub pending: usize,
    pub approved_today: usize,
    pub approved_today_amount: f64,
    pub rejected_today: usize,
    pub rejected_today_amount: f64,
}

impl WithdrawalStats {
    /// Computes counters, with "today" taken in the timezone of `now`.
    pub fn compute<Tz: TimeZone>(requests: &[WithdrawalRequest], now: &DateTime<Tz>) -> Self {
        let mut stats = Self::default();
        for request in requests {
            match request.status {
                WithdrawalStatus::Pending => stats.pending += 1,
                WithdrawalStatus::Approved if is_same_day(&request.timestamp, now) => {
                    stats.approved_today += 1;
                    stats.approved_today_amount += request.amount;
                }
                WithdrawalStatus::Rejected if is_same_day(&request.timestamp, now) => {
                    stats.rejected_today += 1;
                    stats.rejected_today_amount += request.amount;
                }
                WithdrawalStatus::Approved | WithdrawalStatus::Rejected => {}
            }
        }
        stats
    }
}

/// Decision taken on a pending withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn resulting_status(self) -> WithdrawalStatus {
        match self {
            Decision::Approve => WithdrawalStatus::Approved,
            Decision::Reject => WithdrawalStatus::Rejected,
        }
    }
}

/// Filters by status, then by user id or amount.
pub fn filter<'a>(
    requests: &'a [WithdrawalRequest],
    query: &str,
    status: StatusFilter<WithdrawalStatus>,
) -> Vec<&'a WithdrawalRequest> {
    crate::listing::search(requests, query)
        .into_iter()
        .filter(|r| status.accepts(&r.status))
        .collect()
}

/// # Errors
/// `Network`, `Service` or `Decode`.
pub async fn list(api: &ApiClient) -> Result<Vec<WithdrawalRequest>, AdminError> {
    api.get_data(WITHDRAWALS_PATH, "Failed to fetch withdrawal requests")
        .await
}

/// Approves or rejects a pending withdrawal and returns it with its new status.
///
/// # Errors
/// `Validation` if the request does not exist or is no longer pending,
/// otherwise `Network`, `Service` or `Decode`.
pub async fn decide(
    api: &ApiClient,
    request_id: &str,
    decision: Decision,
) -> Result<WithdrawalRequest, AdminError> {
    let mut request = list(api)
        .await?
        .into_iter()
        .find(|r| r.id == request_id)
        .ok_or_else(|| {
            AdminError::validation(format!("Withdrawal request '{request_id}' not found"))
        })?;

    if request.status != WithdrawalStatus::Pending {
        return Err(AdminError::validation(format!(
            "Withdrawal request '{request_id}' is already {}",
            request.status
        )));
    }

    let status = decision.resulting_status();
    api.post_ack(
        UPDATE_WITHDRAWAL_PATH,
        &json!({ "id": request_id, "status": status }),
        "Failed to update withdrawal request",
    )
    .await?;

    info!(%request_id, %status, "withdrawal request updated");
    request.status = status;
    Ok(request)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::AdminErrorKind;

    fn withdrawal(id: &str, amount: f64, status: WithdrawalStatus, ts: &str) -> WithdrawalRequest {
        WithdrawalRequest {
            id: id.to_string(),
            user_id: format!("user-{id}"),
            amount,
            timestamp: ts.to_string(),
            status,
            ..Default::default()
        }
    }

    async fn mount_list(server: &MockServer, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(WITHDRAWALS_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": body})),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn test_missing_status_defaults_to_pending() {
        let parsed: WithdrawalRequest =
            serde_json::from_value(json!({"id": "w1", "user_id": "u1", "amount": 50})).unwrap();
        assert_eq!(parsed.status, WithdrawalStatus::Pending);
    }

    #[test]
    fn test_stats_count_today_only() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let today = "2025-03-10T09:00:00Z";
        let earlier = "2025-03-01T09:00:00Z";
        let requests = vec![
            withdrawal("1", 100.0, WithdrawalStatus::Pending, earlier),
            withdrawal("2", 40.0, WithdrawalStatus::Approved, today),
            withdrawal("3", 60.0, WithdrawalStatus::Approved, today),
            withdrawal("4", 999.0, WithdrawalStatus::Approved, earlier),
            withdrawal("5", 25.0, WithdrawalStatus::Rejected, today),
        ];

        let stats = WithdrawalStats::compute(&requests, &now);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.approved_today, 2);
        assert!((stats.approved_today_amount - 100.0).abs() < f64::EPSILON);
        assert_eq!(stats.rejected_today, 1);
        assert!((stats.rejected_today_amount - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_filter_by_user_and_amount() {
        let requests = vec![
            withdrawal("1", 150.0, WithdrawalStatus::Pending, ""),
            withdrawal("2", 75.0, WithdrawalStatus::Approved, ""),
        ];
        assert_eq!(filter(&requests, "user-2", StatusFilter::All)[0].id, "2");
        assert_eq!(filter(&requests, "150", StatusFilter::All)[0].id, "1");
        assert!(
            filter(
                &requests,
                "",
                StatusFilter::Only(WithdrawalStatus::Rejected)
            )
            .is_empty()
        );
    }

    #[tokio::test]
    async fn test_approve_pending_request() {
        let server = MockServer::start().await;
        mount_list(&server, json!([{"id": "w1", "user_id": "u1", "amount": 50}])).await;
        Mock::given(method("POST"))
            .and(path(UPDATE_WITHDRAWAL_PATH))
            .and(body_json(json!({"id": "w1", "status": "approved"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri(), None).unwrap();
        let updated = decide(&api, "w1", Decision::Approve).await.unwrap();
        assert_eq!(updated.status, WithdrawalStatus::Approved);
    }

    #[tokio::test]
    async fn test_decide_rejects_non_pending_request() {
        let server = MockServer::start().await;
        mount_list(
            &server,
            json!([{"id": "w1", "user_id": "u1", "amount": 50, "status": "rejected"}]),
        )
        .await;
        Mock::given(method("POST"))
            .and(path(UPDATE_WITHDRAWAL_PATH))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri(), None).unwrap();
        let err = decide(&api, "w1", Decision::Approve).await.unwrap_err();
        assert_eq!(err.kind, AdminErrorKind::Validation);
        assert!(err.message.contains("already rejected"));
    }
}
