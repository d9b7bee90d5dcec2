//! Promotional banners.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::ApiClient;
use crate::error::AdminError;
use crate::listing::{Searchable, StatusFilter, contains_ci};

const BANNERS_PATH: &str = "/v1/admin/banners";
const UPDATE_BANNER_PATH: &str = "/v1/admin/banners/update";
const DELETE_BANNER_PATH: &str = "/v1/admin/banners/delete";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Banner {
    pub banner_id: String,
    pub redirect_url: String,
    pub banner_image: String,
    pub name: String,
    pub timestamp: String,
    pub start_time: String,
    pub end_time: String,
    pub expiry: String,
    pub active: bool,
}

impl Banner {
    pub fn status(&self) -> BannerStatus {
        if self.active {
            BannerStatus::Active
        } else {
            BannerStatus::Inactive
        }
    }
}

impl Searchable for Banner {
    fn matches(&self, query: &str) -> bool {
        contains_ci(&self.name, query)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerStatus {
    Active,
    Inactive,
}

impl FromStr for BannerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(BannerStatus::Active),
            "inactive" => Ok(BannerStatus::Inactive),
            other => Err(format!(
                "Unknown banner status '{other}' (expected all, active or inactive)"
            )),
        }
    }
}

impl fmt::Display for BannerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BannerStatus::Active => f.write_str("Active"),
            BannerStatus::Inactive => f.write_str("Inactive"),
        }
    }
}

/// Fields for a new banner. Times are RFC 3339 UTC strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BannerDraft {
    pub name: String,
    pub banner_image: String,
    pub redirect_url: String,
    pub start_time: String,
    pub end_time: String,
    pub expiry: String,
    pub active: bool,
}

impl BannerDraft {
    /// Builds a draft that expires at `end_time`.
    pub fn new(
        name: impl Into<String>,
        banner_image: impl Into<String>,
        redirect_url: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        let end_time = end_time.into();
        Self {
            name: name.into(),
            banner_image: banner_image.into(),
            redirect_url: redirect_url.into(),
            start_time: start_time.into(),
            expiry: end_time.clone(),
            end_time,
            active: true,
        }
    }

    fn validate(&self) -> Result<(), AdminError> {
        require_fields(&[
            self.name.as_str(),
            self.banner_image.as_str(),
            self.redirect_url.as_str(),
            self.start_time.as_str(),
            self.end_time.as_str(),
        ])
    }
}

/// Field edits applied to an existing banner. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BannerPatch {
    pub name: Option<String>,
    pub banner_image: Option<String>,
    pub redirect_url: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub active: Option<bool>,
}

impl BannerPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns `banner` with the patch applied; `expiry` follows `end_time`.
    pub fn apply(self, mut banner: Banner) -> Banner {
        if let Some(name) = self.name {
            banner.name = name;
        }
        if let Some(image) = self.banner_image {
            banner.banner_image = image;
        }
        if let Some(url) = self.redirect_url {
            banner.redirect_url = url;
        }
        if let Some(start) = self.start_time {
            banner.start_time = start;
        }
        if let Some(end) = self.end_time {
            banner.expiry.clone_from(&end);
            banner.end_time = end;
        }
        if let Some(active) = self.active {
            banner.active = active;
        }
        banner
    }
}

fn require_fields(values: &[&str]) -> Result<(), AdminError> {
    if values.iter().any(|v| v.trim().is_empty()) {
        return Err(AdminError::validation("Please fill all required fields"));
    }
    Ok(())
}

/// Filters banners by name and active status.
pub fn filter<'a>(
    banners: &'a [Banner],
    query: &str,
    status: StatusFilter<BannerStatus>,
) -> Vec<&'a Banner> {
    crate::listing::search(banners, query)
        .into_iter()
        .filter(|b| status.accepts(&b.status()))
        .collect()
}

/// # Errors
/// `Network`, `Service` or `Decode`.
pub async fn list(api: &ApiClient) -> Result<Vec<Banner>, AdminError> {
    api.get_data(BANNERS_PATH, "Failed to fetch banners").await
}

/// Looks a banner up by id in the current list.
///
/// # Errors
/// `Validation` when no banner has that id, or any [`list`] error.
pub async fn find(api: &ApiClient, banner_id: &str) -> Result<Banner, AdminError> {
    list(api)
        .await?
        .into_iter()
        .find(|b| b.banner_id == banner_id)
        .ok_or_else(|| AdminError::validation(format!("Banner '{banner_id}' not found")))
}

/// Creates a banner and returns it as stored by the server.
///
/// # Errors
/// `Validation` for missing fields, otherwise as [`list`].
pub async fn create(api: &ApiClient, draft: &BannerDraft) -> Result<Banner, AdminError> {
    draft.validate()?;
    let banner: Banner = api
        .post_data(BANNERS_PATH, draft, "Failed to create banner")
        .await?;
    info!(banner_id = %banner.banner_id, "banner created");
    Ok(banner)
}

/// Replaces a banner with `banner`.
///
/// # Errors
/// `Validation` for missing fields, otherwise as [`list`].
pub async fn update(api: &ApiClient, banner: &Banner) -> Result<(), AdminError> {
    require_fields(&[
        banner.banner_id.as_str(),
        banner.name.as_str(),
        banner.banner_image.as_str(),
        banner.redirect_url.as_str(),
        banner.start_time.as_str(),
        banner.end_time.as_str(),
    ])?;
    api.post_ack(UPDATE_BANNER_PATH, banner, "Failed to update banner")
        .await?;
    info!(banner_id = %banner.banner_id, "banner updated");
    Ok(())
}

/// Flips a banner's active flag and returns the new state.
///
/// # Errors
/// As [`find`] and [`update`].
pub async fn toggle(api: &ApiClient, banner_id: &str) -> Result<Banner, AdminError> {
    let mut banner = find(api, banner_id).await?;
    banner.active = !banner.active;
    update(api, &banner).await?;
    Ok(banner)
}

/// # Errors
/// `Network`, `Service` or `Decode`.
pub async fn delete(api: &ApiClient, banner_id: &str) -> Result<(), AdminError> {
    api.post_ack(
        DELETE_BANNER_PATH,
        &json!({ "banner_id": banner_id }),
        "Failed to delete banner",
    )
    .await?;
    info!(%banner_id, "banner deleted");
    Ok(())
}
