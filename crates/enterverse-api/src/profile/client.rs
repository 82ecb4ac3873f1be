use reqwest::Client;

use super::error::ProfileError;
use super::types::{Profile, ProfileResponse};
use crate::http::endpoint;

pub const BASE_URL: &str = "https://reqres.in/api";

/// Client for the fixed single-user profile resource.
pub struct ProfileClient {
    base_url: String,
    user_id: u64,
    api_key: Option<String>,
    http: Client,
}

impl ProfileClient {
    pub fn new(user_id: u64) -> Self {
        Self {
            base_url: BASE_URL.into(),
            user_id,
            api_key: None,
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sent as the `x-api-key` header when set.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    /// `GET /users/{id}`.
    pub async fn fetch_profile(&self) -> Result<Profile, ProfileError> {
        let user_id = self.user_id.to_string();
        let url = endpoint(&self.base_url, &["users", user_id.as_str()])?;
        tracing::debug!(path = url.path(), "Profile request");

        let mut req = self.http.get(url);
        if let Some(ref key) = self.api_key {
            req = req.header("x-api-key", key);
        }
        let resp = req.send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status, "Profile API error");
            return Err(ProfileError::Api {
                status,
                message: body,
            });
        }

        let body: ProfileResponse = resp
            .json()
            .await
            .map_err(|e| ProfileError::Parse(e.to_string()))?;
        Ok(body.data)
    }
}
