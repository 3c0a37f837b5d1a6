// NuageLab: Nuage VSP testbed management written in Rust
// Copyright (C) 2022-2023 Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! The low-level client for the VSD REST API.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::VsdConfig;

/// Time to wait for a response of the VSD.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated client for the VSD REST API.
///
/// The client is constructed without talking to the VSD. [`ApiClient::new_session`]
/// authenticates with HTTP Basic credentials against the `me` resource and stores the API key
/// of the response; every request afterwards authenticates with `user:api_key`.
///
/// All API URLs are rooted at `https://<host>:<port>/nuage/api/v<version>`, where the dots of
/// the configured version are replaced by underscores (`6.0` becomes `v6_0`). VSD
/// installations ship self-signed certificates, so certificate validation is disabled.
#[derive(Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    user: String,
    password: String,
    enterprise: String,
    /// The session API key, populated by [`ApiClient::new_session`].
    api_key: RwLock<Option<String>>,
}

impl ApiClient {
    /// Create a new client bound to the configured VSD endpoint. No request is sent yet.
    pub fn new(config: &VsdConfig) -> Result<Self, VsdError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(VsdError::Client)?;
        let base_url = format!(
            "https://{}/nuage/api/v{}",
            config.server,
            config.api_version.replace('.', "_"),
        );
        Ok(Self {
            client,
            base_url,
            user: config.user.clone(),
            password: config.password.clone(),
            enterprise: config.enterprise.clone(),
            api_key: RwLock::new(None),
        })
    }

    /// The URL of the API root.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The API user of this client.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Whether [`ApiClient::new_session`] has succeeded on this client.
    pub async fn has_session(&self) -> bool {
        self.api_key.read().await.is_some()
    }

    /// Authenticate against the VSD and store the session API key.
    ///
    /// The call is idempotent: when a key is already present, it returns immediately without
    /// going to the network.
    pub async fn new_session(&self) -> Result<(), VsdError> {
        if self.has_session().await {
            log::trace!("[{}] API session is already established", self.base_url);
            return Ok(());
        }

        log::debug!("[{}] creating a new API session for {}", self.base_url, self.user);

        let response = self
            .client
            .get(self.url("me"))
            .basic_auth(&self.user, Some(&self.password))
            .header("X-Nuage-Organization", &self.enterprise)
            .send()
            .await?;
        let me = Self::into_objects(response).await?;
        let key = me
            .first()
            .and_then(|user| user["APIKey"].as_str())
            .ok_or(VsdError::MissingApiKey)?
            .to_string();

        *self.api_key.write().await = Some(key);
        log::trace!("[{}] API session established!", self.base_url);
        Ok(())
    }

    /// Fetch a resource collection (e.g. `enterprises`). Requires an established session.
    pub async fn get(&self, resource: impl AsRef<str>) -> Result<Vec<Value>, VsdError> {
        self.request(resource.as_ref(), None).await
    }

    /// Fetch a resource collection restricted by an `X-Nuage-Filter` predicate, like
    /// `name IS "my-domain"`.
    pub async fn get_filtered(
        &self,
        resource: impl AsRef<str>,
        filter: impl AsRef<str>,
    ) -> Result<Vec<Value>, VsdError> {
        self.request(resource.as_ref(), Some(filter.as_ref())).await
    }

    async fn request(&self, resource: &str, filter: Option<&str>) -> Result<Vec<Value>, VsdError> {
        let key = self.api_key.read().await.clone().ok_or(VsdError::NoSession)?;

        log::trace!("[{}] GET {resource}", self.base_url);
        let mut request = self
            .client
            .get(self.url(resource))
            .basic_auth(&self.user, Some(&key))
            .header("X-Nuage-Organization", &self.enterprise);
        if let Some(filter) = filter {
            request = request.header("X-Nuage-Filter", filter);
        }

        Self::into_objects(request.send().await?).await
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url, resource)
    }

    /// Check the response status and read the body as a list of API objects. The VSD answers
    /// `204 No Content` for an empty collection.
    async fn into_objects(response: Response) -> Result<Vec<Value>, VsdError> {
        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("VSD API returned {status}: {body}");
            return Err(VsdError::Api { status, body });
        }
        match response.json::<Value>().await? {
            Value::Array(objects) => Ok(objects),
            other => Err(VsdError::UnexpectedPayload(other.to_string())),
        }
    }
}

/// Error of the VSD REST client.
#[derive(Debug, Error)]
pub enum VsdError {
    /// Cannot construct the HTTP client.
    #[error("Cannot create the HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    /// Error while talking to the VSD.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The VSD returned an unexpected status code.
    #[error("VSD API returned {status}: {body}")]
    Api {
        /// The returned status code.
        status: StatusCode,
        /// The body of the error response.
        body: String,
    },
    /// The login response carries no API key.
    #[error("The VSD login response carries no API key")]
    MissingApiKey,
    /// A request was made before establishing a session.
    #[error("No API session, call `new_session` first")]
    NoSession,
    /// The VSD returned something that is not a list of objects.
    #[error("Unexpected VSD payload: {0}")]
    UnexpectedPayload(String),
}
