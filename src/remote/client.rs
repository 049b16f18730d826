// ABOUTME: HTTP client for communicating with the import scheduler REST API
// ABOUTME: Handles connection, catalogue and import endpoints with status-aware errors

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use super::backend::ImportBackend;
use super::models::{
    Connection, ConnectionId, ConnectionIdRequest, ConnectionType, CreateImportRequest,
    DialingList, HubSpotList, ImportId, ImportRecord, MappingFormat, NewConnectionRequest,
    UserUuidRequest,
};
use crate::error::{ConsoleError, Result};

const MAX_LOG_BODY_CHARS: usize = 512;

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    api_base_url: String,
}

impl ApiClient {
    pub fn new(api_base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.api_base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    /// Turns a non-success response into `ConsoleError::Request` carrying the body text.
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("API response error ({}): {}", status, preview);

        let message = if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            body
        };
        Err(ConsoleError::request(status.as_u16(), message))
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let response = Self::check(response).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn text(response: Response) -> Result<String> {
        let response = Self::check(response).await?;
        Ok(response.text().await?)
    }

    async fn empty(response: Response) -> Result<()> {
        Self::check(response).await.map(|_| ())
    }
}

#[async_trait]
impl ImportBackend for ApiClient {
    async fn list_connections(&self, user_uuid: &str) -> Result<Vec<Connection>> {
        let response = self
            .client
            .get(self.url("/connections"))
            .query(&[("userId", user_uuid)])
            .send()
            .await?;
        Self::json(response).await
    }

    async fn list_connections_by_type(
        &self,
        kind: ConnectionType,
        user_uuid: &str,
    ) -> Result<Vec<Connection>> {
        let url = self.url(&format!("/connections/{}", kind));
        debug!("Getting {} connections", kind);
        let response = self
            .client
            .post(&url)
            .json(&UserUuidRequest { user_uuid })
            .send()
            .await?;
        Self::json(response).await
    }

    async fn create_connection(&self, request: &NewConnectionRequest) -> Result<String> {
        let response = self
            .client
            .post(self.url("/connections"))
            .json(request)
            .send()
            .await?;
        Self::text(response).await
    }

    async fn delete_connection(&self, id: ConnectionId) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/connections/{}", id)))
            .send()
            .await?;
        Self::empty(response).await
    }

    async fn list_hubspot_lists(&self, connection_id: ConnectionId) -> Result<Vec<HubSpotList>> {
        let response = self
            .client
            .post(self.url("/connections/hubspot/lists"))
            .json(&ConnectionIdRequest { id: connection_id })
            .send()
            .await?;
        Self::json(response).await
    }

    async fn list_dialing_lists(&self, connection_id: ConnectionId) -> Result<Vec<DialingList>> {
        let response = self
            .client
            .post(self.url("/connections/five9/dialing-lists"))
            .json(&ConnectionIdRequest { id: connection_id })
            .send()
            .await?;
        Self::json(response).await
    }

    async fn hubspot_properties(&self, connection_id: ConnectionId) -> Result<Vec<String>> {
        let response = self
            .client
            .get(self.url(&format!("/hubspot-properties/{}", connection_id)))
            .send()
            .await?;
        Self::json(response).await
    }

    async fn five9_contact_fields(&self, connection_id: ConnectionId) -> Result<Vec<String>> {
        let response = self
            .client
            .get(self.url(&format!("/five9-contact-fields/{}", connection_id)))
            .send()
            .await?;
        Self::json(response).await
    }

    async fn mapping_formats(&self) -> Result<Vec<MappingFormat>> {
        let response = self.client.get(self.url("/mapping-formats")).send().await?;
        Self::json(response).await
    }

    async fn create_import(&self, request: &CreateImportRequest) -> Result<String> {
        debug!(
            "Submitting import '{}' with {} mapping(s)",
            request.import_name,
            request.mapping.len()
        );
        let response = self
            .client
            .post(self.url("/imports"))
            .json(request)
            .send()
            .await?;
        Self::text(response).await
    }

    async fn list_imports(&self, user_uuid: &str) -> Result<Vec<ImportRecord>> {
        let response = self
            .client
            .get(self.url("/imports"))
            .query(&[("userUuid", user_uuid)])
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await?;
        Self::json(response).await
    }

    async fn delete_import(&self, id: ImportId) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/imports/{}", id)))
            .send()
            .await?;
        Self::empty(response).await
    }

    async fn start_import(&self, id: ImportId) -> Result<()> {
        let response = self
            .client
            .post(self.url(&format!("/imports/{}/start", id)))
            .send()
            .await?;
        Self::empty(response).await
    }

    async fn stop_import(&self, id: ImportId) -> Result<()> {
        let response = self
            .client
            .post(self.url(&format!("/imports/{}/stop", id)))
            .send()
            .await?;
        Self::empty(response).await
    }

    async fn run_import(&self, id: ImportId) -> Result<()> {
        let response = self
            .client
            .post(self.url(&format!("/imports/{}/run", id)))
            .send()
            .await?;
        Self::empty(response).await
    }

    async fn scheduled_cron_expressions(&self) -> Result<HashMap<ImportId, String>> {
        let response = self
            .client
            .get(self.url("/imports/schedules"))
            .send()
            .await?;
        Self::json(response).await
    }
}
