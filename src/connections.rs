// ABOUTME: Connection management: creation form validation, listing and bulk deletion
// ABOUTME: Secrets are only ever sent, never read back

use tracing::{debug, info};

use crate::bulk::delete_each;
use crate::error::{ConsoleError, Result};
use crate::remote::models::{Connection, ConnectionId, ConnectionType, NewConnectionRequest};
use crate::remote::ImportBackend;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Hubspot { access_token: String },
    Five9 { username: String, password: String },
}

impl Credentials {
    pub fn kind(&self) -> ConnectionType {
        match self {
            Credentials::Hubspot { .. } => ConnectionType::Hubspot,
            Credentials::Five9 { .. } => ConnectionType::Five9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDraft {
    pub name: String,
    pub description: Option<String>,
    pub credentials: Credentials,
}

impl ConnectionDraft {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ConsoleError::validation("Connection name is required."));
        }
        match &self.credentials {
            Credentials::Hubspot { access_token } if access_token.trim().is_empty() => Err(
                ConsoleError::validation("A HubSpot access token is required."),
            ),
            Credentials::Five9 { username, password }
                if username.trim().is_empty() || password.trim().is_empty() =>
            {
                Err(ConsoleError::validation(
                    "A Five9 username and password are required.",
                ))
            }
            _ => Ok(()),
        }
    }

    pub fn into_request(self, user_uuid: &str) -> Result<NewConnectionRequest> {
        self.validate()?;
        let connection_type = self.credentials.kind();
        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        let (hubspot_access_token, five9_username, five9_password) = match self.credentials {
            Credentials::Hubspot { access_token } => (Some(access_token), None, None),
            Credentials::Five9 { username, password } => (None, Some(username), Some(password)),
        };

        Ok(NewConnectionRequest {
            name: self.name.trim().to_string(),
            description,
            connection_type,
            user_uuid: user_uuid.to_string(),
            five9_username,
            five9_password,
            hubspot_access_token,
        })
    }
}

/// The user's saved connections as last loaded.
pub struct ConnectionDirectory {
    user_uuid: String,
    connections: Vec<Connection>,
}

impl ConnectionDirectory {
    pub fn new(user_uuid: impl Into<String>) -> Self {
        Self {
            user_uuid: user_uuid.into(),
            connections: Vec::new(),
        }
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub async fn refresh(&mut self, backend: &dyn ImportBackend) -> Result<usize> {
        self.connections = backend.list_connections(&self.user_uuid).await?;
        debug!("Loaded {} connection(s)", self.connections.len());
        Ok(self.connections.len())
    }

    /// Validates locally first; backend rejection text comes back verbatim in the error.
    pub async fn create(
        &mut self,
        backend: &dyn ImportBackend,
        draft: ConnectionDraft,
    ) -> Result<String> {
        let request = draft.into_request(&self.user_uuid)?;
        let message = backend.create_connection(&request).await?;
        info!("Saved {} connection '{}'", request.connection_type, request.name);
        if let Err(e) = self.refresh(backend).await {
            tracing::warn!("Failed to reload connections after save: {}", e);
        }
        Ok(message)
    }

    pub async fn delete_selected(
        &mut self,
        backend: &dyn ImportBackend,
        ids: &[ConnectionId],
    ) -> Result<usize> {
        let report = delete_each(ids, |id| backend.delete_connection(id)).await;
        self.connections.retain(|c| !report.deleted.contains(&c.id));
        report.into_result()
    }
}
