// ABOUTME: Backend seam used by the wizard, projector and connection flows
// ABOUTME: Implemented by the HTTP client; swapped for an in-memory double in tests

use async_trait::async_trait;
use std::collections::HashMap;

use super::models::{
    Connection, ConnectionId, ConnectionType, CreateImportRequest, DialingList, HubSpotList,
    ImportId, ImportRecord, MappingFormat, NewConnectionRequest,
};
use crate::error::Result;

#[async_trait]
pub trait ImportBackend: Send + Sync {
    async fn list_connections(&self, user_uuid: &str) -> Result<Vec<Connection>>;

    async fn list_connections_by_type(
        &self,
        kind: ConnectionType,
        user_uuid: &str,
    ) -> Result<Vec<Connection>>;

    /// Returns the backend's confirmation text.
    async fn create_connection(&self, request: &NewConnectionRequest) -> Result<String>;

    async fn delete_connection(&self, id: ConnectionId) -> Result<()>;

    async fn list_hubspot_lists(&self, connection_id: ConnectionId) -> Result<Vec<HubSpotList>>;

    async fn list_dialing_lists(&self, connection_id: ConnectionId) -> Result<Vec<DialingList>>;

    async fn hubspot_properties(&self, connection_id: ConnectionId) -> Result<Vec<String>>;

    async fn five9_contact_fields(&self, connection_id: ConnectionId) -> Result<Vec<String>>;

    async fn mapping_formats(&self) -> Result<Vec<MappingFormat>>;

    /// Returns the backend's confirmation text.
    async fn create_import(&self, request: &CreateImportRequest) -> Result<String>;

    async fn list_imports(&self, user_uuid: &str) -> Result<Vec<ImportRecord>>;

    async fn delete_import(&self, id: ImportId) -> Result<()>;

    async fn start_import(&self, id: ImportId) -> Result<()>;

    async fn stop_import(&self, id: ImportId) -> Result<()>;

    async fn run_import(&self, id: ImportId) -> Result<()>;

    async fn scheduled_cron_expressions(&self) -> Result<HashMap<ImportId, String>>;
}
