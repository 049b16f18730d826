// ABOUTME: In-memory backend double for unit tests
// ABOUTME: Records calls and can hold list fetches open to exercise cancellation

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use super::backend::ImportBackend;
use super::models::*;
use crate::error::{ConsoleError, Result};

#[derive(Default)]
pub(crate) struct FakeState {
    pub hubspot_connections: Vec<Connection>,
    pub five9_connections: Vec<Connection>,
    pub hubspot_lists: HashMap<ConnectionId, Vec<HubSpotList>>,
    pub dialing_lists: HashMap<ConnectionId, Vec<DialingList>>,
    pub properties: Vec<String>,
    pub contact_fields: Vec<String>,
    pub formats: Vec<MappingFormat>,
    pub imports: Vec<ImportRecord>,
    pub reject_create: Option<String>,
    pub reject_connection: Option<String>,
    pub fail_deletes: HashSet<i64>,
    pub fail_toggle: bool,
    pub fail_formats: bool,
    pub created_imports: Vec<CreateImportRequest>,
    pub created_connections: Vec<NewConnectionRequest>,
    pub calls: Vec<String>,
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    pub state: Mutex<FakeState>,
    /// When set, HubSpot list fetches wait for a permit before answering.
    pub list_gate: Option<Arc<Notify>>,
}

pub(crate) fn connection(id: ConnectionId, name: &str, kind: ConnectionType) -> Connection {
    Connection {
        id,
        name: name.to_string(),
        connection_type: Some(kind.as_str().to_string()),
        status: Some("ACTIVE".to_string()),
        description: None,
        created_at: None,
    }
}

pub(crate) fn hubspot_list(id: &str) -> HubSpotList {
    HubSpotList {
        list_id: id.to_string(),
        name: id.to_string(),
        list_size: Some("10".to_string()),
        processing_type: Some("MANUAL".to_string()),
        object_type_id: Some("0-1".to_string()),
        last_updated: None,
    }
}

pub(crate) fn dialing_list(name: &str) -> DialingList {
    DialingList {
        name: name.to_string(),
        size: Some("5".to_string()),
        list_type: None,
    }
}

pub(crate) fn import_record(id: ImportId, status: Option<JobStatus>, progress: Option<i32>) -> ImportRecord {
    ImportRecord {
        id,
        uuid: None,
        name: format!("import-{}", id),
        status,
        email_notification: None,
        email: None,
        created_at: None,
        modified_at: None,
        start_datetime: None,
        completion_datetime: None,
        records_imported: None,
        total_records: None,
        progress,
    }
}

impl FakeBackend {
    /// Catalogue with one CRM connection, one VCC connection and their lists.
    pub fn seeded() -> Self {
        let state = FakeState {
            hubspot_connections: vec![connection(1, "CRM-1", ConnectionType::Hubspot)],
            five9_connections: vec![connection(2, "VCC-1", ConnectionType::Five9)],
            hubspot_lists: HashMap::from([(1, vec![hubspot_list("List-42")])]),
            dialing_lists: HashMap::from([(2, vec![dialing_list("DL-7")])]),
            properties: ["firstname", "lastname", "email", "phone", "zip", "company"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            contact_fields: ["first_name", "last_name", "email", "number1", "number2", "zip"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            formats: vec![
                MappingFormat { id: 11, format: Some("plain".to_string()) },
                MappingFormat { id: 12, format: Some("e164".to_string()) },
            ],
            ..Default::default()
        };
        Self {
            state: Mutex::new(state),
            list_gate: None,
        }
    }

    pub fn with_list_gate(mut self, gate: Arc<Notify>) -> Self {
        self.list_gate = Some(gate);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl ImportBackend for FakeBackend {
    async fn list_connections(&self, _user_uuid: &str) -> Result<Vec<Connection>> {
        self.record("list_connections".to_string());
        let state = self.state.lock().unwrap();
        let mut all = state.hubspot_connections.clone();
        all.extend(state.five9_connections.clone());
        Ok(all)
    }

    async fn list_connections_by_type(
        &self,
        kind: ConnectionType,
        _user_uuid: &str,
    ) -> Result<Vec<Connection>> {
        self.record(format!("list_connections_by_type:{}", kind));
        let state = self.state.lock().unwrap();
        Ok(match kind {
            ConnectionType::Hubspot => state.hubspot_connections.clone(),
            ConnectionType::Five9 => state.five9_connections.clone(),
        })
    }

    async fn create_connection(&self, request: &NewConnectionRequest) -> Result<String> {
        self.record("create_connection".to_string());
        let mut state = self.state.lock().unwrap();
        if let Some(reason) = state.reject_connection.clone() {
            return Err(ConsoleError::request(400, reason));
        }
        state.created_connections.push(request.clone());
        Ok("Connection saved.".to_string())
    }

    async fn delete_connection(&self, id: ConnectionId) -> Result<()> {
        self.record(format!("delete_connection:{}", id));
        let mut state = self.state.lock().unwrap();
        if state.fail_deletes.contains(&id) {
            return Err(ConsoleError::request(404, "Connection not found."));
        }
        state.hubspot_connections.retain(|c| c.id != id);
        state.five9_connections.retain(|c| c.id != id);
        Ok(())
    }

    async fn list_hubspot_lists(&self, connection_id: ConnectionId) -> Result<Vec<HubSpotList>> {
        self.record(format!("list_hubspot_lists:{}", connection_id));
        if let Some(gate) = &self.list_gate {
            gate.notified().await;
        }
        let state = self.state.lock().unwrap();
        Ok(state
            .hubspot_lists
            .get(&connection_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_dialing_lists(&self, connection_id: ConnectionId) -> Result<Vec<DialingList>> {
        self.record(format!("list_dialing_lists:{}", connection_id));
        let state = self.state.lock().unwrap();
        Ok(state
            .dialing_lists
            .get(&connection_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn hubspot_properties(&self, connection_id: ConnectionId) -> Result<Vec<String>> {
        self.record(format!("hubspot_properties:{}", connection_id));
        Ok(self.state.lock().unwrap().properties.clone())
    }

    async fn five9_contact_fields(&self, connection_id: ConnectionId) -> Result<Vec<String>> {
        self.record(format!("five9_contact_fields:{}", connection_id));
        Ok(self.state.lock().unwrap().contact_fields.clone())
    }

    async fn mapping_formats(&self) -> Result<Vec<MappingFormat>> {
        self.record("mapping_formats".to_string());
        let state = self.state.lock().unwrap();
        if state.fail_formats {
            return Err(ConsoleError::request(500, "formats unavailable"));
        }
        Ok(state.formats.clone())
    }

    async fn create_import(&self, request: &CreateImportRequest) -> Result<String> {
        self.record("create_import".to_string());
        let mut state = self.state.lock().unwrap();
        if let Some(reason) = state.reject_create.clone() {
            return Err(ConsoleError::request(400, reason));
        }
        state.created_imports.push(request.clone());
        Ok("Import saved successfully with ID: 1".to_string())
    }

    async fn list_imports(&self, _user_uuid: &str) -> Result<Vec<ImportRecord>> {
        self.record("list_imports".to_string());
        Ok(self.state.lock().unwrap().imports.clone())
    }

    async fn delete_import(&self, id: ImportId) -> Result<()> {
        self.record(format!("delete_import:{}", id));
        let mut state = self.state.lock().unwrap();
        if state.fail_deletes.contains(&id) {
            return Err(ConsoleError::request(404, "Import not found"));
        }
        state.imports.retain(|r| r.id != id);
        Ok(())
    }

    async fn start_import(&self, id: ImportId) -> Result<()> {
        self.record(format!("start_import:{}", id));
        let mut state = self.state.lock().unwrap();
        if state.fail_toggle {
            return Err(ConsoleError::request(400, "Failed to start import"));
        }
        if let Some(record) = state.imports.iter_mut().find(|r| r.id == id) {
            record.status = Some(JobStatus::Starting);
        }
        Ok(())
    }

    async fn stop_import(&self, id: ImportId) -> Result<()> {
        self.record(format!("stop_import:{}", id));
        let mut state = self.state.lock().unwrap();
        if state.fail_toggle {
            return Err(ConsoleError::request(500, "Error stopping import"));
        }
        if let Some(record) = state.imports.iter_mut().find(|r| r.id == id) {
            record.status = Some(JobStatus::Paused);
        }
        Ok(())
    }

    async fn run_import(&self, id: ImportId) -> Result<()> {
        self.record(format!("run_import:{}", id));
        Ok(())
    }

    async fn scheduled_cron_expressions(&self) -> Result<HashMap<ImportId, String>> {
        self.record("scheduled_cron_expressions".to_string());
        Ok(HashMap::new())
    }
}
