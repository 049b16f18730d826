// ABOUTME: Data structures exchanged with the import scheduler backend
// ABOUTME: These are serialized to JSON (camelCase) for API communication

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type ConnectionId = i64;
pub type ImportId = i64;
pub type MappingId = u32;

/// The two account classes a connection can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    /// CRM-class source.
    Hubspot,
    /// VCC-class destination.
    Five9,
}

impl ConnectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionType::Hubspot => "hubspot",
            ConnectionType::Five9 => "five9",
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A saved connection as returned by the backend. Secrets are never read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: ConnectionId,
    pub name: String,
    #[serde(rename = "type")]
    pub connection_type: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConnectionRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub connection_type: ConnectionType,
    pub user_uuid: String,
    pub five9_username: Option<String>,
    pub five9_password: Option<String>,
    pub hubspot_access_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubSpotList {
    pub list_id: String,
    pub name: String,
    pub list_size: Option<String>,
    pub processing_type: Option<String>,
    pub object_type_id: Option<String>,
    pub last_updated: Option<String>,
}

/// Five9 dialing lists are identified by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialingList {
    pub name: String,
    pub size: Option<String>,
    #[serde(rename = "type")]
    pub list_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingFormat {
    pub id: i64,
    pub format: Option<String>,
}

/// One source-property-to-destination-field correspondence.
///
/// The connection and list identifiers are copied from the wizard context at
/// creation time and are not refreshed if the upstream selection changes later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingEntry {
    pub id: MappingId,
    pub hubspot_connection_id: Option<ConnectionId>,
    pub hubspot_list_id: Option<String>,
    pub five9_connection_id: Option<ConnectionId>,
    pub five9_dialing_list: Option<String>,
    pub hubspot_property: String,
    pub five9_field: String,
    pub five9_key: i32,
    pub format_id: Option<i64>,
}

/// Wire form of the schedule. Dates are `YYYY-MM-DDTHH:MM` local time, empty when unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSpec {
    pub start_date: String,
    pub stop_date: String,
    pub recurring: bool,
    pub daily: bool,
    pub monthly: bool,
    pub yearly: bool,
    // Spelling is part of the backend contract.
    pub indefinetely: bool,
    pub immediately: bool,
    pub sunday: bool,
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
    pub saturday: bool,
    pub day: String,
    pub month: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateImportRequest {
    pub user_uuid: String,
    pub import_name: String,
    pub email_notifications: bool,
    pub email: String,
    pub mapping: Vec<MappingEntry>,
    pub schedule: ScheduleSpec,
}

/// Lifecycle state of an import job as reported by the backend.
///
/// Unknown values are carried through verbatim so newer backends still render.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Starting,
    Active,
    Completed,
    Failed,
    Paused,
    Other(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Starting => "STARTING",
            JobStatus::Active => "ACTIVE",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Paused => "PAUSED",
            JobStatus::Other(s) => s,
        }
    }

    /// Whether the job counts as running for the start/stop toggle.
    pub fn is_running(&self) -> bool {
        matches!(self, JobStatus::Active | JobStatus::Starting)
    }
}

impl From<String> for JobStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "STARTING" => JobStatus::Starting,
            "ACTIVE" => JobStatus::Active,
            "COMPLETED" => JobStatus::Completed,
            "FAILED" => JobStatus::Failed,
            "PAUSED" => JobStatus::Paused,
            _ => JobStatus::Other(value),
        }
    }
}

impl From<JobStatus> for String {
    fn from(value: JobStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted job record, read-only on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    pub id: ImportId,
    pub uuid: Option<String>,
    #[serde(default)]
    pub name: String,
    pub status: Option<JobStatus>,
    pub email_notification: Option<bool>,
    pub email: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub modified_at: Option<NaiveDateTime>,
    pub start_datetime: Option<NaiveDateTime>,
    pub completion_datetime: Option<NaiveDateTime>,
    pub records_imported: Option<i64>,
    pub total_records: Option<i64>,
    pub progress: Option<i32>,
}

/// Point-in-time progress pushed by the backend for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub import_id: ImportId,
    pub status: JobStatus,
    #[serde(default)]
    pub current_record: i64,
    #[serde(default)]
    pub total_records: i64,
    pub progress_message: Option<String>,
    pub completion_datetime: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserUuidRequest<'a> {
    pub user_uuid: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ConnectionIdRequest {
    pub id: ConnectionId,
}
