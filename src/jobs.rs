// ABOUTME: Imports table projection merging polled job records with live progress
// ABOUTME: Derives status, percentage and start/stop toggle, with optimistic toggle overrides

use chrono::NaiveDateTime;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::bulk::delete_each;
use crate::error::Result;
use crate::progress::{ProgressBoard, ProgressReconciler};
use crate::remote::models::{ImportId, ImportRecord, JobStatus, ProgressSnapshot};
use crate::remote::ImportBackend;

/// One display row of the imports table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRow {
    pub id: ImportId,
    pub name: String,
    pub created_at: Option<NaiveDateTime>,
    pub start_datetime: Option<NaiveDateTime>,
    pub completion_datetime: Option<NaiveDateTime>,
    /// `None` renders as the placeholder.
    pub progress_percent: Option<u8>,
    pub status: Option<JobStatus>,
    pub toggle_checked: bool,
}

/// Per-job toggle state while a start/stop request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleState {
    Idle,
    Pending(bool),
}

fn clamp_percent(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}

pub fn progress_percent(
    status: Option<&JobStatus>,
    persisted: Option<i32>,
    live: Option<&ProgressSnapshot>,
) -> Option<u8> {
    match status {
        Some(JobStatus::Completed) => Some(persisted.map_or(100, |p| clamp_percent(p as i64))),
        Some(JobStatus::Failed) | Some(JobStatus::Starting) => Some(0),
        Some(JobStatus::Active) if live.is_some() => live.and_then(|s| {
            // Zero total shows the placeholder, not the persisted value.
            (s.total_records > 0).then(|| {
                let ratio = s.current_record as f64 / s.total_records as f64;
                clamp_percent((ratio * 100.0).round() as i64)
            })
        }),
        _ => persisted.map(|p| clamp_percent(p as i64)),
    }
}

pub fn project_row(record: &ImportRecord, board: &ProgressBoard, toggle: ToggleState) -> JobRow {
    let live = board.get(record.id);
    let status = board.status(record.id, record.status.clone());
    let completion_datetime = board.completion_time(record.id, record.completion_datetime);
    let progress_percent = progress_percent(status.as_ref(), record.progress, live);
    let toggle_checked = match toggle {
        ToggleState::Pending(desired) => desired,
        ToggleState::Idle => status.as_ref().is_some_and(JobStatus::is_running),
    };

    JobRow {
        id: record.id,
        name: record.name.clone(),
        created_at: record.created_at,
        start_datetime: record.start_datetime,
        completion_datetime,
        progress_percent,
        status,
        toggle_checked,
    }
}

/// Holds the last polled records and recomputes rows against whatever progress is freshest.
pub struct JobListProjector {
    user_uuid: String,
    records: Vec<ImportRecord>,
    overrides: HashMap<ImportId, bool>,
    reconciler: ProgressReconciler,
}

impl JobListProjector {
    pub fn new(user_uuid: impl Into<String>, reconciler: ProgressReconciler) -> Self {
        Self {
            user_uuid: user_uuid.into(),
            records: Vec::new(),
            overrides: HashMap::new(),
            reconciler,
        }
    }

    pub fn records(&self) -> &[ImportRecord] {
        &self.records
    }

    pub fn is_live(&self) -> bool {
        self.reconciler.is_connected()
    }

    /// Re-poll the backend. On failure the previous records are kept.
    pub async fn refresh(&mut self, backend: &dyn ImportBackend) -> Result<usize> {
        let records = backend.list_imports(&self.user_uuid).await?;
        debug!("Loaded {} import(s)", records.len());
        self.records = records;
        Ok(self.records.len())
    }

    pub fn toggle_state(&self, id: ImportId) -> ToggleState {
        match self.overrides.get(&id) {
            Some(desired) => ToggleState::Pending(*desired),
            None => ToggleState::Idle,
        }
    }

    pub fn rows(&self) -> Vec<JobRow> {
        self.reconciler.read(|board| {
            self.records
                .iter()
                .map(|record| project_row(record, board, self.toggle_state(record.id)))
                .collect()
        })
    }

    /// Show the desired toggle value immediately.
    pub fn begin_toggle(&mut self, id: ImportId, checked: bool) {
        self.overrides.insert(id, checked);
    }

    /// Send start/stop, re-poll regardless of the outcome, then drop the override.
    pub async fn settle_toggle(
        &mut self,
        backend: &dyn ImportBackend,
        id: ImportId,
        checked: bool,
    ) -> Result<()> {
        let request = if checked {
            info!("Starting import {}", id);
            backend.start_import(id).await
        } else {
            info!("Stopping import {}", id);
            backend.stop_import(id).await
        };
        if let Err(e) = &request {
            warn!("Toggle for import {} failed: {}", id, e);
        }

        let refreshed = self.refresh(backend).await;
        self.overrides.remove(&id);
        request?;
        refreshed.map(|_| ())
    }

    pub async fn toggle(
        &mut self,
        backend: &dyn ImportBackend,
        id: ImportId,
        checked: bool,
    ) -> Result<()> {
        self.begin_toggle(id, checked);
        self.settle_toggle(backend, id, checked).await
    }

    /// Delete each id, drop the successes locally, re-poll, then report any failures in aggregate.
    pub async fn delete_selected(
        &mut self,
        backend: &dyn ImportBackend,
        ids: &[ImportId],
    ) -> Result<usize> {
        let report = delete_each(ids, |id| backend.delete_import(id)).await;
        self.records.retain(|r| !report.deleted.contains(&r.id));
        if let Err(e) = self.refresh(backend).await {
            warn!("Failed to reload imports after delete: {}", e);
        }
        // A lagging poll must not bring deleted rows back.
        self.records.retain(|r| !report.deleted.contains(&r.id));
        report.into_result()
    }
}
