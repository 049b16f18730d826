// ABOUTME: Latest-progress-per-job state fed by the push channel
// ABOUTME: Pure accessors that fall back to caller-supplied persisted values

use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::watch;

use crate::remote::models::{ImportId, JobStatus, ProgressSnapshot};

/// Most recent snapshot per job id. A new snapshot replaces the old one wholesale.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProgressBoard {
    snapshots: HashMap<ImportId, ProgressSnapshot>,
}

impl ProgressBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write wins. Returns the snapshot that was replaced, if any.
    pub fn apply(&mut self, snapshot: ProgressSnapshot) -> Option<ProgressSnapshot> {
        self.snapshots.insert(snapshot.import_id, snapshot)
    }

    pub fn get(&self, id: ImportId) -> Option<&ProgressSnapshot> {
        self.snapshots.get(&id)
    }

    /// `"current/total"`, or `None` before the first snapshot for `id`.
    pub fn display_progress(&self, id: ImportId) -> Option<String> {
        self.snapshots
            .get(&id)
            .map(|p| format!("{}/{}", p.current_record, p.total_records))
    }

    pub fn status(&self, id: ImportId, fallback: Option<JobStatus>) -> Option<JobStatus> {
        match self.snapshots.get(&id) {
            Some(snapshot) => Some(snapshot.status.clone()),
            None => fallback,
        }
    }

    /// The live completion time only when the snapshot carries one.
    pub fn completion_time(
        &self,
        id: ImportId,
        fallback: Option<NaiveDateTime>,
    ) -> Option<NaiveDateTime> {
        self.snapshots
            .get(&id)
            .and_then(|p| p.completion_datetime)
            .or(fallback)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Read handle over the board maintained by a [`ProgressFeed`](super::ProgressFeed).
///
/// Cloning is cheap. Connection state is informational; every accessor works
/// (falling back) whether or not the feed is connected.
#[derive(Debug, Clone)]
pub struct ProgressReconciler {
    board: Arc<RwLock<ProgressBoard>>,
    connected: watch::Receiver<bool>,
}

impl ProgressReconciler {
    pub(crate) fn new(board: Arc<RwLock<ProgressBoard>>, connected: watch::Receiver<bool>) -> Self {
        Self { board, connected }
    }

    /// A reconciler with no push source. All accessors return their fallbacks.
    pub fn detached() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self::new(Arc::new(RwLock::new(ProgressBoard::new())), rx)
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    /// Run `f` against the current board.
    pub fn read<R>(&self, f: impl FnOnce(&ProgressBoard) -> R) -> R {
        let guard = self.board.read().unwrap_or_else(|e| e.into_inner());
        f(&guard)
    }

    pub fn display_progress(&self, id: ImportId) -> Option<String> {
        self.read(|b| b.display_progress(id))
    }

    pub fn status(&self, id: ImportId, fallback: Option<JobStatus>) -> Option<JobStatus> {
        self.read(|b| b.status(id, fallback))
    }

    pub fn completion_time(
        &self,
        id: ImportId,
        fallback: Option<NaiveDateTime>,
    ) -> Option<NaiveDateTime> {
        self.read(|b| b.completion_time(id, fallback))
    }

    pub(crate) fn apply(&self, snapshot: ProgressSnapshot) {
        let mut guard = self.board.write().unwrap_or_else(|e| e.into_inner());
        guard.apply(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn snapshot(id: ImportId, status: JobStatus, current: i64, total: i64) -> ProgressSnapshot {
        ProgressSnapshot {
            import_id: id,
            status,
            current_record: current,
            total_records: total,
            progress_message: None,
            completion_datetime: None,
        }
    }

    #[test]
    fn status_falls_back_until_snapshot_arrives() {
        let mut board = ProgressBoard::new();
        board.apply(snapshot(2, JobStatus::Active, 1, 10));
        board.apply(snapshot(3, JobStatus::Failed, 0, 0));

        assert_eq!(board.status(1, Some(JobStatus::Paused)), Some(JobStatus::Paused));
        assert_eq!(board.status(1, None), None);
        assert_eq!(board.status(2, Some(JobStatus::Paused)), Some(JobStatus::Active));
    }

    #[test]
    fn latest_snapshot_replaces_previous_one() {
        let mut board = ProgressBoard::new();
        board.apply(snapshot(5, JobStatus::Active, 10, 100));
        let replaced = board.apply(snapshot(5, JobStatus::Active, 50, 100));

        assert_eq!(replaced.map(|s| s.current_record), Some(10));
        assert_eq!(board.display_progress(5).as_deref(), Some("50/100"));
        assert_eq!(board.display_progress(6), None);
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn completion_time_requires_live_value() {
        let persisted = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let live = NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();

        let mut board = ProgressBoard::new();
        board.apply(snapshot(1, JobStatus::Active, 3, 9));
        assert_eq!(board.completion_time(1, Some(persisted)), Some(persisted));

        let mut done = snapshot(1, JobStatus::Completed, 9, 9);
        done.completion_datetime = Some(live);
        board.apply(done);
        assert_eq!(board.completion_time(1, Some(persisted)), Some(live));
    }

    #[test]
    fn detached_reconciler_degrades_to_fallbacks() {
        let reconciler = ProgressReconciler::detached();
        assert!(!reconciler.is_connected());
        assert_eq!(
            reconciler.status(9, Some(JobStatus::Completed)),
            Some(JobStatus::Completed)
        );

        reconciler.apply(snapshot(9, JobStatus::Failed, 0, 0));
        assert_eq!(reconciler.status(9, Some(JobStatus::Completed)), Some(JobStatus::Failed));
    }
}
