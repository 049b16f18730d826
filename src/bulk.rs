// ABOUTME: Sequential per-item deletion with an aggregate failure report
// ABOUTME: Shared by the connection and import lists

use std::future::Future;
use tracing::warn;

use crate::error::{ConsoleError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkDeleteReport {
    pub deleted: Vec<i64>,
    pub failed: usize,
}

impl BulkDeleteReport {
    pub fn total(&self) -> usize {
        self.deleted.len() + self.failed
    }

    /// `PartialDelete` when anything failed; which items failed is not reported.
    pub fn into_result(self) -> Result<usize> {
        if self.failed > 0 {
            return Err(ConsoleError::PartialDelete {
                failed: self.failed,
                total: self.total(),
            });
        }
        Ok(self.deleted.len())
    }
}

pub async fn delete_each<F, Fut>(ids: &[i64], mut delete: F) -> BulkDeleteReport
where
    F: FnMut(i64) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let mut report = BulkDeleteReport::default();
    for &id in ids {
        match delete(id).await {
            Ok(()) => report.deleted.push(id),
            Err(e) => {
                warn!("Failed to delete {}: {}", id, e);
                report.failed += 1;
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failures_are_counted_not_fatal() {
        let report = delete_each(&[1, 2, 3], |id| async move {
            if id == 2 {
                Err(ConsoleError::request(404, "not found"))
            } else {
                Ok(())
            }
        })
        .await;

        assert_eq!(report.deleted, vec![1, 3]);
        assert_eq!(report.failed, 1);
        assert!(matches!(
            report.into_result(),
            Err(ConsoleError::PartialDelete { failed: 1, total: 3 })
        ));
    }

    #[tokio::test]
    async fn empty_selection_succeeds() {
        let report = delete_each(&[], |_| async { Ok(()) }).await;
        assert_eq!(report.into_result().unwrap(), 0);
    }
}
