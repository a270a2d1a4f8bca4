use futures_util::{Stream, StreamExt};
use serde::Serialize;

use super::model::{FileRef, ProgressStatus, RenameProgress, RenameResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub results: Vec<RenameResult>,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Set when the whole batch was rejected before any file was touched.
    pub batch_error: Option<String>,
}

impl BatchReport {
    pub async fn collect<S>(stream: S) -> Self
    where
        S: Stream<Item = RenameProgress>,
    {
        stream
            .fold(Self::default(), |mut report, progress| async move {
                report.record(&progress);
                report
            })
            .await
    }

    pub fn record(&mut self, progress: &RenameProgress) {
        if progress.current_file.is_none() && progress.status == ProgressStatus::Failed {
            self.batch_error = progress.message.clone();
            return;
        }

        let Some(result) = progress.to_result() else {
            return;
        };
        match result.status {
            ProgressStatus::Success => self.succeeded += 1,
            ProgressStatus::Failed => self.failed += 1,
            ProgressStatus::Skipped => self.skipped += 1,
            ProgressStatus::Processing => {}
        }
        self.results.push(result);
    }

    pub fn failed_files(&self) -> Vec<FileRef> {
        self.results
            .iter()
            .filter(|result| result.status == ProgressStatus::Failed)
            .map(|result| result.original.clone())
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.batch_error.is_none() && self.failed == 0 && self.skipped == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn event(index: usize, status: ProgressStatus, message: Option<&str>) -> RenameProgress {
        RenameProgress {
            current_index: index,
            total: 3,
            current_file: Some(FileRef::new(index.to_string(), format!("f{index}"), "/")),
            status,
            new_name: Some(format!("n{index}")),
            message: message.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn counts_terminal_events_only() {
        use ProgressStatus::*;
        let events = vec![
            event(0, Processing, None),
            event(0, Success, None),
            event(1, Processing, None),
            event(1, Failed, Some("Permission denied")),
            event(2, Processing, None),
            event(2, Skipped, Some("Name is unchanged")),
        ];

        let report = BatchReport::collect(stream::iter(events)).await;
        assert_eq!(report.results.len(), 3);
        assert_eq!((report.succeeded, report.failed, report.skipped), (1, 1, 1));
        assert_eq!(report.failed_files()[0].name, "f1");
        assert!(!report.is_clean());
    }

    #[test]
    fn batch_failure_is_recorded_separately() {
        let mut report = BatchReport::default();
        report.record(&RenameProgress {
            current_index: 0,
            total: 2,
            current_file: None,
            status: ProgressStatus::Failed,
            new_name: None,
            message: Some("Invalid configuration: Prefix cannot be empty".to_string()),
        });
        assert!(report.results.is_empty());
        assert_eq!(report.failed, 0);
        assert!(report.batch_error.is_some());
    }
}
