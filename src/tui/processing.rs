use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use futures_util::StreamExt;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::{info, warn};

use crate::rename_engine::{FileMutationPort, PreviewItem, ProgressStatus, RenameProgress};
use super::app::{App, RunningBatch};
use super::models::{FileItem, ItemStatus};

impl<P: FileMutationPort + 'static> App<P> {
    pub fn start_processing(&mut self) {
        if self.is_running() || self.finished {
            return;
        }
        if !self.summary.can_proceed() {
            self.set_status_message(format!(
                "Cannot start: {} conflict(s), {} file(s) to rename",
                self.summary.conflicts, self.summary.valid_renames
            ));
            return;
        }
        let config = match self.current_config() {
            Ok(config) => config,
            Err(e) => {
                self.set_status_message(format!("{:#}", e));
                return;
            }
        };

        let stream = self.executor.execute(&self.files, &config);
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&cancel);
        let task = tokio::spawn(async move {
            let mut stream = std::pin::pin!(stream);
            // A pull already underway delivers its event before the flag is seen.
            while !stop.load(Ordering::Acquire) {
                let Some(progress) = stream.next().await else {
                    break;
                };
                if tx.send(progress).is_err() {
                    break;
                }
            }
        });

        self.running = Some(RunningBatch {
            task,
            progress: rx,
            cancel,
        });
        self.start_time = Some(Instant::now());
        self.stats.processed = 0;
        info!(files = self.files.len(), "started batch from tui");
    }

    pub fn poll_progress(&mut self) {
        loop {
            let Some(running) = self.running.as_mut() else {
                return;
            };
            match running.progress.try_recv() {
                Ok(progress) => self.apply_progress(progress),
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    self.finish_processing();
                    return;
                }
            }
        }
    }

    fn apply_progress(&mut self, progress: RenameProgress) {
        self.report.record(&progress);

        let Some(file) = progress.current_file.as_ref() else {
            if let Some(message) = progress.message {
                self.set_status_message(message);
            }
            return;
        };
        let Some(index) = self.items.iter().position(|item| item.original.id == file.id) else {
            return;
        };

        let item = &mut self.items[index];
        item.status = ItemStatus::from(progress.status);
        if let Some(name) = progress.new_name {
            item.new_name = name;
        }
        if progress.status.is_terminal() {
            item.message = progress.message;
        }

        match progress.status {
            ProgressStatus::Processing => {
                self.current_processing = Some(index);
                self.list_state.select(Some(index));
            }
            ProgressStatus::Success => self.stats.successful += 1,
            ProgressStatus::Failed => self.stats.failed += 1,
            ProgressStatus::Skipped => self.stats.skipped += 1,
        }
        if progress.status.is_terminal() {
            self.stats.processed += 1;
            self.processing_progress = (progress.current_index + 1) as f64 / progress.total.max(1) as f64;
        }
    }

    fn finish_processing(&mut self) {
        let cancelled = self
            .running
            .take()
            .is_some_and(|running| running.cancel.load(Ordering::Acquire));
        self.current_processing = None;
        self.finished = true;

        if cancelled {
            for item in &mut self.items {
                if item.status == ItemStatus::Processing {
                    item.status = ItemStatus::Pending;
                }
            }
            info!(processed = self.stats.processed, "batch cancelled from tui");
            self.set_status_message(format!(
                "Cancelled after {} of {} files",
                self.stats.processed, self.stats.total
            ));
        } else {
            self.set_status_message(format!(
                "Complete! {} renamed, {} failed, {} skipped",
                self.report.succeeded, self.report.failed, self.report.skipped
            ));
        }
    }

    /// Stops before the next file. The batch finishes through `poll_progress`
    /// once the file in flight reports its outcome.
    pub fn cancel_processing(&mut self) {
        if let Some(running) = &self.running {
            running.cancel.store(true, Ordering::Release);
            self.set_status_message("Cancelling after the current file".to_string());
        }
    }

    pub async fn shutdown(&mut self) {
        let Some(running) = self.running.as_mut() else {
            return;
        };
        running.cancel.store(true, Ordering::Release);
        if let Err(e) = (&mut running.task).await {
            warn!(error = %e, "progress task ended abnormally");
        }
        self.poll_progress();
    }

    pub async fn verify_on_disk(&mut self) {
        if self.is_running() || self.finished {
            return;
        }
        let preview: Vec<PreviewItem> = self
            .items
            .iter()
            .map(|item| match (&item.status, &item.message) {
                (ItemStatus::Conflict, Some(reason)) => {
                    PreviewItem::conflicting(item.original.clone(), item.new_name.clone(), reason.clone())
                }
                _ => PreviewItem::clean(item.original.clone(), item.new_name.clone()),
            })
            .collect();

        let checked = self.executor.preflight(&preview).await;
        self.summary = crate::rename_engine::summarize(&checked);
        self.items = checked.into_iter().map(FileItem::from).collect();
        self.set_status_message(format!(
            "Checked on disk: {} conflict(s)",
            self.summary.conflicts
        ));
    }

    pub fn rescan(&mut self) {
        if self.is_running() {
            return;
        }
        if !self.preselected {
            if let Err(e) = self.load_directory() {
                self.set_status_message(format!("{:#}", e));
                return;
            }
        } else {
            // Pre-selected files keep their identity only until renamed.
            self.files = self
                .report
                .results
                .iter()
                .filter(|result| result.success)
                .map(|result| {
                    let mut file = result.original.clone();
                    file.id = file.location.join(&result.new_name).to_string_lossy().into_owned();
                    file.name = result.new_name.clone();
                    file
                })
                .chain(self.files.iter().filter(|file| {
                    !self
                        .report
                        .results
                        .iter()
                        .any(|result| result.success && result.original.id == file.id)
                }).cloned())
                .collect();
        }
        self.refresh_preview();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rename_engine::{Dispatch, FileRef, MemoryPort};
    use std::fs;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    fn ready_app(dir: &Path) -> App {
        let mut app = App::with_directory(dir.to_string_lossy().into_owned(), Dispatch::Current);
        app.advance_config_step();
        app.prefix_input = "trip_".to_string();
        app.confirm_config();
        app
    }

    async fn wait_until_finished<P: FileMutationPort + 'static>(app: &mut App<P>) {
        for _ in 0..200 {
            app.poll_progress();
            if app.finished {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("batch did not finish");
    }

    #[tokio::test]
    async fn runs_batch_and_updates_rows() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.jpg"), "x").unwrap();
        fs::write(tmp.path().join("a.jpg"), "x").unwrap();

        let mut app = ready_app(tmp.path());
        app.start_processing();
        assert!(app.is_running());
        wait_until_finished(&mut app).await;

        assert_eq!(app.stats.successful, 2);
        assert!(app.items.iter().all(|item| item.status == ItemStatus::Success));
        assert!(tmp.path().join("trip_001.jpg").exists());
        assert!(tmp.path().join("trip_002.jpg").exists());

        app.rescan();
        assert!(!app.finished);
        assert_eq!(app.summary.unchanged, 2);
    }

    #[tokio::test]
    async fn refuses_to_start_with_conflicts() {
        let mut app = App::new(Dispatch::Current);
        app.files = vec![FileRef::new("/d/a", "a", "/d")];
        app.prefix_input = "bad:".to_string();
        app.refresh_preview();
        assert_eq!(app.summary.conflicts, 1);

        app.start_processing();
        assert!(!app.is_running());
        assert!(app.status_message.is_some());
    }

    #[tokio::test]
    async fn verify_marks_existing_names() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.jpg"), "x").unwrap();
        fs::write(tmp.path().join("trip_001.jpg"), "x").unwrap();

        let mut app = ready_app(tmp.path());
        // "a.jpg" sorts first and would take trip_001.jpg.
        assert!(app.summary.can_proceed());
        app.verify_on_disk().await;
        assert!(!app.summary.can_proceed());
        assert_eq!(app.items[0].status, ItemStatus::Conflict);
    }

    #[tokio::test]
    async fn cancel_keeps_the_rename_in_flight() {
        let files = vec![FileRef::new("/d/a.jpg", "a.jpg", "/d"), FileRef::new("/d/b.jpg", "b.jpg", "/d")];
        let port = Arc::new(MemoryPort::with_files(&files).with_latency(Duration::from_millis(30)));
        let mut app = App::with_port(Arc::clone(&port), Dispatch::Current);
        app.files = files;
        app.prefix_input = "trip_".to_string();
        app.refresh_preview();

        app.start_processing();
        for _ in 0..100 {
            app.poll_progress();
            if app.items.iter().any(|item| item.status == ItemStatus::Processing) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(app.items[0].status, ItemStatus::Processing);

        app.cancel_processing();
        assert!(app.is_running());
        wait_until_finished(&mut app).await;

        assert_eq!(app.report.succeeded, 1);
        assert_eq!(app.stats.successful, 1);
        assert_eq!(app.items[0].status, ItemStatus::Success);
        assert_eq!(app.items[1].status, ItemStatus::Pending);
        assert_eq!(port.renames(), [("a.jpg".to_string(), "trip_001.jpg".to_string())]);
        assert!(app.status_message.as_deref().is_some_and(|m| m.starts_with("Cancelled after 1 of 2")));
    }

    #[tokio::test]
    async fn shutdown_records_the_last_outcome() {
        let files = vec![FileRef::new("/d/a.jpg", "a.jpg", "/d"), FileRef::new("/d/b.jpg", "b.jpg", "/d")];
        let port = Arc::new(MemoryPort::with_files(&files).with_latency(Duration::from_millis(20)));
        let mut app = App::with_port(Arc::clone(&port), Dispatch::Current);
        app.files = files;
        app.prefix_input = "trip_".to_string();
        app.refresh_preview();

        app.start_processing();
        tokio::time::sleep(Duration::from_millis(5)).await;
        app.shutdown().await;

        assert!(!app.is_running());
        assert!(app.finished);
        assert_eq!(app.report.succeeded, port.renames().len());
        assert!(app.items.iter().all(|item| item.status != ItemStatus::Processing));
    }
}
