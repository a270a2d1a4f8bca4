use std::future::Future;
use std::sync::Arc;

use futures_util::future::join_all;
use futures_util::stream::{self, Stream};
use tokio::runtime::Handle;
use tracing::{error, info, warn};

use crate::error::MutationError;
use super::generator::generate;
use super::model::{FileRef, PreviewItem, ProgressStatus, RenameConfig, RenameProgress};
use super::port::FileMutationPort;
use super::sorter::sort;
use super::validator::validate_name;

/// Where port calls run. Every mode spawns the call, so a rename already in
/// flight completes even if the progress stream is dropped.
#[derive(Debug, Clone, Default)]
pub enum Dispatch {
    /// The runtime polling the stream. Polling outside a tokio runtime panics.
    #[default]
    Current,
    Runtime(Handle),
}

impl Dispatch {
    async fn run<F>(&self, call: F) -> Result<F::Output, MutationError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let task = match self {
            Dispatch::Current => tokio::spawn(call),
            Dispatch::Runtime(handle) => handle.spawn(call),
        };
        task.await
            .map_err(|e| MutationError::Other(format!("Rename task failed: {}", e)))
    }
}

#[derive(Debug)]
pub struct RenameExecutor<P> {
    port: Arc<P>,
    dispatch: Dispatch,
}

impl<P> Clone for RenameExecutor<P> {
    fn clone(&self) -> Self {
        Self {
            port: Arc::clone(&self.port),
            dispatch: self.dispatch.clone(),
        }
    }
}

impl<P: FileMutationPort + 'static> RenameExecutor<P> {
    pub fn new(port: Arc<P>, dispatch: Dispatch) -> Self {
        Self { port, dispatch }
    }

    pub fn port(&self) -> &Arc<P> {
        &self.port
    }

    /// Returns a cold stream of progress events: `Processing` then a terminal
    /// status for every file, in sorted order. Nothing runs until the stream
    /// is polled, and dropping it stops the batch before the next file.
    ///
    /// An invalid config yields a single `Failed` event with no file.
    pub fn execute(
        &self,
        files: &[FileRef],
        config: &RenameConfig,
    ) -> impl Stream<Item = RenameProgress> + Send + 'static {
        let batch = Batch {
            port: Arc::clone(&self.port),
            dispatch: self.dispatch.clone(),
            config: config.clone(),
            files: files.to_vec(),
            phase: Phase::Start,
        };

        stream::unfold(batch, |mut batch| async move {
            let event = batch.step().await?;
            Some((event, batch))
        })
    }

    pub async fn preflight(&self, items: &[PreviewItem]) -> Vec<PreviewItem> {
        let checks = items.iter().map(|item| {
            let port = Arc::clone(&self.port);
            let location = item.original.location.clone();
            let name = item.preview_name.clone();
            let renameable = item.can_rename();
            async move {
                if !renameable {
                    return false;
                }
                self.dispatch
                    .run(async move { port.name_exists(&location, &name).await })
                    .await
                    .unwrap_or(true)
            }
        });
        let taken = join_all(checks).await;

        items
            .iter()
            .zip(taken)
            .map(|(item, taken)| {
                let mut item = item.clone();
                if taken {
                    item.flag(format!("A file named '{}' already exists", item.preview_name));
                }
                item
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    Announce(usize),
    Apply(usize),
    Done,
}

struct Batch<P> {
    port: Arc<P>,
    dispatch: Dispatch,
    config: RenameConfig,
    files: Vec<FileRef>,
    phase: Phase,
}

impl<P: FileMutationPort + 'static> Batch<P> {
    async fn step(&mut self) -> Option<RenameProgress> {
        loop {
            match self.phase {
                Phase::Start => {
                    if let Err(e) = self.config.validate() {
                        error!(error = %e, files = self.files.len(), "batch rejected");
                        self.phase = Phase::Done;
                        return Some(RenameProgress {
                            current_index: 0,
                            total: self.files.len(),
                            current_file: None,
                            status: ProgressStatus::Failed,
                            new_name: None,
                            message: Some(format!("Invalid configuration: {}", e)),
                        });
                    }

                    self.files = sort(&self.files, self.config.sort_strategy);
                    info!(files = self.files.len(), prefix = %self.config.prefix, "batch started");
                    self.phase = if self.files.is_empty() {
                        Phase::Done
                    } else {
                        Phase::Announce(0)
                    };
                }
                Phase::Announce(index) => {
                    self.phase = Phase::Apply(index);
                    return Some(self.progress(index, ProgressStatus::Processing, None, None));
                }
                Phase::Apply(index) => {
                    let event = self.apply(index).await;
                    self.phase = if index + 1 < self.files.len() {
                        Phase::Announce(index + 1)
                    } else {
                        info!(files = self.files.len(), "batch finished");
                        Phase::Done
                    };
                    return Some(event);
                }
                Phase::Done => return None,
            }
        }
    }

    fn progress(
        &self,
        index: usize,
        status: ProgressStatus,
        new_name: Option<String>,
        message: Option<String>,
    ) -> RenameProgress {
        RenameProgress {
            current_index: index,
            total: self.files.len(),
            current_file: Some(self.files[index].clone()),
            status,
            new_name,
            message,
        }
    }

    fn skipped(&self, index: usize, new_name: Option<String>, reason: String) -> RenameProgress {
        warn!(file = %self.files[index].name, reason = %reason, "skipped");
        self.progress(index, ProgressStatus::Skipped, new_name, Some(reason))
    }

    async fn apply(&self, index: usize) -> RenameProgress {
        let file = &self.files[index];

        let name = match generate(file, &self.config, index) {
            Ok(name) => name,
            Err(e) => return self.skipped(index, None, e.to_string()),
        };
        if let Err(e) = validate_name(&name) {
            return self.skipped(index, Some(name), e.to_string());
        }
        if name == file.name {
            return self.skipped(index, Some(name), "Name is unchanged".to_string());
        }

        let taken = {
            let port = Arc::clone(&self.port);
            let location = file.location.clone();
            let candidate = name.clone();
            self.dispatch
                .run(async move { port.name_exists(&location, &candidate).await })
                .await
                .unwrap_or(true)
        };
        if taken {
            let reason = format!("A file named '{}' already exists", name);
            return self.skipped(index, Some(name), reason);
        }

        let outcome = {
            let port = Arc::clone(&self.port);
            let source = file.clone();
            let target = name.clone();
            self.dispatch
                .run(async move { port.rename_file(&source, &target).await })
                .await
                .and_then(|result| result)
        };

        match outcome {
            Ok(_) => {
                info!(from = %file.name, to = %name, "renamed");
                self.progress(index, ProgressStatus::Success, Some(name), None)
            }
            Err(e) => {
                warn!(file = %file.name, error = %e, "rename failed");
                self.progress(index, ProgressStatus::Failed, Some(name), Some(e.to_string()))
            }
        }
    }
}
