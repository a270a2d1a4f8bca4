use crate::rename_engine::{FileRef, PreviewItem, ProgressStatus};

#[derive(Debug, Clone)]
pub struct FileItem {
    pub original: FileRef,
    pub new_name: String,
    pub status: ItemStatus,
    pub message: Option<String>,
}

impl From<PreviewItem> for FileItem {
    fn from(item: PreviewItem) -> Self {
        let status = if item.has_conflict {
            ItemStatus::Conflict
        } else if item.is_changed() {
            ItemStatus::Pending
        } else {
            ItemStatus::Unchanged
        };

        Self {
            original: item.original,
            new_name: item.preview_name,
            status,
            message: item.conflict_reason,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Pending,
    Unchanged,
    Conflict,
    Processing,
    Success,
    Failed,
    Skipped,
}

impl From<ProgressStatus> for ItemStatus {
    fn from(status: ProgressStatus) -> Self {
        match status {
            ProgressStatus::Processing => ItemStatus::Processing,
            ProgressStatus::Success => ItemStatus::Success,
            ProgressStatus::Failed => ItemStatus::Failed,
            ProgressStatus::Skipped => ItemStatus::Skipped,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigInputMode {
    Directory,
    Prefix,
    StartNumber,
    DigitCount,
    Extension,
    Sort,
    Confirm,
}

#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub total: usize,
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
}
