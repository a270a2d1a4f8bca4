use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use super::validator::is_illegal_char;

pub const MAX_DIGIT_COUNT: u8 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// Stable identifier. For local files this is the full path.
    pub id: String,
    pub name: String,
    pub location: PathBuf,
    pub size: u64,
    pub mime_type: Option<String>,
    pub modified: DateTime<Utc>,
    pub thumbnail: Option<String>,
}

impl FileRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location: location.into(),
            size: 0,
            mime_type: None,
            modified: DateTime::<Utc>::UNIX_EPOCH,
            thumbnail: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = modified;
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Everything after the last `.` of the name, case preserved.
    pub fn extension(&self) -> Option<&str> {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum SortStrategy {
    #[default]
    Natural,
    DateModified,
    Size,
    OriginalOrder,
}

impl SortStrategy {
    pub const ALL: [SortStrategy; 4] = [
        SortStrategy::Natural,
        SortStrategy::DateModified,
        SortStrategy::Size,
        SortStrategy::OriginalOrder,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SortStrategy::Natural => "Natural (name)",
            SortStrategy::DateModified => "Date modified (newest first)",
            SortStrategy::Size => "Size (largest first)",
            SortStrategy::OriginalOrder => "Original order",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameConfig {
    pub prefix: String,
    pub start_number: u64,
    pub digit_count: u8,
    pub preserve_extension: bool,
    pub sort_strategy: SortStrategy,
}

impl RenameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }

        if let Some(c) = self.prefix.chars().find(|c| is_illegal_char(*c)) {
            return Err(ConfigError::IllegalPrefixChar(c));
        }

        if !(1..=MAX_DIGIT_COUNT).contains(&self.digit_count) {
            return Err(ConfigError::DigitCountOutOfRange {
                got: self.digit_count,
                min: 1,
                max: MAX_DIGIT_COUNT,
            });
        }

        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedName {
    pub name: String,
    pub index: usize,
    pub source: FileRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewItem {
    pub original: FileRef,
    pub preview_name: String,
    pub has_conflict: bool,
    pub conflict_reason: Option<String>,
}

impl PreviewItem {
    pub fn clean(original: FileRef, preview_name: String) -> Self {
        Self {
            original,
            preview_name,
            has_conflict: false,
            conflict_reason: None,
        }
    }

    pub fn conflicting(original: FileRef, preview_name: String, reason: impl Into<String>) -> Self {
        Self {
            original,
            preview_name,
            has_conflict: true,
            conflict_reason: Some(reason.into()),
        }
    }

    pub(crate) fn flag(&mut self, reason: impl Into<String>) {
        if !self.has_conflict {
            self.has_conflict = true;
            self.conflict_reason = Some(reason.into());
        }
    }

    pub fn is_changed(&self) -> bool {
        self.preview_name != self.original.name
    }

    pub fn can_rename(&self) -> bool {
        !self.has_conflict && self.is_changed()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PreviewSummary {
    pub total_files: usize,
    pub valid_renames: usize,
    pub conflicts: usize,
    pub unchanged: usize,
}

impl PreviewSummary {
    pub fn can_proceed(&self) -> bool {
        self.conflicts == 0 && self.valid_renames > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProgressStatus {
    Processing,
    Success,
    Failed,
    Skipped,
}

impl ProgressStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ProgressStatus::Processing)
    }
}

/// One event of the executor stream. `current_file` is `None` only for the
/// single batch-level failure emitted when the config is invalid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameProgress {
    pub current_index: usize,
    pub total: usize,
    pub current_file: Option<FileRef>,
    pub status: ProgressStatus,
    pub new_name: Option<String>,
    pub message: Option<String>,
}

impl RenameProgress {
    pub fn to_result(&self) -> Option<RenameResult> {
        if !self.status.is_terminal() {
            return None;
        }
        let original = self.current_file.clone()?;

        Some(RenameResult {
            new_name: self.new_name.clone().unwrap_or_else(|| original.name.clone()),
            original,
            success: self.status == ProgressStatus::Success,
            status: self.status,
            error: self.message.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameResult {
    pub original: FileRef,
    pub new_name: String,
    pub success: bool,
    pub status: ProgressStatus,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(prefix: &str, digits: u8) -> RenameConfig {
        RenameConfig {
            prefix: prefix.to_string(),
            start_number: 1,
            digit_count: digits,
            preserve_extension: true,
            sort_strategy: SortStrategy::Natural,
        }
    }

    #[test]
    fn extension_is_text_after_last_dot() {
        assert_eq!(FileRef::new("1", "photo.JPG", "/").extension(), Some("JPG"));
        assert_eq!(FileRef::new("1", "a.tar.gz", "/").extension(), Some("gz"));
        assert_eq!(FileRef::new("1", "README", "/").extension(), None);
        assert_eq!(FileRef::new("1", "trailing.", "/").extension(), None);
    }

    #[test]
    fn config_rules() {
        assert!(config("vac_", 3).is_valid());
        assert_eq!(config("", 3).validate(), Err(ConfigError::EmptyPrefix));
        assert_eq!(
            config("a/b", 3).validate(),
            Err(ConfigError::IllegalPrefixChar('/'))
        );
        assert_eq!(
            config("tab\t", 3).validate(),
            Err(ConfigError::IllegalPrefixChar('\t'))
        );
        assert!(!config("x", 0).is_valid());
        assert!(config("x", 10).is_valid());
        assert!(!config("x", 11).is_valid());
    }

    #[test]
    fn preview_item_derived_properties() {
        let file = FileRef::new("1", "a.jpg", "/");
        let same = PreviewItem::clean(file.clone(), "a.jpg".to_string());
        assert!(!same.is_changed());
        assert!(!same.can_rename());

        let mut renamed = PreviewItem::clean(file, "b.jpg".to_string());
        assert!(renamed.can_rename());

        renamed.flag("first");
        renamed.flag("second");
        assert!(!renamed.can_rename());
        assert_eq!(renamed.conflict_reason.as_deref(), Some("first"));
    }

    #[test]
    fn processing_events_have_no_result() {
        let progress = RenameProgress {
            current_index: 0,
            total: 1,
            current_file: Some(FileRef::new("1", "a.jpg", "/")),
            status: ProgressStatus::Processing,
            new_name: None,
            message: None,
        };
        assert!(progress.to_result().is_none());

        let done = RenameProgress {
            status: ProgressStatus::Skipped,
            message: Some("unchanged".to_string()),
            ..progress
        };
        let result = done.to_result().unwrap();
        assert!(!result.success);
        assert_eq!(result.new_name, "a.jpg");
        assert_eq!(result.error.as_deref(), Some("unchanged"));
    }
}
