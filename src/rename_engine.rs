//! Batch rename engine: name generation and validation, sorting, previews
//! with conflict detection, and streamed execution through a mutation port.

mod executor;
mod generator;
mod model;
mod port;
mod preview;
mod report;
mod sorter;
mod validator;

pub use executor::{Dispatch, RenameExecutor};
pub use generator::{generate, generate_all};
pub use model::{
    FileRef, GeneratedName, MAX_DIGIT_COUNT, PreviewItem, PreviewSummary, ProgressStatus,
    RenameConfig, RenameProgress, RenameResult, SortStrategy,
};
pub use port::{FileMutationPort, LocalFsPort, MemoryPort};
pub use preview::{build_preview, mark_duplicates, summarize};
pub use report::BatchReport;
pub use sorter::{natural_cmp, sort};
pub use validator::{ILLEGAL_CHARS, MAX_NAME_LENGTH, ValidationResult, validate, validate_name};

use crate::error::ConfigError;

// Interactive configuration builder
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    prefix: Option<String>,
    start_number: u64,
    digit_count: u8,
    preserve_extension: bool,
    sort_strategy: SortStrategy,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            prefix: None,
            start_number: 1,
            digit_count: 3,
            preserve_extension: true,
            sort_strategy: SortStrategy::Natural,
        }
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn start_number(mut self, start_number: u64) -> Self {
        self.start_number = start_number;
        self
    }

    pub fn digit_count(mut self, digit_count: u8) -> Self {
        self.digit_count = digit_count;
        self
    }

    pub fn preserve_extension(mut self, preserve: bool) -> Self {
        self.preserve_extension = preserve;
        self
    }

    pub fn sort_strategy(mut self, strategy: SortStrategy) -> Self {
        self.sort_strategy = strategy;
        self
    }

    /// Requires a prefix but does not run `RenameConfig::validate`, so an
    /// invalid config can still be previewed and explained.
    pub fn build(self) -> Result<RenameConfig, ConfigError> {
        let prefix = self.prefix.ok_or(ConfigError::MissingPrefix)?;

        Ok(RenameConfig {
            prefix,
            start_number: self.start_number,
            digit_count: self.digit_count,
            preserve_extension: self.preserve_extension,
            sort_strategy: self.sort_strategy,
        })
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .prefix("vac_")
            .start_number(5)
            .sort_strategy(SortStrategy::Size)
            .build()
            .unwrap();

        assert_eq!(config.prefix, "vac_");
        assert_eq!(config.start_number, 5);
        assert_eq!(config.digit_count, 3);
        assert!(config.preserve_extension);
        assert_eq!(config.sort_strategy, SortStrategy::Size);
    }

    #[test]
    fn test_config_builder_requires_prefix() {
        assert_eq!(ConfigBuilder::new().build(), Err(ConfigError::MissingPrefix));
    }

    #[test]
    fn test_config_builder_keeps_invalid_values() {
        let config = ConfigBuilder::new().prefix("a:b").digit_count(0).build().unwrap();
        assert!(!config.is_valid());
    }
}
