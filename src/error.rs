use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// A `RenameConfig` that cannot drive a batch. Fatal for the whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Prefix cannot be empty")]
    EmptyPrefix,
    #[error("Prefix contains an illegal character: {0:?}")]
    IllegalPrefixChar(char),
    #[error("Digit count must be between {min} and {max}, got {got}")]
    DigitCountOutOfRange { got: u8, min: u8, max: u8 },
    #[error("A prefix is required")]
    MissingPrefix,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Sequence number overflows at index {index}")]
    SequenceOverflow { index: usize },
}

/// One variant per name rule, in the order the rules are checked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Filename cannot be empty or blank")]
    Blank,
    #[error("Filename contains an illegal character: {0:?}")]
    IllegalCharacter(char),
    #[error("Filename is a reserved device name: {0}")]
    ReservedName(String),
    #[error("Filename must be between 1 and {max} bytes, got {len}")]
    BadLength { len: usize, max: usize },
    #[error("Filename cannot end with a space or period")]
    TrailingSpaceOrPeriod,
    #[error("Filename cannot consist only of dots")]
    OnlyDots,
}

/// Failure reported by a `FileMutationPort`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("Permission denied")]
    PermissionDenied,
    #[error("File not found")]
    NotFound,
    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for MutationError {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => MutationError::PermissionDenied,
            std::io::ErrorKind::NotFound => MutationError::NotFound,
            _ => MutationError::Other(error.to_string()),
        }
    }
}

/// Failure reading files from disk before a batch.
#[derive(Debug, Error)]
pub enum RenameError {
    #[error("Directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),
    #[error("Not a file: {}", .0.display())]
    NotAFile(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

macro_rules! serialize_as_display {
    ($($ty:ty),*) => {
        $(
            impl Serialize for $ty {
                fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
                where
                    S: serde::Serializer,
                {
                    serializer.serialize_str(self.to_string().as_ref())
                }
            }
        )*
    };
}

serialize_as_display!(ConfigError, GenerationError, ValidationError, MutationError, RenameError);

pub type EngineResult<T> = Result<T, RenameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_to_tagged_variants() {
        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert_eq!(MutationError::from(denied), MutationError::PermissionDenied);

        let missing = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert_eq!(MutationError::from(missing), MutationError::NotFound);

        let other = std::io::Error::other("disk on fire");
        assert_eq!(
            MutationError::from(other),
            MutationError::Other("disk on fire".to_string())
        );
    }

    #[test]
    fn scan_errors_name_the_path() {
        let error = RenameError::NotAFile(PathBuf::from("/d/sub"));
        assert_eq!(error.to_string(), "Not a file: /d/sub");
        assert!(matches!(
            RenameError::from(std::io::Error::other("x")),
            RenameError::Io(_)
        ));
    }

    #[test]
    fn errors_serialize_as_their_message() {
        let json = serde_json::to_string(&ConfigError::EmptyPrefix).unwrap();
        assert_eq!(json, "\"Prefix cannot be empty\"");
    }
}
