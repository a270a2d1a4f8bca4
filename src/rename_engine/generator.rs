use tracing::debug;

use crate::error::GenerationError;
use super::model::{FileRef, GeneratedName, RenameConfig};

/// Numbers wider than `digit_count` overflow the padding instead of being
/// truncated. The result is not run through the name validator.
pub fn generate(file: &FileRef, config: &RenameConfig, index: usize) -> Result<String, GenerationError> {
    config.validate()?;

    let number = u64::try_from(index)
        .ok()
        .and_then(|index| config.start_number.checked_add(index))
        .ok_or(GenerationError::SequenceOverflow { index })?;

    let width = usize::from(config.digit_count);
    let mut name = format!("{}{:0width$}", config.prefix, number);

    if config.preserve_extension {
        if let Some(extension) = file.extension() {
            name.push('.');
            name.push_str(extension);
        }
    }

    debug!(original = %file.name, candidate = %name, index, "generated name");
    Ok(name)
}

pub fn generate_all(files: &[FileRef], config: &RenameConfig) -> Result<Vec<GeneratedName>, GenerationError> {
    files
        .iter()
        .enumerate()
        .map(|(index, file)| {
            generate(file, config, index).map(|name| GeneratedName {
                name,
                index,
                source: file.clone(),
            })
        })
        .collect()
}
