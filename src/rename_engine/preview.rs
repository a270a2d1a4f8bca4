use std::collections::HashMap;

use tracing::debug;

use super::generator::generate;
use super::model::{FileRef, PreviewItem, PreviewSummary, RenameConfig};
use super::sorter::sort;
use super::validator::validate_name;

/// Builds the conflict-annotated preview for a batch, in execution order.
///
/// Pure: never touches the filesystem, so names that already exist on disk
/// are not reported here (see `RenameExecutor::preflight`).
pub fn build_preview(files: &[FileRef], config: &RenameConfig) -> Vec<PreviewItem> {
    if let Err(e) = config.validate() {
        let reason = format!("Invalid configuration: {}", e);
        return files
            .iter()
            .map(|file| PreviewItem::conflicting(file.clone(), file.name.clone(), reason.clone()))
            .collect();
    }

    let mut items: Vec<PreviewItem> = sort(files, config.sort_strategy)
        .into_iter()
        .enumerate()
        .map(|(index, file)| match generate(&file, config, index) {
            Ok(name) => match validate_name(&name) {
                Ok(()) => PreviewItem::clean(file, name),
                Err(e) => PreviewItem::conflicting(file, name, e.to_string()),
            },
            Err(e) => {
                let name = file.name.clone();
                PreviewItem::conflicting(file, name, e.to_string())
            }
        })
        .collect();

    mark_duplicates(&mut items);

    debug!(files = items.len(), "built preview");
    items
}

pub fn mark_duplicates(items: &mut [PreviewItem]) {
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (index, item) in items.iter().enumerate() {
        groups
            .entry(item.preview_name.to_lowercase())
            .or_default()
            .push(index);
    }

    for indices in groups.values().filter(|indices| indices.len() > 1) {
        let first = indices[0];
        for &index in indices {
            // Positions are 1-based, as shown to the user.
            let other = if index == first { indices[1] } else { first };
            items[index].flag(format!(
                "Duplicate filename: collides with file #{}",
                other + 1
            ));
        }
    }
}

pub fn summarize(items: &[PreviewItem]) -> PreviewSummary {
    items.iter().fold(
        PreviewSummary {
            total_files: items.len(),
            ..Default::default()
        },
        |mut summary, item| {
            if item.has_conflict {
                summary.conflicts += 1;
            } else if item.is_changed() {
                summary.valid_renames += 1;
            } else {
                summary.unchanged += 1;
            }
            summary
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rename_engine::model::SortStrategy;

    fn config(prefix: &str) -> RenameConfig {
        RenameConfig {
            prefix: prefix.to_string(),
            start_number: 1,
            digit_count: 3,
            preserve_extension: true,
            sort_strategy: SortStrategy::Natural,
        }
    }

    fn files(names: &[&str]) -> Vec<FileRef> {
        names
            .iter()
            .map(|name| FileRef::new(format!("/d/{name}"), *name, "/d"))
            .collect()
    }

    #[test]
    fn invalid_config_flags_every_file() {
        let items = build_preview(&files(&["b.jpg", "a.jpg"]), &config(""));
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| item.has_conflict));
        assert_eq!(items[0].original.name, "b.jpg");
        assert_eq!(
            items[0].conflict_reason.as_deref(),
            Some("Invalid configuration: Prefix cannot be empty")
        );
    }

    #[test]
    fn preview_follows_sort_order() {
        let items = build_preview(&files(&["img10.jpg", "img2.jpg"]), &config("trip_"));
        assert_eq!(items[0].original.name, "img2.jpg");
        assert_eq!(items[0].preview_name, "trip_001.jpg");
        assert_eq!(items[1].preview_name, "trip_002.jpg");
        assert!(items.iter().all(PreviewItem::can_rename));
    }

    #[test]
    fn reserved_generated_name_is_a_conflict() {
        let cfg = RenameConfig {
            prefix: "COM".to_string(),
            start_number: 1,
            digit_count: 1,
            preserve_extension: false,
            sort_strategy: SortStrategy::OriginalOrder,
        };
        let items = build_preview(&files(&["x.txt", "y.txt"]), &cfg);
        assert_eq!(items[0].preview_name, "COM1");
        assert_eq!(
            items[0].conflict_reason.as_deref(),
            Some("Filename is a reserved device name: COM1")
        );
        assert!(items[1].can_rename());
    }

    #[test]
    fn duplicates_are_case_insensitive_and_mark_every_occurrence() {
        let sources = files(&["a.jpg", "b.jpg", "c.jpg"]);
        let mut items = vec![
            PreviewItem::clean(sources[0].clone(), "IMG_001.jpg".to_string()),
            PreviewItem::clean(sources[1].clone(), "other.jpg".to_string()),
            PreviewItem::clean(sources[2].clone(), "img_001.jpg".to_string()),
        ];
        mark_duplicates(&mut items);

        assert!(items[0].has_conflict);
        assert!(!items[1].has_conflict);
        assert!(items[2].has_conflict);
        assert_eq!(
            items[0].conflict_reason.as_deref(),
            Some("Duplicate filename: collides with file #3")
        );
        assert_eq!(
            items[2].conflict_reason.as_deref(),
            Some("Duplicate filename: collides with file #1")
        );
    }

    #[test]
    fn validity_error_wins_over_duplicate() {
        let sources = files(&["a", "b"]);
        let mut items = vec![
            PreviewItem::conflicting(sources[0].clone(), "CON".to_string(), "reserved"),
            PreviewItem::clean(sources[1].clone(), "con".to_string()),
        ];
        mark_duplicates(&mut items);
        assert_eq!(items[0].conflict_reason.as_deref(), Some("reserved"));
        assert!(items[1].has_conflict);
    }

    #[test]
    fn summary_counts() {
        let sources = files(&["keep.jpg", "b.jpg", "c.jpg"]);
        let items = vec![
            PreviewItem::clean(sources[0].clone(), "keep.jpg".to_string()),
            PreviewItem::clean(sources[1].clone(), "x_001.jpg".to_string()),
            PreviewItem::conflicting(sources[2].clone(), "CON".to_string(), "reserved"),
        ];
        let summary = summarize(&items);
        assert_eq!(summary.total_files, 3);
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.valid_renames, 1);
        assert_eq!(summary.conflicts, 1);
        assert!(!summary.can_proceed());
    }

    #[test]
    fn empty_batch_cannot_proceed() {
        let summary = summarize(&build_preview(&[], &config("x")));
        assert_eq!(summary, PreviewSummary::default());
        assert!(!summary.can_proceed());
    }
}
