//! Folder rows for browsing organized notes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Date groups in the order they are presented.
const DATE_GROUP_ORDER: [&str; 6] = [
    "Today",
    "Yesterday",
    "This Week",
    "This Month",
    "This Year",
    "All Time",
];

/// Note counts per folder, as reported by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteCounts {
    #[serde(default)]
    pub categories: HashMap<String, u64>,
    #[serde(default)]
    pub date_groups: HashMap<String, u64>,
    #[serde(default)]
    pub mime_types: HashMap<String, u64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FolderKind {
    Category,
    DateGroup,
    MimeType,
}

impl std::fmt::Display for FolderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FolderKind::Category => write!(f, "category"),
            FolderKind::DateGroup => write!(f, "date_group"),
            FolderKind::MimeType => write!(f, "mime_type"),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FolderRow {
    pub kind: FolderKind,
    pub name: String,
    pub count: u64,
}

impl FolderRow {
    pub fn id(&self) -> String {
        format!("{}-{}", self.kind, self.name)
    }
}

/// Sorted folder rows for each browse section.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BrowseIndex {
    pub categories: Vec<FolderRow>,
    pub date_groups: Vec<FolderRow>,
    pub mime_types: Vec<FolderRow>,
}

impl BrowseIndex {
    pub fn from_counts(counts: &NoteCounts) -> Self {
        Self {
            categories: sorted_rows(&counts.categories, FolderKind::Category),
            date_groups: sorted_date_group_rows(&counts.date_groups),
            mime_types: sorted_rows(&counts.mime_types, FolderKind::MimeType),
        }
    }
}

fn rows(counts: &HashMap<String, u64>, kind: FolderKind) -> Vec<FolderRow> {
    counts
        .iter()
        .map(|(name, count)| FolderRow {
            kind,
            name: name.clone(),
            count: *count,
        })
        .collect()
}

fn sort_case_insensitive(rows: &mut [FolderRow]) {
    rows.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
}

fn sorted_rows(counts: &HashMap<String, u64>, kind: FolderKind) -> Vec<FolderRow> {
    let mut rows = rows(counts, kind);
    sort_case_insensitive(&mut rows);
    rows
}

/// Known date groups first in their natural order, anything else after.
fn sorted_date_group_rows(counts: &HashMap<String, u64>) -> Vec<FolderRow> {
    let (mut preferred, mut remaining): (Vec<FolderRow>, Vec<FolderRow>) =
        rows(counts, FolderKind::DateGroup)
            .into_iter()
            .partition(|row| DATE_GROUP_ORDER.contains(&row.name.as_str()));

    preferred.sort_by_key(|row| {
        DATE_GROUP_ORDER
            .iter()
            .position(|name| *name == row.name)
            .unwrap_or(DATE_GROUP_ORDER.len())
    });
    sort_case_insensitive(&mut remaining);

    preferred.extend(remaining);
    preferred
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(entries: &[(&str, u64)]) -> HashMap<String, u64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn names(rows: &[FolderRow]) -> Vec<&str> {
        rows.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_categories_sorted_case_insensitively() {
        let index = BrowseIndex::from_counts(&NoteCounts {
            categories: counts(&[("shopping", 2), ("Work", 5), ("Ideas", 1)]),
            ..Default::default()
        });
        assert_eq!(names(&index.categories), vec!["Ideas", "shopping", "Work"]);
        assert_eq!(index.categories[2].count, 5);
    }

    #[test]
    fn test_date_groups_preferred_order() {
        let index = BrowseIndex::from_counts(&NoteCounts {
            date_groups: counts(&[
                ("All Time", 40),
                ("Older", 3),
                ("Today", 1),
                ("This Week", 4),
                ("archive", 2),
                ("Yesterday", 2),
            ]),
            ..Default::default()
        });
        assert_eq!(
            names(&index.date_groups),
            vec!["Today", "Yesterday", "This Week", "All Time", "archive", "Older"]
        );
    }

    #[test]
    fn test_row_id() {
        let row = FolderRow {
            kind: FolderKind::MimeType,
            name: "image/jpeg".to_string(),
            count: 1,
        };
        assert_eq!(row.id(), "mime_type-image/jpeg");
    }

    #[test]
    fn test_parse_counts() {
        let json = r#"{"categories": {"Shopping": 2}, "date_groups": {"Today": 1}}"#;
        let counts: NoteCounts = serde_json::from_str(json).unwrap();
        assert_eq!(counts.categories["Shopping"], 2);
        assert!(counts.mime_types.is_empty());
    }
}
