//! Per-file diff and mentioned-issue models.

use serde::Serialize;

/// Kind of change a file underwent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    Added,
    Changed,
    Deleted,
    Renamed,
}

impl From<&str> for ChangeType {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "added" => Self::Added,
            "deleted" => Self::Deleted,
            "renamed" => Self::Renamed,
            _ => Self::Changed,
        }
    }
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Changed => write!(f, "changed"),
            Self::Deleted => write!(f, "deleted"),
            Self::Renamed => write!(f, "renamed"),
        }
    }
}

/// Unified diff of a single changed file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileDiff {
    pub state: ChangeType,

    /// File name before the change (for deletes/renames).
    pub old_name: Option<String>,

    /// File name after the change (for adds/changes/renames).
    pub new_name: Option<String>,

    /// Unified diff body, empty for binary files.
    pub content: String,
}

impl FileDiff {
    /// Best display name: the new name, falling back to the old one.
    pub fn name(&self) -> &str {
        self.new_name
            .as_deref()
            .or(self.old_name.as_deref())
            .unwrap_or("")
    }

    /// Display path, showing "old → new" for renamed files.
    pub fn display_path(&self) -> String {
        match (&self.old_name, &self.new_name, self.state) {
            (Some(old), Some(new), ChangeType::Renamed) => format!("{} → {}", old, new),
            _ => self.name().to_string(),
        }
    }

    /// Sort key for display: `.changes` files first, then `.spec`, then
    /// everything else in API order.
    pub fn sort_priority(&self) -> u8 {
        let name = self.name();
        if name.ends_with(".changes") {
            0
        } else if name.ends_with(".spec") {
            1
        } else {
            2
        }
    }
}

/// Order diffs for display. The sort is stable, so files within one
/// priority class keep the order the API returned them in.
pub fn sort_diffs_for_display(diffs: &mut [FileDiff]) {
    diffs.sort_by_key(FileDiff::sort_priority);
}

/// Issue referenced by the request's diff (bug tracker cross-link).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Issue {
    pub state: Option<String>,
    pub tracker: Option<String>,
    pub name: Option<String>,
    pub label: Option<String>,
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diff(name: &str) -> FileDiff {
        FileDiff {
            state: ChangeType::Changed,
            old_name: Some(name.to_string()),
            new_name: Some(name.to_string()),
            content: String::new(),
        }
    }

    #[test]
    fn test_change_type_from_str() {
        assert_eq!(ChangeType::from("added"), ChangeType::Added);
        assert_eq!(ChangeType::from("DELETED"), ChangeType::Deleted);
        assert_eq!(ChangeType::from("changed"), ChangeType::Changed);
        assert_eq!(ChangeType::from("unknown"), ChangeType::Changed);
    }

    #[test]
    fn test_display_path_renamed() {
        let file = FileDiff {
            state: ChangeType::Renamed,
            old_name: Some("pkg.spec.old".into()),
            new_name: Some("pkg.spec".into()),
            content: String::new(),
        };
        assert_eq!(file.display_path(), "pkg.spec.old → pkg.spec");
    }

    #[test]
    fn test_display_path_deleted_falls_back_to_old_name() {
        let file = FileDiff {
            state: ChangeType::Deleted,
            old_name: Some("obsolete.patch".into()),
            new_name: None,
            content: String::new(),
        };
        assert_eq!(file.display_path(), "obsolete.patch");
    }

    #[test]
    fn test_sort_changes_then_spec_then_rest() {
        let mut diffs = vec![
            diff("fix-build.patch"),
            diff("mypkg.spec"),
            diff("README"),
            diff("mypkg.changes"),
        ];
        sort_diffs_for_display(&mut diffs);
        let names: Vec<&str> = diffs.iter().map(FileDiff::name).collect();
        assert_eq!(
            names,
            vec!["mypkg.changes", "mypkg.spec", "fix-build.patch", "README"]
        );
    }

    #[test]
    fn test_sort_is_stable_within_class() {
        let mut diffs = vec![diff("b.patch"), diff("a.patch")];
        sort_diffs_for_display(&mut diffs);
        assert_eq!(diffs[0].name(), "b.patch");
    }
}
