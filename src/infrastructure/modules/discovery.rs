//! Source unit discovery - recursive directory walks

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::infrastructure::config::ModulesConfig;

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

/// Every allow-listed file under `root`, sorted by path.
///
/// A missing root is logged and yields nothing.
pub fn discover(root: &Path, modules: &ModulesConfig) -> Vec<PathBuf> {
    if !root.exists() {
        tracing::warn!("Module directory does not exist: {}", root.display());
        return Vec::new();
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("Failed to read directory entry under {}: {}", root.display(), e);
                continue;
            }
        };
        if entry.file_type().is_file() && modules.is_allowed(entry.path()) {
            found.push(entry.into_path());
        }
    }
    found
}

/// Files under `roots` whose stem equals `name`, ignoring case
pub fn find_by_stem(roots: &[&Path], name: &str, modules: &ModulesConfig) -> Vec<PathBuf> {
    let wanted = name.to_lowercase();
    roots
        .iter()
        .flat_map(|root| discover(root, modules))
        .filter(|path| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.to_lowercase() == wanted)
                .unwrap_or(false)
        })
        .collect()
}

/// Category of a text command: its immediate parent directory's name
pub fn category_of(path: &Path) -> String {
    path.parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| "general".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discover_filters_and_recurses() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("economy/nested")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("economy/work.yaml"), "name: work").unwrap();
        fs::write(root.join("economy/nested/rob.yml"), "name: rob").unwrap();
        fs::write(root.join("economy/notes.txt"), "ignored").unwrap();
        fs::write(root.join(".git/config.yaml"), "ignored").unwrap();

        let found = discover(root, &ModulesConfig::default());
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| !p.to_string_lossy().contains(".git")));
    }

    #[test]
    fn test_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(&dir.path().join("nope"), &ModulesConfig::default()).is_empty());
    }

    #[test]
    fn test_find_by_stem_ignores_case() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("fun")).unwrap();
        fs::write(dir.path().join("fun/Meme.yaml"), "name: meme").unwrap();

        let found = find_by_stem(&[dir.path()], "MEME", &ModulesConfig::default());
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_category_is_parent_dir() {
        assert_eq!(category_of(Path::new("commands/moderation/ban.yaml")), "moderation");
    }
}
