//! Input-directory discovery (spec.md §6 table, SPEC_FULL.md §4.6).
//!
//! A recursive walk that classifies every file by `(parent directory
//! name, basename glob)`, grounded on
//! `original_source::DesktopParser.__init__`'s `rglob` loop. Files are
//! grouped by artifact family and, where the family is per-contact, by
//! the owning user-id (the file's immediate parent directory name).

use std::path::{Path, PathBuf};

use eyre::{Context, Result};

#[derive(Debug, Default)]
pub struct DiscoveredTree {
    pub message_history: Vec<(String, PathBuf)>,
    pub gallery_cache: Vec<(String, PathBuf)>,
    pub gallery_state: Vec<(String, PathBuf)>,
    pub dialog_state: Vec<(String, PathBuf)>,
    pub draft_storage: Vec<(String, PathBuf)>,
    pub search_history: Vec<(String, PathBuf)>,
    pub avatars: Vec<(String, PathBuf)>,
    pub my_info: Vec<PathBuf>,
    pub dialog_index: Vec<PathBuf>,
    pub contact_list: Vec<PathBuf>,
    pub call_log: Vec<PathBuf>,
    pub ui_settings: Vec<PathBuf>,
    pub favorites: Vec<PathBuf>,
    pub content_cache_dirs: Vec<PathBuf>,
}

/// Walk `root` recursively and classify every regular file. Unreadable
/// subdirectories are a structural I/O failure for that subtree only —
/// per spec.md §7 the walk continues with whatever else it can see.
pub fn discover(root: &Path) -> Result<DiscoveredTree> {
    let mut tree = DiscoveredTree::default();
    walk(root, &mut tree)?;
    Ok(tree)
}

fn walk(dir: &Path, tree: &mut DiscoveredTree) -> Result<()> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "cannot read directory, skipping subtree");
            return Ok(());
        }
    };

    for entry in entries {
        let entry = entry.wrap_err_with(|| format!("reading directory entry under {}", dir.display()))?;
        let path = entry.path();
        if path.is_dir() {
            if path.file_name().and_then(|n| n.to_str()) == Some("content.cache") {
                tree.content_cache_dirs.push(path.clone());
            }
            walk(&path, tree)?;
            continue;
        }
        classify(&path, tree);
    }
    Ok(())
}

fn classify(path: &Path, tree: &mut DiscoveredTree) {
    let basename = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let parent_name = path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    // Per-contact binary/text families: the parent directory name is the
    // user-id, unless the parent is a known subdirectory (avatars,
    // dialogs, info, favorites) in which case the grandparent is the uid.
    if basename.starts_with("_db") {
        tree.message_history.push((parent_name.to_string(), path.to_path_buf()));
    } else if basename.starts_with("_gc") {
        tree.gallery_cache.push((parent_name.to_string(), path.to_path_buf()));
    } else if basename.starts_with("_gs") {
        tree.gallery_state.push((parent_name.to_string(), path.to_path_buf()));
    } else if basename.starts_with("_ste") {
        tree.dialog_state.push((parent_name.to_string(), path.to_path_buf()));
    } else if basename.starts_with("_draft") {
        tree.draft_storage.push((parent_name.to_string(), path.to_path_buf()));
    } else if basename == "hst" {
        tree.search_history.push((parent_name.to_string(), path.to_path_buf()));
    } else if basename.ends_with(".jpg") && parent_name == "avatars" {
        let uid = grandparent_name(path);
        tree.avatars.push((uid, path.to_path_buf()));
    } else if basename == "cache" && parent_name == "info" {
        tree.my_info.push(path.to_path_buf());
    } else if parent_name == "dialogs" && basename.starts_with("cache") {
        tree.dialog_index.push(path.to_path_buf());
    } else if basename == "cache.cl" {
        tree.contact_list.push(path.to_path_buf());
    } else if basename == "call_log.cache" {
        tree.call_log.push(path.to_path_buf());
    } else if basename == "ui2.stg" {
        tree.ui_settings.push(path.to_path_buf());
    } else if parent_name == "favorites" && basename == "cache2" {
        tree.favorites.push(path.to_path_buf());
    }
}

fn grandparent_name(path: &Path) -> String {
    path.parent()
        .and_then(|p| p.parent())
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string()
}
