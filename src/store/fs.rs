use std::collections::BTreeSet;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{BulkOutcome, NotebookStore};
use crate::core::tree::{ROOT_ID, Tree, TreeNode};
use crate::error::{ItemKind, Result, SlateError};

const MANIFEST_FILE: &str = "manifest.json";

/// One item moved into the archive. The item lives at
/// `<archive_dir>/<stored>/<file name>` until it is restored or purged.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ArchiveEntry {
    path: String,
    stored: Uuid,
    is_folder: bool,
    archived_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    entries: Vec<ArchiveEntry>,
}

/// Notebooks kept as plain files under one directory, with archived items
/// parked in a second directory and tracked by a JSON manifest.
pub struct FsNotebookStore {
    notebooks_dir: PathBuf,
    archive_dir: PathBuf,
    // Serializes read-modify-write cycles on the manifest.
    manifest_lock: Mutex<()>,
}

impl FsNotebookStore {
    pub async fn open(notebooks_dir: impl Into<PathBuf>, archive_dir: impl Into<PathBuf>) -> Result<Self> {
        let notebooks_dir = notebooks_dir.into();
        let archive_dir = archive_dir.into();
        fs::create_dir_all(&notebooks_dir).await?;
        fs::create_dir_all(&archive_dir).await?;
        log::debug!(
            "Notebook store at {} (archive {})",
            notebooks_dir.display(),
            archive_dir.display()
        );
        Ok(Self {
            notebooks_dir,
            archive_dir,
            manifest_lock: Mutex::new(()),
        })
    }

    pub fn notebooks_dir(&self) -> &Path {
        &self.notebooks_dir
    }

    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }

    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let parts = components(path)?;
        Some(parts.iter().fold(self.notebooks_dir.clone(), |acc, p| acc.join(p)))
    }

    fn stored_root(&self, entry: &ArchiveEntry) -> PathBuf {
        self.archive_dir
            .join(entry.stored.to_string())
            .join(file_name(&entry.path))
    }

    async fn load_manifest(&self) -> Result<Manifest> {
        match fs::read(self.archive_dir.join(MANIFEST_FILE)).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(Manifest::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_manifest(&self, manifest: &Manifest) -> Result<()> {
        let json = serde_json::to_vec_pretty(manifest)?;
        let tmp = self.archive_dir.join(format!("{MANIFEST_FILE}.tmp"));
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, self.archive_dir.join(MANIFEST_FILE)).await?;
        Ok(())
    }

    /// Where `path` lives inside the archive: the newest entry archived
    /// under exactly that path, else the newest archived folder holding it.
    fn locate(&self, manifest: &Manifest, path: &str) -> Option<(usize, PathBuf)> {
        let newest_first = || manifest.entries.iter().enumerate().rev();
        if let Some((i, entry)) = newest_first().find(|(_, e)| e.path == path) {
            return Some((i, self.stored_root(entry)));
        }
        newest_first().find_map(|(i, entry)| {
            let rest = path.strip_prefix(&entry.path)?.strip_prefix('/')?;
            let location = rest
                .split('/')
                .fold(self.stored_root(entry), |acc, p| acc.join(p));
            Some((i, location))
        })
    }

    async fn archive_one(&self, manifest: &mut Manifest, path: &str) -> Result<()> {
        let source = self.resolve(path).ok_or_else(|| SlateError::NotFound(path.into()))?;
        let meta = fs::symlink_metadata(&source).await?;

        let stored = Uuid::new_v4();
        let slot = self.archive_dir.join(stored.to_string());
        fs::create_dir_all(&slot).await?;
        if let Err(e) = fs::rename(&source, slot.join(file_name(path))).await {
            let _ = fs::remove_dir(&slot).await;
            return Err(e.into());
        }

        manifest.entries.push(ArchiveEntry {
            path: path.to_string(),
            stored,
            is_folder: meta.is_dir(),
            archived_at: Utc::now(),
        });
        Ok(())
    }

    /// Put the most recently archived entry back where it came from. Used
    /// when its manifest record could not be written.
    async fn unarchive_last(&self, manifest: &mut Manifest) {
        let Some(entry) = manifest.entries.pop() else {
            return;
        };
        let slot = self.archive_dir.join(entry.stored.to_string());
        let back = match self.resolve(&entry.path) {
            Some(dest) => fs::rename(self.stored_root(&entry), dest).await,
            None => Ok(()),
        };
        match back {
            Ok(()) => {
                let _ = fs::remove_dir(&slot).await;
            }
            Err(e) => log::error!(
                "Could not move {} back out of {}: {}",
                entry.path,
                slot.display(),
                e
            ),
        }
    }

    async fn restore_one(&self, manifest: &mut Manifest, path: &str) -> Result<()> {
        let (index, location) = self
            .locate(manifest, path)
            .ok_or_else(|| SlateError::NotFound(path.into()))?;
        let dest = self.resolve(path).ok_or_else(|| SlateError::NotFound(path.into()))?;

        if fs::symlink_metadata(&dest).await.is_ok() {
            let is_dir = fs::metadata(&location).await.is_ok_and(|m| m.is_dir());
            return Err(SlateError::DuplicateName {
                kind: kind_of(is_dir),
                name: file_name(path).to_string(),
            });
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::rename(&location, &dest).await?;

        if manifest.entries[index].path == path {
            let entry = manifest.entries.remove(index);
            let _ = fs::remove_dir_all(self.archive_dir.join(entry.stored.to_string())).await;
        }
        Ok(())
    }

    async fn delete_one(&self, manifest: &mut Manifest, path: &str) -> Result<()> {
        let (index, location) = self
            .locate(manifest, path)
            .ok_or_else(|| SlateError::NotFound(path.into()))?;

        if manifest.entries[index].path == path {
            let entry = manifest.entries.remove(index);
            match fs::remove_dir_all(self.archive_dir.join(entry.stored.to_string())).await {
                Ok(()) => {}
                Err(e) if e.kind() == IoErrorKind::NotFound => {}
                Err(e) => {
                    manifest.entries.insert(index, entry);
                    return Err(e.into());
                }
            }
            return Ok(());
        }

        let meta = fs::symlink_metadata(&location).await?;
        if meta.is_dir() {
            fs::remove_dir_all(&location).await?;
        } else {
            fs::remove_file(&location).await?;
        }
        Ok(())
    }

    fn parent_dir(&self, parent_path: &str) -> Result<PathBuf> {
        self.resolve(parent_path)
            .ok_or_else(|| SlateError::NotFound(parent_path.into()))
    }
}

#[async_trait]
impl NotebookStore for FsNotebookStore {
    async fn fetch_active_tree(&self) -> Result<Tree> {
        let mut tree = Tree::new(TreeNode::root("Notebooks"));
        walk(&self.notebooks_dir, "", "active", &mut tree, ROOT_ID)
            .await
            .map_err(|e| SlateError::Fetch(format!("{}: {}", self.notebooks_dir.display(), e)))?;
        Ok(tree)
    }

    async fn fetch_archived_tree(&self) -> Result<Tree> {
        let manifest = self
            .load_manifest()
            .await
            .map_err(|e| SlateError::Fetch(format!("archive manifest: {e}")))?;

        let mut tree = Tree::new(TreeNode::root("Archived"));
        for entry in &manifest.entries {
            let location = self.stored_root(entry);
            if fs::symlink_metadata(&location).await.is_err() {
                log::warn!("Archived item {} is missing from {}", entry.path, location.display());
                continue;
            }

            let scope = format!("archive:{}", entry.stored);
            let id = node_id(&scope, &entry.path);
            let label = file_name(&entry.path);
            let node = if entry.is_folder {
                TreeNode::folder(id.clone(), label, entry.path.clone())
            } else {
                TreeNode::file(id.clone(), label, entry.path.clone())
            };
            if !tree.insert(ROOT_ID, node) {
                continue;
            }
            if entry.is_folder {
                walk(&location, &entry.path, &scope, &mut tree, &id)
                    .await
                    .map_err(|e| SlateError::Fetch(format!("{}: {}", location.display(), e)))?;
            }
        }
        Ok(tree)
    }

    async fn archive_items(&self, paths: &[String]) -> Result<BulkOutcome> {
        let _guard = self.manifest_lock.lock().await;
        let mut manifest = self.load_manifest().await?;
        let batch = Batch::new(paths);

        let mut results = Vec::with_capacity(batch.heads.len());
        for path in &batch.heads {
            let mut result = self.archive_one(&mut manifest, path).await;
            // Every move is recorded before the next one, so a failed write
            // never leaves an item outside both trees.
            if result.is_ok() {
                if let Err(e) = self.save_manifest(&manifest).await {
                    self.unarchive_last(&mut manifest).await;
                    result = Err(e);
                }
            }
            if let Err(e) = &result {
                log::warn!("Failed to archive {}: {}", path, e);
            }
            results.push(result.is_ok());
        }

        let outcome = batch.outcome(&results);
        log::info!("Archived {} items, {} failed", outcome.successful, outcome.failed);
        Ok(outcome)
    }

    async fn restore_items(&self, paths: &[String]) -> Result<BulkOutcome> {
        let _guard = self.manifest_lock.lock().await;
        let mut manifest = self.load_manifest().await?;
        let batch = Batch::new(paths);

        let mut results = Vec::with_capacity(batch.heads.len());
        for path in &batch.heads {
            let mut result = self.restore_one(&mut manifest, path).await;
            if result.is_ok() {
                if let Err(e) = self.save_manifest(&manifest).await {
                    result = Err(e);
                }
            }
            if let Err(e) = &result {
                log::warn!("Failed to restore {}: {}", path, e);
            }
            results.push(result.is_ok());
        }

        let outcome = batch.outcome(&results);
        log::info!("Restored {} items, {} failed", outcome.successful, outcome.failed);
        Ok(outcome)
    }

    async fn delete_items_permanently(&self, paths: &[String]) -> Result<BulkOutcome> {
        let _guard = self.manifest_lock.lock().await;
        let mut manifest = self.load_manifest().await?;
        let batch = Batch::new(paths);

        let mut results = Vec::with_capacity(batch.heads.len());
        for path in &batch.heads {
            let mut result = self.delete_one(&mut manifest, path).await;
            if result.is_ok() {
                if let Err(e) = self.save_manifest(&manifest).await {
                    result = Err(e);
                }
            }
            if let Err(e) = &result {
                log::warn!("Failed to delete {}: {}", path, e);
            }
            results.push(result.is_ok());
        }

        let outcome = batch.outcome(&results);
        log::info!("Deleted {} items, {} failed", outcome.successful, outcome.failed);
        Ok(outcome)
    }

    async fn create_file(&self, parent_path: &str, name: &str) -> Result<Tree> {
        validate_name(name)?;
        let target = self.parent_dir(parent_path)?.join(name);
        let created = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await;
        match created {
            Ok(_) => log::info!("Created file {}", target.display()),
            Err(e) if e.kind() == IoErrorKind::AlreadyExists => {
                return Err(SlateError::DuplicateName {
                    kind: ItemKind::File,
                    name: name.to_string(),
                });
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                return Err(SlateError::NotFound(parent_path.to_string()));
            }
            Err(e) => return Err(e.into()),
        }
        self.fetch_active_tree().await
    }

    async fn create_folder(&self, parent_path: &str, name: &str) -> Result<Tree> {
        validate_name(name)?;
        let target = self.parent_dir(parent_path)?.join(name);
        match fs::create_dir(&target).await {
            Ok(()) => log::info!("Created folder {}", target.display()),
            Err(e) if e.kind() == IoErrorKind::AlreadyExists => {
                return Err(SlateError::DuplicateName {
                    kind: ItemKind::Folder,
                    name: name.to_string(),
                });
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                return Err(SlateError::NotFound(parent_path.to_string()));
            }
            Err(e) => return Err(e.into()),
        }
        self.fetch_active_tree().await
    }

    async fn read_file_content(&self, path: &str) -> Result<String> {
        let file = self
            .resolve(path)
            .filter(|_| !path.trim_matches('/').is_empty())
            .ok_or_else(|| SlateError::NotFound(path.into()))?;
        match fs::read_to_string(&file).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == IoErrorKind::NotFound => Err(SlateError::NotFound(path.into())),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_file_content(&self, path: &str, content: &str) -> Result<()> {
        let file = self
            .resolve(path)
            .filter(|_| !path.trim_matches('/').is_empty())
            .ok_or_else(|| SlateError::NotFound(path.into()))?;
        fs::write(&file, content).await?;
        log::debug!("Saved {} ({} bytes)", path, content.len());
        Ok(())
    }
}

/// The paths of one bulk call, with entries nested under another entry
/// folded into it: they travel with their ancestor and share its result.
struct Batch {
    heads: Vec<String>,
    // For every requested path, the index into `heads` it depends on, or
    // `None` when the path itself was unusable.
    owners: Vec<Option<usize>>,
}

impl Batch {
    fn new(paths: &[String]) -> Self {
        let normalized: Vec<Option<String>> = paths.iter().map(|p| normalize(p)).collect();
        let unique: BTreeSet<&String> = normalized.iter().flatten().collect();
        let heads: Vec<String> = unique
            .iter()
            .filter(|p| !unique.iter().any(|other| is_ancestor(other, p)))
            .map(|p| (*p).clone())
            .collect();

        let owners = normalized
            .iter()
            .map(|p| {
                let p = p.as_ref()?;
                heads.iter().position(|h| h == p || is_ancestor(h, p))
            })
            .collect();
        Self { heads, owners }
    }

    fn outcome(&self, results: &[bool]) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        for owner in &self.owners {
            outcome.record(owner.is_some_and(|i| results[i]));
        }
        outcome
    }
}

/// Walk `dir` into `tree` under `parent_id`: folders first, then files,
/// each group by name. Hidden entries are skipped.
async fn walk(dir: &Path, base: &str, scope: &str, tree: &mut Tree, parent_id: &str) -> std::io::Result<()> {
    let mut pending = vec![(dir.to_path_buf(), base.to_string(), parent_id.to_string())];

    while let Some((dir, base, parent)) = pending.pop() {
        let mut entries = Vec::new();
        let mut reader = fs::read_dir(&dir).await?;
        while let Some(entry) = reader.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let is_dir = entry.file_type().await?.is_dir();
            entries.push((is_dir, name, entry.path()));
        }
        entries.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        for (is_dir, name, full) in entries {
            let path = format!("{base}/{name}");
            let id = node_id(scope, &path);
            let node = if is_dir {
                TreeNode::folder(id.clone(), name, path.clone())
            } else {
                TreeNode::file(id.clone(), name, path.clone())
            };
            if tree.insert(&parent, node) && is_dir {
                pending.push((full, path, id));
            }
        }
    }
    Ok(())
}

/// Stable id for a path within a scope, so refreshes keep ids intact.
fn node_id(scope: &str, path: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("slate:{scope}:{path}").as_bytes()).to_string()
}

/// Split a store path into its components. `None` when it tries to climb
/// out with `..`.
fn components(path: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => return None,
            p => parts.push(p),
        }
    }
    Some(parts)
}

/// Canonical `/a/b` form of an item path; `None` for the root or bad paths.
fn normalize(path: &str) -> Option<String> {
    let parts = components(path)?;
    if parts.is_empty() {
        return None;
    }
    Some(format!("/{}", parts.join("/")))
}

fn is_ancestor(ancestor: &str, path: &str) -> bool {
    path.strip_prefix(ancestor)
        .is_some_and(|rest| rest.starts_with('/'))
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn kind_of(is_folder: bool) -> ItemKind {
    if is_folder { ItemKind::Folder } else { ItemKind::File }
}

fn validate_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() || name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(SlateError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn store() -> (TempDir, FsNotebookStore) {
        let dir = TempDir::new().unwrap();
        let store = FsNotebookStore::open(dir.path().join("notebooks"), dir.path().join("archive"))
            .await
            .unwrap();
        (dir, store)
    }

    async fn seed(store: &FsNotebookStore) {
        store.create_folder("", "Math").await.unwrap();
        store.create_file("/Math", "notes.md").await.unwrap();
        store.create_file("", "todo.md").await.unwrap();
    }

    fn paths(tree: &Tree) -> Vec<String> {
        tree.flatten().into_iter().filter_map(|n| n.path.clone()).collect()
    }

    fn root_paths(tree: &Tree) -> Vec<String> {
        tree.children(ROOT_ID).filter_map(|n| n.path.clone()).collect()
    }

    #[tokio::test]
    async fn active_tree_lists_folders_first_with_stable_ids() {
        let (_dir, store) = store().await;
        seed(&store).await;
        fs::write(store.notebooks_dir().join(".hidden"), "x").await.unwrap();

        let tree = store.fetch_active_tree().await.unwrap();
        assert_eq!(paths(&tree), vec!["/Math", "/Math/notes.md", "/todo.md"]);
        assert!(tree.validate().is_ok());

        let again = store.fetch_active_tree().await.unwrap();
        assert_eq!(tree, again);
    }

    #[tokio::test]
    async fn create_twice_is_a_duplicate() {
        let (_dir, store) = store().await;
        store.create_file("", "a.md").await.unwrap();
        let err = store.create_file("", "a.md").await.unwrap_err();
        assert!(err.is_duplicate_name());

        store.create_folder("", "Dir").await.unwrap();
        assert!(store.create_folder("/", "Dir").await.unwrap_err().is_duplicate_name());
        assert!(matches!(store.create_file("", "../x").await, Err(SlateError::InvalidName(_))));
        assert!(matches!(store.create_file("/nope", "x.md").await, Err(SlateError::NotFound(_))));
    }

    #[tokio::test]
    async fn archive_then_restore_round_trip() {
        let (_dir, store) = store().await;
        seed(&store).await;

        let outcome = store.archive_items(&["/Math/notes.md".into()]).await.unwrap();
        assert_eq!(outcome, BulkOutcome { successful: 1, failed: 0 });

        let active = store.fetch_active_tree().await.unwrap();
        assert!(active.find_by_path("/Math/notes.md").is_none());
        assert!(active.find_by_path("/Math").is_some());

        let archived = store.fetch_archived_tree().await.unwrap();
        assert_eq!(root_paths(&archived), vec!["/Math/notes.md"]);

        let outcome = store.restore_items(&["/Math/notes.md".into()]).await.unwrap();
        assert_eq!(outcome.successful, 1);

        let active = store.fetch_active_tree().await.unwrap();
        let math = active.find_by_path("/Math").unwrap();
        let notes = active.find_by_path("/Math/notes.md").unwrap();
        assert_eq!(math.children, vec![notes.id.clone()]);
        assert!(store.fetch_archived_tree().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn nested_paths_travel_with_their_folder() {
        let (_dir, store) = store().await;
        seed(&store).await;

        let outcome = store
            .archive_items(&["/Math/notes.md".into(), "/Math".into(), "/missing.md".into()])
            .await
            .unwrap();
        assert_eq!(outcome, BulkOutcome { successful: 2, failed: 1 });

        let archived = store.fetch_archived_tree().await.unwrap();
        assert_eq!(root_paths(&archived), vec!["/Math"]);
        assert!(archived.find_by_path("/Math/notes.md").is_some());
        assert!(archived.validate().is_ok());
    }

    #[tokio::test]
    async fn restore_single_item_out_of_archived_folder() {
        let (_dir, store) = store().await;
        seed(&store).await;
        store.create_file("/Math", "algebra.md").await.unwrap();
        store.archive_items(&["/Math".into()]).await.unwrap();

        let outcome = store.restore_items(&["/Math/notes.md".into()]).await.unwrap();
        assert_eq!(outcome.successful, 1);

        let active = store.fetch_active_tree().await.unwrap();
        assert_eq!(paths(&active), vec!["/Math", "/Math/notes.md", "/todo.md"]);
        let archived = store.fetch_archived_tree().await.unwrap();
        assert_eq!(paths(&archived), vec!["/Math", "/Math/algebra.md"]);
    }

    #[tokio::test]
    async fn exact_entry_wins_over_later_parent_archive() {
        let (_dir, store) = store().await;
        seed(&store).await;
        store.create_file("/Math", "algebra.md").await.unwrap();
        store.archive_items(&["/Math/notes.md".into()]).await.unwrap();
        store.archive_items(&["/Math".into()]).await.unwrap();

        let archived = store.fetch_archived_tree().await.unwrap();
        assert_eq!(root_paths(&archived), vec!["/Math/notes.md", "/Math"]);

        let outcome = store.restore_items(&["/Math/notes.md".into()]).await.unwrap();
        assert_eq!(outcome, BulkOutcome { successful: 1, failed: 0 });
        let active = store.fetch_active_tree().await.unwrap();
        assert!(active.find_by_path("/Math/notes.md").is_some());
        assert_eq!(root_paths(&store.fetch_archived_tree().await.unwrap()), vec!["/Math"]);

        store.archive_items(&["/Math/notes.md".into()]).await.unwrap();
        let outcome = store
            .delete_items_permanently(&["/Math/notes.md".into()])
            .await
            .unwrap();
        assert_eq!(outcome, BulkOutcome { successful: 1, failed: 0 });
        let archived = store.fetch_archived_tree().await.unwrap();
        assert_eq!(paths(&archived), vec!["/Math", "/Math/algebra.md"]);
    }

    #[tokio::test]
    async fn unwritable_manifest_leaves_items_in_place() {
        let (_dir, store) = store().await;
        seed(&store).await;
        fs::create_dir(store.archive_dir().join("manifest.json.tmp")).await.unwrap();

        let outcome = store.archive_items(&["/todo.md".into()]).await.unwrap();
        assert_eq!(outcome, BulkOutcome { successful: 0, failed: 1 });

        let active = store.fetch_active_tree().await.unwrap();
        assert!(active.find_by_path("/todo.md").is_some());
        assert!(store.fetch_archived_tree().await.unwrap().is_empty());

        let mut slots = fs::read_dir(store.archive_dir()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = slots.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["manifest.json.tmp"]);
    }

    #[tokio::test]
    async fn restore_never_overwrites() {
        let (_dir, store) = store().await;
        seed(&store).await;
        store.archive_items(&["/todo.md".into()]).await.unwrap();
        store.create_file("", "todo.md").await.unwrap();

        let outcome = store.restore_items(&["/todo.md".into()]).await.unwrap();
        assert_eq!(outcome, BulkOutcome { successful: 0, failed: 1 });
        assert_eq!(root_paths(&store.fetch_archived_tree().await.unwrap()), vec!["/todo.md"]);
    }

    #[tokio::test]
    async fn delete_permanently_removes_storage() {
        let (_dir, store) = store().await;
        seed(&store).await;
        store.archive_items(&["/Math".into(), "/todo.md".into()]).await.unwrap();

        let outcome = store
            .delete_items_permanently(&["/todo.md".into(), "/Math/notes.md".into()])
            .await
            .unwrap();
        assert_eq!(outcome.successful, 2);

        let archived = store.fetch_archived_tree().await.unwrap();
        assert_eq!(paths(&archived), vec!["/Math"]);

        let mut slots = fs::read_dir(store.archive_dir()).await.unwrap();
        let mut dirs = 0;
        while let Some(entry) = slots.next_entry().await.unwrap() {
            if entry.file_type().await.unwrap().is_dir() {
                dirs += 1;
            }
        }
        assert_eq!(dirs, 1);
    }

    #[tokio::test]
    async fn read_and_write_content() {
        let (_dir, store) = store().await;
        seed(&store).await;
        store.write_file_content("/Math/notes.md", "# Limits").await.unwrap();
        assert_eq!(store.read_file_content("/Math/notes.md").await.unwrap(), "# Limits");
        assert!(matches!(
            store.read_file_content("/nope.md").await,
            Err(SlateError::NotFound(_))
        ));
        assert!(store.read_file_content("/../etc/passwd").await.is_err());
    }

    #[test]
    fn batch_folds_descendants_and_bad_paths() {
        let batch = Batch::new(&["/a/b".into(), "/a".into(), "/../x".into(), "a".into(), "/c".into()]);
        assert_eq!(batch.heads, vec!["/a", "/c"]);
        assert_eq!(batch.owners, vec![Some(0), Some(0), None, Some(0), Some(1)]);
        assert_eq!(batch.outcome(&[true, false]), BulkOutcome { successful: 3, failed: 2 });
    }

    #[test]
    fn ancestry_needs_a_separator() {
        assert!(is_ancestor("/Math", "/Math/notes.md"));
        assert!(!is_ancestor("/Math", "/Mathematics"));
        assert!(!is_ancestor("/Math", "/Math"));
    }
}
