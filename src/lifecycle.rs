use std::sync::Arc;

use crate::core::page::Page;
use crate::core::selection::{FocusEffect, SelectionController};
use crate::core::tree::{NodeId, ROOT_ID, Tree};
use crate::error::{ItemKind, Result, SlateError};
use crate::store::{BulkOutcome, NotebookStore, TreeSource, TreeStore};

/// Asks the user to confirm an irreversible action.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirm for F {
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Selecting,
}

/// Archive, restore and permanent delete over the notebook and archive
/// views, plus the create paths that share their duplicate-name guard.
pub struct ArchiveLifecycle {
    store: Arc<dyn NotebookStore>,
    active: TreeStore,
    archived: TreeStore,
    selection: SelectionController,
    archive_selection: SelectionController,
    mode: Mode,
}

impl ArchiveLifecycle {
    pub fn new(store: Arc<dyn NotebookStore>) -> Self {
        Self {
            active: TreeStore::new(Arc::clone(&store), TreeSource::Active),
            archived: TreeStore::new(Arc::clone(&store), TreeSource::Archived),
            store,
            selection: SelectionController::new(),
            archive_selection: SelectionController::new(),
            mode: Mode::Idle,
        }
    }

    pub fn active(&self) -> &TreeStore {
        &self.active
    }

    pub fn archived(&self) -> &TreeStore {
        &self.archived
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn archive_selection(&self) -> &SelectionController {
        &self.archive_selection
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_selecting(&self) -> bool {
        self.mode == Mode::Selecting
    }

    pub async fn load_active(&mut self) -> Result<Arc<Tree>> {
        let tree = self.active.load().await?;
        self.selection.retain_valid(&tree);
        Ok(tree)
    }

    pub async fn load_archived(&mut self) -> Result<Arc<Tree>> {
        let tree = self.archived.load().await?;
        self.archive_selection.retain_valid(&tree);
        Ok(tree)
    }

    /// Enter or leave selection mode. Leaving drops the selection.
    pub fn toggle_selection_mode(&mut self) -> Mode {
        self.mode = match self.mode {
            Mode::Idle => Mode::Selecting,
            Mode::Selecting => {
                self.selection.clear();
                Mode::Idle
            }
        };
        self.mode
    }

    /// Flip one node in the notebook selection. Unknown ids are ignored.
    pub fn toggle_selected(&mut self, id: &str) -> bool {
        if !self.active.tree().contains(id) {
            return false;
        }
        self.selection.toggle(id)
    }

    pub fn select_all(&mut self) {
        let tree = self.active.tree();
        self.selection.select_all(tree.ids().cloned());
    }

    /// Focus a node in the notebook view. See [`SelectionController::focus`].
    pub fn focus(&mut self, id: &str) -> FocusEffect {
        let tree = self.active.tree();
        let selecting = self.is_selecting();
        self.selection.focus(&tree, id, selecting)
    }

    pub fn blur(&mut self) {
        self.selection.blur();
    }

    pub async fn open_file(&self, path: &str) -> Result<Page> {
        let content = self.store.read_file_content(path).await?;
        log::debug!("Opened {} ({} bytes)", path, content.len());
        Ok(Page::parse(path, &content))
    }

    pub async fn save_page(&self, page: &mut Page) -> Result<()> {
        self.store.write_file_content(&page.path, &page.to_file()).await?;
        page.mark_saved();
        Ok(())
    }

    /// Move `paths` into the archive, then reload the notebook tree whatever
    /// the per-item outcome. Selection is cleared and selection mode ends.
    pub async fn archive(&mut self, paths: Vec<String>) -> Result<BulkOutcome> {
        let result = if paths.is_empty() {
            Ok(BulkOutcome::default())
        } else {
            log::info!("Archiving {} items", paths.len());
            let result = self.store.archive_items(&paths).await;
            if let Err(e) = self.load_active().await {
                log::warn!("Reload after archive failed: {}", e);
            }
            result
        };

        self.selection.clear();
        self.mode = Mode::Idle;
        report("archive", result)
    }

    pub async fn archive_selected(&mut self) -> Result<BulkOutcome> {
        let paths = self.selection.selected_paths(&self.active.tree());
        self.archive(paths).await
    }

    /// Archive whatever node has focus (the context-menu action).
    pub async fn archive_focused(&mut self) -> Result<BulkOutcome> {
        let tree = self.active.tree();
        let path = self
            .selection
            .focused()
            .and_then(|id| tree.get(id))
            .and_then(|n| n.path.clone());
        match path {
            Some(path) => self.archive(vec![path]).await,
            None => Ok(BulkOutcome::default()),
        }
    }

    pub fn toggle_archived(&mut self, id: &str) -> bool {
        if !self.archived.tree().contains(id) {
            return false;
        }
        self.archive_selection.toggle(id)
    }

    pub fn select_archived<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        let tree = self.archived.tree();
        let ids: Vec<NodeId> = ids
            .into_iter()
            .map(Into::into)
            .filter(|id: &NodeId| tree.contains(id))
            .collect();
        self.archive_selection.select_all(ids);
    }

    /// Right-clicking an item outside the selection selects only that item.
    pub fn context_select_archived(&mut self, id: &str) {
        if id == ROOT_ID || self.archive_selection.is_selected(id) {
            return;
        }
        self.select_archived([id]);
    }

    /// Move `paths` out of the archive and reload both views, since each
    /// shows part of what changed.
    pub async fn restore(&mut self, paths: Vec<String>) -> Result<BulkOutcome> {
        if paths.is_empty() {
            return Ok(BulkOutcome::default());
        }
        log::info!("Restoring {} items", paths.len());
        let result = self.store.restore_items(&paths).await;

        let (active, archived) = futures::join!(self.active.load(), self.archived.load());
        match active {
            Ok(tree) => self.selection.retain_valid(&tree),
            Err(e) => log::warn!("Reload of notebooks after restore failed: {}", e),
        }
        match archived {
            Ok(tree) => self.archive_selection.retain_valid(&tree),
            Err(e) => log::warn!("Reload of archive after restore failed: {}", e),
        }

        self.archive_selection.clear();
        report("restore", result)
    }

    pub async fn restore_selected(&mut self) -> Result<BulkOutcome> {
        let paths = self.archive_selection.selected_paths(&self.archived.tree());
        self.restore(paths).await
    }

    /// Permanently delete archived `paths` once `confirm` agrees. Returns
    /// `None` when the user backed out (or there was nothing to delete).
    pub async fn delete_forever(
        &mut self,
        paths: Vec<String>,
        confirm: &dyn Confirm,
    ) -> Result<Option<BulkOutcome>> {
        if paths.is_empty() {
            return Ok(None);
        }

        let prompt = format!(
            "Are you sure you want to permanently delete {}?",
            self.describe(&paths)
        );
        if !confirm.confirm(&prompt) {
            log::debug!("Permanent delete of {} items cancelled", paths.len());
            return Ok(None);
        }

        log::info!("Permanently deleting {} items", paths.len());
        let result = self.store.delete_items_permanently(&paths).await;
        if let Err(e) = self.load_archived().await {
            log::warn!("Reload of archive after delete failed: {}", e);
        }
        self.archive_selection.clear();
        report("delete", result).map(Some)
    }

    pub async fn delete_selected(&mut self, confirm: &dyn Confirm) -> Result<Option<BulkOutcome>> {
        let paths = self.archive_selection.selected_paths(&self.archived.tree());
        self.delete_forever(paths, confirm).await
    }

    fn describe(&self, paths: &[String]) -> String {
        match paths {
            [one] => {
                let tree = self.archived.tree();
                let label = tree
                    .find_by_path(one)
                    .map(|n| n.label.clone())
                    .unwrap_or_else(|| one.clone());
                format!("\"{label}\"")
            }
            many => format!("{} notebooks", many.len()),
        }
    }

    pub async fn create_file(&mut self, name: &str) -> Result<Arc<Tree>> {
        self.create(name, ItemKind::File).await
    }

    pub async fn create_folder(&mut self, name: &str) -> Result<Arc<Tree>> {
        self.create(name, ItemKind::Folder).await
    }

    /// Create `name` in the current target directory unless a sibling
    /// already carries that exact label.
    async fn create(&mut self, name: &str, kind: ItemKind) -> Result<Arc<Tree>> {
        let tree = self.active.tree();
        let target = match tree.get(self.selection.target_dir()) {
            Some(node) if node.is_folder => node,
            _ => tree.root(),
        };

        if tree.child_named(&target.id, name).is_some() {
            return Err(SlateError::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }

        let parent_path = target.path.clone().unwrap_or_default();
        let fresh = match kind {
            ItemKind::File => self.store.create_file(&parent_path, name).await?,
            ItemKind::Folder => self.store.create_folder(&parent_path, name).await?,
        };
        let fresh = self.active.replace(fresh);
        self.selection.retain_valid(&fresh);
        Ok(fresh)
    }
}

fn report(action: &str, result: Result<BulkOutcome>) -> Result<BulkOutcome> {
    match &result {
        Ok(outcome) if outcome.failed > 0 => log::warn!(
            "{}: {} succeeded, {} failed",
            action,
            outcome.successful,
            outcome.failed
        ),
        Ok(_) => {}
        Err(e) => log::error!("{} failed: {}", action, e),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FsNotebookStore;
    use std::cell::RefCell;
    use tempfile::TempDir;

    async fn lifecycle() -> (TempDir, ArchiveLifecycle) {
        let dir = TempDir::new().unwrap();
        let store = FsNotebookStore::open(dir.path().join("notebooks"), dir.path().join("archive"))
            .await
            .unwrap();
        let mut lifecycle = ArchiveLifecycle::new(Arc::new(store));
        lifecycle.load_active().await.unwrap();
        lifecycle.create_folder("Math").await.unwrap();
        let math = id_of(&lifecycle.active().tree(), "/Math");
        lifecycle.focus(&math);
        lifecycle.create_file("notes.md").await.unwrap();
        lifecycle.blur();
        lifecycle.create_file("todo.md").await.unwrap();
        (dir, lifecycle)
    }

    fn id_of(tree: &Tree, path: &str) -> NodeId {
        tree.find_by_path(path).unwrap().id.clone()
    }

    #[tokio::test]
    async fn archive_scenario_round_trips() {
        let (_dir, mut lc) = lifecycle().await;

        let outcome = lc.archive(vec!["/Math/notes.md".into()]).await.unwrap();
        assert_eq!(outcome, BulkOutcome { successful: 1, failed: 0 });
        assert!(lc.active().tree().find_by_path("/Math/notes.md").is_none());

        let archived = lc.load_archived().await.unwrap();
        let roots: Vec<_> = archived.children(ROOT_ID).filter_map(|n| n.path.as_deref()).collect();
        assert_eq!(roots, vec!["/Math/notes.md"]);

        lc.restore(vec!["/Math/notes.md".into()]).await.unwrap();
        let active = lc.active().tree();
        let notes = active.find_by_path("/Math/notes.md").unwrap();
        assert_eq!(active.parent_of(&notes.id).and_then(|p| p.path.as_deref()), Some("/Math"));
        assert!(lc.archived().tree().is_empty());
    }

    #[tokio::test]
    async fn selection_mode_archive_clears_and_exits() {
        let (_dir, mut lc) = lifecycle().await;
        assert_eq!(lc.toggle_selection_mode(), Mode::Selecting);

        let todo = id_of(&lc.active().tree(), "/todo.md");
        assert_eq!(
            lc.focus(&todo),
            FocusEffect::Toggled { id: todo.clone(), selected: true }
        );
        assert!(!lc.toggle_selected("no-such-id"));

        let outcome = lc.archive_selected().await.unwrap();
        assert_eq!(outcome.successful, 1);
        assert_eq!(lc.mode(), Mode::Idle);
        assert!(lc.selection().is_empty());
        assert!(lc.active().tree().find_by_path("/todo.md").is_none());
    }

    #[tokio::test]
    async fn select_all_archives_everything() {
        let (_dir, mut lc) = lifecycle().await;
        lc.toggle_selection_mode();
        lc.select_all();
        assert_eq!(lc.selection().len(), 3);
        assert!(!lc.selection().is_selected(ROOT_ID));

        let outcome = lc.archive_selected().await.unwrap();
        assert_eq!(outcome, BulkOutcome { successful: 3, failed: 0 });
        assert!(lc.active().tree().is_empty());

        let archived = lc.load_archived().await.unwrap();
        for path in ["/Math", "/Math/notes.md", "/todo.md"] {
            assert!(archived.find_by_path(path).is_some(), "{path} missing from archive");
        }
    }

    #[tokio::test]
    async fn leaving_selection_mode_drops_selection() {
        let (_dir, mut lc) = lifecycle().await;
        lc.toggle_selection_mode();
        lc.select_all();
        assert_eq!(lc.toggle_selection_mode(), Mode::Idle);
        assert!(lc.selection().is_empty());
    }

    #[tokio::test]
    async fn empty_archive_makes_no_call_but_resets_mode() {
        let (_dir, mut lc) = lifecycle().await;
        lc.toggle_selection_mode();
        let outcome = lc.archive_selected().await.unwrap();
        assert_eq!(outcome, BulkOutcome::default());
        assert_eq!(lc.mode(), Mode::Idle);
    }

    #[tokio::test]
    async fn duplicate_names_are_refused_in_target_directory() {
        let (_dir, mut lc) = lifecycle().await;
        let err = lc.create_file("todo.md").await.unwrap_err();
        assert!(err.is_duplicate_name());

        // Same name is fine inside another folder.
        let math = id_of(&lc.active().tree(), "/Math");
        lc.focus(&math);
        lc.create_file("todo.md").await.unwrap();
        assert!(lc.create_file("todo.md").await.unwrap_err().is_duplicate_name());
        assert!(lc.create_folder("todo.md").await.unwrap_err().is_duplicate_name());

        // Labels compare case-sensitively.
        lc.create_file("Todo.md").await.ok();
        assert!(lc.active().tree().find_by_path("/Math/todo.md").is_some());
    }

    #[tokio::test]
    async fn delete_forever_needs_confirmation() {
        let (_dir, mut lc) = lifecycle().await;
        lc.archive(vec!["/todo.md".into(), "/Math".into()]).await.unwrap();
        lc.load_archived().await.unwrap();

        let prompts = RefCell::new(Vec::new());
        let decline = |p: &str| {
            prompts.borrow_mut().push(p.to_string());
            false
        };
        let skipped = lc.delete_forever(vec!["/todo.md".into()], &decline).await.unwrap();
        assert!(skipped.is_none());
        assert_eq!(
            prompts.borrow().as_slice(),
            ["Are you sure you want to permanently delete \"todo.md\"?".to_string()]
        );
        assert!(lc.archived().tree().find_by_path("/todo.md").is_some());

        let accept = |_: &str| true;
        let archived = lc.archived().tree();
        lc.select_archived(archived.ids().cloned());
        let outcome = lc.delete_selected(&accept).await.unwrap().unwrap();
        assert_eq!(outcome.failed, 0);
        assert!(lc.archived().tree().is_empty());
        assert!(lc.archive_selection().is_empty());
    }

    #[tokio::test]
    async fn context_select_replaces_unselected_only() {
        let (_dir, mut lc) = lifecycle().await;
        lc.archive(vec!["/todo.md".into(), "/Math".into()]).await.unwrap();
        let archived = lc.load_archived().await.unwrap();
        let todo = id_of(&archived, "/todo.md");
        let math = id_of(&archived, "/Math");

        lc.select_archived([todo.clone(), math.clone()]);
        lc.context_select_archived(&math);
        assert_eq!(lc.archive_selection().len(), 2);

        lc.toggle_archived(&math);
        lc.context_select_archived(&math);
        assert_eq!(lc.archive_selection().len(), 1);
        assert!(lc.archive_selection().is_selected(&math));
    }

    #[tokio::test]
    async fn focusing_a_file_opens_it() {
        let (_dir, mut lc) = lifecycle().await;
        let todo = id_of(&lc.active().tree(), "/todo.md");
        let FocusEffect::OpenFile { path } = lc.focus(&todo) else {
            panic!("expected an open-file effect");
        };
        let mut page = lc.open_file(&path).await.unwrap();
        assert_eq!(page.content(), "");
        page.edit("- [ ] integrals");
        lc.save_page(&mut page).await.unwrap();
        assert_eq!(lc.open_file(&path).await.unwrap().content(), "- [ ] integrals");

        page.add_tag("math");
        lc.save_page(&mut page).await.unwrap();
        let reopened = lc.open_file(&path).await.unwrap();
        assert_eq!(reopened.tags(), ["math"]);
        assert_eq!(reopened.content(), "- [ ] integrals");
        assert!(lc.selection().is_empty());
    }

    #[tokio::test]
    async fn archive_focused_uses_context_item() {
        let (_dir, mut lc) = lifecycle().await;
        assert_eq!(lc.archive_focused().await.unwrap(), BulkOutcome::default());
        let math = id_of(&lc.active().tree(), "/Math");
        lc.focus(&math);
        assert_eq!(lc.archive_focused().await.unwrap().successful, 1);
        assert!(lc.active().tree().find_by_path("/Math").is_none());
        assert_eq!(lc.selection().target_dir(), ROOT_ID);
    }
}
