use std::path::PathBuf;
use std::sync::Arc;

use crate::config::SlateConfig;
use crate::core::app_state::{AppState, Modal};
use crate::core::commands::{Action, CommandEffect, CommandPalette};
use crate::core::page::Page;
use crate::core::search::{EditDistanceMatcher, project_with};
use crate::core::selection::FocusEffect;
use crate::core::tree::Tree;
use crate::error::{Result, SlateError};
use crate::lifecycle::{ArchiveLifecycle, Confirm};
use crate::message::{Message, NewItem};
use crate::store::{BulkOutcome, LoadState, NotebookStore, TreeStore};

pub const DEFAULT_FILE_NAME: &str = "Untitled.md";
pub const DEFAULT_FOLDER_NAME: &str = "New Folder";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Inline feedback shown above the tree until dismissed or replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    /// Message to send if the user asks to try again.
    pub retry: Option<Message>,
}

impl Notice {
    fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
            retry: None,
        }
    }

    fn warning(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            text: text.into(),
            retry: None,
        }
    }

    fn error(err: &SlateError, retry: Option<Message>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: err.to_string(),
            retry: if err.is_retryable() { retry } else { None },
        }
    }
}

/// What a tree panel should draw.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeView {
    /// First load still in flight.
    Loading,
    /// The last load failed. `stale` is the last good tree, if there was one.
    Error {
        message: String,
        stale: Option<Arc<Tree>>,
    },
    Empty,
    NoResults(String),
    Ready(Arc<Tree>),
}

/// The message-driven front of the notebook core. A UI feeds it
/// [`Message`]s and renders from its accessors.
pub struct Session {
    config: SlateConfig,
    config_path: Option<PathBuf>,
    app: AppState,
    lifecycle: ArchiveLifecycle,
    palette: CommandPalette,
    matcher: EditDistanceMatcher,
    query: String,
    archive_query: String,
    palette_query: String,
    palette_root: Option<String>,
    page: Option<Page>,
    notice: Option<Notice>,
    confirm: Box<dyn Confirm>,
}

impl Session {
    pub fn new(
        config: SlateConfig,
        config_path: Option<PathBuf>,
        store: Arc<dyn NotebookStore>,
        confirm: Box<dyn Confirm>,
    ) -> Self {
        Self {
            app: AppState::from_config(&config),
            matcher: EditDistanceMatcher::with_threshold(config.search_threshold),
            config,
            config_path,
            lifecycle: ArchiveLifecycle::new(store),
            palette: CommandPalette::new(),
            query: String::new(),
            archive_query: String::new(),
            palette_query: String::new(),
            palette_root: None,
            page: None,
            notice: None,
            confirm,
        }
    }

    /// Initial load of the notebook tree.
    pub async fn start(&mut self) {
        self.update(Message::Refresh).await;
    }

    pub fn config(&self) -> &SlateConfig {
        &self.config
    }

    pub fn app(&self) -> &AppState {
        &self.app
    }

    pub fn lifecycle(&self) -> &ArchiveLifecycle {
        &self.lifecycle
    }

    pub fn page(&self) -> Option<&Page> {
        self.page.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn palette_root(&self) -> Option<&str> {
        self.palette_root.as_deref()
    }

    pub fn palette_matches(&self) -> Vec<&Action> {
        self.palette
            .matches(&self.palette_query, self.palette_root.as_deref())
    }

    pub fn visible_tree(&self) -> TreeView {
        view(self.lifecycle.active(), &self.query, &self.matcher)
    }

    pub fn visible_archive(&self) -> TreeView {
        view(self.lifecycle.archived(), &self.archive_query, &self.matcher)
    }

    pub async fn update(&mut self, message: Message) {
        match message {
            Message::Refresh => {
                if let Err(e) = self.lifecycle.load_active().await {
                    self.notice = Some(Notice::error(&e, Some(Message::Refresh)));
                }
                self.drop_missing_page();
            }

            Message::Focus(id) => match self.lifecycle.focus(&id) {
                FocusEffect::OpenFile { path } => self.open_page(&path).await,
                FocusEffect::Toggled { .. }
                | FocusEffect::TargetDirectory(_)
                | FocusEffect::Ignored => {}
            },

            Message::Blur => self.lifecycle.blur(),

            Message::ToggleSelectionMode => {
                self.lifecycle.toggle_selection_mode();
            }

            Message::ToggleSelected(id) => {
                self.lifecycle.toggle_selected(&id);
            }

            Message::SelectAll => self.lifecycle.select_all(),

            Message::ArchiveSelected => {
                let result = self.lifecycle.archive_selected().await;
                self.archived(result).await;
            }

            Message::ArchiveFocused => {
                let result = self.lifecycle.archive_focused().await;
                self.archived(result).await;
            }

            Message::Create(kind, name) => {
                let name = name.trim();
                let result = match kind {
                    NewItem::File => {
                        let name = if name.is_empty() { DEFAULT_FILE_NAME } else { name };
                        self.lifecycle.create_file(name).await
                    }
                    NewItem::Folder => {
                        let name = if name.is_empty() { DEFAULT_FOLDER_NAME } else { name };
                        self.lifecycle.create_folder(name).await
                    }
                };
                if let Err(e) = result {
                    log::warn!("Create failed: {}", e);
                    self.notice = Some(Notice::error(&e, None));
                }
            }

            Message::SearchChanged(query) => self.query = query,
            Message::ClearSearch => self.query.clear(),

            Message::RefreshArchive => self.load_archive().await,

            Message::ArchiveSearchChanged(query) => self.archive_query = query,

            Message::ToggleArchived(id) => {
                self.lifecycle.toggle_archived(&id);
            }

            Message::SelectArchived(ids) => self.lifecycle.select_archived(ids),

            Message::ContextSelectArchived(id) => self.lifecycle.context_select_archived(&id),

            Message::RestoreSelected => {
                let result = self.lifecycle.restore_selected().await;
                self.report("Restored", result);
            }

            Message::DeleteSelected => {
                match self.lifecycle.delete_selected(self.confirm.as_ref()).await {
                    Ok(Some(outcome)) => self.report("Deleted", Ok(outcome)),
                    Ok(None) => {}
                    Err(e) => self.notice = Some(Notice::error(&e, None)),
                }
            }

            Message::EditPage(content) => {
                if let Some(page) = self.page.as_mut() {
                    page.edit(content);
                }
            }

            Message::AddTag(tag) => {
                if let Some(page) = self.page.as_mut() {
                    page.add_tag(&tag);
                }
            }

            Message::RemoveTag(tag) => {
                if let Some(page) = self.page.as_mut() {
                    page.remove_tag(&tag);
                }
            }

            Message::SavePage => {
                if let Err(e) = self.save_page().await {
                    self.notice = Some(Notice::error(&e, Some(Message::SavePage)));
                }
            }

            Message::ClosePage => {
                match self.save_page().await {
                    Ok(()) => self.page = None,
                    Err(e) => self.notice = Some(Notice::error(&e, Some(Message::SavePage))),
                }
            }

            Message::Toggle(modal) => {
                if self.app.toggle(modal) {
                    self.opened(modal).await;
                }
            }

            Message::Open(modal) => {
                if !self.app.is_open(modal) {
                    self.app.open(modal);
                    self.opened(modal).await;
                }
            }

            Message::Close(modal) => self.app.close(modal),

            Message::SetTheme(theme) => {
                self.app.set_theme(theme);
                self.persist();
            }

            Message::SetAccent(color) => self.apply_setting(|app| app.set_accent_color(&color)),

            Message::SetLanguage(language) => self.apply_setting(|app| app.set_language(&language)),

            Message::SetDebugLogging(enabled) => {
                crate::set_debug_logging(enabled);
                self.config.debug_logging = enabled;
                log::info!("Debug logging {}", if enabled { "enabled" } else { "disabled" });
                self.persist();
            }

            Message::PaletteQuery(query) => self.palette_query = query,

            Message::PaletteChoose(id) => self.choose(&id),

            Message::PaletteBack => {
                self.palette_query.clear();
                self.palette_root = self
                    .palette_root
                    .as_deref()
                    .and_then(|root| self.palette.get(root))
                    .and_then(|action| action.parent.clone());
            }

            Message::PaletteShortcut(key) => {
                if let Some(id) = self.palette.by_shortcut(&key).map(|a| a.id.clone()) {
                    self.choose(&id);
                }
            }

            Message::AddShortcut(trigger, value) => {
                match self.config.add_shortcut(&trigger, &value) {
                    Ok(()) => self.persist(),
                    Err(e) => self.notice = Some(Notice::error(&e, None)),
                }
            }

            Message::RemoveShortcut(trigger) => {
                if self.config.remove_shortcut(&trigger) {
                    self.persist();
                }
            }

            Message::DismissNotice => self.notice = None,
        }
    }

    async fn archived(&mut self, result: Result<BulkOutcome>) {
        let changed = result.as_ref().is_ok_and(|o| o.successful > 0);
        self.report("Archived", result);
        self.drop_missing_page();
        // An open archive panel would otherwise keep showing the old list.
        if changed && self.app.is_open(Modal::Archive) {
            self.load_archive().await;
        }
    }

    async fn opened(&mut self, modal: Modal) {
        match modal {
            Modal::Archive => self.load_archive().await,
            Modal::CommandBar => {
                self.palette_query.clear();
                self.palette_root = None;
            }
            _ => {}
        }
    }

    async fn load_archive(&mut self) {
        if let Err(e) = self.lifecycle.load_archived().await {
            self.notice = Some(Notice::error(&e, Some(Message::RefreshArchive)));
        }
    }

    async fn open_page(&mut self, path: &str) {
        if self.page.as_ref().is_some_and(|p| p.path == path) {
            return;
        }
        if let Err(e) = self.save_page().await {
            self.notice = Some(Notice::error(&e, Some(Message::SavePage)));
            return;
        }
        match self.lifecycle.open_file(path).await {
            Ok(page) => self.page = Some(page),
            Err(e) => {
                log::error!("Failed to open {}: {}", path, e);
                self.notice = Some(Notice::error(&e, None));
            }
        }
    }

    /// Write the open page back if it has unsaved edits.
    async fn save_page(&mut self) -> Result<()> {
        match self.page.as_mut() {
            Some(page) if page.is_dirty() => self.lifecycle.save_page(page).await,
            _ => Ok(()),
        }
    }

    /// Close the page once its file has left the notebook tree.
    fn drop_missing_page(&mut self) {
        if self.lifecycle.active().state() != &LoadState::Ready {
            return;
        }
        let tree = self.lifecycle.active().tree();
        let missing = self
            .page
            .as_ref()
            .is_some_and(|page| tree.find_by_path(&page.path).is_none());
        if missing {
            log::debug!("Closing the open page: its file left the notebook tree");
            self.page = None;
        }
    }

    fn choose(&mut self, id: &str) {
        let Some(action) = self.palette.get(id) else {
            return;
        };
        match action.effect {
            None => {
                self.palette_root = Some(action.id.clone());
                self.palette_query.clear();
            }
            Some(effect) => {
                self.app.close(Modal::CommandBar);
                self.palette_root = None;
                self.palette_query.clear();
                self.perform(effect);
            }
        }
    }

    fn perform(&mut self, effect: CommandEffect) {
        match effect {
            CommandEffect::OpenSettings => self.app.open(Modal::Settings),
            CommandEffect::SetTheme(theme) => {
                self.app.set_theme(theme);
                self.persist();
            }
            CommandEffect::SetAccent(color) => self.apply_setting(|app| app.set_accent_color(color)),
        }
    }

    fn apply_setting(&mut self, change: impl FnOnce(&mut AppState) -> Result<()>) {
        match change(&mut self.app) {
            Ok(()) => self.persist(),
            Err(e) => self.notice = Some(Notice::error(&e, None)),
        }
    }

    fn persist(&mut self) {
        self.app.write_to(&mut self.config);
        let Some(path) = &self.config_path else {
            return;
        };
        if let Err(e) = self.config.save_to(path) {
            log::error!("Failed to save config to {}: {}", path.display(), e);
            self.notice = Some(Notice::error(&e, None));
        }
    }

    fn report(&mut self, verb: &str, result: Result<BulkOutcome>) {
        self.notice = match result.and_then(BulkOutcome::check) {
            Ok(outcome) if outcome.successful == 0 => None,
            Ok(outcome) => Some(Notice::info(format!(
                "{verb} {} {}",
                outcome.successful,
                if outcome.successful == 1 { "item" } else { "items" }
            ))),
            Err(e @ SlateError::PartialOperation { .. }) => Some(Notice::warning(e.to_string())),
            Err(e) => Some(Notice::error(&e, None)),
        };
    }
}

fn view(store: &TreeStore, query: &str, matcher: &EditDistanceMatcher) -> TreeView {
    let tree = store.tree();
    let query = query.trim();
    match store.state() {
        LoadState::Loading if tree.is_empty() => TreeView::Loading,
        LoadState::Error(message) => TreeView::Error {
            message: message.clone(),
            stale: (!tree.is_empty()).then(|| project_with(&tree, query, matcher)),
        },
        _ if tree.is_empty() => TreeView::Empty,
        _ => {
            let shown = project_with(&tree, query, matcher);
            if shown.is_empty() {
                TreeView::NoResults(query.to_string())
            } else {
                TreeView::Ready(shown)
            }
        }
    }
}
