use crate::core::app_state::{Modal, Theme};
use crate::core::tree::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewItem {
    File,
    Folder,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    // Notebook tree
    Refresh,
    Focus(NodeId),
    Blur,
    ToggleSelectionMode,
    ToggleSelected(NodeId),
    SelectAll,
    ArchiveSelected,
    ArchiveFocused,
    Create(NewItem, String),

    // Search
    SearchChanged(String),
    ClearSearch,

    // Archive view
    RefreshArchive,
    ArchiveSearchChanged(String),
    ToggleArchived(NodeId),
    SelectArchived(Vec<NodeId>),
    ContextSelectArchived(NodeId),
    RestoreSelected,
    DeleteSelected,

    // Page
    EditPage(String),
    AddTag(String),
    RemoveTag(String),
    SavePage,
    ClosePage,

    // App state
    Toggle(Modal),
    Open(Modal),
    Close(Modal),
    SetTheme(Theme),
    SetAccent(String),
    SetLanguage(String),
    SetDebugLogging(bool),

    // Command palette
    PaletteQuery(String),
    PaletteChoose(String),
    PaletteBack,
    PaletteShortcut(String),

    // Shortcuts
    AddShortcut(String, String),
    RemoveShortcut(String),

    DismissNotice,
}
