pub mod fs;
pub mod tree_store;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::tree::Tree;
use crate::error::{Result, SlateError};

pub use fs::FsNotebookStore;
pub use tree_store::{LoadState, TreeSource, TreeStore};

/// Per-item tally of a bulk archive, restore or delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOutcome {
    pub successful: usize,
    pub failed: usize,
}

impl BulkOutcome {
    pub fn record(&mut self, ok: bool) {
        if ok {
            self.successful += 1;
        } else {
            self.failed += 1;
        }
    }

    /// `PartialOperation` when anything failed. Meant for reporting: the
    /// operation itself has already completed.
    pub fn check(self) -> Result<Self> {
        if self.failed > 0 {
            Err(SlateError::PartialOperation {
                successful: self.successful,
                failed: self.failed,
            })
        } else {
            Ok(self)
        }
    }
}

/// The file collaborator that owns the notebooks on disk (or wherever).
///
/// Every call may reject; callers map rejections into visible state rather
/// than letting them escape.
#[async_trait]
pub trait NotebookStore: Send + Sync {
    async fn fetch_active_tree(&self) -> Result<Tree>;

    async fn fetch_archived_tree(&self) -> Result<Tree>;

    async fn archive_items(&self, paths: &[String]) -> Result<BulkOutcome>;

    async fn restore_items(&self, paths: &[String]) -> Result<BulkOutcome>;

    async fn delete_items_permanently(&self, paths: &[String]) -> Result<BulkOutcome>;

    /// Create an empty file and return the refreshed active tree.
    async fn create_file(&self, parent_path: &str, name: &str) -> Result<Tree>;

    async fn create_folder(&self, parent_path: &str, name: &str) -> Result<Tree>;

    async fn read_file_content(&self, path: &str) -> Result<String>;

    async fn write_file_content(&self, path: &str, content: &str) -> Result<()>;
}
