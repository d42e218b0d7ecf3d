use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::watch;

use super::NotebookStore;
use crate::core::tree::{Tree, TreeNode};
use crate::error::{Result, SlateError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeSource {
    Active,
    Archived,
}

impl TreeSource {
    fn root_label(self) -> &'static str {
        match self {
            Self::Active => "Notebooks",
            Self::Archived => "Archived",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    /// The last fetch failed; the previous tree is still being shown.
    Error(String),
}

/// Identifies one fetch so a slow, stale response can be told apart from
/// the newest one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct LoadTicket {
    generation: u64,
}

/// Owns the current tree for one view and swaps it out whole on each load.
pub struct TreeStore {
    source: TreeSource,
    store: Arc<dyn NotebookStore>,
    tree: watch::Sender<Arc<Tree>>,
    state: LoadState,
    issued: u64,
    applied: u64,
}

impl TreeStore {
    pub fn new(store: Arc<dyn NotebookStore>, source: TreeSource) -> Self {
        let empty = Arc::new(Tree::new(TreeNode::root(source.root_label())));
        let (tree, _) = watch::channel(empty);
        Self {
            source,
            store,
            tree,
            state: LoadState::Loading,
            issued: 0,
            applied: 0,
        }
    }

    pub fn source(&self) -> TreeSource {
        self.source
    }

    pub fn tree(&self) -> Arc<Tree> {
        Arc::clone(&self.tree.borrow())
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Tree>> {
        self.tree.subscribe()
    }

    /// Fetch and install a fresh tree. On failure the previous tree stays
    /// and the store reports `LoadState::Error`.
    pub async fn load(&mut self) -> Result<Arc<Tree>> {
        let (ticket, fetch) = self.request();
        let result = fetch.await;
        self.apply(ticket, result)
    }

    /// Start a fetch without holding on to the store. The future can be
    /// awaited elsewhere and its result handed back through [`apply`].
    ///
    /// [`apply`]: TreeStore::apply
    pub fn request(&mut self) -> (LoadTicket, BoxFuture<'static, Result<Tree>>) {
        self.issued += 1;
        self.state = LoadState::Loading;
        let ticket = LoadTicket {
            generation: self.issued,
        };

        let store = Arc::clone(&self.store);
        let source = self.source;
        let fetch: BoxFuture<'static, Result<Tree>> = Box::pin(async move {
            match source {
                TreeSource::Active => store.fetch_active_tree().await,
                TreeSource::Archived => store.fetch_archived_tree().await,
            }
        });
        (ticket, fetch)
    }

    /// Install the result of a fetch. Responses older than one already
    /// applied are dropped and the current tree is returned unchanged.
    pub fn apply(&mut self, ticket: LoadTicket, result: Result<Tree>) -> Result<Arc<Tree>> {
        if ticket.generation <= self.applied {
            log::debug!(
                "{:?} tree: dropping stale response #{} (have #{})",
                self.source,
                ticket.generation,
                self.applied
            );
            return Ok(self.tree());
        }

        let is_latest = ticket.generation == self.issued;
        match result {
            Ok(tree) => {
                self.applied = ticket.generation;
                if is_latest {
                    self.state = LoadState::Ready;
                }
                log::debug!("{:?} tree loaded: {} nodes", self.source, tree.len());
                let tree = Arc::new(tree);
                self.tree.send_replace(Arc::clone(&tree));
                Ok(tree)
            }
            Err(e) => {
                let message = match e {
                    SlateError::Fetch(message) => message,
                    other => other.to_string(),
                };
                log::error!("Failed to load {:?} tree: {}", self.source, message);
                if is_latest {
                    self.state = LoadState::Error(message.clone());
                }
                Err(SlateError::Fetch(message))
            }
        }
    }

    /// Install a tree the collaborator handed back directly (e.g. after a
    /// create). It counts as the newest response.
    pub fn replace(&mut self, tree: Tree) -> Arc<Tree> {
        self.issued += 1;
        let ticket = LoadTicket {
            generation: self.issued,
        };
        // A successful apply only fails for stale tickets, and this one is new.
        match self.apply(ticket, Ok(tree)) {
            Ok(tree) => tree,
            Err(_) => self.tree(),
        }
    }
}
