use std::collections::HashSet;
use std::sync::Arc;

use slate::config::SlateConfig;
use slate::core::tree::ROOT_ID;
use slate::store::{FsNotebookStore, NotebookStore};

#[tokio::main]
async fn main() {
    let config = SlateConfig::load();
    slate::set_debug_logging(config.debug_logging);
    slate::install_journal_logger("slate-archive-check");

    println!("=== Archive vs Notebooks ===\n");
    println!("notebooks: {}", config.notebooks_dir.display());
    println!("archive:   {}\n", config.archive_dir.display());

    let store = match FsNotebookStore::open(&config.notebooks_dir, &config.archive_dir).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            println!("Could not open store: {}", e);
            return;
        }
    };

    let (active, archived) = futures::join!(store.fetch_active_tree(), store.fetch_archived_tree());
    let active = match active {
        Ok(tree) => tree,
        Err(e) => {
            println!("Notebook tree failed to load: {}", e);
            return;
        }
    };
    let archived = match archived {
        Ok(tree) => tree,
        Err(e) => {
            println!("Archive failed to load: {}", e);
            return;
        }
    };

    for (name, tree) in [("notebooks", &active), ("archive", &archived)] {
        if let Err(defect) = tree.validate() {
            println!("{} tree is malformed: {:?}", name, defect);
        }
    }

    let active_paths: HashSet<&str> = active
        .flatten()
        .into_iter()
        .filter_map(|n| n.path.as_deref())
        .collect();

    let entries: Vec<&str> = archived
        .children(ROOT_ID)
        .filter_map(|n| n.path.as_deref())
        .collect();
    println!(
        "Notebooks: {} items, archive: {} entries ({} items)\n",
        active_paths.len(),
        entries.len(),
        archived.len().saturating_sub(1)
    );

    // An archived path that also exists in the notebooks can't be restored.
    let blocked: Vec<&str> = entries
        .iter()
        .copied()
        .filter(|p| active_paths.contains(p))
        .collect();

    let mut seen = HashSet::new();
    let repeated: Vec<&str> = entries.iter().copied().filter(|p| !seen.insert(*p)).collect();

    if blocked.is_empty() && repeated.is_empty() {
        println!("OK: every archive entry can be restored.");
        return;
    }

    if !blocked.is_empty() {
        println!("Restore blocked, path exists in notebooks ({}):", blocked.len());
        for path in &blocked {
            println!("  {}", path);
        }
    }
    if !repeated.is_empty() {
        println!("Archived more than once ({}):", repeated.len());
        for path in &repeated {
            println!("  {}", path);
        }
    }
}
