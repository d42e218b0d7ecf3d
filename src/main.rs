use std::io::{BufRead, Write};
use std::sync::Arc;

use slate::config::SlateConfig;
use slate::core::search::{EditDistanceMatcher, project_with};
use slate::core::tree::{ROOT_ID, Tree};
use slate::lifecycle::ArchiveLifecycle;
use slate::store::{BulkOutcome, FsNotebookStore};

const USAGE: &str = "\
usage: slate <command> [args]

  tree                       show the notebook tree
  archived                   show the archive
  search <query>             fuzzy-search notebook names
  archive <path>...          move items into the archive
  restore <path>...          move archived items back
  purge [--yes] <path>...    permanently delete archived items
  new-file <parent> <name>   create an empty file
  new-folder <parent> <name> create a folder
  cat <path>                 print a file";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = SlateConfig::load();
    slate::set_debug_logging(config.debug_logging);
    if !slate::install_journal_logger("slate") {
        eprintln!("slate: journal unavailable, logging disabled");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        println!("{USAGE}");
        return Ok(());
    };

    config.ensure_dirs()?;
    let store = FsNotebookStore::open(&config.notebooks_dir, &config.archive_dir).await?;
    let mut lifecycle = ArchiveLifecycle::new(Arc::new(store));

    match (command.as_str(), rest) {
        ("tree", []) => {
            let tree = lifecycle.load_active().await?;
            print_tree(&tree);
        }
        ("archived", []) => {
            let tree = lifecycle.load_archived().await?;
            print_tree(&tree);
        }
        ("search", [query, ..]) => {
            let tree = lifecycle.load_active().await?;
            let matcher = EditDistanceMatcher::with_threshold(config.search_threshold);
            let found = project_with(&tree, &rest.join(" "), &matcher);
            if found.is_empty() {
                println!("no notebooks match {query:?}");
            }
            for node in found.children(ROOT_ID) {
                println!("{}", node.path.as_deref().unwrap_or(&node.label));
            }
        }
        ("archive", paths) if !paths.is_empty() => {
            lifecycle.load_active().await?;
            summarize("archived", lifecycle.archive(paths.to_vec()).await?);
        }
        ("restore", paths) if !paths.is_empty() => {
            lifecycle.load_archived().await?;
            summarize("restored", lifecycle.restore(paths.to_vec()).await?);
        }
        ("purge", args) if !args.is_empty() => {
            let yes = args.iter().any(|a| a == "--yes");
            let paths: Vec<String> = args.iter().filter(|a| *a != "--yes").cloned().collect();
            lifecycle.load_archived().await?;
            let confirm = |prompt: &str| yes || ask(prompt);
            match lifecycle.delete_forever(paths, &confirm).await? {
                Some(outcome) => summarize("deleted", outcome),
                None => println!("nothing deleted"),
            }
        }
        ("new-file" | "new-folder", [parent, name]) => {
            let tree = lifecycle.load_active().await?;
            if parent != "/" {
                let Some(folder) = tree.find_by_path(parent).filter(|n| n.is_folder) else {
                    return Err(format!("no folder at {parent}").into());
                };
                lifecycle.focus(&folder.id);
            }
            if command == "new-file" {
                lifecycle.create_file(name).await?;
            } else {
                lifecycle.create_folder(name).await?;
            }
            println!("created {}/{}", parent.trim_end_matches('/'), name);
        }
        ("cat", [path]) => {
            let page = lifecycle.open_file(path).await?;
            print!("{}", page.to_file());
        }
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }

    Ok(())
}

fn print_tree(tree: &Tree) {
    fn walk(tree: &Tree, id: &str, depth: usize) {
        for node in tree.children(id) {
            let marker = if node.is_folder { "/" } else { "" };
            println!("{}{}{}", "  ".repeat(depth), node.label, marker);
            walk(tree, &node.id, depth + 1);
        }
    }

    if tree.is_empty() {
        println!("({} is empty)", tree.root().label);
        return;
    }
    walk(tree, ROOT_ID, 0);
}

fn summarize(verb: &str, outcome: BulkOutcome) {
    println!("{} {}, {} failed", verb, outcome.successful, outcome.failed);
}

fn ask(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match std::io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim(), "y" | "Y" | "yes"),
        Err(_) => false,
    }
}
