pub mod config;
pub mod scan;
pub mod tables;

use std::path::{Path, PathBuf};

/// File names looked up in the working directory, in order
const LOCAL_STORES: [&str; 2] = ["state.vscdb", "state(2).vscdb"];

/// Resolve the store to open.
///
/// An explicit path is returned as is so that opening it reports the
/// missing file. Otherwise the working directory is searched first, then
/// the editor's global storage under the platform config dir.
pub fn find_store(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if explicit.is_some() {
        return explicit;
    }

    let cwd = std::env::current_dir().ok()?;
    candidates(&cwd).into_iter().find(|p| p.is_file())
}

fn candidates(dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = LOCAL_STORES.iter().map(|name| dir.join(name)).collect();
    if let Some(dirs) = directories::BaseDirs::new() {
        paths.push(
            dirs.config_dir()
                .join("Cursor")
                .join("User")
                .join("globalStorage")
                .join("state.vscdb"),
        );
    }
    paths
}

pub fn print_store_not_found() {
    println!("No store found.");
    println!("  Looked for {} in the current directory", LOCAL_STORES.join(" and "));
    println!("  Pass a path explicitly: kvscan scan <path/to/state.vscdb>");
}
