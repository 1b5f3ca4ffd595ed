use std::path::{Path, PathBuf};

use devdash_core::config::CONFIG_FILE;

/// Resolve the project root.
///
/// Priority:
/// 1. `--root` flag / `DEVDASH_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `devdash.yaml`
/// 3. Walk upward from `cwd` looking for `.git/`
/// 4. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    resolve_from(&cwd)
}

fn resolve_from(start: &Path) -> PathBuf {
    find_upward(start, |d| d.join(CONFIG_FILE).is_file())
        .or_else(|| find_upward(start, |d| d.join(".git").is_dir()))
        .unwrap_or_else(|| start.to_path_buf())
}

fn find_upward(start: &Path, hit: impl Fn(&Path) -> bool) -> Option<PathBuf> {
    start.ancestors().find(|d| hit(d)).map(Path::to_path_buf)
}
