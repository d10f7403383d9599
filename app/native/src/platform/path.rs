//! Path expansion for paths typed by the user.
//!
//! GIF paths arrive from the command line, the intent console and the
//! configuration file. All of them accept `~` for the home directory and may
//! be wrapped in quotes when copied from a file manager.

use std::path::{Path, PathBuf};

/// Expands a leading `~` and strips surrounding quotes and whitespace.
///
/// Returns an empty `PathBuf` for blank input.
#[must_use]
pub fn expand(path: &str) -> PathBuf {
    let path = unquote(path.trim());

    if path.is_empty() {
        return PathBuf::new();
    }

    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Expands `path` and resolves it against `base_dir` when it is relative.
///
/// Used for paths found in the configuration file, which are relative to the
/// directory holding that file.
#[must_use]
pub fn expand_and_resolve(path: &str, base_dir: &Path) -> PathBuf {
    let expanded = expand(path);

    if expanded.as_os_str().is_empty() || expanded.is_absolute() {
        return expanded;
    }

    base_dir.join(expanded)
}

fn unquote(path: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = path.strip_prefix(quote).and_then(|p| p.strip_suffix(quote)) {
            return inner.trim();
        }
    }
    path
}
