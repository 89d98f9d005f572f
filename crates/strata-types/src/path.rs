//! Helpers for `/`-joined node paths.
//!
//! A node path is a sequence of tree entry names joined by `/`. The root
//! tree has the empty path.

/// Path separator between tree entry names.
pub const SEPARATOR: char = '/';

/// Join `child` onto `parent`. An empty parent yields `child` unchanged.
pub fn append_child(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}{SEPARATOR}{child}")
    }
}

/// The parent path of `path`, or `""` for a top-level name.
pub fn parent_path(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// The last name in `path`.
pub fn node_name(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Split a path into its entry names. The empty path has no components.
pub fn components(path: &str) -> Vec<&str> {
    if path.is_empty() {
        Vec::new()
    } else {
        path.split(SEPARATOR).collect()
    }
}

/// Returns `true` if `ancestor` is a strict ancestor of `path`.
pub fn is_ancestor(ancestor: &str, path: &str) -> bool {
    if ancestor.is_empty() {
        return !path.is_empty();
    }
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path[ancestor.len()..].starts_with(SEPARATOR)
}

/// Returns `true` if `path` is a valid node path: non-empty names, no
/// leading, trailing or doubled separators.
pub fn is_valid(path: &str) -> bool {
    !path.is_empty() && path.split(SEPARATOR).all(|c| !c.is_empty())
}
