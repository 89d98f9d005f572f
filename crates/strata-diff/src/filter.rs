use strata_types::path;

/// Restricts a diff to one node path and everything below it.
///
/// Matching is by whole path components: the filter `points` covers
/// `points/p1` but not `points2/p1`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PathFilter {
    path: String,
}

impl PathFilter {
    /// Build a filter. Leading and trailing separators are ignored; an
    /// empty path matches everything.
    pub fn new(filter_path: impl AsRef<str>) -> Self {
        Self {
            path: filter_path.as_ref().trim_matches(path::SEPARATOR).to_string(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_everything(&self) -> bool {
        self.path.is_empty()
    }

    /// Whether the walk must descend into the node at `node_path`: it is
    /// the filter path, lies below it, or lies on the way to it.
    pub fn visits(&self, node_path: &str) -> bool {
        self.reports(node_path) || path::is_ancestor(node_path, &self.path)
    }

    /// Whether a feature at `node_path` is inside the filter.
    pub fn reports(&self, node_path: &str) -> bool {
        self.is_everything() || node_path == self.path || path::is_ancestor(&self.path, node_path)
    }
}

impl std::fmt::Display for PathFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}
