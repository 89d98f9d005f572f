use std::fmt;

use serde::{Deserialize, Serialize};
use strata_refs::types::{remote_prefix, HEADS_PREFIX};
use strata_types::ObjectId;

use crate::error::{SyncError, SyncResult};

/// A refspec mapping remote refs to local tracking refs.
///
/// Either side may end in a single `*`, in which case both must, and the
/// text matched on the source side is substituted on the destination side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefSpec {
    pub src: String,
    pub dst: String,
    pub force: bool,
}

impl RefSpec {
    pub fn new(src: impl Into<String>, dst: impl Into<String>) -> Self {
        Self { src: src.into(), dst: dst.into(), force: false }
    }

    pub fn forced(src: impl Into<String>, dst: impl Into<String>) -> Self {
        Self { src: src.into(), dst: dst.into(), force: true }
    }

    /// The default mapping for `remote`: every branch into
    /// `refs/remotes/<remote>/`.
    pub fn default_for(remote: &str) -> Self {
        Self::forced(format!("{HEADS_PREFIX}*"), format!("{}*", remote_prefix(remote)))
    }

    /// Parse "+refs/heads/*:refs/remotes/origin/*"
    pub fn parse(s: &str) -> SyncResult<Self> {
        let (force, rest) = match s.strip_prefix('+') {
            Some(stripped) => (true, stripped),
            None => (false, s),
        };
        let (src, dst) = rest.split_once(':').unwrap_or((rest, rest));
        if src.is_empty() || dst.is_empty() {
            return Err(SyncError::InvalidRefSpec(s.to_string()));
        }
        let wild = |side: &str| side.matches('*').count();
        match (wild(src), wild(dst)) {
            (0, 0) => {}
            (1, 1) if src.ends_with('*') && dst.ends_with('*') => {}
            _ => return Err(SyncError::InvalidRefSpec(s.to_string())),
        }
        Ok(Self { src: src.into(), dst: dst.into(), force })
    }

    /// Local name for the remote ref `name`, if this spec covers it.
    pub fn map_src(&self, name: &str) -> Option<String> {
        match (self.src.strip_suffix('*'), self.dst.strip_suffix('*')) {
            (Some(src_prefix), Some(dst_prefix)) => name
                .strip_prefix(src_prefix)
                .filter(|rest| !rest.is_empty())
                .map(|rest| format!("{dst_prefix}{rest}")),
            _ => (name == self.src).then(|| self.dst.clone()),
        }
    }

    /// Returns `true` if the local ref `name` is a destination of this spec.
    pub fn matches_dst(&self, name: &str) -> bool {
        match self.dst.strip_suffix('*') {
            Some(prefix) => name.len() > prefix.len() && name.starts_with(prefix),
            None => name == self.dst,
        }
    }

    /// Longest literal prefix of the destination, for listing local refs.
    pub fn dst_prefix(&self) -> &str {
        self.dst.strip_suffix('*').unwrap_or(&self.dst)
    }
}

impl fmt::Display for RefSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.force {
            f.write_str("+")?;
        }
        write!(f, "{}:{}", self.src, self.dst)
    }
}

impl TryFrom<String> for RefSpec {
    type Error = SyncError;

    fn try_from(s: String) -> SyncResult<Self> {
        Self::parse(&s)
    }
}

impl From<RefSpec> for String {
    fn from(spec: RefSpec) -> Self {
        spec.to_string()
    }
}

/// A configured remote repository.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub name: String,
    pub url: String,
    pub fetch: RefSpec,
}

impl RemoteConfig {
    /// A remote with the default fetch refspec.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        let name = name.into();
        let fetch = RefSpec::default_for(&name);
        Self { name, url: url.into(), fetch }
    }
}

/// One tracking ref moved by a fetch. A null `old` means it was created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingRefUpdate {
    pub remote: String,
    pub name: String,
    pub old: ObjectId,
    pub new: ObjectId,
}

impl TrackingRefUpdate {
    pub fn is_new(&self) -> bool {
        self.old.is_null()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchResult {
    pub updates: Vec<TrackingRefUpdate>,
    /// Tracking refs deleted because the remote no longer has the branch.
    pub pruned: Vec<String>,
    pub objects_fetched: usize,
}

impl FetchResult {
    /// `true` when the fetch changed nothing locally.
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.pruned.is_empty() && self.objects_fetched == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refspec_parse_with_force() {
        let rs = RefSpec::parse("+refs/heads/*:refs/remotes/origin/*").unwrap();
        assert!(rs.force);
        assert_eq!(rs.src, "refs/heads/*");
        assert_eq!(rs.dst, "refs/remotes/origin/*");
    }

    #[test]
    fn refspec_parse_single() {
        let rs = RefSpec::parse("refs/heads/master").unwrap();
        assert!(!rs.force);
        assert_eq!(rs.src, "refs/heads/master");
        assert_eq!(rs.dst, "refs/heads/master");
    }

    #[test]
    fn refspec_rejects_unbalanced_wildcards() {
        assert!(RefSpec::parse("refs/heads/*:refs/remotes/origin/master").is_err());
        assert!(RefSpec::parse("refs/*/x:refs/*/x").is_err());
        assert!(RefSpec::parse(":refs/x").is_err());
    }

    #[test]
    fn refspec_maps_wildcards() {
        let rs = RefSpec::default_for("origin");
        assert_eq!(rs.to_string(), "+refs/heads/*:refs/remotes/origin/*");
        assert_eq!(
            rs.map_src("refs/heads/topic/a").as_deref(),
            Some("refs/remotes/origin/topic/a")
        );
        assert_eq!(rs.map_src("refs/tags/v1"), None);
        assert_eq!(rs.map_src("refs/heads/"), None);
        assert!(rs.matches_dst("refs/remotes/origin/master"));
        assert!(!rs.matches_dst("refs/remotes/upstream/master"));
        assert_eq!(rs.dst_prefix(), "refs/remotes/origin/");
    }

    #[test]
    fn refspec_maps_exact() {
        let rs = RefSpec::new("refs/heads/master", "refs/remotes/origin/master");
        assert_eq!(
            rs.map_src("refs/heads/master").as_deref(),
            Some("refs/remotes/origin/master")
        );
        assert_eq!(rs.map_src("refs/heads/other"), None);
        assert!(rs.matches_dst("refs/remotes/origin/master"));
    }

    #[test]
    fn remote_config_serializes_refspec_as_string() {
        let remote = RemoteConfig::new("origin", "/srv/data");
        let text = toml::to_string(&remote).unwrap();
        assert!(text.contains("fetch = \"+refs/heads/*:refs/remotes/origin/*\""));
        let back: RemoteConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, remote);
    }

    #[test]
    fn fetch_result_defaults() {
        let f = FetchResult::default();
        assert!(f.is_empty());
        assert_eq!(f.objects_fetched, 0);
    }
}
