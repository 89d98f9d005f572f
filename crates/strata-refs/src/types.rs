//! Core reference types and the well-known ref namespace.

use strata_types::ObjectId;

use crate::error::{RefError, RefResult};

/// Current branch, or the checked-out commit when detached.
pub const HEAD: &str = "HEAD";
/// Root tree of the working snapshot.
pub const WORK_HEAD: &str = "WORK_HEAD";
/// Root tree of the staged snapshot.
pub const STAGE_HEAD: &str = "STAGE_HEAD";

pub const HEADS_PREFIX: &str = "refs/heads/";
pub const REMOTES_PREFIX: &str = "refs/remotes/";

/// Marker that introduces a symbolic target in the persisted form.
pub const SYMREF_PREFIX: &str = "ref: ";

/// Maximum number of symbolic hops followed during resolution.
pub const MAX_SYMBOLIC_DEPTH: usize = 8;

/// `refs/heads/<branch>`
pub fn branch_ref(branch: &str) -> String {
    format!("{HEADS_PREFIX}{branch}")
}

/// `refs/remotes/<remote>/<branch>`
pub fn remote_ref(remote: &str, branch: &str) -> String {
    format!("{REMOTES_PREFIX}{remote}/{branch}")
}

/// `refs/remotes/<remote>/`
pub fn remote_prefix(remote: &str) -> String {
    format!("{REMOTES_PREFIX}{remote}/")
}

/// The branch name of a `refs/heads/` ref.
pub fn branch_name(name: &str) -> Option<&str> {
    name.strip_prefix(HEADS_PREFIX)
}

/// The value stored under a ref name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RefValue {
    Direct(ObjectId),
    Symbolic(String),
}

impl RefValue {
    pub fn symbolic(target: impl Into<String>) -> Self {
        Self::Symbolic(target.into())
    }

    pub fn is_symbolic(&self) -> bool {
        matches!(self, Self::Symbolic(_))
    }

    pub fn as_direct(&self) -> Option<ObjectId> {
        match self {
            Self::Direct(id) => Some(*id),
            Self::Symbolic(_) => None,
        }
    }

    pub fn as_symbolic(&self) -> Option<&str> {
        match self {
            Self::Direct(_) => None,
            Self::Symbolic(target) => Some(target),
        }
    }

    /// The persisted form: a hex id, or `ref: <target>`.
    pub fn render(&self) -> String {
        match self {
            Self::Direct(id) => id.to_hex(),
            Self::Symbolic(target) => format!("{SYMREF_PREFIX}{target}"),
        }
    }

    /// Parse the persisted form. `name` is only used for error reporting.
    pub fn parse(name: &str, raw: &str) -> RefResult<Self> {
        let raw = raw.trim();
        if let Some(target) = raw.strip_prefix(SYMREF_PREFIX) {
            let target = target.trim();
            if target.is_empty() {
                return Err(RefError::Corrupt {
                    name: name.to_string(),
                    reason: "empty symbolic target".into(),
                });
            }
            return Ok(Self::Symbolic(target.to_string()));
        }
        ObjectId::from_hex(raw)
            .map(Self::Direct)
            .map_err(|e| RefError::Corrupt {
                name: name.to_string(),
                reason: e.to_string(),
            })
    }
}

impl From<ObjectId> for RefValue {
    fn from(id: ObjectId) -> Self {
        Self::Direct(id)
    }
}

impl std::fmt::Display for RefValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// A resolved reference.
///
/// `object_id` is the id at the end of the symbolic chain (null for an
/// unborn branch); `target` is the immediate symbolic target, if any.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ref {
    pub name: String,
    pub object_id: ObjectId,
    pub target: Option<String>,
}

impl Ref {
    pub fn direct(name: impl Into<String>, object_id: ObjectId) -> Self {
        Self {
            name: name.into(),
            object_id,
            target: None,
        }
    }

    pub fn symbolic(
        name: impl Into<String>,
        target: impl Into<String>,
        object_id: ObjectId,
    ) -> Self {
        Self {
            name: name.into(),
            object_id,
            target: Some(target.into()),
        }
    }

    pub fn is_symbolic(&self) -> bool {
        self.target.is_some()
    }

    /// Name with the `refs/heads/` or `refs/remotes/` prefix stripped.
    pub fn short_name(&self) -> &str {
        self.name
            .strip_prefix(HEADS_PREFIX)
            .or_else(|| self.name.strip_prefix(REMOTES_PREFIX))
            .unwrap_or(&self.name)
    }
}

impl std::fmt::Display for Ref {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.target {
            Some(target) => {
                write!(f, "{} -> {} ({})", self.name, target, self.object_id.short_hex())
            }
            None => write!(f, "{} {}", self.name, self.object_id.short_hex()),
        }
    }
}
