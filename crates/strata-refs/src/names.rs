//! Ref name validation following git-style conventions.
//!
//! A valid ref name:
//! - is non-empty
//! - contains no whitespace, control characters, or any of `~^:?*[\`
//! - contains neither `..` nor `@{`
//! - has no empty components and no component starting with `.`
//! - does not end with `.` or `.lock`

use crate::error::{RefError, RefResult};
use crate::types::HEAD;

const FORBIDDEN_CHARS: &[char] = &['~', '^', ':', '?', '*', '[', '\\'];

fn invalid(name: &str, reason: impl Into<String>) -> RefError {
    RefError::InvalidName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate a full ref name such as `HEAD` or `refs/heads/master`.
pub fn validate_ref_name(name: &str) -> RefResult<()> {
    if name.is_empty() {
        return Err(invalid(name, "must not be empty"));
    }
    if let Some(ch) = name
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || FORBIDDEN_CHARS.contains(c))
    {
        return Err(invalid(name, format!("contains forbidden character {ch:?}")));
    }
    if name.contains("..") {
        return Err(invalid(name, "must not contain '..'"));
    }
    if name.contains("@{") {
        return Err(invalid(name, "must not contain '@{'"));
    }
    if name.ends_with('.') || name.ends_with(".lock") {
        return Err(invalid(name, "must not end with '.' or '.lock'"));
    }
    for component in name.split('/') {
        if component.is_empty() {
            return Err(invalid(name, "path components must not be empty"));
        }
        if component.starts_with('.') {
            return Err(invalid(name, format!("component starts with '.': {component:?}")));
        }
    }
    Ok(())
}

/// Validate a short branch name (the part after `refs/heads/`).
pub fn validate_branch_name(name: &str) -> RefResult<()> {
    validate_ref_name(name)?;
    if name == HEAD || name.starts_with('-') {
        return Err(invalid(name, "not usable as a branch name"));
    }
    Ok(())
}

/// Validate a remote name. Must be a single component.
pub fn validate_remote_name(name: &str) -> RefResult<()> {
    validate_ref_name(name)?;
    if name.contains('/') {
        return Err(invalid(name, "remote name must not contain '/'"));
    }
    Ok(())
}
