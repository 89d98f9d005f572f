//! Repository configuration, stored as TOML at `.strata/config.toml`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strata_sync::{RefSpec, RemoteConfig};
use strata_types::Person;

use crate::error::{SdkError, SdkResult};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Remote used by a fetch that names none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_remote: Option<String>,
    #[serde(default)]
    pub user: UserConfig,
    #[serde(default)]
    pub remote: BTreeMap<String, RemoteSection>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSection {
    pub url: String,
    pub fetch: RefSpec,
}

impl RepoConfig {
    pub fn load(path: &Path) -> SdkResult<Self> {
        let text = fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| SdkError::Config(format!("{}: {e}", path.display())))
    }

    pub fn save(&self, path: &Path) -> SdkResult<()> {
        let text = toml::to_string_pretty(self).map_err(|e| SdkError::Config(e.to_string()))?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Configured remotes, sorted by name.
    pub fn remotes(&self) -> Vec<RemoteConfig> {
        self.remote
            .iter()
            .map(|(name, section)| RemoteConfig {
                name: name.clone(),
                url: section.url.clone(),
                fetch: section.fetch.clone(),
            })
            .collect()
    }

    /// Author identity stamped with the current time.
    pub fn person(&self) -> Person {
        Person::now(self.user.name.clone(), self.user.email.clone())
    }
}
