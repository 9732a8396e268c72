// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Loader configuration

use crate::error::{ModuleError, Result};
use crate::path;
use serde::{Deserialize, Serialize};

/// Configuration for a [`ModuleSystem`](crate::ModuleSystem).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoaderConfig {
    /// Working directory used to resolve relative inputs; process cwd if unset
    pub cwd: Option<String>,

    /// Extra global search roots (`NODE_PATH`)
    pub node_path: Vec<String>,

    /// Home directory for `~/.node_modules` and `~/.node_libraries`
    pub home_dir: Option<String>,

    /// Install prefix; contributes `<prefix>/lib/node`
    pub prefix: Option<String>,

    /// Keep symlinked paths as module identities instead of real paths
    pub preserve_symlinks: bool,
}

impl LoaderConfig {
    /// Configuration from the process environment.
    pub fn from_env() -> Self {
        let mut config = Self::from_lookup(|key| std::env::var(key).ok());
        config.home_dir = dirs::home_dir().and_then(|p| p.to_str().map(String::from));
        config
    }

    /// Configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(node_path) = lookup("NODE_PATH") {
            config.node_path = node_path
                .split(':')
                .filter(|entry| !entry.is_empty())
                .map(String::from)
                .collect();
        }
        config.preserve_symlinks = lookup("NODE_PRESERVE_SYMLINKS").as_deref() == Some("1");
        config
    }

    /// Load a JSON configuration file
    pub fn from_file(file: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(file)?;
        serde_json::from_str(&content).map_err(|e| ModuleError::InvalidModuleFormat {
            path: file.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Fill unset fields from `other`
    pub fn merge(mut self, other: LoaderConfig) -> Self {
        if self.cwd.is_none() {
            self.cwd = other.cwd;
        }
        if self.node_path.is_empty() {
            self.node_path = other.node_path;
        }
        if self.home_dir.is_none() {
            self.home_dir = other.home_dir;
        }
        if self.prefix.is_none() {
            self.prefix = other.prefix;
        }
        self.preserve_symlinks |= other.preserve_symlinks;
        self
    }

    /// The absolute working directory
    pub fn resolved_cwd(&self) -> Result<String> {
        match &self.cwd {
            Some(cwd) if path::is_absolute(cwd) => Ok(path::normalize(cwd)),
            Some(cwd) => Err(ModuleError::invalid_argument(format!(
                "cwd must be absolute, got '{}'",
                cwd
            ))),
            None => {
                let cwd = std::env::current_dir()?;
                cwd.to_str()
                    .map(path::normalize)
                    .ok_or_else(|| ModuleError::invalid_argument("working directory is not UTF-8"))
            }
        }
    }

    /// Global search roots, appended to every bare lookup
    pub fn global_paths(&self, cwd: &str) -> Vec<String> {
        let mut paths: Vec<String> = self
            .node_path
            .iter()
            .map(|entry| path::resolve(cwd, entry))
            .collect();
        if let Some(home) = &self.home_dir {
            paths.push(path::join(home, ".node_modules"));
            paths.push(path::join(home, ".node_libraries"));
        }
        if let Some(prefix) = &self.prefix {
            paths.push(path::join(prefix, "lib/node"));
        }
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lookup() {
        let config = LoaderConfig::from_lookup(|key| match key {
            "NODE_PATH" => Some("/opt/lib::rel".to_string()),
            "NODE_PRESERVE_SYMLINKS" => Some("1".to_string()),
            _ => None,
        });
        assert_eq!(config.node_path, vec!["/opt/lib", "rel"]);
        assert!(config.preserve_symlinks);
    }

    #[test]
    fn test_global_paths_order() {
        let config = LoaderConfig {
            node_path: vec!["/opt/lib".into(), "rel".into()],
            home_dir: Some("/home/u".into()),
            prefix: Some("/usr/local".into()),
            ..Default::default()
        };
        assert_eq!(
            config.global_paths("/work"),
            vec![
                "/opt/lib",
                "/work/rel",
                "/home/u/.node_modules",
                "/home/u/.node_libraries",
                "/usr/local/lib/node",
            ]
        );
    }

    #[test]
    fn test_default_has_no_global_paths() {
        assert!(LoaderConfig::default().global_paths("/work").is_empty());
    }

    #[test]
    fn test_from_file_and_merge() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("cjs.json");
        std::fs::write(&file, r#"{"cwd":"/srv/app","preserveSymlinks":true}"#).unwrap();

        let config = LoaderConfig::from_file(&file).unwrap().merge(LoaderConfig {
            cwd: Some("/ignored".into()),
            prefix: Some("/usr".into()),
            ..Default::default()
        });
        assert_eq!(config.cwd.as_deref(), Some("/srv/app"));
        assert_eq!(config.prefix.as_deref(), Some("/usr"));
        assert!(config.preserve_symlinks);
        assert_eq!(config.resolved_cwd().unwrap(), "/srv/app");
    }

    #[test]
    fn test_relative_cwd_rejected() {
        let config = LoaderConfig {
            cwd: Some("app".into()),
            ..Default::default()
        };
        assert!(matches!(config.resolved_cwd(), Err(ModuleError::InvalidArgument(_))));
    }
}
