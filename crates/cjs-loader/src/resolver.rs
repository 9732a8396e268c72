// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module path resolution (Node.js algorithm)

use crate::builtins;
use crate::error::{ModuleError, Result};
use crate::fs::FileSystem;
use crate::path;
use dashmap::DashMap;
use serde::Deserialize;
use std::sync::Arc;

/// What resolution knows about the requiring module.
///
/// Every field is optional: a missing `filename` makes relative requests
/// resolve from `"."`, missing `paths` leaves bare requests with only the
/// global search roots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolveContext {
    /// Module id
    pub id: Option<String>,
    /// Absolute filename of the requiring module
    pub filename: Option<String>,
    /// node_modules search roots of the requiring module
    pub paths: Option<Vec<String>>,
}

impl ResolveContext {
    /// Context for a module at `filename`
    pub fn with_filename(filename: impl Into<String>) -> Self {
        Self {
            filename: Some(filename.into()),
            ..Default::default()
        }
    }

    /// Context that only carries search roots
    pub fn with_paths(paths: Vec<String>) -> Self {
        Self {
            paths: Some(paths),
            ..Default::default()
        }
    }
}

/// Options for `require.resolve`
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Start the lookup from these directories instead of the parent
    pub paths: Option<Vec<String>>,
}

/// Minimal package.json structure for resolution
#[derive(Debug, Default, Deserialize)]
pub struct PackageJson {
    /// Entry point
    pub main: Option<String>,
    /// Package type (`module` or `commonjs`)
    #[serde(rename = "type")]
    pub package_type: Option<String>,
}

/// `node_modules` directories searched from `from`, innermost first.
///
/// `from` is resolved against `cwd` and normalized before the walk;
/// directories that already are `node_modules` do not get a nested entry.
pub fn node_module_paths(cwd: &str, from: &str) -> Vec<String> {
    let from = path::resolve(cwd, from);
    if from == "/" {
        return vec!["/node_modules".to_string()];
    }

    let segments: Vec<&str> = from.split('/').filter(|s| !s.is_empty()).collect();
    let mut paths = Vec::with_capacity(segments.len() + 1);
    for end in (1..=segments.len()).rev() {
        if segments[end - 1] == "node_modules" {
            continue;
        }
        paths.push(format!("/{}/node_modules", segments[..end].join("/")));
    }
    paths.push("/node_modules".to_string());
    paths
}

/// Module resolver implementing Node.js resolution algorithm
pub struct ModuleResolver {
    fs: Arc<dyn FileSystem>,
    cwd: String,
    global_paths: Vec<String>,
    preserve_symlinks: bool,
    /// package.json contents by file path; `None` when absent
    packages: DashMap<String, Option<Arc<PackageJson>>>,
}

impl ModuleResolver {
    /// Create a resolver rooted at an absolute `cwd`
    pub fn new(
        fs: Arc<dyn FileSystem>,
        cwd: String,
        global_paths: Vec<String>,
        preserve_symlinks: bool,
    ) -> Self {
        Self {
            fs,
            cwd,
            global_paths,
            preserve_symlinks,
            packages: DashMap::new(),
        }
    }

    /// Working directory relative inputs resolve against
    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    /// Global search roots
    pub fn global_paths(&self) -> &[String] {
        &self.global_paths
    }

    /// `Module._nodeModulePaths(from)`
    pub fn node_module_paths(&self, from: Option<&str>) -> Result<Vec<String>> {
        let from = from.ok_or_else(|| {
            ModuleError::invalid_argument("The \"from\" argument must be of type string")
        })?;
        Ok(node_module_paths(&self.cwd, from))
    }

    /// `Module._resolveLookupPaths(request, parent)`
    pub fn resolve_lookup_paths(&self, request: &str, parent: Option<&ResolveContext>) -> Vec<String> {
        if builtins::is_builtin(request) {
            return Vec::new();
        }

        if !path::is_relative_request(request) {
            let mut paths = parent
                .and_then(|ctx| ctx.paths.clone())
                .unwrap_or_default();
            paths.extend(self.global_paths.iter().cloned());
            return paths;
        }

        match parent.and_then(|ctx| ctx.filename.as_deref()) {
            Some(filename) => vec![path::dirname(filename)],
            None => vec![".".to_string()],
        }
    }

    /// `Module._resolveFilename(request, parent, isMain, options)`.
    ///
    /// Builtins come back exactly as spelled. Everything else resolves to
    /// an absolute file path, trying in order: the literal path, the path
    /// with each extension in `extensions`, then the path as a package
    /// directory.
    pub fn resolve_filename(
        &self,
        request: &str,
        parent: Option<&ResolveContext>,
        is_main: bool,
        options: &ResolveOptions,
        extensions: &[String],
    ) -> Result<String> {
        if request.is_empty() {
            return Err(ModuleError::invalid_argument(
                "The argument 'id' must be a non-empty string",
            ));
        }
        if builtins::is_builtin(request) {
            return Ok(request.to_string());
        }

        let paths = match &options.paths {
            Some(roots) => self.lookup_paths_from_roots(request, roots),
            None => self.resolve_lookup_paths(request, parent),
        };
        tracing::trace!(request, is_main, ?paths, "resolving");

        match self.find_path(request, &paths, extensions)? {
            Some(filename) => Ok(filename),
            None => Err(ModuleError::ModuleNotFound {
                request: request.to_string(),
                searched: if path::is_absolute(request) {
                    vec![path::normalize(request)]
                } else {
                    paths
                },
                require_stack: Vec::new(),
            }),
        }
    }

    fn lookup_paths_from_roots(&self, request: &str, roots: &[String]) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for root in roots {
            let root = path::resolve(&self.cwd, root);
            let candidates = if path::is_relative_request(request) {
                vec![root]
            } else {
                let mut dirs = node_module_paths(&self.cwd, &root);
                dirs.extend(self.global_paths.iter().cloned());
                dirs
            };
            for candidate in candidates {
                if !out.contains(&candidate) {
                    out.push(candidate);
                }
            }
        }
        out
    }

    fn find_path(&self, request: &str, paths: &[String], extensions: &[String]) -> Result<Option<String>> {
        let absolute = path::is_absolute(request);
        let directory_only = path::names_directory(request);

        let bases: Vec<String> = if absolute {
            vec![path::normalize(request)]
        } else {
            paths
                .iter()
                .map(|dir| path::resolve(&self.cwd, dir))
                .filter(|dir| self.fs.is_dir(dir))
                .map(|dir| path::resolve(&dir, request))
                .collect()
        };

        for base in bases {
            let mut found = None;
            if !directory_only {
                found = self
                    .try_file(&base)
                    .or_else(|| self.try_extensions(&base, extensions));
            }
            if found.is_none() && self.fs.is_dir(&base) {
                found = self.try_package(&base, extensions)?;
            }
            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }

    fn try_file(&self, candidate: &str) -> Option<String> {
        if self.fs.is_file(candidate) {
            Some(self.to_real_path(candidate))
        } else {
            None
        }
    }

    fn try_extensions(&self, base: &str, extensions: &[String]) -> Option<String> {
        extensions
            .iter()
            .find_map(|ext| self.try_file(&format!("{}{}", base, ext)))
    }

    /// Resolve a directory (package.json main, then index)
    fn try_package(&self, dir: &str, extensions: &[String]) -> Result<Option<String>> {
        let index = path::join(dir, "index");
        let pkg = self.read_package(dir)?;
        let Some(main) = pkg.as_ref().and_then(|p| p.main.as_deref()).filter(|m| !m.is_empty()) else {
            return Ok(self.try_extensions(&index, extensions));
        };

        let filename = path::resolve(dir, main);
        let found = self
            .try_file(&filename)
            .or_else(|| self.try_extensions(&filename, extensions))
            .or_else(|| self.try_extensions(&path::join(&filename, "index"), extensions));
        if found.is_some() {
            return Ok(found);
        }

        if let Some(fallback) = self.try_extensions(&index, extensions) {
            tracing::warn!(package = dir, main, "invalid \"main\" field, falling back to index");
            return Ok(Some(fallback));
        }

        Err(ModuleError::ModuleNotFound {
            request: filename,
            searched: vec![dir.to_string()],
            require_stack: Vec::new(),
        })
    }

    fn to_real_path(&self, candidate: &str) -> String {
        if self.preserve_symlinks {
            return candidate.to_string();
        }
        self.fs
            .real_path(candidate)
            .unwrap_or_else(|_| candidate.to_string())
    }

    /// Read and cache `<dir>/package.json`
    pub fn read_package(&self, dir: &str) -> Result<Option<Arc<PackageJson>>> {
        let file = path::join(dir, "package.json");
        if let Some(cached) = self.packages.get(&file) {
            return Ok(cached.clone());
        }

        let parsed = if self.fs.is_file(&file) {
            let content = self.fs.read_to_string(&file)?;
            let pkg = serde_json::from_str::<PackageJson>(&content).map_err(|e| {
                ModuleError::InvalidModuleFormat {
                    path: file.clone(),
                    reason: format!("Error parsing package.json: {}", e),
                }
            })?;
            Some(Arc::new(pkg))
        } else {
            None
        };

        self.packages.insert(file, parsed.clone());
        Ok(parsed)
    }

    /// The `"type"` field of the package scope containing `filename`
    pub fn package_type(&self, filename: &str) -> Result<Option<String>> {
        let mut dir = path::dirname(filename);
        loop {
            if path::basename(&dir) == "node_modules" {
                return Ok(None);
            }
            if let Some(pkg) = self.read_package(&dir)? {
                return Ok(pkg.package_type.clone());
            }
            if dir == "/" || dir == "." {
                return Ok(None);
            }
            dir = path::dirname(&dir);
        }
    }
}
